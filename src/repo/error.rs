use crate::dataid::{Axis, DataId};
use crate::exposure::ExposureError;

use std::fmt;

#[derive(Debug)]
pub enum RepoError {
    UnknownDatasetType(String),
    MissingAxis { dataset: String, axis: Axis },
    BadTemplate(String),
    NotFound { dataset: String, data_id: DataId },
    InvalidRegistryValue { axis: Axis, value: String },
    Io(std::io::Error),
    Registry(rusqlite::Error),
    Policy(serde_json::Error),
    Exposure(ExposureError),
}

impl fmt::Display for RepoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepoError::UnknownDatasetType(name) => {
                write!(f, "Unknown dataset type '{}'", name)
            }
            RepoError::MissingAxis { dataset, axis } => {
                write!(f, "Data ID for '{}' is missing the {} axis", dataset, axis)
            }
            RepoError::BadTemplate(msg) => write!(f, "Bad dataset template: {}", msg),
            RepoError::NotFound { dataset, data_id } => {
                write!(f, "No '{}' dataset for {}", dataset, data_id)
            }
            RepoError::InvalidRegistryValue { axis, value } => {
                write!(f, "Registry holds invalid {} value '{}'", axis, value)
            }
            RepoError::Io(e) => write!(f, "I/O error: {}", e),
            RepoError::Registry(e) => write!(f, "Registry error: {}", e),
            RepoError::Policy(e) => write!(f, "Failed to parse mapper policy: {}", e),
            RepoError::Exposure(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for RepoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RepoError::Io(e) => Some(e),
            RepoError::Registry(e) => Some(e),
            RepoError::Policy(e) => Some(e),
            RepoError::Exposure(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for RepoError {
    fn from(err: std::io::Error) -> RepoError {
        RepoError::Io(err)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(err: rusqlite::Error) -> RepoError {
        RepoError::Registry(err)
    }
}

impl From<serde_json::Error> for RepoError {
    fn from(err: serde_json::Error) -> RepoError {
        RepoError::Policy(err)
    }
}

impl From<ExposureError> for RepoError {
    fn from(err: ExposureError) -> RepoError {
        RepoError::Exposure(err)
    }
}
