//! Dataset retrieval helpers with strict/warn/silent missing-data policy.

use crate::dataid::DataId;
use crate::exposure::{Exposure, PsfModel};
use crate::repo::{RepoError, Repository};

use log::warn;
use std::fmt;

#[derive(Debug)]
pub enum FetchError {
    /// Dataset could not be retrieved and strict handling was requested.
    MissingDataset(String),
    /// Exposure was retrieved but carries no PSF, with strict handling.
    MissingPsf(String),
    /// The exposure itself could not be fetched for a PSF read; raised
    /// regardless of the strict flag.
    Repo(RepoError),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::MissingDataset(msg) => write!(f, "{}", msg),
            FetchError::MissingPsf(msg) => write!(f, "{}", msg),
            FetchError::Repo(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for FetchError {}

/// Gets a dataset from a repository, with an optional error or warning
/// when it cannot be retrieved.
///
/// Every retrieval failure counts as missing: with `strict` it becomes an
/// error, otherwise with `warn` a skip message is logged and `None` is
/// returned, otherwise `None` is returned silently.
pub fn get_dataset(
    repo: &dyn Repository,
    dataset: &str,
    data_id: &DataId,
    strict: bool,
    warn_missing: bool,
) -> Result<Option<Exposure>, FetchError> {
    match repo.get(dataset, data_id) {
        Ok(exposure) => Ok(Some(exposure)),
        Err(_) => {
            let msg = format!("{} : Failed to retrieve {} dataset", data_id, dataset);
            if strict {
                Err(FetchError::MissingDataset(msg))
            } else {
                if warn_missing {
                    warn!("*** Skipping {}", msg);
                }
                Ok(None)
            }
        }
    }
}

/// Gets the PSF of an exposure without reading its pixels.
///
/// A failure to fetch the exposure header is always an error, regardless
/// of `strict`; the strict/warn policy applies only to a missing PSF on
/// an otherwise-retrieved exposure.
pub fn get_psf(
    repo: &dyn Repository,
    dataset: &str,
    data_id: &DataId,
    strict: bool,
    warn_missing: bool,
) -> Result<Option<PsfModel>, FetchError> {
    let header = repo
        .get_header(dataset, data_id)
        .map_err(FetchError::Repo)?;
    match header.info.psf {
        Some(psf) => Ok(Some(psf)),
        None => {
            let msg = format!("{} : {} exposure had no PSF", data_id, dataset);
            if strict {
                Err(FetchError::MissingPsf(msg))
            } else {
                if warn_missing {
                    warn!("*** Skipping {}", msg);
                }
                Ok(None)
            }
        }
    }
}
