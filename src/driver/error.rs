use crate::cli::UnusedOptionError;
use crate::repo::RepoError;

use std::fmt;

#[derive(Debug)]
pub enum DriverError {
    Cli(clap::Error),
    Option(UnusedOptionError),
    Repo(RepoError),
    Process(Box<dyn std::error::Error>),
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriverError::Cli(e) => write!(f, "{}", e),
            DriverError::Option(e) => write!(f, "{}", e),
            DriverError::Repo(e) => write!(f, "{}", e),
            DriverError::Process(e) => write!(f, "Processing failed: {}", e),
        }
    }
}

impl std::error::Error for DriverError {}

impl From<clap::Error> for DriverError {
    fn from(err: clap::Error) -> DriverError {
        DriverError::Cli(err)
    }
}

impl From<UnusedOptionError> for DriverError {
    fn from(err: UnusedOptionError) -> DriverError {
        DriverError::Option(err)
    }
}

impl From<RepoError> for DriverError {
    fn from(err: RepoError) -> DriverError {
        DriverError::Repo(err)
    }
}
