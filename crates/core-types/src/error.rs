use crate::enums::ErrorKind;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Unknown environment: {0}")]
    UnknownEnvironment(String),

    #[error("Missing required credential: {0}")]
    MissingCredential(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),

    #[error("Invalid or incomplete credentials: '{0}' is empty")]
    EmptyCredential(String),
}

impl CoreError {
    /// Every shared-type failure is a static misconfiguration.
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Configuration
    }
}
