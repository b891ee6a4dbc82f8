use configuration::ConfigError;
use core_types::ErrorKind;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error(transparent)]
    ConfigurationError(#[from] ConfigError),

    #[error("Invalid or incomplete credentials")]
    InvalidCredentials,

    #[error("Failed to connect to PostgreSQL: {0}")]
    ConnectionError(#[source] sqlx::Error),

    #[error("Failed to connect to PostgreSQL: timed out after {0:?}")]
    ConnectionTimeout(Duration),

    #[error("Database operation failed: {0}")]
    QueryError(#[from] sqlx::Error),

    #[error("The cursor has already been closed.")]
    CursorClosed,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl DbError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DbError::ConfigurationError(e) => e.kind(),
            DbError::InvalidCredentials => ErrorKind::Configuration,
            DbError::ConnectionError(_)
            | DbError::ConnectionTimeout(_)
            | DbError::QueryError(_)
            | DbError::CursorClosed => ErrorKind::Connection,
            DbError::InvalidArgument(_) => ErrorKind::InvalidArgument,
        }
    }
}
