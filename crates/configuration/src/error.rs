use core_types::{CoreError, ErrorKind};
use std::path::PathBuf;
use thiserror::Error;
use vault_client::VaultError;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Invalid configuration file: {0}")]
    InvalidFile(String),

    #[error("Failed to load configuration from file: {0}")]
    LoadError(#[from] ini::Error),

    #[error("{0} environment variable is required for production")]
    MissingVariable(&'static str),

    #[error(transparent)]
    Credentials(#[from] CoreError),

    #[error("Vault error: {0}")]
    Vault(#[from] VaultError),
}

impl ConfigError {
    /// Vault failures signal a live dependency problem; everything else is a
    /// static misconfiguration.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConfigError::Vault(_) => ErrorKind::Vault,
            _ => ErrorKind::Configuration,
        }
    }
}
