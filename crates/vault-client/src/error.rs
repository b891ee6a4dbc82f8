use core_types::ErrorKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VaultError {
    #[error("Failed to authenticate with Vault")]
    Authentication,

    #[error("Failed to reach Vault: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Vault rejected the token header: {0}")]
    InvalidToken(String),

    #[error("Vault returned an error (status {0}): {1}")]
    Api(u16, String),

    #[error("No secret found at path: {0}")]
    SecretNotFound(String),

    #[error("Failed to deserialize the Vault response: {0}")]
    Deserialization(String),
}

impl VaultError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Vault
    }
}
