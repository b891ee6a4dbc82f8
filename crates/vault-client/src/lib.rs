//! # Vault Client Crate
//!
//! A small client for the secrets service that holds production database
//! credentials. Only the two calls credential resolution needs are exposed:
//! a token check and a KV version 2 secret read.
//!
//! The [`SecretStore`] trait is the seam the rest of the workspace depends on,
//! so the live [`VaultClient`] can be swapped for an in-memory store in tests.

use crate::auth::token_headers;
use crate::responses::{KvV2Response, VaultErrorResponse};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{Map, Value};

mod auth;
pub mod error;
pub mod responses;

// --- Public API ---
pub use auth::TOKEN_HEADER;
pub use error::VaultError;

/// The default mount point of the KV version 2 secrets engine.
pub const DEFAULT_MOUNT: &str = "secret";

/// The generic, abstract interface for a secrets service.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Checks whether the configured token is accepted by the service.
    async fn is_authenticated(&self) -> Result<bool, VaultError>;

    /// Reads the key/value payload of the secret stored at `path`.
    async fn read_secret(&self, path: &str) -> Result<Map<String, Value>, VaultError>;
}

/// A concrete implementation of [`SecretStore`] for HashiCorp Vault.
#[derive(Clone)]
pub struct VaultClient {
    client: reqwest::Client,
    base_url: String,
    mount: String,
}

impl VaultClient {
    pub fn new(address: &str, token: &str) -> Result<Self, VaultError> {
        let client = reqwest::Client::builder()
            .default_headers(token_headers(token)?)
            .build()?;

        Ok(Self {
            client,
            base_url: address.trim_end_matches('/').to_string(),
            mount: DEFAULT_MOUNT.to_string(),
        })
    }

    /// Reads secrets from a KV engine mounted somewhere other than `secret/`.
    pub fn with_mount(mut self, mount: &str) -> Self {
        self.mount = mount.trim_matches('/').to_string();
        self
    }

    pub fn address(&self) -> &str {
        &self.base_url
    }

    fn secret_url(&self, path: &str) -> String {
        format!(
            "{}/v1/{}/data/{}",
            self.base_url,
            self.mount,
            path.trim_start_matches('/')
        )
    }

    async fn error_from(response: reqwest::Response) -> VaultError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        VaultError::Api(status.as_u16(), VaultErrorResponse::from_body(&body).message())
    }
}

#[async_trait]
impl SecretStore for VaultClient {
    async fn is_authenticated(&self) -> Result<bool, VaultError> {
        let url = format!("{}/v1/auth/token/lookup-self", self.base_url);
        let response = self.client.get(&url).send().await?;

        match response.status() {
            status if status.is_success() => Ok(true),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Ok(false),
            _ => Err(Self::error_from(response).await),
        }
    }

    async fn read_secret(&self, path: &str) -> Result<Map<String, Value>, VaultError> {
        let url = self.secret_url(path);
        tracing::debug!(mount = %self.mount, path, "Reading secret from Vault");

        let response = self.client.get(&url).send().await?;
        match response.status() {
            status if status.is_success() => {
                let text = response.text().await?;
                let parsed: KvV2Response = serde_json::from_str(&text)
                    .map_err(|e| VaultError::Deserialization(e.to_string()))?;
                Ok(parsed.data.data)
            }
            StatusCode::NOT_FOUND => Err(VaultError::SecretNotFound(path.to_string())),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(VaultError::Authentication),
            _ => Err(Self::error_from(response).await),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_url_joins_mount_and_path() {
        let client = VaultClient::new("https://vault.example.com/", "t").unwrap();
        assert_eq!(client.address(), "https://vault.example.com");
        assert_eq!(
            client.secret_url("secret/database/postgresql"),
            "https://vault.example.com/v1/secret/data/secret/database/postgresql"
        );

        let client = client.with_mount("/kv/");
        assert_eq!(
            client.secret_url("/db/postgres"),
            "https://vault.example.com/v1/kv/data/db/postgres"
        );
    }

    #[test]
    fn error_body_falls_back_to_raw_text() {
        assert_eq!(
            VaultErrorResponse::from_body(r#"{"errors":["permission denied"]}"#).message(),
            "permission denied"
        );
        assert_eq!(VaultErrorResponse::from_body("bad gateway").message(), "bad gateway");
        assert_eq!(VaultErrorResponse::from_body("").message(), "no error details");
    }
}
