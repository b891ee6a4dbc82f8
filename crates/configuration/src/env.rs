//! Access to environment variables behind an injectable provider.

use std::collections::HashMap;

/// Explicit environment selection (`prod`, `local`, `dev`, ...).
pub const ENVIRONMENT: &str = "ENVIRONMENT";
/// Address of the Vault server. Its presence also implies production.
pub const VAULT_ADDR: &str = "VAULT_ADDR";
/// Token used to authenticate against Vault.
pub const VAULT_TOKEN: &str = "VAULT_TOKEN";
/// Overrides the path of the database secret.
pub const DB_VAULT_PATH: &str = "DB_VAULT_PATH";
/// Overrides the mount point of the KV version 2 engine.
pub const VAULT_MOUNT: &str = "VAULT_MOUNT";
/// Cloud region; its presence implies production.
pub const AWS_REGION: &str = "AWS_REGION";
/// Overrides the path of the local property file.
pub const DB_CONFIG_FILE: &str = "DB_CONFIG_FILE";

/// A source of environment variables.
///
/// Implementations return `None` for unset variables and for variables set
/// to the empty string.
pub trait EnvProvider: Send + Sync {
    fn var(&self, key: &str) -> Option<String>;
}

/// Reads the real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl ProcessEnv {
    /// Loads a `.env` file from the working directory (or a parent), then
    /// returns a provider over the process environment.
    pub fn load() -> Self {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!(path = %path.display(), "Loaded environment from .env file"),
            Err(e) if e.not_found() => {}
            Err(e) => tracing::warn!("Ignoring unreadable .env file: {}", e),
        }
        ProcessEnv
    }
}

impl EnvProvider for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok().filter(|v| !v.is_empty())
    }
}

impl EnvProvider for HashMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).filter(|v| !v.is_empty()).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_provider_treats_empty_values_as_unset() {
        let env = HashMap::from([
            (VAULT_ADDR.to_string(), "https://vault.example.com".to_string()),
            (AWS_REGION.to_string(), String::new()),
        ]);
        assert_eq!(env.var(VAULT_ADDR).as_deref(), Some("https://vault.example.com"));
        assert_eq!(env.var(AWS_REGION), None);
        assert_eq!(env.var(VAULT_TOKEN), None);
    }
}
