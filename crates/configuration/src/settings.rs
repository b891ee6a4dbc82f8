use crate::env::{
    AWS_REGION, DB_CONFIG_FILE, DB_VAULT_PATH, ENVIRONMENT, EnvProvider, VAULT_ADDR, VAULT_MOUNT,
    VAULT_TOKEN,
};
use core_types::Environment;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Default location of the local property file.
pub const DEFAULT_CONFIG_FILE: &str = "config/database.properties";
/// Section of the property file holding the credentials.
pub const DEFAULT_SECTION: &str = "postgresql";
/// Default path of the database secret in Vault.
pub const DEFAULT_VAULT_PATH: &str = "secret/database/postgresql";

/// Every tunable of credential resolution, captured once from the
/// environment provider.
#[derive(Clone, Serialize)]
pub struct ResolverSettings {
    /// Raw value of `ENVIRONMENT`, if set.
    pub environment: Option<String>,
    pub vault_addr: Option<String>,
    #[serde(skip)]
    pub vault_token: Option<String>,
    pub vault_path: String,
    pub vault_mount: String,
    pub aws_region: Option<String>,
    pub config_file: PathBuf,
    pub section: String,
}

impl ResolverSettings {
    pub fn from_env(env: &dyn EnvProvider) -> Self {
        Self {
            environment: env.var(ENVIRONMENT),
            vault_addr: env.var(VAULT_ADDR),
            vault_token: env.var(VAULT_TOKEN),
            vault_path: env.var(DB_VAULT_PATH).unwrap_or_else(|| DEFAULT_VAULT_PATH.to_string()),
            vault_mount: env
                .var(VAULT_MOUNT)
                .unwrap_or_else(|| vault_client::DEFAULT_MOUNT.to_string()),
            aws_region: env.var(AWS_REGION),
            config_file: env
                .var(DB_CONFIG_FILE)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE)),
            section: DEFAULT_SECTION.to_string(),
        }
    }

    /// Decides the environment when none was given explicitly.
    ///
    /// Precedence: the `ENVIRONMENT` designation, then the presence of a
    /// Vault address or a cloud region, then `Local`. An unrecognised
    /// designation falls through to the heuristics.
    pub fn detect_environment(&self) -> Environment {
        if let Some(designation) = self.environment.as_deref() {
            match Environment::from_designation(designation) {
                Some(env) => return env,
                None => tracing::warn!("Ignoring unknown ENVIRONMENT value '{}'", designation),
            }
        }
        if self.vault_addr.is_some() || self.aws_region.is_some() {
            return Environment::Production;
        }
        Environment::Local
    }
}

impl fmt::Debug for ResolverSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolverSettings")
            .field("environment", &self.environment)
            .field("vault_addr", &self.vault_addr)
            .field("vault_token", &self.vault_token.as_ref().map(|_| "[REDACTED]"))
            .field("vault_path", &self.vault_path)
            .field("vault_mount", &self.vault_mount)
            .field("aws_region", &self.aws_region)
            .field("config_file", &self.config_file)
            .field("section", &self.section)
            .finish()
    }
}
