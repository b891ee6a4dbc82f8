use crate::env::{EnvProvider, ProcessEnv};
use crate::error::ConfigError;
use crate::local::load_local_credentials;
use crate::settings::ResolverSettings;
use crate::vault::{load_vault_credentials, vault_connector, SecretStoreConnector, VaultEndpoint};
use core_types::{CredentialSet, Environment};
use serde_json::{Map, Value};
use vault_client::{SecretStore, VaultError};

/// Decides the active environment and produces its credential set.
///
/// The environment is fixed at construction. Credentials are loaded on the
/// first call to [`CredentialResolver::get_credentials`] and cached for the
/// lifetime of the resolver.
pub struct CredentialResolver {
    environment: Environment,
    settings: ResolverSettings,
    connector: SecretStoreConnector,
    credentials: Option<CredentialSet>,
}

impl CredentialResolver {
    /// Creates a resolver over the process environment (after loading any
    /// `.env` file). With `None`, the environment is detected.
    pub fn new(environment: Option<Environment>) -> Self {
        let mut builder = Self::builder();
        if let Some(environment) = environment {
            builder = builder.environment(environment);
        }
        builder.build()
    }

    pub fn builder() -> CredentialResolverBuilder {
        CredentialResolverBuilder::default()
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn settings(&self) -> &ResolverSettings {
        &self.settings
    }

    /// Returns the credential set, loading it on first use.
    pub async fn get_credentials(&mut self) -> Result<&CredentialSet, ConfigError> {
        let credentials = match self.credentials.take() {
            Some(cached) => cached,
            None => self.load().await?,
        };
        Ok(&*self.credentials.insert(credentials))
    }

    /// Checks a credential mapping for completeness. See
    /// [`core_types::validate_credentials`].
    pub fn validate_credentials(&self, credentials: &Map<String, Value>) -> bool {
        core_types::validate_credentials(credentials)
    }

    async fn load(&self) -> Result<CredentialSet, ConfigError> {
        match self.environment {
            Environment::Local => {
                tracing::debug!(path = %self.settings.config_file.display(), "Loading credentials from local property file");
                load_local_credentials(&self.settings.config_file, &self.settings.section)
            }
            Environment::Production => {
                tracing::debug!(addr = ?self.settings.vault_addr, "Loading credentials from Vault");
                load_vault_credentials(&self.settings, &self.connector).await
            }
        }
    }
}

/// Builds a [`CredentialResolver`] with injected collaborators.
#[derive(Default)]
pub struct CredentialResolverBuilder {
    environment: Option<Environment>,
    env: Option<Box<dyn EnvProvider>>,
    connector: Option<SecretStoreConnector>,
}

impl CredentialResolverBuilder {
    /// Fixes the environment instead of detecting it.
    pub fn environment(mut self, environment: Environment) -> Self {
        self.environment = Some(environment);
        self
    }

    /// Reads variables from `env` instead of the process environment.
    pub fn env_provider(mut self, env: impl EnvProvider + 'static) -> Self {
        self.env = Some(Box::new(env));
        self
    }

    /// Replaces how the secrets service is reached.
    pub fn secret_store<F>(mut self, connector: F) -> Self
    where
        F: Fn(&VaultEndpoint) -> Result<Box<dyn SecretStore>, VaultError> + Send + Sync + 'static,
    {
        self.connector = Some(Box::new(connector));
        self
    }

    pub fn build(self) -> CredentialResolver {
        let env = self.env.unwrap_or_else(|| Box::new(ProcessEnv::load()));
        let settings = ResolverSettings::from_env(env.as_ref());

        let environment = match self.environment {
            Some(environment) => environment,
            None => {
                let detected = settings.detect_environment();
                tracing::debug!(environment = %detected, "Detected environment");
                detected
            }
        };

        CredentialResolver {
            environment,
            settings,
            connector: self.connector.unwrap_or_else(vault_connector),
            credentials: None,
        }
    }
}
