//! # Configuration Crate
//!
//! Decides whether the process runs locally or in production and produces the
//! database credential set from the matching source: a local INI-style
//! property file, or a secret stored in Vault.
//!
//! ## Public API
//!
//! - [`CredentialResolver`]: environment detection plus memoized credential loading.
//! - [`EnvProvider`]: the injectable view of environment variables.
//! - [`ResolverSettings`]: paths and addresses captured from the environment.
//! - [`validate_credentials`]: the pure completeness check over a credential mapping.
//! - [`ConfigError`]: the errors this crate can return.

// Declare the modules that make up this crate.
pub mod env;
pub mod error;
pub mod local;
pub mod resolver;
pub mod settings;
pub mod vault;

// Re-export the core types to provide a clean public API.
pub use core_types::validate_credentials;
pub use env::{EnvProvider, ProcessEnv};
pub use error::ConfigError;
pub use local::load_local_credentials;
pub use resolver::{CredentialResolver, CredentialResolverBuilder};
pub use settings::ResolverSettings;
pub use vault::{load_vault_credentials, SecretStoreConnector, VaultEndpoint};

/// Resolves credentials for `environment` (detected when `None`) from the
/// process environment in one step.
pub async fn load_credentials(
    environment: Option<core_types::Environment>,
) -> Result<core_types::CredentialSet, ConfigError> {
    let mut resolver = CredentialResolver::new(environment);
    Ok(resolver.get_credentials().await?.clone())
}
