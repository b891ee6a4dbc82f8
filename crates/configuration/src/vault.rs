//! Credentials from the secrets service.

use crate::env::{VAULT_ADDR, VAULT_TOKEN};
use crate::error::ConfigError;
use crate::settings::ResolverSettings;
use core_types::CredentialSet;
use vault_client::{SecretStore, VaultClient, VaultError};

/// Where and how to reach the secrets service.
pub struct VaultEndpoint {
    pub address: String,
    pub token: String,
    pub mount: String,
}

/// Opens a [`SecretStore`] for an endpoint. The default opens a live
/// [`VaultClient`]; tests substitute in-memory stores.
pub type SecretStoreConnector =
    Box<dyn Fn(&VaultEndpoint) -> Result<Box<dyn SecretStore>, VaultError> + Send + Sync>;

pub fn vault_connector() -> SecretStoreConnector {
    Box::new(|endpoint: &VaultEndpoint| {
        let client = VaultClient::new(&endpoint.address, &endpoint.token)?.with_mount(&endpoint.mount);
        Ok(Box::new(client) as Box<dyn SecretStore>)
    })
}

/// Fetches and checks the database secret.
///
/// Missing `VAULT_ADDR`/`VAULT_TOKEN` and missing keys in the payload are
/// configuration errors; a rejected token or a service failure is a Vault
/// error.
pub async fn load_vault_credentials(
    settings: &ResolverSettings,
    connector: &SecretStoreConnector,
) -> Result<CredentialSet, ConfigError> {
    let address = settings
        .vault_addr
        .clone()
        .ok_or(ConfigError::MissingVariable(VAULT_ADDR))?;
    let token = settings
        .vault_token
        .clone()
        .ok_or(ConfigError::MissingVariable(VAULT_TOKEN))?;

    let store = connector(&VaultEndpoint {
        address,
        token,
        mount: settings.vault_mount.clone(),
    })?;

    if !store.is_authenticated().await? {
        return Err(VaultError::Authentication.into());
    }

    let secret = store.read_secret(&settings.vault_path).await?;
    tracing::debug!(path = %settings.vault_path, "Fetched database secret from Vault");

    Ok(CredentialSet::from_map(&secret)?)
}
