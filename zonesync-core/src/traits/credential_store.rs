//! Credential storage abstract trait.

use async_trait::async_trait;
use std::collections::HashMap;
use zonesync_provider::ProviderCredentials;

use crate::error::CoreResult;

/// Credential map type: `account_id` -> typed credentials.
pub type CredentialsMap = HashMap<String, ProviderCredentials>;

/// Credential storage trait.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Load all credentials.
    ///
    /// Used at startup to restore providers with a single storage read.
    async fn load_all(&self) -> CoreResult<CredentialsMap>;

    /// Get one account's credentials.
    ///
    /// # Returns
    /// * `Ok(Some(credentials))` - credentials exist
    /// * `Ok(None)` - no credentials stored for this account
    async fn get(&self, account_id: &str) -> CoreResult<Option<ProviderCredentials>>;

    /// Set one account's credentials.
    ///
    /// # Arguments
    /// * `account_id` - account id
    /// * `credentials` - typed credentials
    async fn set(&self, account_id: &str, credentials: &ProviderCredentials) -> CoreResult<()>;

    /// Remove one account's credentials.
    ///
    /// # Arguments
    /// * `account_id` - account id
    async fn remove(&self, account_id: &str) -> CoreResult<()>;
}
