//! Account and credential lifecycle.
//!
//! Creating an account runs the full chain: validate the credential format,
//! prove the credentials against the live API, save them, register the
//! provider, then persist the account. A failure late in the chain cleans
//! up the earlier steps.

use std::sync::Arc;

use chrono::Utc;
use zonesync_provider::{create_provider, DnsProvider, ProviderCredentials};

use crate::error::{CoreError, CoreResult};
use crate::services::ServiceContext;
use crate::types::{Account, AccountStatus, SyncConfig};

/// Result of restoring providers from stored credentials at startup.
#[derive(Debug, Clone, Copy, Default)]
pub struct RestoreResult {
    pub restored: usize,
    pub failed: usize,
}

/// Account and credential service.
pub struct CredentialService {
    ctx: Arc<ServiceContext>,
}

impl CredentialService {
    #[must_use]
    pub fn new(ctx: Arc<ServiceContext>) -> Self {
        Self { ctx }
    }

    /// List all accounts.
    pub async fn list_accounts(&self) -> CoreResult<Vec<Account>> {
        self.ctx.accounts.find_all().await
    }

    /// Get one account.
    pub async fn get_account(&self, account_id: &str) -> CoreResult<Option<Account>> {
        self.ctx.accounts.find_by_id(account_id).await
    }

    /// Check a credential set against the live API without saving anything.
    ///
    /// Returns `Ok(true)` when the API accepts the credentials, `Ok(false)`
    /// when it rejects them. Format problems fail before any network call.
    pub async fn validate(&self, credentials: &ProviderCredentials) -> CoreResult<bool> {
        credentials
            .validate()
            .map_err(CoreError::CredentialValidation)?;
        let provider = create_provider(credentials.clone(), self.ctx.budget.clone())?;
        Ok(provider.validate_credentials().await?)
    }

    /// Create an account from validated credentials.
    ///
    /// Flow: verify credentials -> save credentials -> register provider ->
    /// save account. A failed account save cleans up the saved credentials
    /// and the registered provider.
    pub async fn create_account(
        &self,
        name: String,
        credentials: ProviderCredentials,
    ) -> CoreResult<Account> {
        let provider = self.validate_and_create_provider(&credentials).await?;

        let account = Account::new(name);
        let account_id = account.id.clone();

        log::info!("Saving credentials for account {account_id}");
        self.ctx.credential_store.set(&account_id, &credentials).await?;
        self.ctx.registry.register(account_id.clone(), provider).await;

        if let Err(e) = self.ctx.accounts.save(&account).await {
            log::error!("Failed to save account metadata, cleaning up: {e}");
            if let Err(cleanup_err) = self.ctx.credential_store.remove(&account_id).await {
                log::warn!("Cleanup: failed to delete credentials for {account_id}: {cleanup_err}");
            }
            self.ctx.registry.unregister(&account_id).await;
            return Err(e);
        }
        Ok(account)
    }

    /// Replace an account's credentials.
    ///
    /// The new credentials are proven against the live API before anything
    /// is written; the account returns to `Active` on success.
    pub async fn update_credentials(
        &self,
        account_id: &str,
        credentials: ProviderCredentials,
    ) -> CoreResult<Account> {
        let mut account = self
            .ctx
            .accounts
            .find_by_id(account_id)
            .await?
            .ok_or_else(|| CoreError::AccountNotFound(account_id.to_string()))?;

        let provider = self.validate_and_create_provider(&credentials).await?;

        log::info!("Updating credentials for account {account_id}");
        self.ctx.credential_store.set(account_id, &credentials).await?;
        self.ctx
            .registry
            .register(account_id.to_string(), provider)
            .await;

        account.status = Some(AccountStatus::Active);
        account.error = None;
        account.updated_at = Utc::now();
        self.ctx.accounts.save(&account).await?;
        Ok(account)
    }

    /// Update an account's sync settings.
    pub async fn update_config(
        &self,
        account_id: &str,
        config: SyncConfig,
    ) -> CoreResult<Account> {
        let mut account = self
            .ctx
            .accounts
            .find_by_id(account_id)
            .await?
            .ok_or_else(|| CoreError::AccountNotFound(account_id.to_string()))?;
        account.config = config;
        account.updated_at = Utc::now();
        self.ctx.accounts.save(&account).await?;
        Ok(account)
    }

    /// Delete an account.
    ///
    /// Credentials go first; when that fails the account stays listed so
    /// the operator can retry. The account row itself is removed last.
    pub async fn delete_account(&self, account_id: &str) -> CoreResult<()> {
        self.ctx
            .accounts
            .find_by_id(account_id)
            .await?
            .ok_or_else(|| CoreError::AccountNotFound(account_id.to_string()))?;

        self.ctx.credential_store.remove(account_id).await?;
        self.ctx.registry.unregister(account_id).await;
        self.ctx.accounts.delete(account_id).await?;
        Ok(())
    }

    /// Rebuild the provider registry from stored credentials.
    ///
    /// Called at startup. Accounts whose credentials are missing or cannot
    /// build a provider are marked `Error` and skipped; the rest register
    /// without a network round trip.
    pub async fn restore_accounts(&self) -> CoreResult<RestoreResult> {
        let accounts = self.ctx.accounts.find_all().await?;
        let all_credentials = match self.ctx.credential_store.load_all().await {
            Ok(creds) => creds,
            Err(e) => {
                log::error!("Failed to load credentials: {e}");
                for account in &accounts {
                    self.ctx
                        .mark_account_invalid(&account.id, &e.to_string())
                        .await;
                }
                return Ok(RestoreResult {
                    restored: 0,
                    failed: accounts.len(),
                });
            }
        };

        let mut result = RestoreResult::default();
        for account in &accounts {
            let Some(credentials) = all_credentials.get(&account.id) else {
                log::warn!("No credentials found for account {}", account.id);
                self.ctx
                    .mark_account_invalid(&account.id, "credentials missing")
                    .await;
                result.failed += 1;
                continue;
            };

            match create_provider(credentials.clone(), self.ctx.budget.clone()) {
                Ok(provider) => {
                    self.ctx.registry.register(account.id.clone(), provider).await;
                    if let Err(e) = self
                        .ctx
                        .accounts
                        .update_status(&account.id, AccountStatus::Active, None)
                        .await
                    {
                        log::warn!("Failed to update status for account {}: {e}", account.id);
                    }
                    result.restored += 1;
                }
                Err(e) => {
                    log::warn!("Failed to create provider for account {}: {e}", account.id);
                    self.ctx
                        .mark_account_invalid(&account.id, &e.to_string())
                        .await;
                    result.failed += 1;
                }
            }
        }
        Ok(result)
    }

    async fn validate_and_create_provider(
        &self,
        credentials: &ProviderCredentials,
    ) -> CoreResult<Arc<dyn DnsProvider>> {
        credentials
            .validate()
            .map_err(CoreError::CredentialValidation)?;
        let provider = create_provider(credentials.clone(), self.ctx.budget.clone())?;
        if !provider.validate_credentials().await? {
            return Err(CoreError::InvalidCredentials("godaddy".to_string()));
        }
        Ok(provider)
    }
}
