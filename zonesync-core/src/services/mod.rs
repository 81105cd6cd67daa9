//! Business logic service layer.

mod conflicts;
mod credentials;
mod differ;
mod discovery;
mod merge;
mod scheduler;
mod status;
mod sync;

pub use conflicts::{ConflictResolutionChoice, ConflictService};
pub use credentials::{CredentialService, RestoreResult};
pub use differ::{
    build_plan, ConflictResolution, DetectedConflict, DiffContext, DiffPlan, RecordOp,
};
pub use discovery::{classify, DiscoveryOutcome, DiscoveryService};
pub use merge::{resolve_key, KeyResolution};
pub use scheduler::{Scheduler, SchedulerHandle, Trigger};
pub use status::{AccountOverview, DomainOverview, StatusService};
pub use sync::{AccountSyncReport, SyncOptions, SyncService};

use std::sync::Arc;

use zonesync_provider::{DnsProvider, ProviderError, RequestBudget};

use crate::error::{CoreError, CoreResult};
use crate::traits::{
    AccountRepository, BaselineStore, ConflictQueue, CredentialStore, DesiredStateSource,
    DomainCatalog, ProviderRegistry, RecordHistoryStore, SyncLogStore,
};
use crate::types::AccountStatus;

/// Service context, holding every dependency the services need.
///
/// The host builds this with a struct literal, injecting its storage
/// implementations, and shares it behind an `Arc`.
pub struct ServiceContext {
    /// Credential storage.
    pub credential_store: Arc<dyn CredentialStore>,
    /// Account persistence.
    pub accounts: Arc<dyn AccountRepository>,
    /// Provider registry.
    pub registry: Arc<dyn ProviderRegistry>,
    /// Domain catalog.
    pub catalog: Arc<dyn DomainCatalog>,
    /// Sync run audit log.
    pub sync_log: Arc<dyn SyncLogStore>,
    /// Per-record change history.
    pub history: Arc<dyn RecordHistoryStore>,
    /// Manual conflict queue.
    pub conflicts: Arc<dyn ConflictQueue>,
    /// Last-known-common baselines.
    pub baselines: Arc<dyn BaselineStore>,
    /// Desired-state access into the control plane.
    pub desired: Arc<dyn DesiredStateSource>,
    /// Shared request budget for all provider instances.
    pub budget: Arc<RequestBudget>,
}

impl ServiceContext {
    /// Get a registered provider instance.
    pub async fn get_provider(&self, account_id: &str) -> CoreResult<Arc<dyn DnsProvider>> {
        self.registry
            .get(account_id)
            .await
            .ok_or_else(|| CoreError::AccountNotFound(account_id.to_string()))
    }

    /// Mark an account invalid.
    ///
    /// Called when the remote API rejects the account's credentials.
    pub async fn mark_account_invalid(&self, account_id: &str, error_msg: &str) {
        if let Err(e) = self
            .accounts
            .update_status(account_id, AccountStatus::Error, Some(error_msg.to_string()))
            .await
        {
            log::error!("Failed to mark account {account_id} as invalid: {e}");
            return;
        }
        log::warn!("Account {account_id} marked as invalid: {error_msg}");
    }

    /// Handle a provider error, updating the account status when the error
    /// means the credentials are no longer valid.
    pub async fn handle_provider_error(&self, account_id: &str, err: ProviderError) -> CoreError {
        if let ProviderError::InvalidCredentials { .. } = &err {
            self.mark_account_invalid(account_id, "credentials rejected by the provider")
                .await;
        }
        CoreError::Provider(err)
    }
}
