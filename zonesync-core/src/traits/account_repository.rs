//! Account persistence abstract trait.

use async_trait::async_trait;

use crate::error::CoreResult;
use crate::types::{Account, AccountStatus};

/// Account metadata repository trait.
///
/// The CLI host backs this with a JSON file store; tests use the in-memory
/// mock.
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Get all accounts.
    async fn find_all(&self) -> CoreResult<Vec<Account>>;

    /// Get an account by id.
    ///
    /// # Arguments
    /// * `id` - account id
    async fn find_by_id(&self, id: &str) -> CoreResult<Option<Account>>;

    /// Save an account (insert or update).
    ///
    /// # Arguments
    /// * `account` - account data
    async fn save(&self, account: &Account) -> CoreResult<()>;

    /// Delete an account.
    ///
    /// # Arguments
    /// * `id` - account id
    async fn delete(&self, id: &str) -> CoreResult<()>;

    /// Update account status.
    ///
    /// # Arguments
    /// * `id` - account id
    /// * `status` - new status
    /// * `error` - error message (if status is `Error`)
    async fn update_status(
        &self,
        id: &str,
        status: AccountStatus,
        error: Option<String>,
    ) -> CoreResult<()>;
}
