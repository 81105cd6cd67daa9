//! Domain catalog persistence abstract trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::CoreResult;
use crate::types::DomainEntry;

/// Domain catalog trait.
///
/// Holds the classified view of every domain owned by each account. Entries
/// are keyed by (account id, domain name).
#[async_trait]
pub trait DomainCatalog: Send + Sync {
    /// All entries for one account.
    async fn find_by_account(&self, account_id: &str) -> CoreResult<Vec<DomainEntry>>;

    /// One entry.
    async fn find(&self, account_id: &str, domain: &str) -> CoreResult<Option<DomainEntry>>;

    /// Insert or update one entry.
    async fn save(&self, entry: &DomainEntry) -> CoreResult<()>;

    /// Insert or update many entries with one storage write.
    async fn save_all(&self, entries: &[DomainEntry]) -> CoreResult<()>;

    /// Remove one entry.
    ///
    /// Called only after a fully successful discovery pass confirms the
    /// domain is gone from the remote account.
    async fn remove(&self, account_id: &str, domain: &str) -> CoreResult<()>;

    /// Stamp a successful sync completion time.
    async fn update_last_synced(
        &self,
        account_id: &str,
        domain: &str,
        at: DateTime<Utc>,
    ) -> CoreResult<()>;
}
