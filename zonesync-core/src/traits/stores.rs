//! Sync bookkeeping stores: audit log, record history, conflict queue,
//! last-known-common baselines.

use async_trait::async_trait;

use crate::error::CoreResult;
use crate::types::{ConflictItem, ConflictState, RecordChange, RecordSet, RecordValue, SyncLogEntry};

/// Sync run audit log.
#[async_trait]
pub trait SyncLogStore: Send + Sync {
    /// Append one entry. Entries are appended for every run, including
    /// failures.
    async fn append(&self, entry: &SyncLogEntry) -> CoreResult<()>;

    /// Most recent entries for an account, newest first.
    async fn recent(&self, account_id: &str, limit: usize) -> CoreResult<Vec<SyncLogEntry>>;

    /// The single most recent entry for an account.
    async fn latest(&self, account_id: &str) -> CoreResult<Option<SyncLogEntry>>;
}

/// Per-record mutation history.
#[async_trait]
pub trait RecordHistoryStore: Send + Sync {
    /// Append one change row.
    async fn append(&self, change: &RecordChange) -> CoreResult<()>;

    /// Most recent changes for a domain, newest first.
    async fn recent_for_domain(
        &self,
        account_id: &str,
        domain: &str,
        limit: usize,
    ) -> CoreResult<Vec<RecordChange>>;
}

/// Queue of conflicts awaiting manual resolution.
#[async_trait]
pub trait ConflictQueue: Send + Sync {
    /// Enqueue a new pending conflict.
    async fn push(&self, item: &ConflictItem) -> CoreResult<()>;

    /// Look up one item by id.
    async fn find_by_id(&self, id: &str) -> CoreResult<Option<ConflictItem>>;

    /// All pending items for a domain. Sync runs skip these keys.
    async fn pending_for_domain(
        &self,
        account_id: &str,
        domain: &str,
    ) -> CoreResult<Vec<ConflictItem>>;

    /// All pending items for an account.
    async fn pending_for_account(&self, account_id: &str) -> CoreResult<Vec<ConflictItem>>;

    /// Transition an item out of `Pending`.
    ///
    /// # Arguments
    /// * `id` - item id
    /// * `state` - terminal state
    /// * `values` - applied values, for custom resolutions
    async fn resolve(
        &self,
        id: &str,
        state: ConflictState,
        values: Option<Vec<RecordValue>>,
    ) -> CoreResult<()>;
}

/// Last-known-common baselines, one `RecordSet` per (account, domain).
///
/// The baseline is the reference point of the three-way merge; it only
/// advances for keys whose operations succeeded.
#[async_trait]
pub trait BaselineStore: Send + Sync {
    /// Load a domain's baseline. `None` means no sync has completed yet.
    async fn get(&self, account_id: &str, domain: &str) -> CoreResult<Option<RecordSet>>;

    /// Store a domain's baseline.
    async fn set(&self, account_id: &str, domain: &str, baseline: &RecordSet) -> CoreResult<()>;

    /// Drop a domain's baseline (domain removed from the catalog).
    async fn remove(&self, account_id: &str, domain: &str) -> CoreResult<()>;
}
