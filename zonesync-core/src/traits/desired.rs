//! Desired-state access abstract trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use zonesync_provider::RecordKey;

use crate::error::CoreResult;
use crate::types::{RecordSet, RecordValue};

/// Access to the control plane's desired DNS records.
///
/// The sync engine polls this source at the start of every run instead of
/// hooking into the control plane's write path, so the control plane stays
/// free to change records without notifying the engine.
#[async_trait]
pub trait DesiredStateSource: Send + Sync {
    /// Current desired records for a domain.
    ///
    /// An unknown domain yields an empty set.
    async fn fetch_records(&self, domain: &str) -> CoreResult<RecordSet>;

    /// When the desired records for a domain last changed, if the control
    /// plane tracks it. Feeds the timestamp conflict policy; `None` makes
    /// that policy fall back to remote precedence.
    async fn last_modified(&self, domain: &str) -> CoreResult<Option<DateTime<Utc>>>;

    /// Write a remote-won value set into the control plane.
    ///
    /// Used when the resolved direction for a key is remote-authoritative
    /// (imports and remote-precedence conflict resolutions). An empty set
    /// deletes the key locally.
    async fn apply_remote(
        &self,
        domain: &str,
        key: &RecordKey,
        values: &BTreeSet<RecordValue>,
    ) -> CoreResult<()>;
}
