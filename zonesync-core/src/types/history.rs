//! Record mutation history types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use zonesync_provider::RecordKey;

use super::RecordValue;

/// Kind of mutation recorded in history.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    Created,
    Updated,
    Deleted,
    /// A both-sides change was resolved by policy; old/new show the loser
    /// and winner.
    Conflict,
}

/// Which side originated the change.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChangeSource {
    /// The local control plane changed first; pushed to the remote.
    Local,
    /// The remote changed first; imported locally.
    Remote,
    /// Produced by the sync engine itself (conflict resolution).
    Sync,
}

/// One row of record mutation history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordChange {
    /// Row id (UUID).
    pub id: String,
    /// Owning account id.
    pub account_id: String,
    /// Domain the key belongs to.
    pub domain: String,
    /// Changed key.
    pub key: RecordKey,
    /// Kind of mutation.
    pub change_type: ChangeType,
    /// Originating side.
    pub source: ChangeSource,
    /// Value set before the change.
    #[serde(default)]
    pub old_values: Vec<RecordValue>,
    /// Value set after the change.
    #[serde(default)]
    pub new_values: Vec<RecordValue>,
    /// Resolution method, for conflict rows.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
    /// When the change was recorded.
    pub changed_at: DateTime<Utc>,
}

impl RecordChange {
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        account_id: impl Into<String>,
        domain: impl Into<String>,
        key: RecordKey,
        change_type: ChangeType,
        source: ChangeSource,
        old_values: Vec<RecordValue>,
        new_values: Vec<RecordValue>,
        resolution: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            account_id: account_id.into(),
            domain: domain.into(),
            key,
            change_type,
            source,
            old_values,
            new_values,
            resolution,
            changed_at: Utc::now(),
        }
    }
}
