//! Conflict policy and manual conflict queue types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use zonesync_provider::RecordKey;

use super::RecordValue;

/// How to resolve a key changed on both sides with differing values.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    /// The remote value set wins. Default.
    #[default]
    RemotePrecedence,
    /// Queue the conflict for an operator; skip the key until resolved.
    ManualQueue,
    /// The side with the newer change timestamp wins. Falls back to
    /// remote precedence when timestamps are missing or equal.
    Timestamp,
}

/// Lifecycle of a queued conflict.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConflictState {
    /// Awaiting a decision; the key is skipped by sync runs.
    Pending,
    /// Resolved with the local value set.
    ResolvedLocal,
    /// Resolved with the remote value set.
    ResolvedRemote,
    /// Resolved with operator-supplied values.
    ResolvedCustom,
    /// Dismissed without applying either side.
    Ignored,
}

/// A conflict awaiting (or having received) manual resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictItem {
    /// Item id (UUID).
    pub id: String,
    /// Owning account id.
    pub account_id: String,
    /// Domain the conflicting key belongs to.
    pub domain: String,
    /// The conflicting key.
    pub key: RecordKey,
    /// Local value set at detection time.
    pub local_values: Vec<RecordValue>,
    /// Remote value set at detection time.
    pub remote_values: Vec<RecordValue>,
    /// Detection time.
    pub detected_at: DateTime<Utc>,
    /// Current state.
    pub state: ConflictState,
    /// Values applied on resolution, when custom.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution_values: Option<Vec<RecordValue>>,
    /// Resolution time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
}

impl ConflictItem {
    /// New pending conflict.
    #[must_use]
    pub fn new(
        account_id: impl Into<String>,
        domain: impl Into<String>,
        key: RecordKey,
        local_values: Vec<RecordValue>,
        remote_values: Vec<RecordValue>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            account_id: account_id.into(),
            domain: domain.into(),
            key,
            local_values,
            remote_values,
            detected_at: Utc::now(),
            state: ConflictState::Pending,
            resolution_values: None,
            resolved_at: None,
        }
    }

    /// Transition out of `Pending`.
    pub fn resolve(&mut self, state: ConflictState, values: Option<Vec<RecordValue>>) {
        self.state = state;
        self.resolution_values = values;
        self.resolved_at = Some(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zonesync_provider::DnsRecordType;

    fn value(v: &str) -> RecordValue {
        RecordValue {
            value: v.to_string(),
            ttl: 600,
            priority: None,
        }
    }

    #[test]
    fn default_policy_is_remote_precedence() {
        assert_eq!(ConflictPolicy::default(), ConflictPolicy::RemotePrecedence);
    }

    #[test]
    fn policy_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&ConflictPolicy::RemotePrecedence).unwrap(),
            "\"remote_precedence\""
        );
        assert_eq!(
            serde_json::to_string(&ConflictState::ResolvedCustom).unwrap(),
            "\"resolved_custom\""
        );
    }

    #[test]
    fn new_conflict_is_pending() {
        let item = ConflictItem::new(
            "acc-1",
            "example.com",
            RecordKey::new(DnsRecordType::A, "www"),
            vec![value("203.0.113.10")],
            vec![value("203.0.113.99")],
        );
        assert_eq!(item.state, ConflictState::Pending);
        assert!(item.resolved_at.is_none());
    }

    #[test]
    fn resolve_stamps_state_and_time() {
        let mut item = ConflictItem::new(
            "acc-1",
            "example.com",
            RecordKey::new(DnsRecordType::A, "www"),
            vec![value("203.0.113.10")],
            vec![value("203.0.113.99")],
        );
        item.resolve(ConflictState::ResolvedCustom, Some(vec![value("203.0.113.50")]));
        assert_eq!(item.state, ConflictState::ResolvedCustom);
        assert!(item.resolved_at.is_some());
        assert!(item.resolution_values.is_some());
    }
}
