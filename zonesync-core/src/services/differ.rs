//! Diff plan construction.
//!
//! Runs the three-way merge over every key of a domain and turns the
//! resolutions into an ordered operation plan. Remote deletes come first,
//! then creates, then updates, then local writes, so a half-applied plan
//! never leaves the remote zone with more stale data than it started with.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use zonesync_provider::{DnsRecordType, RecordKey};

use super::merge::{resolve_key, KeyResolution};
use crate::types::{ConflictPolicy, RecordSet, RecordValue};

/// One operation of a diff plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOp {
    /// Delete the key's record set from the remote zone.
    DeleteRemote { key: RecordKey },
    /// Create the key's record set in the remote zone.
    CreateRemote {
        key: RecordKey,
        values: BTreeSet<RecordValue>,
    },
    /// Replace the key's record set in the remote zone.
    UpdateRemote {
        key: RecordKey,
        values: BTreeSet<RecordValue>,
    },
    /// Write the key's value set into the local desired state.
    /// An empty set deletes the key locally.
    WriteLocal {
        key: RecordKey,
        values: BTreeSet<RecordValue>,
        /// Conflict resolution label, when the write settles a conflict.
        resolution: Option<ConflictResolution>,
    },
}

impl RecordOp {
    /// The key this operation touches.
    #[must_use]
    pub fn key(&self) -> &RecordKey {
        match self {
            Self::DeleteRemote { key }
            | Self::CreateRemote { key, .. }
            | Self::UpdateRemote { key, .. }
            | Self::WriteLocal { key, .. } => key,
        }
    }

    /// One-line description, used by dry runs.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::DeleteRemote { key } => format!("delete remote {key}"),
            Self::CreateRemote { key, values } => {
                format!("create remote {key} ({} values)", values.len())
            }
            Self::UpdateRemote { key, values } => {
                format!("update remote {key} ({} values)", values.len())
            }
            Self::WriteLocal { key, values, .. } if values.is_empty() => {
                format!("delete local {key}")
            }
            Self::WriteLocal { key, values, .. } => {
                format!("write local {key} ({} values)", values.len())
            }
        }
    }
}

/// How a conflicting key was settled without an operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictResolution {
    /// Policy picked the remote side.
    RemotePrecedence,
    /// Timestamp comparison picked a side.
    Timestamp,
}

impl ConflictResolution {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RemotePrecedence => "remote_precedence",
            Self::Timestamp => "timestamp",
        }
    }
}

/// A conflict the policy sent to the manual queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedConflict {
    pub key: RecordKey,
    pub local_values: Vec<RecordValue>,
    pub remote_values: Vec<RecordValue>,
}

/// Inputs to plan construction beyond the three snapshots.
#[derive(Debug, Clone, Default)]
pub struct DiffContext {
    /// Active conflict policy.
    pub policy: ConflictPolicy,
    /// Last local modification time, for the timestamp policy.
    pub local_modified: Option<DateTime<Utc>>,
    /// Last remote modification time, for the timestamp policy.
    pub remote_modified: Option<DateTime<Utc>>,
    /// Keys with a pending queued conflict; skipped entirely.
    pub pending_keys: BTreeSet<RecordKey>,
}

/// Ordered operation plan for one domain.
#[derive(Debug, Clone, Default)]
pub struct DiffPlan {
    /// Operations in application order.
    pub ops: Vec<RecordOp>,
    /// Conflicts to enqueue for manual resolution.
    pub conflicts: Vec<DetectedConflict>,
    /// Count of conflicting keys the policy settled without an operator.
    pub auto_resolved: u32,
    /// Keys skipped because a queued conflict is still pending.
    pub skipped_pending: Vec<RecordKey>,
    /// Keys whose sides converged on their own; baseline advances, no ops.
    pub converged: Vec<(RecordKey, BTreeSet<RecordValue>)>,
}

impl DiffPlan {
    /// True when the plan carries no operations and no queued conflicts.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.ops.is_empty() && self.conflicts.is_empty()
    }
}

/// Turn a local-won value set into the remote op it needs, if any.
fn remote_op_for(
    key: RecordKey,
    values: BTreeSet<RecordValue>,
    remote_has_key: bool,
) -> Option<RecordOp> {
    if values.is_empty() {
        remote_has_key.then_some(RecordOp::DeleteRemote { key })
    } else if remote_has_key {
        Some(RecordOp::UpdateRemote { key, values })
    } else {
        Some(RecordOp::CreateRemote { key, values })
    }
}

/// Resolve a conflict under the timestamp policy.
///
/// Returns the winning side's op, or falls back to remote precedence when
/// either timestamp is missing or they are equal.
fn timestamp_winner(ctx: &DiffContext) -> (bool, ConflictResolution) {
    match (ctx.local_modified, ctx.remote_modified) {
        (Some(local), Some(remote)) if local > remote => (true, ConflictResolution::Timestamp),
        (Some(local), Some(remote)) if remote > local => (false, ConflictResolution::Timestamp),
        _ => (false, ConflictResolution::RemotePrecedence),
    }
}

/// Build the operation plan for one domain.
///
/// Every key in the union of the three snapshots is merged independently.
/// NS keys never appear in plans. Keys with a pending queued conflict are
/// skipped until the operator resolves them.
///
/// The same inputs always yield the same plan, and applying a plan then
/// rebuilding it yields an empty plan.
#[must_use]
pub fn build_plan(
    desired: &RecordSet,
    remote: &RecordSet,
    baseline: &RecordSet,
    ctx: &DiffContext,
) -> DiffPlan {
    let mut plan = DiffPlan::default();

    let mut deletes = Vec::new();
    let mut creates = Vec::new();
    let mut updates = Vec::new();
    let mut locals = Vec::new();

    let mut keys: BTreeSet<RecordKey> = desired.key_union(remote).into_iter().collect();
    keys.extend(baseline.keys().cloned());

    for key in keys {
        if key.record_type == DnsRecordType::Ns {
            continue;
        }
        if ctx.pending_keys.contains(&key) {
            plan.skipped_pending.push(key);
            continue;
        }

        let local = desired.get(&key);
        let remote_values = remote.get(&key);
        let base = baseline.get(&key);
        let remote_has_key = remote_values.is_some();

        match resolve_key(local, remote_values, base) {
            KeyResolution::Unchanged => {}
            KeyResolution::Converged(values) => plan.converged.push((key, values)),
            KeyResolution::PushLocal(values) => {
                if let Some(op) = remote_op_for(key, values, remote_has_key) {
                    match op {
                        RecordOp::DeleteRemote { .. } => deletes.push(op),
                        RecordOp::CreateRemote { .. } => creates.push(op),
                        _ => updates.push(op),
                    }
                }
            }
            KeyResolution::PullRemote(values) => {
                locals.push(RecordOp::WriteLocal {
                    key,
                    values,
                    resolution: None,
                });
            }
            KeyResolution::Conflict {
                local: local_values,
                remote: conflicting,
            } => match ctx.policy {
                ConflictPolicy::ManualQueue => {
                    plan.conflicts.push(DetectedConflict {
                        key,
                        local_values: local_values.into_iter().collect(),
                        remote_values: conflicting.into_iter().collect(),
                    });
                }
                ConflictPolicy::RemotePrecedence => {
                    plan.auto_resolved += 1;
                    locals.push(RecordOp::WriteLocal {
                        key,
                        values: conflicting,
                        resolution: Some(ConflictResolution::RemotePrecedence),
                    });
                }
                ConflictPolicy::Timestamp => {
                    let (local_wins, resolution) = timestamp_winner(ctx);
                    plan.auto_resolved += 1;
                    if local_wins {
                        if let Some(op) = remote_op_for(key, local_values, remote_has_key) {
                            match op {
                                RecordOp::DeleteRemote { .. } => deletes.push(op),
                                RecordOp::CreateRemote { .. } => creates.push(op),
                                _ => updates.push(op),
                            }
                        }
                    } else {
                        locals.push(RecordOp::WriteLocal {
                            key,
                            values: conflicting,
                            resolution: Some(resolution),
                        });
                    }
                }
            },
        }
    }

    plan.ops = deletes;
    plan.ops.extend(creates);
    plan.ops.extend(updates);
    plan.ops.extend(locals);
    plan
}
