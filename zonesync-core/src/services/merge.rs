//! Three-way merge of one record key.
//!
//! Compares the desired (local) and remote value sets of a key against the
//! last-known-common baseline. A key is "changed" on a side when its value
//! set differs from the baseline; an absent key and an empty set are the
//! same thing.

use std::collections::BTreeSet;

use crate::types::RecordValue;

/// Outcome of merging one key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyResolution {
    /// Neither side changed; nothing to do.
    Unchanged,
    /// Only the local side changed; push its value set to the remote.
    /// An empty set means the key was deleted locally.
    PushLocal(BTreeSet<RecordValue>),
    /// Only the remote side changed; import its value set locally.
    /// An empty set means the key was deleted remotely.
    PullRemote(BTreeSet<RecordValue>),
    /// Both sides changed to the same value set; only the baseline moves.
    Converged(BTreeSet<RecordValue>),
    /// Both sides changed to different value sets; policy decides.
    Conflict {
        local: BTreeSet<RecordValue>,
        remote: BTreeSet<RecordValue>,
    },
}

static EMPTY: BTreeSet<RecordValue> = BTreeSet::new();

fn normalize(values: Option<&BTreeSet<RecordValue>>) -> &BTreeSet<RecordValue> {
    values.unwrap_or(&EMPTY)
}

/// Merge one key's three snapshots.
#[must_use]
pub fn resolve_key(
    local: Option<&BTreeSet<RecordValue>>,
    remote: Option<&BTreeSet<RecordValue>>,
    baseline: Option<&BTreeSet<RecordValue>>,
) -> KeyResolution {
    let local = normalize(local);
    let remote = normalize(remote);
    let baseline = normalize(baseline);

    let local_changed = local != baseline;
    let remote_changed = remote != baseline;

    match (local_changed, remote_changed) {
        (false, false) => KeyResolution::Unchanged,
        (true, false) => KeyResolution::PushLocal(local.clone()),
        (false, true) => KeyResolution::PullRemote(remote.clone()),
        (true, true) => {
            if local == remote {
                KeyResolution::Converged(local.clone())
            } else {
                KeyResolution::Conflict {
                    local: local.clone(),
                    remote: remote.clone(),
                }
            }
        }
    }
}
