//! Sync run types: triggers, outcomes, audit log entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What started a sync run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SyncTrigger {
    /// Operator-initiated (CLI command).
    Manual,
    /// Periodic scheduler tick.
    Scheduled,
    /// First sync after discovery.
    Initial,
}

/// Status of a sync run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SyncRunStatus {
    Running,
    Completed,
    /// Some operations applied, some failed; per-operation detail is kept.
    Partial,
    Failed,
}

/// Mutation counters accumulated over a run.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SyncCounters {
    pub domains_processed: u32,
    pub records_created: u32,
    pub records_updated: u32,
    pub records_deleted: u32,
    pub conflicts_detected: u32,
    pub conflicts_resolved: u32,
}

impl SyncCounters {
    /// Fold another counter set into this one.
    pub fn merge(&mut self, other: &Self) {
        self.domains_processed += other.domains_processed;
        self.records_created += other.records_created;
        self.records_updated += other.records_updated;
        self.records_deleted += other.records_deleted;
        self.conflicts_detected += other.conflicts_detected;
        self.conflicts_resolved += other.conflicts_resolved;
    }
}

/// Audit log entry for one sync run.
///
/// An entry is appended for every run, including failed and timed-out ones.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncLogEntry {
    /// Entry id (UUID).
    pub id: String,
    /// Account the run belonged to.
    pub account_id: String,
    /// Domain scope; `None` for whole-account runs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    /// What started the run.
    pub trigger: SyncTrigger,
    /// Final (or current) status.
    pub status: SyncRunStatus,
    /// Mutation counters.
    pub counters: SyncCounters,
    /// Errors collected during the run.
    #[serde(default)]
    pub errors: Vec<String>,
    /// Run start time.
    pub started_at: DateTime<Utc>,
    /// Run completion time; `None` while running.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    /// Wall-clock duration, once completed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<i64>,
}

impl SyncLogEntry {
    /// Start a new running entry.
    #[must_use]
    pub fn start(
        account_id: impl Into<String>,
        domain: Option<String>,
        trigger: SyncTrigger,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            account_id: account_id.into(),
            domain,
            trigger,
            status: SyncRunStatus::Running,
            counters: SyncCounters::default(),
            errors: Vec::new(),
            started_at: Utc::now(),
            completed_at: None,
            duration_seconds: None,
        }
    }

    /// Mark the run finished with the given status.
    pub fn finish(&mut self, status: SyncRunStatus) {
        let now = Utc::now();
        self.status = status;
        self.duration_seconds = Some((now - self.started_at).num_seconds());
        self.completed_at = Some(now);
    }
}

/// Why a per-domain run did (or did not) do work.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SyncDisposition {
    /// The plan was applied (fully or partially; see the status).
    Synced,
    /// A run for this domain was already in flight; this trigger was a no-op.
    AlreadyRunning,
    /// Synced recently and not forced.
    SkippedFresh,
    /// Auto-sync is disabled for the domain.
    SkippedDisabled,
    /// Plan computed and reported without applying.
    DryRun,
}

/// Result of syncing one domain.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainSyncOutcome {
    /// Domain name.
    pub domain: String,
    /// How the run was dispatched.
    pub disposition: SyncDisposition,
    /// Run status; `Completed` for skips and no-ops.
    pub status: SyncRunStatus,
    /// Mutation counters for this domain.
    pub counters: SyncCounters,
    /// Per-operation errors, in plan order.
    #[serde(default)]
    pub errors: Vec<String>,
    /// Human-readable plan description, populated for dry runs.
    #[serde(default)]
    pub planned_ops: Vec<String>,
}

impl DomainSyncOutcome {
    /// Outcome for a run that did no work.
    #[must_use]
    pub fn skipped(domain: impl Into<String>, disposition: SyncDisposition) -> Self {
        Self {
            domain: domain.into(),
            disposition,
            status: SyncRunStatus::Completed,
            counters: SyncCounters::default(),
            errors: Vec::new(),
            planned_ops: Vec::new(),
        }
    }
}
