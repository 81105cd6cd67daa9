//! Sync orchestration.
//!
//! Drives one reconciliation run per domain: fetch both sides, merge
//! against the baseline, apply the plan through the provider, and record
//! the outcome. Runs for the same domain are serialized; a second trigger
//! while one is in flight is acknowledged as a no-op.

use std::collections::{BTreeSet, HashSet};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use zonesync_provider::RecordKey;

use crate::error::{CoreError, CoreResult};
use crate::services::differ::{build_plan, DiffContext, DiffPlan, RecordOp};
use crate::services::ServiceContext;
use crate::types::{
    Account, ChangeSource, ChangeType, ConflictItem, ConflictState, DomainEntry,
    DomainSyncOutcome, RecordChange, RecordSet, RecordValue, SyncCounters, SyncDisposition,
    SyncLogEntry, SyncRunStatus, SyncTrigger,
};

/// Options for one sync invocation.
#[derive(Debug, Clone, Copy)]
pub struct SyncOptions {
    /// What started the run.
    pub trigger: SyncTrigger,
    /// Bypass the freshness check.
    pub force: bool,
    /// Compute and report the plan without applying it.
    pub dry_run: bool,
}

impl SyncOptions {
    #[must_use]
    pub fn manual() -> Self {
        Self {
            trigger: SyncTrigger::Manual,
            force: false,
            dry_run: false,
        }
    }

    #[must_use]
    pub fn scheduled() -> Self {
        Self {
            trigger: SyncTrigger::Scheduled,
            force: false,
            dry_run: false,
        }
    }
}

/// Aggregated result of syncing every eligible domain of one account.
#[derive(Debug, Clone)]
pub struct AccountSyncReport {
    pub account_id: String,
    pub status: SyncRunStatus,
    pub counters: SyncCounters,
    pub outcomes: Vec<DomainSyncOutcome>,
}

/// Releases the in-flight slot for a domain when the run ends.
struct RunGuard<'a> {
    in_flight: &'a Mutex<HashSet<String>>,
    slot: String,
}

impl<'a> RunGuard<'a> {
    /// Claim the domain's slot; `None` when a run is already in flight.
    fn try_acquire(
        in_flight: &'a Mutex<HashSet<String>>,
        account_id: &str,
        domain: &str,
    ) -> Option<Self> {
        let slot = format!("{account_id}/{domain}");
        let mut held = in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if held.insert(slot.clone()) {
            Some(Self { in_flight, slot })
        } else {
            None
        }
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.slot);
    }
}

/// Sync orchestration service.
pub struct SyncService {
    ctx: Arc<ServiceContext>,
    in_flight: Mutex<HashSet<String>>,
}

impl SyncService {
    #[must_use]
    pub fn new(ctx: Arc<ServiceContext>) -> Self {
        Self {
            ctx,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// Sync every eligible domain of one account.
    ///
    /// Scheduled runs only take `auto_sync` domains; manual runs take every
    /// domain of the account. Domains run concurrently up to the account's
    /// worker count.
    pub async fn sync_account(
        &self,
        account_id: &str,
        options: SyncOptions,
    ) -> CoreResult<AccountSyncReport> {
        let account = self.load_account(account_id).await?;
        if !account.config.sync_enabled {
            log::info!("Sync disabled for account {account_id}, skipping");
            return Ok(AccountSyncReport {
                account_id: account_id.to_string(),
                status: SyncRunStatus::Completed,
                counters: SyncCounters::default(),
                outcomes: Vec::new(),
            });
        }

        let entries = self.ctx.catalog.find_by_account(account_id).await?;
        let eligible: Vec<DomainEntry> = entries
            .into_iter()
            .filter(|e| e.auto_sync || options.trigger == SyncTrigger::Manual)
            .collect();

        let outcomes: Vec<DomainSyncOutcome> = stream::iter(eligible)
            .map(|entry| {
                let domain = entry.name.clone();
                async move {
                    match self.sync_domain(account_id, &domain, options).await {
                        Ok(outcome) => outcome,
                        Err(e) => DomainSyncOutcome {
                            domain,
                            disposition: SyncDisposition::Synced,
                            status: SyncRunStatus::Failed,
                            counters: SyncCounters::default(),
                            errors: vec![e.to_string()],
                            planned_ops: Vec::new(),
                        },
                    }
                }
            })
            .buffer_unordered(account.config.worker_count.max(1))
            .collect()
            .await;

        let mut counters = SyncCounters::default();
        for outcome in &outcomes {
            counters.merge(&outcome.counters);
        }
        let status = aggregate_status(&outcomes);
        Ok(AccountSyncReport {
            account_id: account_id.to_string(),
            status,
            counters,
            outcomes,
        })
    }

    /// Run one reconciliation for one domain.
    ///
    /// Appends a `SyncLogEntry` for every run that gets past the dispatch
    /// checks, including failed and timed-out ones.
    pub async fn sync_domain(
        &self,
        account_id: &str,
        domain: &str,
        options: SyncOptions,
    ) -> CoreResult<DomainSyncOutcome> {
        let Some(_guard) = RunGuard::try_acquire(&self.in_flight, account_id, domain) else {
            log::debug!("Run already in flight for {domain}, coalescing trigger");
            return Ok(DomainSyncOutcome::skipped(
                domain,
                SyncDisposition::AlreadyRunning,
            ));
        };

        let account = self.load_account(account_id).await?;
        let entry = self
            .ctx
            .catalog
            .find(account_id, domain)
            .await?
            .ok_or_else(|| CoreError::DomainNotFound(domain.to_string()))?;

        if !entry.auto_sync && options.trigger == SyncTrigger::Scheduled {
            return Ok(DomainSyncOutcome::skipped(
                domain,
                SyncDisposition::SkippedDisabled,
            ));
        }
        if options.trigger == SyncTrigger::Scheduled && !options.force && is_fresh(&entry, &account)
        {
            return Ok(DomainSyncOutcome::skipped(
                domain,
                SyncDisposition::SkippedFresh,
            ));
        }

        let mut log_entry =
            SyncLogEntry::start(account_id, Some(domain.to_string()), options.trigger);
        let budget = Duration::from_secs(account.config.run_timeout_secs);

        let outcome = match tokio::time::timeout(
            budget,
            self.run_domain(&account, domain, options),
        )
        .await
        {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) => {
                if e.is_expected() {
                    log::warn!("Sync failed for {domain}: {e}");
                } else {
                    log::error!("Sync failed for {domain}: {e}");
                }
                DomainSyncOutcome {
                    domain: domain.to_string(),
                    disposition: SyncDisposition::Synced,
                    status: SyncRunStatus::Failed,
                    counters: SyncCounters::default(),
                    errors: vec![e.to_string()],
                    planned_ops: Vec::new(),
                }
            }
            Err(_) => {
                let e = CoreError::SyncTimeout(domain.to_string());
                log::error!("{e}");
                DomainSyncOutcome {
                    domain: domain.to_string(),
                    disposition: SyncDisposition::Synced,
                    status: SyncRunStatus::Failed,
                    counters: SyncCounters::default(),
                    errors: vec![e.to_string()],
                    planned_ops: Vec::new(),
                }
            }
        };

        log_entry.counters = outcome.counters;
        log_entry.errors = outcome.errors.clone();
        log_entry.finish(outcome.status);
        self.ctx.sync_log.append(&log_entry).await?;

        if outcome.status == SyncRunStatus::Completed
            && outcome.disposition == SyncDisposition::Synced
        {
            self.ctx
                .catalog
                .update_last_synced(account_id, domain, Utc::now())
                .await?;
        }
        Ok(outcome)
    }

    async fn load_account(&self, account_id: &str) -> CoreResult<Account> {
        self.ctx
            .accounts
            .find_by_id(account_id)
            .await?
            .ok_or_else(|| CoreError::AccountNotFound(account_id.to_string()))
    }

    /// The fetch → merge → apply pipeline for one domain.
    async fn run_domain(
        &self,
        account: &Account,
        domain: &str,
        options: SyncOptions,
    ) -> CoreResult<DomainSyncOutcome> {
        let account_id = account.id.as_str();
        let provider = self.ctx.get_provider(account_id).await?;

        let desired = self.ctx.desired.fetch_records(domain).await?;
        let remote_records = match provider.fetch_records(domain).await {
            Ok(records) => records,
            Err(e) => return Err(self.ctx.handle_provider_error(account_id, e).await),
        };
        let remote = RecordSet::from_records(remote_records);
        let baseline = self
            .ctx
            .baselines
            .get(account_id, domain)
            .await?
            .unwrap_or_default();

        let pending_keys: BTreeSet<RecordKey> = self
            .ctx
            .conflicts
            .pending_for_domain(account_id, domain)
            .await?
            .into_iter()
            .filter(|c| c.state == ConflictState::Pending)
            .map(|c| c.key)
            .collect();

        let diff_ctx = DiffContext {
            policy: account.config.conflict_policy,
            local_modified: self.ctx.desired.last_modified(domain).await?,
            // The registrar API carries no per-record change times.
            remote_modified: None,
            pending_keys,
        };
        let plan = build_plan(&desired, &remote, &baseline, &diff_ctx);

        if options.dry_run {
            return Ok(dry_run_outcome(domain, &plan));
        }
        self.apply_plan(account, domain, &desired, &baseline, plan)
            .await
    }

    /// Apply a plan op by op, advancing the baseline per successful key.
    ///
    /// A failed operation is recorded and skipped; its key keeps the old
    /// baseline and is retried on the next run.
    async fn apply_plan(
        &self,
        account: &Account,
        domain: &str,
        desired: &RecordSet,
        baseline: &RecordSet,
        plan: DiffPlan,
    ) -> CoreResult<DomainSyncOutcome> {
        let account_id = account.id.as_str();
        let provider = self.ctx.get_provider(account_id).await?;

        let mut counters = SyncCounters {
            domains_processed: 1,
            ..SyncCounters::default()
        };
        let mut errors = Vec::new();
        let mut new_baseline = baseline.clone();
        for (key, values) in &plan.converged {
            new_baseline.set_values(key.clone(), values.clone());
        }

        let total_ops = plan.ops.len();
        let mut succeeded = 0usize;

        for op in plan.ops {
            let result = self
                .apply_op(account_id, domain, &provider, desired, baseline, &op)
                .await;
            match result {
                Ok(change_type) => {
                    succeeded += 1;
                    match change_type {
                        ChangeType::Created => counters.records_created += 1,
                        ChangeType::Updated => counters.records_updated += 1,
                        ChangeType::Deleted => counters.records_deleted += 1,
                        ChangeType::Conflict => {
                            counters.records_updated += 1;
                            counters.conflicts_resolved += 1;
                        }
                    }
                    match &op {
                        RecordOp::DeleteRemote { key } => new_baseline.remove_key(key),
                        RecordOp::CreateRemote { key, values }
                        | RecordOp::UpdateRemote { key, values }
                        | RecordOp::WriteLocal { key, values, .. } => {
                            new_baseline.set_values(key.clone(), values.clone());
                        }
                    }
                }
                Err(e) => {
                    if e.is_expected() {
                        log::warn!("{op} failed for {domain}: {e}", op = op.describe());
                    } else {
                        log::error!("{op} failed for {domain}: {e}", op = op.describe());
                    }
                    errors.push(format!("{}: {e}", op.describe()));
                }
            }
        }

        for conflict in &plan.conflicts {
            let item = ConflictItem::new(
                account_id,
                domain,
                conflict.key.clone(),
                conflict.local_values.clone(),
                conflict.remote_values.clone(),
            );
            self.ctx.conflicts.push(&item).await?;
            self.ctx
                .history
                .append(&RecordChange::new(
                    account_id,
                    domain,
                    conflict.key.clone(),
                    ChangeType::Conflict,
                    ChangeSource::Sync,
                    conflict.local_values.clone(),
                    conflict.remote_values.clone(),
                    None,
                ))
                .await?;
            counters.conflicts_detected += 1;
            log::warn!(
                "Conflict queued for {domain} {key}, key skipped until resolved",
                key = conflict.key
            );
        }

        if new_baseline != *baseline {
            self.ctx
                .baselines
                .set(account_id, domain, &new_baseline)
                .await?;
        }

        let status = if errors.is_empty() && plan.conflicts.is_empty() {
            SyncRunStatus::Completed
        } else if succeeded == 0 && total_ops > 0 && !errors.is_empty() {
            SyncRunStatus::Failed
        } else {
            SyncRunStatus::Partial
        };

        Ok(DomainSyncOutcome {
            domain: domain.to_string(),
            disposition: SyncDisposition::Synced,
            status,
            counters,
            errors,
            planned_ops: Vec::new(),
        })
    }

    /// Apply one operation, returning the change type it counts as.
    async fn apply_op(
        &self,
        account_id: &str,
        domain: &str,
        provider: &Arc<dyn zonesync_provider::DnsProvider>,
        desired: &RecordSet,
        baseline: &RecordSet,
        op: &RecordOp,
    ) -> CoreResult<ChangeType> {
        match op {
            RecordOp::DeleteRemote { key } => {
                if let Err(e) = provider.replace_record_set(domain, key, &[]).await {
                    return Err(self.ctx.handle_provider_error(account_id, e).await);
                }
                self.ctx
                    .history
                    .append(&RecordChange::new(
                        account_id,
                        domain,
                        key.clone(),
                        ChangeType::Deleted,
                        ChangeSource::Local,
                        baseline.get(key).map(set_to_vec).unwrap_or_default(),
                        Vec::new(),
                        None,
                    ))
                    .await?;
                Ok(ChangeType::Deleted)
            }
            RecordOp::CreateRemote { key, values } | RecordOp::UpdateRemote { key, values } => {
                let records = RecordSet::records_for(key, values);
                if let Err(e) = provider.replace_record_set(domain, key, &records).await {
                    return Err(self.ctx.handle_provider_error(account_id, e).await);
                }
                let change_type = if matches!(op, RecordOp::CreateRemote { .. }) {
                    ChangeType::Created
                } else {
                    ChangeType::Updated
                };
                self.ctx
                    .history
                    .append(&RecordChange::new(
                        account_id,
                        domain,
                        key.clone(),
                        change_type,
                        ChangeSource::Local,
                        baseline.get(key).map(set_to_vec).unwrap_or_default(),
                        values.iter().cloned().collect(),
                        None,
                    ))
                    .await?;
                Ok(change_type)
            }
            RecordOp::WriteLocal {
                key,
                values,
                resolution,
            } => {
                self.ctx.desired.apply_remote(domain, key, values).await?;
                let change_type = if resolution.is_some() {
                    ChangeType::Conflict
                } else if values.is_empty() {
                    ChangeType::Deleted
                } else if desired.contains_key(key) {
                    ChangeType::Updated
                } else {
                    ChangeType::Created
                };
                let source = if resolution.is_some() {
                    ChangeSource::Sync
                } else {
                    ChangeSource::Remote
                };
                self.ctx
                    .history
                    .append(&RecordChange::new(
                        account_id,
                        domain,
                        key.clone(),
                        change_type,
                        source,
                        desired.get(key).map(set_to_vec).unwrap_or_default(),
                        values.iter().cloned().collect(),
                        resolution.map(|r| r.as_str().to_string()),
                    ))
                    .await?;
                Ok(change_type)
            }
        }
    }
}

fn set_to_vec(values: &BTreeSet<RecordValue>) -> Vec<RecordValue> {
    values.iter().cloned().collect()
}

fn is_fresh(entry: &DomainEntry, account: &Account) -> bool {
    let Some(last) = entry.last_synced else {
        return false;
    };
    let age = Utc::now() - last;
    age.num_seconds() >= 0
        && u64::try_from(age.num_seconds()).unwrap_or(u64::MAX)
            < account.config.freshness_max_age_secs
}

fn dry_run_outcome(domain: &str, plan: &DiffPlan) -> DomainSyncOutcome {
    let mut planned: Vec<String> = plan.ops.iter().map(RecordOp::describe).collect();
    for conflict in &plan.conflicts {
        planned.push(format!("queue conflict for {}", conflict.key));
    }
    for key in &plan.skipped_pending {
        planned.push(format!("skip {key} (pending conflict)"));
    }
    DomainSyncOutcome {
        domain: domain.to_string(),
        disposition: SyncDisposition::DryRun,
        status: SyncRunStatus::Completed,
        counters: SyncCounters::default(),
        errors: Vec::new(),
        planned_ops: planned,
    }
}

fn aggregate_status(outcomes: &[DomainSyncOutcome]) -> SyncRunStatus {
    if outcomes.is_empty() {
        return SyncRunStatus::Completed;
    }
    let failed = outcomes
        .iter()
        .filter(|o| o.status == SyncRunStatus::Failed)
        .count();
    let clean = outcomes
        .iter()
        .filter(|o| o.status == SyncRunStatus::Completed)
        .count();
    if failed == outcomes.len() {
        SyncRunStatus::Failed
    } else if clean == outcomes.len() {
        SyncRunStatus::Completed
    } else {
        SyncRunStatus::Partial
    }
}
