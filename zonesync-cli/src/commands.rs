//! Subcommand handlers.
//!
//! Each handler resolves its account selector, calls into the service layer
//! and prints a human-readable report. Only sync runs influence the exit
//! code; `Failed` is the one status that exits nonzero.

use std::sync::Arc;

use zonesync_core::services::{
    ConflictResolutionChoice, ConflictService, CredentialService, DiscoveryService, Scheduler,
    StatusService, SyncOptions, SyncService, Trigger,
};
use zonesync_core::types::{Account, ConflictItem, DomainSyncOutcome, SyncRunStatus};
use zonesync_core::{CoreError, CoreResult, ServiceContext};
use zonesync_provider::ProviderCredentials;

/// All services behind one handle, shared by every subcommand.
pub struct App {
    ctx: Arc<ServiceContext>,
    sync: Arc<SyncService>,
    discovery: DiscoveryService,
    conflicts: ConflictService,
    credentials: CredentialService,
    status: StatusService,
}

impl App {
    #[must_use]
    pub fn new(ctx: Arc<ServiceContext>) -> Self {
        Self {
            sync: Arc::new(SyncService::new(Arc::clone(&ctx))),
            discovery: DiscoveryService::new(Arc::clone(&ctx)),
            conflicts: ConflictService::new(Arc::clone(&ctx)),
            credentials: CredentialService::new(Arc::clone(&ctx)),
            status: StatusService::new(Arc::clone(&ctx)),
            ctx,
        }
    }

    /// Restore providers from stored credentials. Called once at startup.
    pub async fn restore(&self) -> CoreResult<()> {
        let result = self.credentials.restore_accounts().await?;
        if result.restored + result.failed > 0 {
            log::info!(
                "Restored {} account(s), {} failed",
                result.restored,
                result.failed
            );
        }
        Ok(())
    }

    /// Accounts addressed by a selector: an id or name picks one account,
    /// no selector means every account.
    async fn resolve_accounts(&self, selector: Option<&str>) -> CoreResult<Vec<Account>> {
        let accounts = self.credentials.list_accounts().await?;
        match selector {
            Some(wanted) => {
                let found = accounts
                    .into_iter()
                    .find(|a| a.id == wanted || a.name == wanted)
                    .ok_or_else(|| CoreError::AccountNotFound(wanted.to_string()))?;
                Ok(vec![found])
            }
            None => {
                if accounts.is_empty() {
                    return Err(CoreError::ValidationError(
                        "no accounts configured; run `zonesync credentials save` first"
                            .to_string(),
                    ));
                }
                Ok(accounts)
            }
        }
    }

    /// `sync` subcommand. Returns `true` when every run avoided `Failed`.
    pub async fn sync(
        &self,
        account: Option<&str>,
        domain: Option<&str>,
        force: bool,
        dry_run: bool,
    ) -> CoreResult<bool> {
        let accounts = self.resolve_accounts(account).await?;
        if domain.is_some() && accounts.len() > 1 {
            return Err(CoreError::ValidationError(
                "--domain needs --account when more than one account exists".to_string(),
            ));
        }

        let options = SyncOptions {
            force,
            dry_run,
            ..SyncOptions::manual()
        };

        let mut ok = true;
        for acct in &accounts {
            if let Some(domain) = domain {
                let outcome = self.sync.sync_domain(&acct.id, domain, options).await?;
                print_outcome(&acct.name, &outcome);
                ok &= outcome.status != SyncRunStatus::Failed;
            } else {
                let report = self.sync.sync_account(&acct.id, options).await?;
                println!(
                    "{}: {:?} ({} domain(s), +{} ~{} -{} records, {} conflict(s))",
                    acct.name,
                    report.status,
                    report.outcomes.len(),
                    report.counters.records_created,
                    report.counters.records_updated,
                    report.counters.records_deleted,
                    report.counters.conflicts_detected,
                );
                for outcome in &report.outcomes {
                    print_outcome(&acct.name, outcome);
                }
                ok &= report.status != SyncRunStatus::Failed;
            }
        }
        Ok(ok)
    }

    /// `discover` subcommand.
    pub async fn discover(&self, account: Option<&str>) -> CoreResult<()> {
        for acct in self.resolve_accounts(account).await? {
            let outcome = self.discovery.discover(&acct.id).await?;
            println!(
                "{}: {} domain(s) found, {} added, {} updated, {} removed",
                acct.name, outcome.domains_found, outcome.added, outcome.updated, outcome.removed,
            );
            for error in &outcome.errors {
                println!("  warning: {error}");
            }
        }
        Ok(())
    }

    /// `status` subcommand.
    pub async fn status(&self, account: Option<&str>) -> CoreResult<()> {
        for acct in self.resolve_accounts(account).await? {
            let overview = self.status.overview(&acct.id).await?;
            let status = overview
                .account
                .status
                .map_or_else(|| "unknown".to_string(), |s| format!("{s:?}"));
            println!("{} [{}] ({})", overview.account.name, overview.account.id, status);
            if let Some(error) = &overview.account.error {
                println!("  error: {error}");
            }
            if let Some(run) = &overview.last_run {
                println!(
                    "  last run: {:?} ({:?}) at {}",
                    run.status, run.trigger, run.started_at
                );
            }
            if overview.pending_conflicts > 0 {
                println!("  pending conflicts: {}", overview.pending_conflicts);
            }
            for domain in &overview.domains {
                let entry = &domain.entry;
                let synced = entry
                    .last_synced
                    .map_or_else(|| "never".to_string(), |t| t.to_string());
                println!(
                    "  {} {:?} auto_sync={} last_synced={}{}",
                    entry.name,
                    entry.classification,
                    entry.auto_sync,
                    synced,
                    if domain.pending_conflicts > 0 {
                        format!(" conflicts={}", domain.pending_conflicts)
                    } else {
                        String::new()
                    },
                );
            }
        }
        Ok(())
    }

    /// `history` subcommand.
    pub async fn history(
        &self,
        account: Option<&str>,
        domain: &str,
        limit: usize,
    ) -> CoreResult<()> {
        let accounts = self.resolve_accounts(account).await?;
        if accounts.len() > 1 {
            return Err(CoreError::ValidationError(
                "history needs --account when more than one account exists".to_string(),
            ));
        }
        let acct = &accounts[0];
        let changes = self.status.domain_history(&acct.id, domain, limit).await?;
        if changes.is_empty() {
            println!("No recorded changes for {domain}");
            return Ok(());
        }
        for change in changes {
            let resolution = change
                .resolution
                .map_or_else(String::new, |r| format!(" [{r}]"));
            println!(
                "{} {:?}/{:?} {} {} -> {}{}",
                change.changed_at,
                change.change_type,
                change.source,
                change.key,
                describe_values(&change.old_values),
                describe_values(&change.new_values),
                resolution,
            );
        }
        Ok(())
    }

    /// `conflicts list` subcommand.
    pub async fn conflicts_list(&self, account: Option<&str>) -> CoreResult<()> {
        let mut any = false;
        for acct in self.resolve_accounts(account).await? {
            for item in self.conflicts.list_pending(&acct.id).await? {
                any = true;
                print_conflict(&acct.name, &item);
            }
        }
        if !any {
            println!("No pending conflicts");
        }
        Ok(())
    }

    /// `conflicts resolve` subcommand.
    pub async fn conflicts_resolve(
        &self,
        id: &str,
        choice: ConflictResolutionChoice,
    ) -> CoreResult<()> {
        let item = self.conflicts.resolve(id, choice).await?;
        println!("Conflict {} on {} {} -> {:?}", item.id, item.domain, item.key, item.state);
        Ok(())
    }

    /// `credentials save` subcommand. Creates the named account, or replaces
    /// its credentials when it already exists.
    pub async fn credentials_save(
        &self,
        name: &str,
        credentials: ProviderCredentials,
    ) -> CoreResult<()> {
        let existing = self
            .credentials
            .list_accounts()
            .await?
            .into_iter()
            .find(|a| a.name == name);
        let account = match existing {
            Some(account) => {
                let updated = self
                    .credentials
                    .update_credentials(&account.id, credentials)
                    .await?;
                println!("Updated credentials for account {} [{}]", updated.name, updated.id);
                updated
            }
            None => {
                let created = self
                    .credentials
                    .create_account(name.to_string(), credentials)
                    .await?;
                println!("Created account {} [{}]", created.name, created.id);
                created
            }
        };
        log::debug!("Account {} saved", account.id);
        Ok(())
    }

    /// `credentials validate` subcommand. No state is written.
    pub async fn credentials_validate(
        &self,
        credentials: ProviderCredentials,
    ) -> CoreResult<bool> {
        let accepted = self.credentials.validate(&credentials).await?;
        if accepted {
            println!("Credentials accepted by the provider");
        } else {
            println!("Credentials rejected by the provider");
        }
        Ok(accepted)
    }

    /// `daemon` subcommand: scheduler loop until ctrl-c.
    pub async fn daemon(&self) -> CoreResult<()> {
        let (scheduler, handle) = Scheduler::new(Arc::clone(&self.ctx), Arc::clone(&self.sync));
        let loop_task = tokio::spawn(scheduler.run());

        log::info!("Daemon running; press ctrl-c to stop");
        handle.trigger(Trigger::All);
        tokio::signal::ctrl_c()
            .await
            .map_err(|e| CoreError::StorageError(format!("signal handler: {e}")))?;
        log::info!("Shutting down");
        handle.shutdown();
        let _ = loop_task.await;
        Ok(())
    }
}

fn describe_values(values: &[zonesync_core::types::RecordValue]) -> String {
    if values.is_empty() {
        return "(none)".to_string();
    }
    values
        .iter()
        .map(|v| v.value.as_str())
        .collect::<Vec<_>>()
        .join(",")
}

fn print_outcome(account: &str, outcome: &DomainSyncOutcome) {
    println!(
        "  {}/{}: {:?} ({:?}) +{} ~{} -{} conflicts={}",
        account,
        outcome.domain,
        outcome.disposition,
        outcome.status,
        outcome.counters.records_created,
        outcome.counters.records_updated,
        outcome.counters.records_deleted,
        outcome.counters.conflicts_detected,
    );
    for op in &outcome.planned_ops {
        println!("    plan: {op}");
    }
    for error in &outcome.errors {
        println!("    error: {error}");
    }
}

fn print_conflict(account: &str, item: &ConflictItem) {
    println!(
        "{} {}/{} {} detected {}",
        item.id, account, item.domain, item.key, item.detected_at
    );
    println!("  local:  {}", describe_values(&item.local_values));
    println!("  remote: {}", describe_values(&item.remote_values));
}
