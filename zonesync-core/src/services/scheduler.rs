//! Periodic and triggered run scheduling.
//!
//! One loop owns the cadence: a periodic tick enqueues scheduled runs for
//! every enabled account, manual triggers arrive over a channel, and a
//! shutdown flag stops the loop. Triggers received after shutdown are
//! dropped without running.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};

use crate::services::sync::{SyncOptions, SyncService};
use crate::services::ServiceContext;

const DEFAULT_TICK: Duration = Duration::from_secs(900);
const TRIGGER_QUEUE_DEPTH: usize = 64;

/// A manual run request.
#[derive(Debug, Clone)]
pub enum Trigger {
    /// Sync every enabled account.
    All,
    /// Sync one account.
    Account(String),
    /// Sync one domain.
    Domain { account_id: String, domain: String },
}

/// Control handle for a running scheduler.
#[derive(Clone)]
pub struct SchedulerHandle {
    trigger_tx: mpsc::Sender<Trigger>,
    shutdown_tx: watch::Sender<bool>,
}

impl SchedulerHandle {
    /// Enqueue a manual run. Returns `false` when the scheduler is gone or
    /// its queue is full.
    pub fn trigger(&self, trigger: Trigger) -> bool {
        self.trigger_tx.try_send(trigger).is_ok()
    }

    /// Stop the loop. In-flight runs finish; queued triggers are dropped.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }
}

/// The scheduling loop.
pub struct Scheduler {
    ctx: Arc<ServiceContext>,
    sync: Arc<SyncService>,
    trigger_rx: mpsc::Receiver<Trigger>,
    shutdown_rx: watch::Receiver<bool>,
}

impl Scheduler {
    /// Build a scheduler and its control handle.
    #[must_use]
    pub fn new(ctx: Arc<ServiceContext>, sync: Arc<SyncService>) -> (Self, SchedulerHandle) {
        let (trigger_tx, trigger_rx) = mpsc::channel(TRIGGER_QUEUE_DEPTH);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        (
            Self {
                ctx,
                sync,
                trigger_rx,
                shutdown_rx,
            },
            SchedulerHandle {
                trigger_tx,
                shutdown_tx,
            },
        )
    }

    /// Run until shutdown.
    pub async fn run(mut self) {
        log::info!("Scheduler started");
        loop {
            let tick = self.tick_interval().await;
            tokio::select! {
                () = tokio::time::sleep(tick) => {
                    self.run_all(SyncOptions::scheduled()).await;
                }
                trigger = self.trigger_rx.recv() => {
                    match trigger {
                        Some(trigger) => self.handle_trigger(trigger).await,
                        None => break,
                    }
                }
                changed = self.shutdown_rx.changed() => {
                    if changed.is_err() || *self.shutdown_rx.borrow() {
                        break;
                    }
                }
            }
        }
        log::info!("Scheduler stopped");
    }

    /// Shortest enabled account interval, or the default cadence.
    async fn tick_interval(&self) -> Duration {
        match self.ctx.accounts.find_all().await {
            Ok(accounts) => accounts
                .iter()
                .filter(|a| a.config.sync_enabled)
                .map(|a| Duration::from_secs(a.config.sync_interval_secs.max(1)))
                .min()
                .unwrap_or(DEFAULT_TICK),
            Err(e) => {
                log::error!("Scheduler could not list accounts: {e}");
                DEFAULT_TICK
            }
        }
    }

    async fn handle_trigger(&self, trigger: Trigger) {
        match trigger {
            Trigger::All => self.run_all(SyncOptions::manual()).await,
            Trigger::Account(account_id) => {
                self.run_account(&account_id, SyncOptions::manual()).await;
            }
            Trigger::Domain { account_id, domain } => {
                match self
                    .sync
                    .sync_domain(&account_id, &domain, SyncOptions::manual())
                    .await
                {
                    Ok(outcome) => log::debug!(
                        "Triggered run for {domain}: {disposition:?}",
                        disposition = outcome.disposition
                    ),
                    Err(e) => log::error!("Triggered run for {domain} failed: {e}"),
                }
            }
        }
    }

    async fn run_all(&self, options: SyncOptions) {
        let accounts = match self.ctx.accounts.find_all().await {
            Ok(accounts) => accounts,
            Err(e) => {
                log::error!("Scheduler could not list accounts: {e}");
                return;
            }
        };
        for account in accounts.iter().filter(|a| a.config.sync_enabled) {
            self.run_account(&account.id, options).await;
        }
    }

    async fn run_account(&self, account_id: &str, options: SyncOptions) {
        match self.sync.sync_account(account_id, options).await {
            Ok(report) => log::info!(
                "Account {account_id} synced: {status:?}, {domains} domains",
                status = report.status,
                domains = report.outcomes.len()
            ),
            Err(e) => {
                if e.is_expected() {
                    log::warn!("Account {account_id} sync failed: {e}");
                } else {
                    log::error!("Account {account_id} sync failed: {e}");
                }
            }
        }
    }
}
