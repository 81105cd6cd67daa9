//! Read-only status and history views.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::services::ServiceContext;
use crate::types::{Account, DomainEntry, RecordChange, SyncLogEntry};

/// One domain's row in the status view.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainOverview {
    #[serde(flatten)]
    pub entry: DomainEntry,
    /// Pending conflicts touching this domain.
    pub pending_conflicts: usize,
}

/// Full status view for one account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountOverview {
    pub account: Account,
    pub domains: Vec<DomainOverview>,
    /// Most recent sync run, any domain.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_run: Option<SyncLogEntry>,
    /// Total pending conflicts for the account.
    pub pending_conflicts: usize,
}

/// Status and history query service.
pub struct StatusService {
    ctx: Arc<ServiceContext>,
}

impl StatusService {
    #[must_use]
    pub fn new(ctx: Arc<ServiceContext>) -> Self {
        Self { ctx }
    }

    /// Status view for one account.
    pub async fn overview(&self, account_id: &str) -> CoreResult<AccountOverview> {
        let account = self
            .ctx
            .accounts
            .find_by_id(account_id)
            .await?
            .ok_or_else(|| CoreError::AccountNotFound(account_id.to_string()))?;

        let entries = self.ctx.catalog.find_by_account(account_id).await?;
        let last_run = self.ctx.sync_log.latest(account_id).await?;
        let pending = self.ctx.conflicts.pending_for_account(account_id).await?;

        let conflict_counts: Vec<usize> = futures::future::join_all(
            entries
                .iter()
                .map(|e| self.ctx.conflicts.pending_for_domain(account_id, &e.name)),
        )
        .await
        .into_iter()
        .map(|r| r.map(|items| items.len()).unwrap_or(0))
        .collect();

        let domains = entries
            .into_iter()
            .zip(conflict_counts)
            .map(|(entry, pending_conflicts)| DomainOverview {
                entry,
                pending_conflicts,
            })
            .collect();

        Ok(AccountOverview {
            account,
            domains,
            last_run,
            pending_conflicts: pending.len(),
        })
    }

    /// Recent sync runs for an account, newest first.
    pub async fn recent_runs(
        &self,
        account_id: &str,
        limit: usize,
    ) -> CoreResult<Vec<SyncLogEntry>> {
        self.ctx.sync_log.recent(account_id, limit).await
    }

    /// Recent record changes for one domain, newest first.
    pub async fn domain_history(
        &self,
        account_id: &str,
        domain: &str,
        limit: usize,
    ) -> CoreResult<Vec<RecordChange>> {
        self.ctx
            .history
            .recent_for_domain(account_id, domain, limit)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{SyncOptions, SyncService};
    use crate::test_utils::TestWorld;
    use crate::types::SyncRunStatus;
    use zonesync_provider::DnsRecordType;

    #[tokio::test]
    async fn overview_reflects_catalog_and_runs() {
        let world = TestWorld::new().await;
        world
            .set_desired("example.com", &[(DnsRecordType::A, "www", "203.0.113.10")])
            .await;
        world.set_remote("example.com", &[]).await;

        let sync = SyncService::new(world.ctx.clone());
        sync.sync_domain(&world.account_id, "example.com", SyncOptions::manual())
            .await
            .unwrap();

        let status = StatusService::new(world.ctx.clone());
        let overview = status.overview(&world.account_id).await.unwrap();
        assert_eq!(overview.domains.len(), 1);
        assert_eq!(overview.pending_conflicts, 0);
        let last = overview.last_run.unwrap();
        assert_eq!(last.status, SyncRunStatus::Completed);
        assert_eq!(last.counters.records_created, 1);
    }

    #[tokio::test]
    async fn overview_unknown_account_errors() {
        let world = TestWorld::new().await;
        let status = StatusService::new(world.ctx.clone());
        let result = status.overview("ghost").await;
        assert!(matches!(result, Err(CoreError::AccountNotFound(_))));
    }

    #[tokio::test]
    async fn history_lists_applied_changes_newest_first() {
        let world = TestWorld::new().await;
        world
            .set_desired("example.com", &[(DnsRecordType::A, "www", "203.0.113.10")])
            .await;
        world.set_remote("example.com", &[]).await;

        let sync = SyncService::new(world.ctx.clone());
        sync.sync_domain(&world.account_id, "example.com", SyncOptions::manual())
            .await
            .unwrap();

        let status = StatusService::new(world.ctx.clone());
        let history = status
            .domain_history(&world.account_id, "example.com", 10)
            .await
            .unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].domain, "example.com");
    }
}
