//! Manual conflict queue operations.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::error::{CoreError, CoreResult};
use crate::services::ServiceContext;
use crate::types::{
    ChangeSource, ChangeType, ConflictItem, ConflictState, RecordChange, RecordSet, RecordValue,
};

/// Operator decision for one queued conflict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictResolutionChoice {
    /// Keep the local value set; push it to the remote.
    Local,
    /// Keep the remote value set; write it into the local desired state.
    Remote,
    /// Apply operator-supplied values on both sides.
    Custom(Vec<RecordValue>),
    /// Dismiss without applying either side. The key re-enters the merge on
    /// the next run and may be queued again.
    Ignore,
}

/// Conflict queue service.
pub struct ConflictService {
    ctx: Arc<ServiceContext>,
}

impl ConflictService {
    #[must_use]
    pub fn new(ctx: Arc<ServiceContext>) -> Self {
        Self { ctx }
    }

    /// Pending conflicts for an account.
    pub async fn list_pending(&self, account_id: &str) -> CoreResult<Vec<ConflictItem>> {
        self.ctx.conflicts.pending_for_account(account_id).await
    }

    /// Resolve one queued conflict.
    ///
    /// Applies the chosen side (or custom values) to whichever side lost,
    /// advances the baseline for the key, and records the decision in
    /// history. Only `Pending` items can be resolved.
    pub async fn resolve(
        &self,
        conflict_id: &str,
        choice: ConflictResolutionChoice,
    ) -> CoreResult<ConflictItem> {
        let item = self
            .ctx
            .conflicts
            .find_by_id(conflict_id)
            .await?
            .ok_or_else(|| CoreError::ConflictNotFound(conflict_id.to_string()))?;
        if item.state != ConflictState::Pending {
            return Err(CoreError::ValidationError(format!(
                "conflict {conflict_id} is not pending"
            )));
        }

        let account_id = item.account_id.as_str();
        let domain = item.domain.as_str();
        let key = &item.key;

        let (state, applied, resolution_label) = match &choice {
            ConflictResolutionChoice::Local => {
                let values: BTreeSet<RecordValue> = item.local_values.iter().cloned().collect();
                self.push_remote(account_id, domain, key, &values).await?;
                (ConflictState::ResolvedLocal, Some(values), "manual_local")
            }
            ConflictResolutionChoice::Remote => {
                let values: BTreeSet<RecordValue> = item.remote_values.iter().cloned().collect();
                self.ctx.desired.apply_remote(domain, key, &values).await?;
                (ConflictState::ResolvedRemote, Some(values), "manual_remote")
            }
            ConflictResolutionChoice::Custom(custom) => {
                if custom.is_empty() {
                    return Err(CoreError::ValidationError(
                        "custom resolution requires at least one value".to_string(),
                    ));
                }
                let values: BTreeSet<RecordValue> = custom.iter().cloned().collect();
                self.push_remote(account_id, domain, key, &values).await?;
                self.ctx.desired.apply_remote(domain, key, &values).await?;
                (ConflictState::ResolvedCustom, Some(values), "manual_custom")
            }
            ConflictResolutionChoice::Ignore => (ConflictState::Ignored, None, "ignored"),
        };

        if let Some(values) = &applied {
            let mut baseline = self
                .ctx
                .baselines
                .get(account_id, domain)
                .await?
                .unwrap_or_default();
            baseline.set_values(key.clone(), values.clone());
            self.ctx.baselines.set(account_id, domain, &baseline).await?;

            self.ctx
                .history
                .append(&RecordChange::new(
                    account_id,
                    domain,
                    key.clone(),
                    ChangeType::Conflict,
                    ChangeSource::Sync,
                    item.local_values.clone(),
                    values.iter().cloned().collect(),
                    Some(resolution_label.to_string()),
                ))
                .await?;
        }

        let resolution_values = match (&state, &choice) {
            (ConflictState::ResolvedCustom, ConflictResolutionChoice::Custom(values)) => {
                Some(values.clone())
            }
            _ => None,
        };
        self.ctx
            .conflicts
            .resolve(conflict_id, state, resolution_values.clone())
            .await?;

        log::info!(
            "Conflict {conflict_id} for {domain} {key} resolved as {state:?}"
        );
        let mut resolved = item;
        resolved.resolve(state, resolution_values);
        Ok(resolved)
    }

    async fn push_remote(
        &self,
        account_id: &str,
        domain: &str,
        key: &zonesync_provider::RecordKey,
        values: &BTreeSet<RecordValue>,
    ) -> CoreResult<()> {
        let provider = self.ctx.get_provider(account_id).await?;
        let records = RecordSet::records_for(key, values);
        match provider.replace_record_set(domain, key, &records).await {
            Ok(()) => Ok(()),
            Err(e) => Err(self.ctx.handle_provider_error(account_id, e).await),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{key, value, TestWorld};
    use zonesync_provider::DnsRecordType;

    async fn queued_conflict(world: &TestWorld) -> ConflictItem {
        let item = ConflictItem::new(
            world.account_id.clone(),
            "example.com",
            key(DnsRecordType::A, "www"),
            vec![value("203.0.113.10", 600)],
            vec![value("203.0.113.99", 600)],
        );
        world.ctx.conflicts.push(&item).await.unwrap();
        item
    }

    #[tokio::test]
    async fn resolve_local_pushes_to_remote() {
        let world = TestWorld::new().await;
        world.set_remote("example.com", &[]).await;
        let item = queued_conflict(&world).await;

        let service = ConflictService::new(world.ctx.clone());
        let resolved = service
            .resolve(&item.id, ConflictResolutionChoice::Local)
            .await
            .unwrap();
        assert_eq!(resolved.state, ConflictState::ResolvedLocal);

        let remote = world.remote_set("example.com").await;
        let values = remote.get(&key(DnsRecordType::A, "www")).unwrap();
        assert_eq!(values.iter().next().unwrap().value, "203.0.113.10");
    }

    #[tokio::test]
    async fn resolve_remote_writes_locally() {
        let world = TestWorld::new().await;
        world
            .set_desired("example.com", &[(DnsRecordType::A, "www", "203.0.113.10")])
            .await;
        let item = queued_conflict(&world).await;

        let service = ConflictService::new(world.ctx.clone());
        let resolved = service
            .resolve(&item.id, ConflictResolutionChoice::Remote)
            .await
            .unwrap();
        assert_eq!(resolved.state, ConflictState::ResolvedRemote);

        let desired = world.desired_set("example.com").await;
        let values = desired.get(&key(DnsRecordType::A, "www")).unwrap();
        assert_eq!(values.iter().next().unwrap().value, "203.0.113.99");
        assert_eq!(world.provider.replace_calls(), 0);
    }

    #[tokio::test]
    async fn resolve_custom_applies_both_sides() {
        let world = TestWorld::new().await;
        world.set_remote("example.com", &[]).await;
        world.set_desired("example.com", &[]).await;
        let item = queued_conflict(&world).await;

        let service = ConflictService::new(world.ctx.clone());
        let custom = vec![value("203.0.113.50", 600)];
        let resolved = service
            .resolve(&item.id, ConflictResolutionChoice::Custom(custom))
            .await
            .unwrap();
        assert_eq!(resolved.state, ConflictState::ResolvedCustom);
        assert!(resolved.resolution_values.is_some());

        let remote = world.remote_set("example.com").await;
        let desired = world.desired_set("example.com").await;
        let k = key(DnsRecordType::A, "www");
        assert_eq!(
            remote.get(&k).unwrap().iter().next().unwrap().value,
            "203.0.113.50"
        );
        assert_eq!(
            desired.get(&k).unwrap().iter().next().unwrap().value,
            "203.0.113.50"
        );
    }

    #[tokio::test]
    async fn ignore_applies_nothing() {
        let world = TestWorld::new().await;
        let item = queued_conflict(&world).await;

        let service = ConflictService::new(world.ctx.clone());
        let resolved = service
            .resolve(&item.id, ConflictResolutionChoice::Ignore)
            .await
            .unwrap();
        assert_eq!(resolved.state, ConflictState::Ignored);
        assert_eq!(world.provider.replace_calls(), 0);
        assert!(world.baseline("example.com").await.is_none());
    }

    #[tokio::test]
    async fn resolving_twice_is_rejected() {
        let world = TestWorld::new().await;
        let item = queued_conflict(&world).await;

        let service = ConflictService::new(world.ctx.clone());
        service
            .resolve(&item.id, ConflictResolutionChoice::Ignore)
            .await
            .unwrap();
        let second = service
            .resolve(&item.id, ConflictResolutionChoice::Ignore)
            .await;
        assert!(matches!(second, Err(CoreError::ValidationError(_))));
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let world = TestWorld::new().await;
        let service = ConflictService::new(world.ctx.clone());
        let result = service
            .resolve("nope", ConflictResolutionChoice::Ignore)
            .await;
        assert!(matches!(result, Err(CoreError::ConflictNotFound(_))));
    }

    #[tokio::test]
    async fn empty_custom_values_rejected() {
        let world = TestWorld::new().await;
        let item = queued_conflict(&world).await;
        let service = ConflictService::new(world.ctx.clone());
        let result = service
            .resolve(&item.id, ConflictResolutionChoice::Custom(Vec::new()))
            .await;
        assert!(matches!(result, Err(CoreError::ValidationError(_))));
    }
}
