//! Domain discovery and hosting classification.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use zonesync_provider::{DnsRecordType, ProviderRecord};

use crate::error::CoreResult;
use crate::services::ServiceContext;
use crate::types::{DomainEntry, HostingClass};

/// Summary of one discovery pass over an account.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryOutcome {
    /// Domains listed by the provider.
    pub domains_found: u32,
    /// New catalog entries.
    pub added: u32,
    /// Existing entries refreshed.
    pub updated: u32,
    /// Entries evicted because the domain left the account.
    pub removed: u32,
    /// Domains whose records could not be fetched for classification.
    #[serde(default)]
    pub errors: Vec<String>,
}

/// Classify a domain from its apex address records.
///
/// # Arguments
/// * `records` - the domain's full record list
/// * `server_ip` - the configured server address, if any
///
/// Returns the classification, whether an apex address matches the server,
/// and the apex addresses seen.
#[must_use]
pub fn classify(
    records: &[ProviderRecord],
    server_ip: Option<&str>,
) -> (HostingClass, bool, Vec<String>) {
    let apex_addresses: Vec<String> = records
        .iter()
        .filter(|r| {
            matches!(r.record_type, DnsRecordType::A | DnsRecordType::Aaaa) && r.name == "@"
        })
        .map(|r| r.value.clone())
        .collect();

    if apex_addresses.is_empty() {
        return (HostingClass::Parked, false, apex_addresses);
    }

    let points_to_server =
        server_ip.is_some_and(|ip| apex_addresses.iter().any(|addr| addr == ip));
    let class = if points_to_server {
        HostingClass::ServerHosted
    } else {
        HostingClass::External
    };
    (class, points_to_server, apex_addresses)
}

/// Domain discovery service.
///
/// Lists an account's domains at the registrar, classifies each one by its
/// apex address records, and reconciles the catalog with what it finds.
pub struct DiscoveryService {
    ctx: Arc<ServiceContext>,
}

impl DiscoveryService {
    #[must_use]
    pub fn new(ctx: Arc<ServiceContext>) -> Self {
        Self { ctx }
    }

    /// Run one discovery pass for an account.
    ///
    /// Catalog entries for domains missing from the remote list are evicted
    /// only when every listed domain classified cleanly; a partial pass must
    /// not drop entries it could not verify.
    pub async fn discover(&self, account_id: &str) -> CoreResult<DiscoveryOutcome> {
        let provider = self.ctx.get_provider(account_id).await?;
        let account = self
            .ctx
            .accounts
            .find_by_id(account_id)
            .await?
            .ok_or_else(|| crate::error::CoreError::AccountNotFound(account_id.to_string()))?;
        let server_ip = account.config.server_ip.clone();

        let remote_domains = match provider.list_domains().await {
            Ok(domains) => domains,
            Err(e) => return Err(self.ctx.handle_provider_error(account_id, e).await),
        };

        let mut outcome = DiscoveryOutcome {
            domains_found: u32::try_from(remote_domains.len()).unwrap_or(u32::MAX),
            ..DiscoveryOutcome::default()
        };

        let existing = self.ctx.catalog.find_by_account(account_id).await?;
        let known: HashSet<String> = existing.iter().map(|e| e.name.clone()).collect();

        let mut updated_entries = Vec::with_capacity(remote_domains.len());
        for remote in &remote_domains {
            let mut entry = self
                .ctx
                .catalog
                .find(account_id, &remote.name)
                .await?
                .unwrap_or_else(|| DomainEntry::new(account_id, remote.name.clone()));

            entry.status = remote.status;
            entry.expires_at = remote.expires_at;
            entry.auto_renew = remote.auto_renew;

            match provider.fetch_records(&remote.name).await {
                Ok(records) => {
                    if !entry.manual_override {
                        let (class, points_to_server, detected) =
                            classify(&records, server_ip.as_deref());
                        entry.classification = class;
                        entry.points_to_server = points_to_server;
                        entry.detected_ips = detected;
                    }
                    entry.last_classified = Some(Utc::now());
                }
                Err(e) => {
                    log::warn!(
                        "Discovery could not fetch records for {domain}: {e}",
                        domain = remote.name
                    );
                    outcome.errors.push(format!("{}: {e}", remote.name));
                }
            }

            if known.contains(&remote.name) {
                outcome.updated += 1;
            } else {
                outcome.added += 1;
            }
            updated_entries.push(entry);
        }

        self.ctx.catalog.save_all(&updated_entries).await?;

        // Eviction requires a fully clean pass over the remote list.
        if outcome.errors.is_empty() {
            let listed: HashSet<&str> = remote_domains.iter().map(|d| d.name.as_str()).collect();
            for stale in existing.iter().filter(|e| !listed.contains(e.name.as_str())) {
                self.ctx.catalog.remove(account_id, &stale.name).await?;
                self.ctx.baselines.remove(account_id, &stale.name).await?;
                outcome.removed += 1;
            }
        }

        log::info!(
            "Discovery for {account_id}: {found} domains, {added} added, {updated} updated, {removed} removed",
            found = outcome.domains_found,
            added = outcome.added,
            updated = outcome.updated,
            removed = outcome.removed,
        );
        Ok(outcome)
    }
}
