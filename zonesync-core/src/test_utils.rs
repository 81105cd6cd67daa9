//! Test helpers: in-memory mock stores, a scripted provider, and a
//! pre-wired `TestWorld` factory.

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use zonesync_provider::{
    clamp_ttl, DnsProvider, DnsRecordType, DomainStatus, ProviderCredentials, ProviderDomain,
    ProviderError, ProviderMetadata, ProviderRecord, RecordKey, RequestBudget,
    Result as ProviderResult,
};

use crate::error::CoreResult;
use crate::services::ServiceContext;
use crate::traits::{
    AccountRepository, BaselineStore, ConflictQueue, CredentialStore, CredentialsMap,
    DesiredStateSource, DomainCatalog, InMemoryProviderRegistry, ProviderRegistry,
    RecordHistoryStore, SyncLogStore,
};
use crate::types::{
    Account, AccountStatus, ConflictItem, ConflictPolicy, ConflictState, DomainEntry,
    RecordChange, RecordSet, RecordValue, SyncLogEntry,
};

/// Shorthand for a record key.
pub fn key(record_type: DnsRecordType, name: &str) -> RecordKey {
    RecordKey::new(record_type, name)
}

/// Shorthand for a record value.
pub fn value(v: &str, ttl: u32) -> RecordValue {
    RecordValue {
        value: v.to_string(),
        ttl,
        priority: None,
    }
}

fn set_from(entries: &[(DnsRecordType, &str, &str)]) -> RecordSet {
    RecordSet::from_records(entries.iter().map(|(record_type, name, v)| ProviderRecord {
        record_type: *record_type,
        name: (*name).to_string(),
        value: (*v).to_string(),
        ttl: 600,
        priority: None,
    }))
}

// ===== MockAccountRepository =====

#[derive(Default)]
pub struct MockAccountRepository {
    accounts: RwLock<HashMap<String, Account>>,
}

impl MockAccountRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountRepository for MockAccountRepository {
    async fn find_all(&self) -> CoreResult<Vec<Account>> {
        Ok(self.accounts.read().await.values().cloned().collect())
    }

    async fn find_by_id(&self, id: &str) -> CoreResult<Option<Account>> {
        Ok(self.accounts.read().await.get(id).cloned())
    }

    async fn save(&self, account: &Account) -> CoreResult<()> {
        self.accounts
            .write()
            .await
            .insert(account.id.clone(), account.clone());
        Ok(())
    }

    async fn delete(&self, id: &str) -> CoreResult<()> {
        self.accounts.write().await.remove(id);
        Ok(())
    }

    async fn update_status(
        &self,
        id: &str,
        status: AccountStatus,
        error: Option<String>,
    ) -> CoreResult<()> {
        let mut store = self.accounts.write().await;
        if let Some(account) = store.get_mut(id) {
            account.status = Some(status);
            account.error = error;
        }
        Ok(())
    }
}

// ===== MockCredentialStore =====

#[derive(Default)]
pub struct MockCredentialStore {
    credentials: RwLock<CredentialsMap>,
}

impl MockCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for MockCredentialStore {
    async fn load_all(&self) -> CoreResult<CredentialsMap> {
        Ok(self.credentials.read().await.clone())
    }

    async fn get(&self, account_id: &str) -> CoreResult<Option<ProviderCredentials>> {
        Ok(self.credentials.read().await.get(account_id).cloned())
    }

    async fn set(&self, account_id: &str, credentials: &ProviderCredentials) -> CoreResult<()> {
        self.credentials
            .write()
            .await
            .insert(account_id.to_string(), credentials.clone());
        Ok(())
    }

    async fn remove(&self, account_id: &str) -> CoreResult<()> {
        self.credentials.write().await.remove(account_id);
        Ok(())
    }
}

// ===== MockDomainCatalog =====

#[derive(Default)]
pub struct MockDomainCatalog {
    entries: RwLock<HashMap<String, DomainEntry>>,
}

impl MockDomainCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    fn storage_key(account_id: &str, domain: &str) -> String {
        format!("{account_id}::{domain}")
    }
}

#[async_trait]
impl DomainCatalog for MockDomainCatalog {
    async fn find_by_account(&self, account_id: &str) -> CoreResult<Vec<DomainEntry>> {
        let mut entries: Vec<DomainEntry> = self
            .entries
            .read()
            .await
            .values()
            .filter(|e| e.account_id == account_id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    async fn find(&self, account_id: &str, domain: &str) -> CoreResult<Option<DomainEntry>> {
        Ok(self
            .entries
            .read()
            .await
            .get(&Self::storage_key(account_id, domain))
            .cloned())
    }

    async fn save(&self, entry: &DomainEntry) -> CoreResult<()> {
        self.entries
            .write()
            .await
            .insert(Self::storage_key(&entry.account_id, &entry.name), entry.clone());
        Ok(())
    }

    async fn save_all(&self, entries: &[DomainEntry]) -> CoreResult<()> {
        let mut store = self.entries.write().await;
        for entry in entries {
            store.insert(
                Self::storage_key(&entry.account_id, &entry.name),
                entry.clone(),
            );
        }
        Ok(())
    }

    async fn remove(&self, account_id: &str, domain: &str) -> CoreResult<()> {
        self.entries
            .write()
            .await
            .remove(&Self::storage_key(account_id, domain));
        Ok(())
    }

    async fn update_last_synced(
        &self,
        account_id: &str,
        domain: &str,
        at: DateTime<Utc>,
    ) -> CoreResult<()> {
        let mut store = self.entries.write().await;
        if let Some(entry) = store.get_mut(&Self::storage_key(account_id, domain)) {
            entry.last_synced = Some(at);
        }
        Ok(())
    }
}

// ===== Bookkeeping stores =====

#[derive(Default)]
pub struct MockSyncLogStore {
    entries: RwLock<Vec<SyncLogEntry>>,
}

impl MockSyncLogStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SyncLogStore for MockSyncLogStore {
    async fn append(&self, entry: &SyncLogEntry) -> CoreResult<()> {
        self.entries.write().await.push(entry.clone());
        Ok(())
    }

    async fn recent(&self, account_id: &str, limit: usize) -> CoreResult<Vec<SyncLogEntry>> {
        Ok(self
            .entries
            .read()
            .await
            .iter()
            .rev()
            .filter(|e| e.account_id == account_id)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn latest(&self, account_id: &str) -> CoreResult<Option<SyncLogEntry>> {
        Ok(self.recent(account_id, 1).await?.into_iter().next())
    }
}

#[derive(Default)]
pub struct MockRecordHistoryStore {
    changes: RwLock<Vec<RecordChange>>,
}

impl MockRecordHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordHistoryStore for MockRecordHistoryStore {
    async fn append(&self, change: &RecordChange) -> CoreResult<()> {
        self.changes.write().await.push(change.clone());
        Ok(())
    }

    async fn recent_for_domain(
        &self,
        account_id: &str,
        domain: &str,
        limit: usize,
    ) -> CoreResult<Vec<RecordChange>> {
        Ok(self
            .changes
            .read()
            .await
            .iter()
            .rev()
            .filter(|c| c.account_id == account_id && c.domain == domain)
            .take(limit)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct MockConflictQueue {
    items: RwLock<Vec<ConflictItem>>,
}

impl MockConflictQueue {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConflictQueue for MockConflictQueue {
    async fn push(&self, item: &ConflictItem) -> CoreResult<()> {
        self.items.write().await.push(item.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> CoreResult<Option<ConflictItem>> {
        Ok(self
            .items
            .read()
            .await
            .iter()
            .find(|i| i.id == id)
            .cloned())
    }

    async fn pending_for_domain(
        &self,
        account_id: &str,
        domain: &str,
    ) -> CoreResult<Vec<ConflictItem>> {
        Ok(self
            .items
            .read()
            .await
            .iter()
            .filter(|i| {
                i.account_id == account_id
                    && i.domain == domain
                    && i.state == ConflictState::Pending
            })
            .cloned()
            .collect())
    }

    async fn pending_for_account(&self, account_id: &str) -> CoreResult<Vec<ConflictItem>> {
        Ok(self
            .items
            .read()
            .await
            .iter()
            .filter(|i| i.account_id == account_id && i.state == ConflictState::Pending)
            .cloned()
            .collect())
    }

    async fn resolve(
        &self,
        id: &str,
        state: ConflictState,
        values: Option<Vec<RecordValue>>,
    ) -> CoreResult<()> {
        let mut items = self.items.write().await;
        if let Some(item) = items.iter_mut().find(|i| i.id == id) {
            item.resolve(state, values);
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MockBaselineStore {
    baselines: RwLock<HashMap<String, RecordSet>>,
}

impl MockBaselineStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BaselineStore for MockBaselineStore {
    async fn get(&self, account_id: &str, domain: &str) -> CoreResult<Option<RecordSet>> {
        Ok(self
            .baselines
            .read()
            .await
            .get(&format!("{account_id}::{domain}"))
            .cloned())
    }

    async fn set(&self, account_id: &str, domain: &str, baseline: &RecordSet) -> CoreResult<()> {
        self.baselines
            .write()
            .await
            .insert(format!("{account_id}::{domain}"), baseline.clone());
        Ok(())
    }

    async fn remove(&self, account_id: &str, domain: &str) -> CoreResult<()> {
        self.baselines
            .write()
            .await
            .remove(&format!("{account_id}::{domain}"));
        Ok(())
    }
}

// ===== MockDesiredStateSource =====

#[derive(Default)]
pub struct MockDesiredStateSource {
    records: RwLock<HashMap<String, RecordSet>>,
    modified: RwLock<HashMap<String, DateTime<Utc>>>,
}

impl MockDesiredStateSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set(&self, domain: &str, set: RecordSet) {
        self.records.write().await.insert(domain.to_string(), set);
    }

    pub async fn get(&self, domain: &str) -> RecordSet {
        self.records
            .read()
            .await
            .get(domain)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn set_modified(&self, domain: &str, at: DateTime<Utc>) {
        self.modified.write().await.insert(domain.to_string(), at);
    }
}

#[async_trait]
impl DesiredStateSource for MockDesiredStateSource {
    async fn fetch_records(&self, domain: &str) -> CoreResult<RecordSet> {
        Ok(self.get(domain).await)
    }

    async fn last_modified(&self, domain: &str) -> CoreResult<Option<DateTime<Utc>>> {
        Ok(self.modified.read().await.get(domain).copied())
    }

    async fn apply_remote(
        &self,
        domain: &str,
        record_key: &RecordKey,
        values: &BTreeSet<RecordValue>,
    ) -> CoreResult<()> {
        let mut records = self.records.write().await;
        let set = records.entry(domain.to_string()).or_default();
        set.set_values(record_key.clone(), values.clone());
        Ok(())
    }
}

// ===== MockDnsProvider =====

/// Scripted remote provider.
///
/// Holds per-domain record sets, mirrors the real provider's TTL clamp on
/// writes, and can be told to fail `replace_record_set` for specific keys.
#[derive(Default)]
pub struct MockDnsProvider {
    domains: RwLock<Vec<ProviderDomain>>,
    records: RwLock<HashMap<String, RecordSet>>,
    failing_keys: std::sync::Mutex<BTreeSet<RecordKey>>,
    replace_count: AtomicUsize,
}

impl MockDnsProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_domain(&self, name: &str) {
        self.domains.write().await.push(ProviderDomain {
            name: name.to_string(),
            status: DomainStatus::Active,
            expires_at: None,
            auto_renew: true,
        });
    }

    pub async fn set_records(&self, domain: &str, set: RecordSet) {
        self.records.write().await.insert(domain.to_string(), set);
    }

    pub async fn record_set(&self, domain: &str) -> RecordSet {
        self.records
            .read()
            .await
            .get(domain)
            .cloned()
            .unwrap_or_default()
    }

    /// Make `replace_record_set` fail for this key until cleared.
    pub fn fail_replace_for(&self, record_key: RecordKey) {
        self.failing_keys
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(record_key);
    }

    pub fn clear_failures(&self) {
        self.failing_keys
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clear();
    }

    pub fn replace_calls(&self) -> usize {
        self.replace_count.load(Ordering::SeqCst)
    }

    fn should_fail(&self, record_key: &RecordKey) -> bool {
        self.failing_keys
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .contains(record_key)
    }
}

#[async_trait]
impl DnsProvider for MockDnsProvider {
    fn id(&self) -> &'static str {
        "mock"
    }

    fn metadata(&self) -> ProviderMetadata {
        ProviderMetadata {
            id: "mock",
            name: "Mock",
            credential_fields: Vec::new(),
        }
    }

    async fn validate_credentials(&self) -> ProviderResult<bool> {
        Ok(true)
    }

    async fn list_domains(&self) -> ProviderResult<Vec<ProviderDomain>> {
        Ok(self.domains.read().await.clone())
    }

    async fn fetch_records(&self, domain: &str) -> ProviderResult<Vec<ProviderRecord>> {
        let set = self.record_set(domain).await;
        Ok(set
            .iter()
            .flat_map(|(k, values)| RecordSet::records_for(k, values))
            .collect())
    }

    async fn replace_record_set(
        &self,
        domain: &str,
        record_key: &RecordKey,
        records: &[ProviderRecord],
    ) -> ProviderResult<()> {
        self.replace_count.fetch_add(1, Ordering::SeqCst);
        if self.should_fail(record_key) {
            return Err(ProviderError::NetworkError {
                provider: "mock".to_string(),
                detail: format!("scripted failure for {record_key}"),
            });
        }
        let mut store = self.records.write().await;
        let set = store.entry(domain.to_string()).or_default();
        let values: BTreeSet<RecordValue> = records
            .iter()
            .map(|r| RecordValue {
                value: r.value.clone(),
                ttl: clamp_ttl(r.ttl),
                priority: r.priority,
            })
            .collect();
        set.set_values(record_key.clone(), values);
        Ok(())
    }

    async fn add_records(&self, domain: &str, records: &[ProviderRecord]) -> ProviderResult<()> {
        let mut store = self.records.write().await;
        let set = store.entry(domain.to_string()).or_default();
        for record in records {
            set.insert(
                record.key(),
                RecordValue {
                    value: record.value.clone(),
                    ttl: clamp_ttl(record.ttl),
                    priority: record.priority,
                },
            );
        }
        Ok(())
    }
}

// ===== TestWorld =====

/// A fully wired in-memory environment: one account with a registered mock
/// provider and one catalog domain (`example.com`).
pub struct TestWorld {
    pub ctx: Arc<ServiceContext>,
    pub account_id: String,
    pub provider: Arc<MockDnsProvider>,
    pub desired: Arc<MockDesiredStateSource>,
    pub catalog: Arc<MockDomainCatalog>,
}

impl TestWorld {
    pub async fn new() -> Self {
        Self::with_policy(ConflictPolicy::RemotePrecedence).await
    }

    pub async fn with_policy(policy: ConflictPolicy) -> Self {
        let accounts = Arc::new(MockAccountRepository::new());
        let credential_store = Arc::new(MockCredentialStore::new());
        let registry = Arc::new(InMemoryProviderRegistry::new());
        let catalog = Arc::new(MockDomainCatalog::new());
        let sync_log = Arc::new(MockSyncLogStore::new());
        let history = Arc::new(MockRecordHistoryStore::new());
        let conflicts = Arc::new(MockConflictQueue::new());
        let baselines = Arc::new(MockBaselineStore::new());
        let desired = Arc::new(MockDesiredStateSource::new());
        let provider = Arc::new(MockDnsProvider::new());

        let mut account = Account::new("test");
        account.config.conflict_policy = policy;
        account.config.server_ip = Some("203.0.113.10".to_string());
        let account_id = account.id.clone();
        accounts.save(&account).await.unwrap();
        registry.register(account_id.clone(), provider.clone()).await;

        let ctx = Arc::new(ServiceContext {
            credential_store,
            accounts,
            registry,
            catalog: catalog.clone(),
            sync_log,
            history,
            conflicts,
            baselines,
            desired: desired.clone(),
            budget: Arc::new(RequestBudget::new(600)),
        });

        let world = Self {
            ctx,
            account_id,
            provider,
            desired,
            catalog,
        };
        world.add_domain("example.com").await;
        world
    }

    /// Register a domain in the catalog and at the mock provider.
    pub async fn add_domain(&self, domain: &str) {
        self.catalog
            .save(&DomainEntry::new(self.account_id.clone(), domain))
            .await
            .unwrap();
        self.provider.add_domain(domain).await;
    }

    pub async fn set_desired(&self, domain: &str, entries: &[(DnsRecordType, &str, &str)]) {
        self.desired.set(domain, set_from(entries)).await;
    }

    pub async fn set_desired_raw(&self, domain: &str, set: RecordSet) {
        self.desired.set(domain, set).await;
    }

    pub async fn set_remote(&self, domain: &str, entries: &[(DnsRecordType, &str, &str)]) {
        self.provider.set_records(domain, set_from(entries)).await;
    }

    pub async fn set_baseline(&self, domain: &str, entries: &[(DnsRecordType, &str, &str)]) {
        self.ctx
            .baselines
            .set(&self.account_id, domain, &set_from(entries))
            .await
            .unwrap();
    }

    pub async fn baseline(&self, domain: &str) -> Option<RecordSet> {
        self.ctx
            .baselines
            .get(&self.account_id, domain)
            .await
            .unwrap()
    }

    pub async fn remote_set(&self, domain: &str) -> RecordSet {
        self.provider.record_set(domain).await
    }

    pub async fn desired_set(&self, domain: &str) -> RecordSet {
        self.desired.get(domain).await
    }

    pub async fn mark_synced(&self, domain: &str) {
        self.ctx
            .catalog
            .update_last_synced(&self.account_id, domain, Utc::now())
            .await
            .unwrap();
    }

    pub async fn disable_auto_sync(&self, domain: &str) {
        let mut entry = self
            .ctx
            .catalog
            .find(&self.account_id, domain)
            .await
            .unwrap()
            .expect("domain not in catalog");
        entry.auto_sync = false;
        self.catalog.save(&entry).await.unwrap();
    }
}
