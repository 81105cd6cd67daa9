//! JSON file storage for the CLI host.
//!
//! One [`FileStore`] implements every storage trait the engine needs, with
//! one JSON file per concern under the data directory. Writes go through a
//! temp file and an atomic rename so a crash never leaves a half-written
//! file behind.

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Mutex;
use zonesync_provider::{ProviderCredentials, RecordKey};

use zonesync_core::error::{CoreError, CoreResult};
use zonesync_core::traits::{
    AccountRepository, BaselineStore, ConflictQueue, CredentialStore, CredentialsMap,
    DesiredStateSource, DomainCatalog, RecordHistoryStore, SyncLogStore,
};
use zonesync_core::types::{
    Account, AccountStatus, ConflictItem, ConflictState, DomainEntry, RecordChange, RecordSet,
    RecordValue, SyncLogEntry,
};

fn storage_err(context: &str, e: impl std::fmt::Display) -> CoreError {
    CoreError::StorageError(format!("{context}: {e}"))
}

fn read_json<T>(path: &Path) -> CoreResult<T>
where
    T: DeserializeOwned + Default,
{
    match fs::read(path) {
        Ok(bytes) => serde_json::from_slice(&bytes)
            .map_err(|e| storage_err(&format!("parse {}", path.display()), e)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(T::default()),
        Err(e) => Err(storage_err(&format!("read {}", path.display()), e)),
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> CoreResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| storage_err(&format!("create {}", parent.display()), e))?;
    }
    let bytes = serde_json::to_vec_pretty(value)
        .map_err(|e| CoreError::SerializationError(e.to_string()))?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, bytes).map_err(|e| storage_err(&format!("write {}", tmp.display()), e))?;
    fs::rename(&tmp, path).map_err(|e| storage_err(&format!("rename {}", path.display()), e))
}

fn compound_key(account_id: &str, domain: &str) -> String {
    format!("{account_id}::{domain}")
}

/// JSON file storage rooted at a data directory.
///
/// Layout:
/// - `accounts.json` - account metadata
/// - `credentials.json` - provider credentials
/// - `catalog.json` - discovered domains
/// - `sync_log.json` - append-only run log
/// - `record_history.json` - per-key change history
/// - `conflicts.json` - conflict queue
/// - `baselines.json` - last-known-common record sets
/// - `desired/<domain>.json` - desired record sets, one file per domain
pub struct FileStore {
    dir: PathBuf,
    accounts_lock: Mutex<()>,
    credentials_lock: Mutex<()>,
    catalog_lock: Mutex<()>,
    sync_log_lock: Mutex<()>,
    history_lock: Mutex<()>,
    conflicts_lock: Mutex<()>,
    baselines_lock: Mutex<()>,
    desired_lock: Mutex<()>,
}

impl FileStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            accounts_lock: Mutex::new(()),
            credentials_lock: Mutex::new(()),
            catalog_lock: Mutex::new(()),
            sync_log_lock: Mutex::new(()),
            history_lock: Mutex::new(()),
            conflicts_lock: Mutex::new(()),
            baselines_lock: Mutex::new(()),
            desired_lock: Mutex::new(()),
        }
    }

    fn file(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    fn desired_path(&self, domain: &str) -> PathBuf {
        self.dir.join("desired").join(format!("{domain}.json"))
    }
}

#[async_trait]
impl AccountRepository for FileStore {
    async fn find_all(&self) -> CoreResult<Vec<Account>> {
        let _guard = self.accounts_lock.lock().await;
        let map: HashMap<String, Account> = read_json(&self.file("accounts.json"))?;
        let mut accounts: Vec<Account> = map.into_values().collect();
        accounts.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(accounts)
    }

    async fn find_by_id(&self, id: &str) -> CoreResult<Option<Account>> {
        let _guard = self.accounts_lock.lock().await;
        let map: HashMap<String, Account> = read_json(&self.file("accounts.json"))?;
        Ok(map.get(id).cloned())
    }

    async fn save(&self, account: &Account) -> CoreResult<()> {
        let _guard = self.accounts_lock.lock().await;
        let path = self.file("accounts.json");
        let mut map: HashMap<String, Account> = read_json(&path)?;
        map.insert(account.id.clone(), account.clone());
        write_json(&path, &map)
    }

    async fn delete(&self, id: &str) -> CoreResult<()> {
        let _guard = self.accounts_lock.lock().await;
        let path = self.file("accounts.json");
        let mut map: HashMap<String, Account> = read_json(&path)?;
        map.remove(id);
        write_json(&path, &map)
    }

    async fn update_status(
        &self,
        id: &str,
        status: AccountStatus,
        error: Option<String>,
    ) -> CoreResult<()> {
        let _guard = self.accounts_lock.lock().await;
        let path = self.file("accounts.json");
        let mut map: HashMap<String, Account> = read_json(&path)?;
        if let Some(account) = map.get_mut(id) {
            account.status = Some(status);
            account.error = error;
            write_json(&path, &map)?;
        }
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for FileStore {
    async fn load_all(&self) -> CoreResult<CredentialsMap> {
        let _guard = self.credentials_lock.lock().await;
        read_json(&self.file("credentials.json"))
    }

    async fn get(&self, account_id: &str) -> CoreResult<Option<ProviderCredentials>> {
        let _guard = self.credentials_lock.lock().await;
        let map: CredentialsMap = read_json(&self.file("credentials.json"))?;
        Ok(map.get(account_id).cloned())
    }

    async fn set(&self, account_id: &str, credentials: &ProviderCredentials) -> CoreResult<()> {
        let _guard = self.credentials_lock.lock().await;
        let path = self.file("credentials.json");
        let mut map: CredentialsMap = read_json(&path)?;
        map.insert(account_id.to_string(), credentials.clone());
        write_json(&path, &map)
    }

    async fn remove(&self, account_id: &str) -> CoreResult<()> {
        let _guard = self.credentials_lock.lock().await;
        let path = self.file("credentials.json");
        let mut map: CredentialsMap = read_json(&path)?;
        map.remove(account_id);
        write_json(&path, &map)
    }
}

#[async_trait]
impl DomainCatalog for FileStore {
    async fn find_by_account(&self, account_id: &str) -> CoreResult<Vec<DomainEntry>> {
        let _guard = self.catalog_lock.lock().await;
        let map: HashMap<String, DomainEntry> = read_json(&self.file("catalog.json"))?;
        let mut entries: Vec<DomainEntry> = map
            .into_values()
            .filter(|e| e.account_id == account_id)
            .collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    async fn find(&self, account_id: &str, domain: &str) -> CoreResult<Option<DomainEntry>> {
        let _guard = self.catalog_lock.lock().await;
        let map: HashMap<String, DomainEntry> = read_json(&self.file("catalog.json"))?;
        Ok(map.get(&compound_key(account_id, domain)).cloned())
    }

    async fn save(&self, entry: &DomainEntry) -> CoreResult<()> {
        self.save_all(std::slice::from_ref(entry)).await
    }

    async fn save_all(&self, entries: &[DomainEntry]) -> CoreResult<()> {
        let _guard = self.catalog_lock.lock().await;
        let path = self.file("catalog.json");
        let mut map: HashMap<String, DomainEntry> = read_json(&path)?;
        for entry in entries {
            map.insert(compound_key(&entry.account_id, &entry.name), entry.clone());
        }
        write_json(&path, &map)
    }

    async fn remove(&self, account_id: &str, domain: &str) -> CoreResult<()> {
        let _guard = self.catalog_lock.lock().await;
        let path = self.file("catalog.json");
        let mut map: HashMap<String, DomainEntry> = read_json(&path)?;
        map.remove(&compound_key(account_id, domain));
        write_json(&path, &map)
    }

    async fn update_last_synced(
        &self,
        account_id: &str,
        domain: &str,
        at: DateTime<Utc>,
    ) -> CoreResult<()> {
        let _guard = self.catalog_lock.lock().await;
        let path = self.file("catalog.json");
        let mut map: HashMap<String, DomainEntry> = read_json(&path)?;
        if let Some(entry) = map.get_mut(&compound_key(account_id, domain)) {
            entry.last_synced = Some(at);
            write_json(&path, &map)?;
        }
        Ok(())
    }
}

#[async_trait]
impl SyncLogStore for FileStore {
    async fn append(&self, entry: &SyncLogEntry) -> CoreResult<()> {
        let _guard = self.sync_log_lock.lock().await;
        let path = self.file("sync_log.json");
        let mut entries: Vec<SyncLogEntry> = read_json(&path)?;
        entries.push(entry.clone());
        write_json(&path, &entries)
    }

    async fn recent(&self, account_id: &str, limit: usize) -> CoreResult<Vec<SyncLogEntry>> {
        let _guard = self.sync_log_lock.lock().await;
        let entries: Vec<SyncLogEntry> = read_json(&self.file("sync_log.json"))?;
        Ok(entries
            .into_iter()
            .rev()
            .filter(|e| e.account_id == account_id)
            .take(limit)
            .collect())
    }

    async fn latest(&self, account_id: &str) -> CoreResult<Option<SyncLogEntry>> {
        Ok(self.recent(account_id, 1).await?.into_iter().next())
    }
}

#[async_trait]
impl RecordHistoryStore for FileStore {
    async fn append(&self, change: &RecordChange) -> CoreResult<()> {
        let _guard = self.history_lock.lock().await;
        let path = self.file("record_history.json");
        let mut changes: Vec<RecordChange> = read_json(&path)?;
        changes.push(change.clone());
        write_json(&path, &changes)
    }

    async fn recent_for_domain(
        &self,
        account_id: &str,
        domain: &str,
        limit: usize,
    ) -> CoreResult<Vec<RecordChange>> {
        let _guard = self.history_lock.lock().await;
        let changes: Vec<RecordChange> = read_json(&self.file("record_history.json"))?;
        Ok(changes
            .into_iter()
            .rev()
            .filter(|c| c.account_id == account_id && c.domain == domain)
            .take(limit)
            .collect())
    }
}

#[async_trait]
impl ConflictQueue for FileStore {
    async fn push(&self, item: &ConflictItem) -> CoreResult<()> {
        let _guard = self.conflicts_lock.lock().await;
        let path = self.file("conflicts.json");
        let mut items: Vec<ConflictItem> = read_json(&path)?;
        items.push(item.clone());
        write_json(&path, &items)
    }

    async fn find_by_id(&self, id: &str) -> CoreResult<Option<ConflictItem>> {
        let _guard = self.conflicts_lock.lock().await;
        let items: Vec<ConflictItem> = read_json(&self.file("conflicts.json"))?;
        Ok(items.into_iter().find(|i| i.id == id))
    }

    async fn pending_for_domain(
        &self,
        account_id: &str,
        domain: &str,
    ) -> CoreResult<Vec<ConflictItem>> {
        let _guard = self.conflicts_lock.lock().await;
        let items: Vec<ConflictItem> = read_json(&self.file("conflicts.json"))?;
        Ok(items
            .into_iter()
            .filter(|i| {
                i.account_id == account_id
                    && i.domain == domain
                    && i.state == ConflictState::Pending
            })
            .collect())
    }

    async fn pending_for_account(&self, account_id: &str) -> CoreResult<Vec<ConflictItem>> {
        let _guard = self.conflicts_lock.lock().await;
        let items: Vec<ConflictItem> = read_json(&self.file("conflicts.json"))?;
        Ok(items
            .into_iter()
            .filter(|i| i.account_id == account_id && i.state == ConflictState::Pending)
            .collect())
    }

    async fn resolve(
        &self,
        id: &str,
        state: ConflictState,
        values: Option<Vec<RecordValue>>,
    ) -> CoreResult<()> {
        let _guard = self.conflicts_lock.lock().await;
        let path = self.file("conflicts.json");
        let mut items: Vec<ConflictItem> = read_json(&path)?;
        if let Some(item) = items.iter_mut().find(|i| i.id == id) {
            item.resolve(state, values);
            write_json(&path, &items)?;
        }
        Ok(())
    }
}

#[async_trait]
impl BaselineStore for FileStore {
    async fn get(&self, account_id: &str, domain: &str) -> CoreResult<Option<RecordSet>> {
        let _guard = self.baselines_lock.lock().await;
        let map: HashMap<String, RecordSet> = read_json(&self.file("baselines.json"))?;
        Ok(map.get(&compound_key(account_id, domain)).cloned())
    }

    async fn set(&self, account_id: &str, domain: &str, baseline: &RecordSet) -> CoreResult<()> {
        let _guard = self.baselines_lock.lock().await;
        let path = self.file("baselines.json");
        let mut map: HashMap<String, RecordSet> = read_json(&path)?;
        map.insert(compound_key(account_id, domain), baseline.clone());
        write_json(&path, &map)
    }

    async fn remove(&self, account_id: &str, domain: &str) -> CoreResult<()> {
        let _guard = self.baselines_lock.lock().await;
        let path = self.file("baselines.json");
        let mut map: HashMap<String, RecordSet> = read_json(&path)?;
        map.remove(&compound_key(account_id, domain));
        write_json(&path, &map)
    }
}

#[async_trait]
impl DesiredStateSource for FileStore {
    async fn fetch_records(&self, domain: &str) -> CoreResult<RecordSet> {
        let _guard = self.desired_lock.lock().await;
        read_json(&self.desired_path(domain))
    }

    async fn last_modified(&self, domain: &str) -> CoreResult<Option<DateTime<Utc>>> {
        let _guard = self.desired_lock.lock().await;
        match fs::metadata(self.desired_path(domain)) {
            Ok(meta) => {
                let modified = meta
                    .modified()
                    .map_err(|e| storage_err("desired state mtime", e))?;
                Ok(Some(DateTime::<Utc>::from(modified)))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(storage_err("desired state mtime", e)),
        }
    }

    async fn apply_remote(
        &self,
        domain: &str,
        key: &RecordKey,
        values: &BTreeSet<RecordValue>,
    ) -> CoreResult<()> {
        let _guard = self.desired_lock.lock().await;
        let path = self.desired_path(domain);
        let mut set: RecordSet = read_json(&path)?;
        set.set_values(key.clone(), values.clone());
        write_json(&path, &set)
    }
}
