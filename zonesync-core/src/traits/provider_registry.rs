//! Provider registry abstract trait.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use zonesync_provider::DnsProvider;

/// Provider registry trait.
///
/// Manages all registered provider instances, indexed by `account_id`.
/// A default memory implementation is provided by [`InMemoryProviderRegistry`].
#[async_trait]
pub trait ProviderRegistry: Send + Sync {
    /// Register a provider instance.
    ///
    /// # Arguments
    /// * `account_id` - account id
    /// * `provider` - provider instance
    async fn register(&self, account_id: String, provider: Arc<dyn DnsProvider>);

    /// Unregister a provider.
    ///
    /// # Arguments
    /// * `account_id` - account id
    async fn unregister(&self, account_id: &str);

    /// Get a provider instance.
    ///
    /// # Arguments
    /// * `account_id` - account id
    async fn get(&self, account_id: &str) -> Option<Arc<dyn DnsProvider>>;

    /// List all registered `account_id`s.
    async fn list_account_ids(&self) -> Vec<String>;
}

/// In-memory provider registry.
///
/// Default implementation, sufficient for all current hosts.
#[derive(Clone, Default)]
pub struct InMemoryProviderRegistry {
    providers: Arc<RwLock<HashMap<String, Arc<dyn DnsProvider>>>>,
}

impl InMemoryProviderRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProviderRegistry for InMemoryProviderRegistry {
    async fn register(&self, account_id: String, provider: Arc<dyn DnsProvider>) {
        self.providers.write().await.insert(account_id, provider);
    }

    async fn unregister(&self, account_id: &str) {
        self.providers.write().await.remove(account_id);
    }

    async fn get(&self, account_id: &str) -> Option<Arc<dyn DnsProvider>> {
        self.providers.read().await.get(account_id).cloned()
    }

    async fn list_account_ids(&self) -> Vec<String> {
        self.providers.read().await.keys().cloned().collect()
    }
}
