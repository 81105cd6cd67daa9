//! Core provider trait definition.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{ProviderDomain, ProviderMetadata, ProviderRecord, RecordKey};

/// Unified interface to a remote authoritative DNS provider.
///
/// Implementations must be `Send + Sync` so they can be shared across async
/// tasks behind `Arc<dyn DnsProvider>`.
///
/// # Record set semantics
///
/// The remote API has no per-record identifiers: it replaces the full value
/// set of one (type, name) key per write. All mutation therefore goes through
/// [`replace_record_set`](Self::replace_record_set), with an empty slice
/// meaning deletion of the key.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Provider identifier (e.g. `godaddy`).
    fn id(&self) -> &'static str;

    /// Static metadata for this provider (display name, credential fields).
    fn metadata(&self) -> ProviderMetadata;

    /// Check whether the configured credentials are accepted by the remote API.
    ///
    /// # Returns
    /// * `Ok(true)` - credentials are valid
    /// * `Ok(false)` - the API rejected the credentials
    /// * `Err(_)` - the check itself failed (network error, etc.)
    async fn validate_credentials(&self) -> Result<bool>;

    /// List all domains owned by the remote account.
    async fn list_domains(&self) -> Result<Vec<ProviderDomain>>;

    /// Fetch all records of a domain.
    ///
    /// NS and SOA records are filtered out: the registrar manages them and
    /// the sync engine never writes them.
    ///
    /// # Arguments
    /// * `domain` - domain name
    async fn fetch_records(&self, domain: &str) -> Result<Vec<ProviderRecord>>;

    /// Replace the full value set of one (type, name) key.
    ///
    /// An empty `records` slice deletes the key. All records must belong to
    /// `key`; TTLs are clamped to the API minimum before sending.
    ///
    /// # Arguments
    /// * `domain` - domain name
    /// * `key` - record set identity
    /// * `records` - new value set for the key
    async fn replace_record_set(
        &self,
        domain: &str,
        key: &RecordKey,
        records: &[ProviderRecord],
    ) -> Result<()>;

    /// Append records to a domain without touching existing keys.
    ///
    /// # Arguments
    /// * `domain` - domain name
    /// * `records` - records to add
    async fn add_records(&self, domain: &str, records: &[ProviderRecord]) -> Result<()>;
}
