//! zonesync core library.
//!
//! Continuous reconciliation between a control plane's desired DNS records
//! and a remote authoritative provider:
//! - domain discovery and hosting classification
//! - three-way record merge against a last-known-common baseline
//! - conflict policies (remote precedence, manual queue, timestamp)
//! - sync orchestration, scheduling, and audit bookkeeping
//!
//! The library is host-independent: storage and desired-state access are
//! abstracted behind traits, and the host wires them into a
//! [`ServiceContext`].

pub mod error;
pub mod services;
pub mod traits;
pub mod types;

#[cfg(test)]
mod test_utils;

// Re-export common types
pub use error::{CoreError, CoreResult};
pub use services::ServiceContext;
pub use traits::{
    AccountRepository, BaselineStore, ConflictQueue, CredentialStore, DesiredStateSource,
    DomainCatalog, ProviderRegistry, RecordHistoryStore, SyncLogStore,
};
