//! Storage layer abstraction trait definitions.

mod account_repository;
mod catalog;
mod credential_store;
mod desired;
mod provider_registry;
mod stores;

pub use account_repository::AccountRepository;
pub use catalog::DomainCatalog;
pub use credential_store::{CredentialStore, CredentialsMap};
pub use desired::DesiredStateSource;
pub use provider_registry::{InMemoryProviderRegistry, ProviderRegistry};
pub use stores::{BaselineStore, ConflictQueue, RecordHistoryStore, SyncLogStore};
