//! # zonesync-provider
//!
//! Remote DNS provider client for the zonesync engine.
//!
//! Wraps the GoDaddy domains API (production and OTE environments) behind the
//! [`DnsProvider`] trait, with a shared account-wide request budget, retries
//! for transient failures, and a structured error taxonomy.
//!
//! ## Rate Limiting
//!
//! The remote API allows 60 requests per minute per account. A single
//! [`RequestBudget`] is shared by every provider instance created through
//! [`create_provider`]; callers that outwait the permit bound receive
//! [`ProviderError::RateLimited`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use zonesync_provider::{
//!     create_provider, ApiEnvironment, ProviderCredentials, RequestBudget,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let budget = Arc::new(RequestBudget::default());
//!     let provider = create_provider(
//!         ProviderCredentials::Godaddy {
//!             api_key: "your-key".to_string(),
//!             api_secret: "your-secret".to_string(),
//!             environment: ApiEnvironment::Production,
//!         },
//!         budget,
//!     )?;
//!
//!     provider.validate_credentials().await?;
//!
//!     for domain in provider.list_domains().await? {
//!         println!("{} ({:?})", domain.name, domain.status);
//!         for record in provider.fetch_records(&domain.name).await? {
//!             println!("  {} {} -> {}", record.record_type, record.name, record.value);
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! All operations return [`Result<T, ProviderError>`](ProviderError). Transient
//! errors (`NetworkError`, `Timeout`, `RateLimited`) are retried with
//! exponential backoff and full jitter before surfacing; business errors
//! (`InvalidCredentials`, `DomainNotFound`, ...) surface immediately.

mod budget;
mod error;
mod factory;
mod godaddy;
mod http;
mod retry;
mod traits;
mod types;

// Re-export error types
pub use error::{ProviderError, Result};

// Re-export factory functions
pub use factory::{create_provider, get_all_provider_metadata};

// Re-export core trait
pub use traits::DnsProvider;

// Re-export rate limiting and retry policy
pub use budget::{DEFAULT_MAX_WAIT, DEFAULT_REQUESTS_PER_MINUTE, RequestBudget};
pub use retry::RetryPolicy;

// Re-export types
pub use types::{
    ApiEnvironment, CredentialValidationError, DnsRecordType, DomainStatus, FieldType, MIN_TTL,
    ProviderCredentialField, ProviderCredentials, ProviderDomain, ProviderMetadata, ProviderRecord,
    RecordKey, clamp_ttl,
};

// Re-export the concrete provider
pub use godaddy::GodaddyProvider;
