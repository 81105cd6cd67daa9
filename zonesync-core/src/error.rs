//! Unified error type definition.

use serde::Serialize;
use thiserror::Error;

// Re-export library error types
pub use zonesync_provider::{CredentialValidationError, ProviderError};

/// Core layer error type
#[derive(Error, Debug, Serialize)]
#[serde(tag = "code", content = "details")]
pub enum CoreError {
    /// Account not found
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    /// Domain not found in the catalog
    #[error("Domain not found: {0}")]
    DomainNotFound(String),

    /// Conflict queue item not found
    #[error("Conflict not found: {0}")]
    ConflictNotFound(String),

    /// Credential storage error
    #[error("Credential error: {0}")]
    CredentialError(String),

    /// Credential validation errors (structured, field level)
    #[error("{0}")]
    CredentialValidation(CredentialValidationError),

    /// Invalid credentials (rejected by the remote API)
    #[error("Invalid credentials for: {0}")]
    InvalidCredentials(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Storage layer error
    #[error("Storage error: {0}")]
    StorageError(String),

    /// A sync run exceeded its wall-clock budget
    #[error("Sync timed out for domain: {0}")]
    SyncTimeout(String),

    /// Provider error (converted from the provider library)
    #[error("{0}")]
    Provider(#[from] ProviderError),
}

impl CoreError {
    /// Whether this is expected behavior (user input, resource does not exist,
    /// etc.), used for log level selection.
    ///
    /// Level `warn` should be used when returning `true` and level `error`
    /// when returning `false`.
    /// **Update this method when adding variants.**
    #[must_use]
    pub fn is_expected(&self) -> bool {
        match self {
            Self::AccountNotFound(_)
            | Self::DomainNotFound(_)
            | Self::ConflictNotFound(_)
            | Self::ValidationError(_)
            | Self::CredentialValidation(_)
            | Self::InvalidCredentials(_) => true,
            Self::Provider(e) => e.is_expected(),
            _ => false,
        }
    }
}

/// Core layer Result type alias
pub type CoreResult<T> = std::result::Result<T, CoreError>;
