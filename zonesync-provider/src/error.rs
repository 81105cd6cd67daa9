use serde::{Deserialize, Serialize};

/// Unified error type for all remote DNS operations.
///
/// Each variant includes a `provider` field identifying which provider produced the error,
/// plus variant-specific context. All variants are serializable for structured error reporting.
///
/// # Retryable Errors
///
/// The following variants represent transient failures that may succeed on retry:
/// - [`NetworkError`](Self::NetworkError) — network connectivity issues
/// - [`Timeout`](Self::Timeout) — request timed out
/// - [`RateLimited`](Self::RateLimited) — API rate limit exceeded
///
/// The built-in retry policy handles these with exponential backoff; see
/// [`RetryPolicy`](crate::RetryPolicy).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "code")]
pub enum ProviderError {
    /// A network-level error occurred (DNS resolution failure, connection refused, 5xx).
    NetworkError {
        /// Provider that produced the error.
        provider: String,
        /// Error details.
        detail: String,
    },

    /// The provided credentials are invalid or expired.
    InvalidCredentials {
        /// Provider that produced the error.
        provider: String,
        /// Original error message from the provider API, if available.
        raw_message: Option<String>,
    },

    /// The specified record set was not found.
    RecordNotFound {
        /// Provider that produced the error.
        provider: String,
        /// Name of the record that was not found.
        record_name: String,
        /// Original error message from the provider API, if available.
        raw_message: Option<String>,
    },

    /// A request parameter is invalid (e.g., bad TTL value, malformed IP address).
    InvalidParameter {
        /// Provider that produced the error.
        provider: String,
        /// Name of the invalid parameter.
        param: String,
        /// Description of what's wrong.
        detail: String,
    },

    /// The API rate limit has been exceeded (HTTP 429, or the local request
    /// budget was exhausted without a permit becoming available).
    RateLimited {
        /// Provider that produced the error.
        provider: String,
        /// Suggested wait time in seconds before retrying, if provided by the API.
        retry_after: Option<u64>,
        /// Original error message from the provider API, if available.
        raw_message: Option<String>,
    },

    /// The HTTP request timed out.
    Timeout {
        /// Provider that produced the error.
        provider: String,
        /// Error details.
        detail: String,
    },

    /// The specified domain was not found in the remote account.
    DomainNotFound {
        /// Provider that produced the error.
        provider: String,
        /// Domain name that was not found.
        domain: String,
        /// Original error message from the provider API, if available.
        raw_message: Option<String>,
    },

    /// The authenticated user lacks permission for the requested operation.
    PermissionDenied {
        /// Provider that produced the error.
        provider: String,
        /// Original error message from the provider API, if available.
        raw_message: Option<String>,
    },

    /// Failed to parse the provider's API response.
    ParseError {
        /// Provider that produced the error.
        provider: String,
        /// Details about the parse failure.
        detail: String,
    },

    /// Failed to serialize a request body.
    SerializationError {
        /// Provider that produced the error.
        provider: String,
        /// Details about the serialization failure.
        detail: String,
    },

    /// An unrecognized error from the provider API.
    ///
    /// This is a catch-all for status codes and error bodies not yet mapped
    /// to a specific variant.
    Unknown {
        /// Provider that produced the error.
        provider: String,
        /// Raw error code from the API, if available.
        raw_code: Option<String>,
        /// Raw error message from the API.
        raw_message: String,
    },
}

impl ProviderError {
    /// Whether this is expected behavior (user input, resource does not exist, etc.),
    /// used for log level selection.
    ///
    /// Returns `true` for `warn`-level errors, `false` for `error`-level.
    /// **Update this method when adding variants.**
    #[must_use]
    pub fn is_expected(&self) -> bool {
        matches!(
            self,
            Self::InvalidCredentials { .. }
                | Self::RecordNotFound { .. }
                | Self::InvalidParameter { .. }
                | Self::DomainNotFound { .. }
                | Self::PermissionDenied { .. }
        )
    }

    /// Whether the operation may succeed on retry.
    ///
    /// Network errors, timeouts and rate limiting are transient; business
    /// errors (bad credentials, missing domains) are not.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::NetworkError { .. } | Self::Timeout { .. } | Self::RateLimited { .. }
        )
    }
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NetworkError { provider, detail } => {
                write!(f, "[{provider}] Network error: {detail}")
            }
            Self::InvalidCredentials {
                provider,
                raw_message,
            } => {
                if let Some(msg) = raw_message {
                    write!(f, "[{provider}] Invalid credentials: {msg}")
                } else {
                    write!(f, "[{provider}] Invalid credentials")
                }
            }
            Self::RecordNotFound {
                provider,
                record_name,
                ..
            } => {
                write!(f, "[{provider}] Record '{record_name}' not found")
            }
            Self::InvalidParameter {
                provider,
                param,
                detail,
            } => {
                write!(f, "[{provider}] Invalid parameter '{param}': {detail}")
            }
            Self::RateLimited {
                provider,
                retry_after,
                ..
            } => {
                if let Some(secs) = retry_after {
                    write!(f, "[{provider}] Rate limited (retry after {secs}s)")
                } else {
                    write!(f, "[{provider}] Rate limited")
                }
            }
            Self::Timeout { provider, detail } => {
                write!(f, "[{provider}] Request timeout: {detail}")
            }
            Self::DomainNotFound {
                provider,
                domain,
                raw_message,
            } => {
                if let Some(msg) = raw_message {
                    write!(f, "[{provider}] Domain '{domain}' not found: {msg}")
                } else {
                    write!(f, "[{provider}] Domain '{domain}' not found")
                }
            }
            Self::PermissionDenied {
                provider,
                raw_message,
            } => {
                if let Some(msg) = raw_message {
                    write!(f, "[{provider}] Permission denied: {msg}")
                } else {
                    write!(f, "[{provider}] Permission denied")
                }
            }
            Self::ParseError { provider, detail } => {
                write!(f, "[{provider}] Parse error: {detail}")
            }
            Self::SerializationError { provider, detail } => {
                write!(f, "[{provider}] Serialization error: {detail}")
            }
            Self::Unknown {
                provider,
                raw_message,
                ..
            } => {
                write!(f, "[{provider}] {raw_message}")
            }
        }
    }
}

impl std::error::Error for ProviderError {}

/// Convenience type alias for `Result<T, ProviderError>`.
pub type Result<T> = std::result::Result<T, ProviderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_network_error() {
        let e = ProviderError::NetworkError {
            provider: "test".to_string(),
            detail: "connection refused".to_string(),
        };
        assert_eq!(e.to_string(), "[test] Network error: connection refused");
    }

    #[test]
    fn display_invalid_credentials_with_message() {
        let e = ProviderError::InvalidCredentials {
            provider: "godaddy".to_string(),
            raw_message: Some("bad key".to_string()),
        };
        assert_eq!(e.to_string(), "[godaddy] Invalid credentials: bad key");
    }

    #[test]
    fn display_invalid_credentials_without_message() {
        let e = ProviderError::InvalidCredentials {
            provider: "godaddy".to_string(),
            raw_message: None,
        };
        assert_eq!(e.to_string(), "[godaddy] Invalid credentials");
    }

    #[test]
    fn display_record_not_found() {
        let e = ProviderError::RecordNotFound {
            provider: "godaddy".to_string(),
            record_name: "www".to_string(),
            raw_message: None,
        };
        assert_eq!(e.to_string(), "[godaddy] Record 'www' not found");
    }

    #[test]
    fn display_invalid_parameter() {
        let e = ProviderError::InvalidParameter {
            provider: "test".to_string(),
            param: "ttl".to_string(),
            detail: "must be > 0".to_string(),
        };
        assert_eq!(e.to_string(), "[test] Invalid parameter 'ttl': must be > 0");
    }

    #[test]
    fn display_rate_limited_with_retry() {
        let e = ProviderError::RateLimited {
            provider: "godaddy".to_string(),
            retry_after: Some(30),
            raw_message: None,
        };
        assert_eq!(e.to_string(), "[godaddy] Rate limited (retry after 30s)");
    }

    #[test]
    fn display_rate_limited_without_retry() {
        let e = ProviderError::RateLimited {
            provider: "godaddy".to_string(),
            retry_after: None,
            raw_message: None,
        };
        assert_eq!(e.to_string(), "[godaddy] Rate limited");
    }

    #[test]
    fn display_timeout() {
        let e = ProviderError::Timeout {
            provider: "test".to_string(),
            detail: "30s elapsed".to_string(),
        };
        assert_eq!(e.to_string(), "[test] Request timeout: 30s elapsed");
    }

    #[test]
    fn display_domain_not_found() {
        let e = ProviderError::DomainNotFound {
            provider: "test".to_string(),
            domain: "example.com".to_string(),
            raw_message: None,
        };
        assert_eq!(e.to_string(), "[test] Domain 'example.com' not found");
    }

    #[test]
    fn display_unknown() {
        let e = ProviderError::Unknown {
            provider: "test".to_string(),
            raw_code: Some("422".to_string()),
            raw_message: "something broke".to_string(),
        };
        assert_eq!(e.to_string(), "[test] something broke");
    }

    #[test]
    fn serialize_json_tagged_by_code() {
        let e = ProviderError::RateLimited {
            provider: "godaddy".to_string(),
            retry_after: Some(60),
            raw_message: Some("too many requests".to_string()),
        };
        let json = serde_json::to_string(&e).unwrap();
        assert!(json.contains("\"code\":\"RateLimited\""));
        assert!(json.contains("\"retry_after\":60"));
    }

    #[test]
    fn deserialize_all_variants() {
        let variants: Vec<ProviderError> = vec![
            ProviderError::NetworkError {
                provider: "t".into(),
                detail: "d".into(),
            },
            ProviderError::InvalidCredentials {
                provider: "t".into(),
                raw_message: None,
            },
            ProviderError::RecordNotFound {
                provider: "t".into(),
                record_name: "www".into(),
                raw_message: None,
            },
            ProviderError::InvalidParameter {
                provider: "t".into(),
                param: "ttl".into(),
                detail: "bad".into(),
            },
            ProviderError::RateLimited {
                provider: "t".into(),
                retry_after: Some(30),
                raw_message: None,
            },
            ProviderError::Timeout {
                provider: "t".into(),
                detail: "30s".into(),
            },
            ProviderError::DomainNotFound {
                provider: "t".into(),
                domain: "x.com".into(),
                raw_message: None,
            },
            ProviderError::PermissionDenied {
                provider: "t".into(),
                raw_message: None,
            },
            ProviderError::ParseError {
                provider: "t".into(),
                detail: "bad".into(),
            },
            ProviderError::SerializationError {
                provider: "t".into(),
                detail: "fail".into(),
            },
            ProviderError::Unknown {
                provider: "t".into(),
                raw_code: Some("E1".into()),
                raw_message: "oops".into(),
            },
        ];

        for v in &variants {
            let json = serde_json::to_string(v).unwrap();
            let back: ProviderError = serde_json::from_str(&json).unwrap();
            assert_eq!(back.to_string(), v.to_string());
        }
    }

    #[test]
    fn is_retryable_variants() {
        assert!(
            ProviderError::NetworkError {
                provider: "t".into(),
                detail: "x".into(),
            }
            .is_retryable()
        );
        assert!(
            ProviderError::Timeout {
                provider: "t".into(),
                detail: "x".into(),
            }
            .is_retryable()
        );
        assert!(
            ProviderError::RateLimited {
                provider: "t".into(),
                retry_after: None,
                raw_message: None,
            }
            .is_retryable()
        );
        assert!(
            !ProviderError::InvalidCredentials {
                provider: "t".into(),
                raw_message: None,
            }
            .is_retryable()
        );
        assert!(
            !ProviderError::DomainNotFound {
                provider: "t".into(),
                domain: "x".into(),
                raw_message: None,
            }
            .is_retryable()
        );
        assert!(
            !ProviderError::ParseError {
                provider: "t".into(),
                detail: "x".into(),
            }
            .is_retryable()
        );
    }

    #[test]
    fn is_expected_variants() {
        assert!(
            ProviderError::InvalidCredentials {
                provider: "t".into(),
                raw_message: None,
            }
            .is_expected()
        );
        assert!(
            ProviderError::DomainNotFound {
                provider: "t".into(),
                domain: "x".into(),
                raw_message: None,
            }
            .is_expected()
        );
        assert!(
            !ProviderError::NetworkError {
                provider: "t".into(),
                detail: "x".into(),
            }
            .is_expected()
        );
        assert!(
            !ProviderError::Unknown {
                provider: "t".into(),
                raw_code: None,
                raw_message: "x".into(),
            }
            .is_expected()
        );
    }
}
