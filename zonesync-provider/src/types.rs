//! Shared types for remote DNS providers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Minimum TTL accepted by the remote API, in seconds.
///
/// Every record sent to the remote is clamped to at least this value.
pub const MIN_TTL: u32 = 600;

/// Clamp a TTL to the remote API minimum.
#[must_use]
pub fn clamp_ttl(ttl: u32) -> u32 {
    ttl.max(MIN_TTL)
}

/// DNS record types handled by the sync engine.
///
/// NS and SOA are recognized on reads so they can be filtered out, but are
/// never written.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum DnsRecordType {
    A,
    Aaaa,
    Cname,
    Mx,
    Txt,
    Ns,
    Srv,
    Caa,
}

impl DnsRecordType {
    /// Uppercase wire representation, as used in API paths and bodies.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::A => "A",
            Self::Aaaa => "AAAA",
            Self::Cname => "CNAME",
            Self::Mx => "MX",
            Self::Txt => "TXT",
            Self::Ns => "NS",
            Self::Srv => "SRV",
            Self::Caa => "CAA",
        }
    }

    /// Parse an uppercase type string from the API.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "A" => Some(Self::A),
            "AAAA" => Some(Self::Aaaa),
            "CNAME" => Some(Self::Cname),
            "MX" => Some(Self::Mx),
            "TXT" => Some(Self::Txt),
            "NS" => Some(Self::Ns),
            "SRV" => Some(Self::Srv),
            "CAA" => Some(Self::Caa),
            _ => None,
        }
    }

    /// Whether the type carries a priority field on the wire (MX and SRV only).
    #[must_use]
    pub fn has_priority(&self) -> bool {
        matches!(self, Self::Mx | Self::Srv)
    }
}

impl std::fmt::Display for DnsRecordType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a record set: one (type, name) pair.
///
/// The remote API replaces record sets wholesale per key, so all diffing and
/// conflict handling happens at this granularity. Ordering is type first,
/// then name, which keeps plan output deterministic.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordKey {
    /// Record type.
    #[serde(rename = "type")]
    pub record_type: DnsRecordType,
    /// Relative record name (`@` for the apex).
    pub name: String,
}

impl RecordKey {
    #[must_use]
    pub fn new(record_type: DnsRecordType, name: impl Into<String>) -> Self {
        Self {
            record_type,
            name: name.into(),
        }
    }
}

impl std::fmt::Display for RecordKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.record_type, self.name)
    }
}

/// A single DNS record as seen by the provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProviderRecord {
    /// Record type.
    #[serde(rename = "type")]
    pub record_type: DnsRecordType,
    /// Relative record name (`@` for the apex).
    pub name: String,
    /// Record value (address, target host, text payload).
    pub value: String,
    /// TTL in seconds.
    pub ttl: u32,
    /// Priority, for MX and SRV records.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<u16>,
}

impl ProviderRecord {
    /// The (type, name) key this record belongs to.
    #[must_use]
    pub fn key(&self) -> RecordKey {
        RecordKey::new(self.record_type, self.name.clone())
    }
}

/// Domain status as reported by the registrar.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DomainStatus {
    Active,
    Pending,
    Expired,
    Cancelled,
    Unknown,
}

/// A domain owned by the remote account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderDomain {
    /// Domain name.
    pub name: String,
    /// Registrar status.
    pub status: DomainStatus,
    /// Expiration date, if reported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    /// Whether auto-renew is enabled at the registrar.
    pub auto_renew: bool,
}

/// Remote API environment.
///
/// OTE is GoDaddy's test environment; credentials are environment-specific.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ApiEnvironment {
    #[default]
    Production,
    Ote,
}

impl ApiEnvironment {
    /// Base URL for API requests in this environment.
    #[must_use]
    pub fn base_url(&self) -> &'static str {
        match self {
            Self::Production => "https://api.godaddy.com/v1",
            Self::Ote => "https://api.ote-godaddy.com/v1",
        }
    }
}

/// Input field type for credential forms.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Password,
}

/// Describes one credential field a provider requires.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderCredentialField {
    /// Field identifier (e.g. `api_key`).
    pub name: &'static str,
    /// Human-readable label.
    pub label: &'static str,
    /// Input type.
    pub field_type: FieldType,
}

/// Static metadata describing a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderMetadata {
    /// Provider identifier (e.g. `godaddy`).
    pub id: &'static str,
    /// Display name.
    pub name: &'static str,
    /// Credential fields the provider requires.
    pub credential_fields: Vec<ProviderCredentialField>,
}

/// Structured credential validation failure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CredentialValidationError {
    /// A required field is missing.
    MissingField { field: String },
    /// A required field is present but empty.
    EmptyField { field: String },
    /// A field fails format validation.
    InvalidFormat { field: String, reason: String },
}

impl std::fmt::Display for CredentialValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingField { field } => write!(f, "Missing credential field '{field}'"),
            Self::EmptyField { field } => write!(f, "Credential field '{field}' is empty"),
            Self::InvalidFormat { field, reason } => {
                write!(f, "Credential field '{field}' is invalid: {reason}")
            }
        }
    }
}

impl std::error::Error for CredentialValidationError {}

/// Minimum length for API key/secret fields.
const MIN_CREDENTIAL_LEN: usize = 10;

/// Typed provider credentials, tagged by provider id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum ProviderCredentials {
    Godaddy {
        /// API key from the developer portal.
        api_key: String,
        /// API secret paired with the key.
        api_secret: String,
        /// Target environment; defaults to production.
        #[serde(default)]
        environment: ApiEnvironment,
    },
}

impl ProviderCredentials {
    /// Provider identifier for this credential variant.
    #[must_use]
    pub fn provider_id(&self) -> &'static str {
        match self {
            Self::Godaddy { .. } => "godaddy",
        }
    }

    /// Validate credential fields locally (presence and length only).
    ///
    /// Remote validity is checked separately via
    /// [`DnsProvider::validate_credentials`](crate::DnsProvider::validate_credentials).
    pub fn validate(&self) -> std::result::Result<(), CredentialValidationError> {
        match self {
            Self::Godaddy {
                api_key,
                api_secret,
                ..
            } => {
                validate_secret_field("api_key", api_key)?;
                validate_secret_field("api_secret", api_secret)?;
                Ok(())
            }
        }
    }
}

fn validate_secret_field(
    field: &str,
    value: &str,
) -> std::result::Result<(), CredentialValidationError> {
    if value.is_empty() {
        return Err(CredentialValidationError::EmptyField {
            field: field.to_string(),
        });
    }
    if value.len() < MIN_CREDENTIAL_LEN {
        return Err(CredentialValidationError::InvalidFormat {
            field: field.to_string(),
            reason: format!("must be at least {MIN_CREDENTIAL_LEN} characters"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_type_serializes_uppercase() {
        let json = serde_json::to_string(&DnsRecordType::Aaaa).unwrap();
        assert_eq!(json, "\"AAAA\"");
        let back: DnsRecordType = serde_json::from_str("\"CNAME\"").unwrap();
        assert_eq!(back, DnsRecordType::Cname);
    }

    #[test]
    fn record_type_parse_round_trip() {
        for t in [
            DnsRecordType::A,
            DnsRecordType::Aaaa,
            DnsRecordType::Cname,
            DnsRecordType::Mx,
            DnsRecordType::Txt,
            DnsRecordType::Ns,
            DnsRecordType::Srv,
            DnsRecordType::Caa,
        ] {
            assert_eq!(DnsRecordType::parse(t.as_str()), Some(t));
        }
        assert_eq!(DnsRecordType::parse("LOC"), None);
    }

    #[test]
    fn priority_only_for_mx_and_srv() {
        assert!(DnsRecordType::Mx.has_priority());
        assert!(DnsRecordType::Srv.has_priority());
        assert!(!DnsRecordType::A.has_priority());
        assert!(!DnsRecordType::Txt.has_priority());
    }

    #[test]
    fn ttl_clamped_to_minimum() {
        assert_eq!(clamp_ttl(0), 600);
        assert_eq!(clamp_ttl(599), 600);
        assert_eq!(clamp_ttl(600), 600);
        assert_eq!(clamp_ttl(3600), 3600);
    }

    #[test]
    fn record_key_orders_type_then_name() {
        let a_www = RecordKey::new(DnsRecordType::A, "www");
        let a_mail = RecordKey::new(DnsRecordType::A, "mail");
        let mx_apex = RecordKey::new(DnsRecordType::Mx, "@");
        assert!(a_mail < a_www);
        assert!(a_www < mx_apex);
    }

    #[test]
    fn provider_record_key() {
        let record = ProviderRecord {
            record_type: DnsRecordType::Mx,
            name: "@".to_string(),
            value: "mail.example.com".to_string(),
            ttl: 3600,
            priority: Some(10),
        };
        assert_eq!(record.key(), RecordKey::new(DnsRecordType::Mx, "@"));
    }

    #[test]
    fn provider_record_omits_absent_priority() {
        let record = ProviderRecord {
            record_type: DnsRecordType::A,
            name: "www".to_string(),
            value: "203.0.113.10".to_string(),
            ttl: 600,
            priority: None,
        };
        let json = serde_json::to_string(&record).unwrap();
        assert!(!json.contains("priority"));
    }

    #[test]
    fn environment_base_urls() {
        assert_eq!(
            ApiEnvironment::Production.base_url(),
            "https://api.godaddy.com/v1"
        );
        assert_eq!(
            ApiEnvironment::Ote.base_url(),
            "https://api.ote-godaddy.com/v1"
        );
    }

    #[test]
    fn environment_default_is_production() {
        assert_eq!(ApiEnvironment::default(), ApiEnvironment::Production);
    }

    #[test]
    fn credentials_deserialize_without_environment() {
        let json = r#"{"provider":"godaddy","api_key":"key-1234567890","api_secret":"secret-1234567890"}"#;
        let creds: ProviderCredentials = serde_json::from_str(json).unwrap();
        let ProviderCredentials::Godaddy { environment, .. } = creds;
        assert_eq!(environment, ApiEnvironment::Production);
    }

    #[test]
    fn credentials_validate_ok() {
        let creds = ProviderCredentials::Godaddy {
            api_key: "key-1234567890".to_string(),
            api_secret: "secret-1234567890".to_string(),
            environment: ApiEnvironment::Production,
        };
        assert!(creds.validate().is_ok());
    }

    #[test]
    fn credentials_validate_empty_key() {
        let creds = ProviderCredentials::Godaddy {
            api_key: String::new(),
            api_secret: "secret-1234567890".to_string(),
            environment: ApiEnvironment::Production,
        };
        assert_eq!(
            creds.validate(),
            Err(CredentialValidationError::EmptyField {
                field: "api_key".to_string()
            })
        );
    }

    #[test]
    fn credentials_validate_short_secret() {
        let creds = ProviderCredentials::Godaddy {
            api_key: "key-1234567890".to_string(),
            api_secret: "short".to_string(),
            environment: ApiEnvironment::Ote,
        };
        assert!(matches!(
            creds.validate(),
            Err(CredentialValidationError::InvalidFormat { field, .. }) if field == "api_secret"
        ));
    }
}
