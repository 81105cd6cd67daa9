//! Domain catalog types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use zonesync_provider::DomainStatus;

/// How a domain is hosted relative to this server.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HostingClass {
    /// An apex address record points at this server's IP.
    ServerHosted,
    /// Address records exist but point elsewhere.
    External,
    /// No address records at all.
    Parked,
    /// Not yet classified.
    #[default]
    Unknown,
}

/// Catalog entry for one domain owned by a remote account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainEntry {
    /// Owning account id.
    pub account_id: String,
    /// Domain name.
    pub name: String,
    /// Hosting classification from the last discovery pass.
    pub classification: HostingClass,
    /// Whether an apex address record matches the configured server IP.
    pub points_to_server: bool,
    /// Apex addresses observed during classification.
    #[serde(default)]
    pub detected_ips: Vec<String>,
    /// Whether the scheduler syncs this domain automatically.
    pub auto_sync: bool,
    /// When set, discovery must not overwrite the classification.
    #[serde(default)]
    pub manual_override: bool,
    /// Registrar status.
    pub status: DomainStatus,
    /// Registrar expiration date, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    /// Whether auto-renew is enabled at the registrar.
    pub auto_renew: bool,
    /// Completion time of the last successful sync run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_synced: Option<DateTime<Utc>>,
    /// Time of the last successful classification.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_classified: Option<DateTime<Utc>>,
}

impl DomainEntry {
    /// Fresh entry for a newly discovered domain.
    #[must_use]
    pub fn new(account_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            name: name.into(),
            classification: HostingClass::Unknown,
            points_to_server: false,
            detected_ips: Vec::new(),
            auto_sync: true,
            manual_override: false,
            status: DomainStatus::Unknown,
            expires_at: None,
            auto_renew: false,
            last_synced: None,
            last_classified: None,
        }
    }
}
