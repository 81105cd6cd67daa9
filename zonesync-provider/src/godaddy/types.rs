//! GoDaddy API wire types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{
    DnsRecordType, DomainStatus, ProviderDomain, ProviderRecord, clamp_ttl,
};

/// A domain entry from `GET /domains`.
#[derive(Debug, Deserialize)]
pub(crate) struct GdDomain {
    pub domain: String,
    pub status: String,
    #[serde(default)]
    pub expires: Option<DateTime<Utc>>,
    #[serde(default, rename = "renewAuto")]
    pub renew_auto: bool,
}

impl GdDomain {
    pub(crate) fn into_provider_domain(self) -> ProviderDomain {
        // GoDaddy uses compound statuses like CANCELLED_TRANSFER and
        // PENDING_DNS_ACTIVE; match on the leading token.
        let status = match self.status.split('_').next().unwrap_or("") {
            "ACTIVE" => DomainStatus::Active,
            "PENDING" => DomainStatus::Pending,
            "EXPIRED" => DomainStatus::Expired,
            "CANCELLED" => DomainStatus::Cancelled,
            _ => DomainStatus::Unknown,
        };
        ProviderDomain {
            name: self.domain,
            status,
            expires_at: self.expires,
            auto_renew: self.renew_auto,
        }
    }
}

/// A record entry from `GET /domains/{domain}/records`.
#[derive(Debug, Deserialize)]
pub(crate) struct GdRecord {
    pub data: String,
    pub name: String,
    pub ttl: u32,
    #[serde(rename = "type")]
    pub record_type: String,
    #[serde(default)]
    pub priority: Option<u16>,
}

impl GdRecord {
    /// Convert to the provider-neutral record shape.
    ///
    /// Returns `None` for record types outside the sync engine's model
    /// (SOA and other registrar-managed types).
    pub(crate) fn into_provider_record(self) -> Option<ProviderRecord> {
        let record_type = DnsRecordType::parse(&self.record_type)?;
        Some(ProviderRecord {
            record_type,
            name: self.name,
            value: self.data,
            ttl: self.ttl,
            priority: self.priority,
        })
    }
}

/// Record body for `PUT /domains/{domain}/records/{type}/{name}`.
///
/// The key is carried in the path, so only the value set is serialized.
#[derive(Debug, Serialize)]
pub(crate) struct GdRecordSetItem {
    pub data: String,
    pub ttl: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<u16>,
}

impl GdRecordSetItem {
    pub(crate) fn from_record(record: &ProviderRecord) -> Self {
        Self {
            data: record.value.clone(),
            ttl: clamp_ttl(record.ttl),
            priority: record
                .priority
                .filter(|_| record.record_type.has_priority()),
        }
    }
}

/// Record body for `PATCH /domains/{domain}/records`.
#[derive(Debug, Serialize)]
pub(crate) struct GdRecordItem {
    #[serde(rename = "type")]
    pub record_type: &'static str,
    pub name: String,
    pub data: String,
    pub ttl: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<u16>,
}

impl GdRecordItem {
    pub(crate) fn from_record(record: &ProviderRecord) -> Self {
        Self {
            record_type: record.record_type.as_str(),
            name: record.name.clone(),
            data: record.value.clone(),
            ttl: clamp_ttl(record.ttl),
            priority: record
                .priority
                .filter(|_| record.record_type.has_priority()),
        }
    }
}

/// Error body returned by the GoDaddy API.
#[derive(Debug, Deserialize, Default)]
pub(crate) struct GdErrorBody {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}
