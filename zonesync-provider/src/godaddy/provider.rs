//! GoDaddy `DnsProvider` trait implementation.

use async_trait::async_trait;
use reqwest::Method;

use crate::error::{ProviderError, Result};
use crate::traits::DnsProvider;
use crate::types::{
    DnsRecordType, ProviderDomain, ProviderMetadata, ProviderRecord, RecordKey,
};

use super::types::{GdRecordItem, GdRecordSetItem};
use super::{GdDomain, GdRecord, GodaddyProvider, PROVIDER_ID};

impl GodaddyProvider {
    fn record_set_path(&self, domain: &str, key: &RecordKey) -> String {
        format!(
            "/domains/{}/records/{}/{}",
            urlencoding::encode(domain),
            key.record_type.as_str(),
            urlencoding::encode(&key.name)
        )
    }
}

#[async_trait]
impl DnsProvider for GodaddyProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn metadata(&self) -> ProviderMetadata {
        Self::provider_metadata()
    }

    async fn validate_credentials(&self) -> Result<bool> {
        // There is no dedicated auth probe; listing owned domains is the
        // cheapest call that exercises the credentials.
        match self.get_json::<Vec<GdDomain>>("/domains", None).await {
            Ok(_) => Ok(true),
            Err(ProviderError::InvalidCredentials { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn list_domains(&self) -> Result<Vec<ProviderDomain>> {
        let domains: Vec<GdDomain> = self.get_json("/domains", None).await?;
        Ok(domains
            .into_iter()
            .map(GdDomain::into_provider_domain)
            .collect())
    }

    async fn fetch_records(&self, domain: &str) -> Result<Vec<ProviderRecord>> {
        let path = format!("/domains/{}/records", urlencoding::encode(domain));
        let records: Vec<GdRecord> = self.get_json(&path, Some(domain)).await?;
        Ok(records
            .into_iter()
            .filter_map(GdRecord::into_provider_record)
            .filter(|r| r.record_type != DnsRecordType::Ns)
            .collect())
    }

    async fn replace_record_set(
        &self,
        domain: &str,
        key: &RecordKey,
        records: &[ProviderRecord],
    ) -> Result<()> {
        if let Some(stray) = records.iter().find(|r| r.key() != *key) {
            return Err(ProviderError::InvalidParameter {
                provider: PROVIDER_ID.to_string(),
                param: "records".to_string(),
                detail: format!(
                    "record '{} {}' does not belong to set '{key}'",
                    stray.record_type, stray.name
                ),
            });
        }
        if key.record_type == DnsRecordType::Ns {
            return Err(ProviderError::InvalidParameter {
                provider: PROVIDER_ID.to_string(),
                param: "type".to_string(),
                detail: "NS record sets are registrar-managed and cannot be written".to_string(),
            });
        }

        // An empty body deletes the whole set; the API has no DELETE verb
        // for records.
        let body: Vec<GdRecordSetItem> =
            records.iter().map(GdRecordSetItem::from_record).collect();
        let path = self.record_set_path(domain, key);
        self.send_json(Method::PUT, &path, &body, Some(domain)).await
    }

    async fn add_records(&self, domain: &str, records: &[ProviderRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }
        let body: Vec<GdRecordItem> = records.iter().map(GdRecordItem::from_record).collect();
        let path = format!("/domains/{}/records", urlencoding::encode(domain));
        self.send_json(Method::PATCH, &path, &body, Some(domain))
            .await
    }
}
