//! GoDaddy DNS provider.

mod http;
mod provider;
mod types;

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;

use crate::budget::RequestBudget;
use crate::retry::RetryPolicy;
use crate::types::{
    ApiEnvironment, FieldType, ProviderCredentialField, ProviderMetadata,
};

pub(crate) use types::{GdDomain, GdErrorBody, GdRecord};

pub(crate) const PROVIDER_ID: &str = "godaddy";

/// Per-request timeout against the GoDaddy API.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// GoDaddy DNS provider.
///
/// Authenticates with a static `sso-key` header. All requests flow through
/// the shared [`RequestBudget`] and the crate retry policy.
pub struct GodaddyProvider {
    pub(crate) client: Client,
    pub(crate) api_key: String,
    pub(crate) api_secret: String,
    pub(crate) base_url: &'static str,
    pub(crate) budget: Arc<RequestBudget>,
    pub(crate) retry: RetryPolicy,
}

impl GodaddyProvider {
    #[must_use]
    pub fn new(
        api_key: String,
        api_secret: String,
        environment: ApiEnvironment,
        budget: Arc<RequestBudget>,
    ) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            api_key,
            api_secret,
            base_url: environment.base_url(),
            budget,
            retry: RetryPolicy::default(),
        }
    }

    /// Static provider metadata (id, display name, credential fields).
    #[must_use]
    pub fn provider_metadata() -> ProviderMetadata {
        ProviderMetadata {
            id: PROVIDER_ID,
            name: "GoDaddy",
            credential_fields: vec![
                ProviderCredentialField {
                    name: "api_key",
                    label: "API Key",
                    field_type: FieldType::Text,
                },
                ProviderCredentialField {
                    name: "api_secret",
                    label: "API Secret",
                    field_type: FieldType::Password,
                },
            ],
        }
    }
}
