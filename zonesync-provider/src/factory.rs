//! Provider factory functions and metadata.

use std::sync::Arc;

use crate::budget::RequestBudget;
use crate::error::Result;
use crate::godaddy::GodaddyProvider;
use crate::traits::DnsProvider;
use crate::types::{ProviderCredentials, ProviderMetadata};

/// Creates a [`DnsProvider`] instance from the given credentials.
///
/// The concrete provider type is determined by the [`ProviderCredentials`]
/// variant. Every provider created from the same `budget` shares one request
/// allowance, which is what keeps concurrent workers inside the remote API's
/// account-wide rate limit.
///
/// # Examples
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use zonesync_provider::{create_provider, ApiEnvironment, ProviderCredentials, RequestBudget};
///
/// let budget = Arc::new(RequestBudget::default());
/// let provider = create_provider(
///     ProviderCredentials::Godaddy {
///         api_key: "your-key".to_string(),
///         api_secret: "your-secret".to_string(),
///         environment: ApiEnvironment::Production,
///     },
///     budget,
/// ).unwrap();
/// ```
pub fn create_provider(
    credentials: ProviderCredentials,
    budget: Arc<RequestBudget>,
) -> Result<Arc<dyn DnsProvider>> {
    match credentials {
        ProviderCredentials::Godaddy {
            api_key,
            api_secret,
            environment,
        } => Ok(Arc::new(GodaddyProvider::new(
            api_key,
            api_secret,
            environment,
            budget,
        ))),
    }
}

/// Returns metadata for all available providers.
pub fn get_all_provider_metadata() -> Vec<ProviderMetadata> {
    vec![GodaddyProvider::provider_metadata()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ApiEnvironment;

    #[test]
    fn creates_godaddy_provider() {
        let budget = Arc::new(RequestBudget::default());
        let result = create_provider(
            ProviderCredentials::Godaddy {
                api_key: "key-1234567890".to_string(),
                api_secret: "secret-1234567890".to_string(),
                environment: ApiEnvironment::Production,
            },
            budget,
        );
        let Ok(provider) = result else {
            unreachable!("factory failed");
        };
        assert_eq!(provider.id(), "godaddy");
    }

    #[test]
    fn metadata_lists_godaddy() {
        let all = get_all_provider_metadata();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, "godaddy");
        assert_eq!(all[0].credential_fields.len(), 2);
    }
}
