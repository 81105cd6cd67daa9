//! GoDaddy HTTP request methods.

use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{ProviderError, Result};
use crate::http::HttpUtils;

use super::{GdErrorBody, GodaddyProvider, PROVIDER_ID};

impl GodaddyProvider {
    fn auth_header(&self) -> String {
        format!("sso-key {}:{}", self.api_key, self.api_secret)
    }

    /// Execute one API call: budget permit, auth header, retry on transient
    /// failures. Returns the status and body of the final attempt.
    async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<(u16, String)> {
        let url = format!("{}{}", self.base_url, path);
        self.retry
            .run(PROVIDER_ID, path, || async {
                self.budget.acquire(PROVIDER_ID).await?;
                let mut builder = self
                    .client
                    .request(method.clone(), &url)
                    .header("Authorization", self.auth_header());
                if let Some(json) = body {
                    builder = builder.json(json);
                }
                HttpUtils::execute_request(builder, PROVIDER_ID, method.as_str(), &url).await
            })
            .await
    }

    /// Map a non-2xx API status to a structured error.
    pub(crate) fn map_error(&self, status: u16, body: &str, domain: Option<&str>) -> ProviderError {
        let parsed: GdErrorBody = serde_json::from_str(body).unwrap_or_default();
        let message = parsed.message;
        match status {
            400 | 422 => ProviderError::InvalidParameter {
                provider: PROVIDER_ID.to_string(),
                param: parsed.code.unwrap_or_else(|| "request".to_string()),
                detail: message.unwrap_or_else(|| format!("HTTP {status}")),
            },
            401 => ProviderError::InvalidCredentials {
                provider: PROVIDER_ID.to_string(),
                raw_message: message,
            },
            403 => ProviderError::PermissionDenied {
                provider: PROVIDER_ID.to_string(),
                raw_message: message,
            },
            404 => ProviderError::DomainNotFound {
                provider: PROVIDER_ID.to_string(),
                domain: domain.unwrap_or("unknown").to_string(),
                raw_message: message,
            },
            _ => ProviderError::Unknown {
                provider: PROVIDER_ID.to_string(),
                raw_code: parsed.code.or_else(|| Some(status.to_string())),
                raw_message: message.unwrap_or_else(|| format!("HTTP {status}")),
            },
        }
    }

    /// GET a JSON document.
    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        domain: Option<&str>,
    ) -> Result<T> {
        let (status, text) = self.execute(Method::GET, path, None).await?;
        if !(200..300).contains(&status) {
            return Err(self.map_error(status, &text, domain));
        }
        HttpUtils::parse_json(&text, PROVIDER_ID)
    }

    /// Send a JSON body with the given method; the response body is discarded.
    pub(crate) async fn send_json<B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: &B,
        domain: Option<&str>,
    ) -> Result<()> {
        let json =
            serde_json::to_value(body).map_err(|e| ProviderError::SerializationError {
                provider: PROVIDER_ID.to_string(),
                detail: e.to_string(),
            })?;
        let (status, text) = self.execute(method, path, Some(&json)).await?;
        if !(200..300).contains(&status) {
            return Err(self.map_error(status, &text, domain));
        }
        Ok(())
    }
}
