//! Shared HTTP client construction and response checks.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use crate::error::{InsighterError, Result};

/// Header that scopes every request to a tenant.
pub const TENANT_HEADER: &str = "x-current-tenant";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Build the HTTP client a session uses unless one is supplied.
pub fn default_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .pool_max_idle_per_host(10)
        .build()
        .map_err(InsighterError::from)
}

/// Default headers merged into every session request.
pub fn default_headers(tenant: Option<&str>) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    if let Some(tenant) = tenant {
        let value = HeaderValue::from_str(tenant).map_err(|e| {
            InsighterError::Configuration(format!("invalid tenant header value {tenant:?}: {e}"))
        })?;
        headers.insert(HeaderName::from_static(TENANT_HEADER), value);
    }
    Ok(headers)
}

/// Pass a 2xx response through; turn anything else into [`InsighterError::Http`].
pub async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let url = response.url().to_string();
    let body = response.text().await.unwrap_or_default();
    tracing::debug!(status = status.as_u16(), url = %url, "Request failed");
    Err(InsighterError::http(status.as_u16(), url, body))
}

/// Read a JSON body, reporting undecodable payloads as invalid responses.
pub async fn read_json<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let url = response.url().to_string();
    let body = response.text().await?;
    serde_json::from_str(&body)
        .map_err(|e| InsighterError::InvalidResponse(format!("{url}: {e}")))
}
