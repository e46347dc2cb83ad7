//! Shared HTTP client and header helpers.

use std::sync::OnceLock;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};

use crate::error::{ApiError, Result};

/// Request timeout applied by [`default_client`].
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Header carrying the Volvo developer-portal API key.
pub const API_KEY_HEADER: &str = "vcc-api-key";

static SHARED_CLIENT: OnceLock<reqwest::Client> = OnceLock::new();

/// Get (or create) the shared pooled reqwest client.
pub fn default_client() -> reqwest::Client {
    SHARED_CLIENT
        .get_or_init(|| {
            reqwest::Client::builder()
                .timeout(DEFAULT_TIMEOUT)
                .pool_max_idle_per_host(4)
                .build()
                .unwrap_or_else(|err| {
                    tracing::warn!(error = %err, "falling back to default HTTP client");
                    reqwest::Client::new()
                })
        })
        .clone()
}

/// Headers for an authenticated vehicle API request.
///
/// A token or key that cannot be sent as a header value is a
/// configuration error; the value itself is left out of the message.
pub fn vehicle_headers(access_token: &str, api_key: &str) -> Result<HeaderMap> {
    let bearer = HeaderValue::from_str(&format!("Bearer {access_token}")).map_err(|_| {
        ApiError::Configuration("access token is not a valid header value".to_string())
    })?;
    let key = HeaderValue::from_str(api_key)
        .map_err(|_| ApiError::Configuration("API key is not a valid header value".to_string()))?;

    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(AUTHORIZATION, bearer);
    headers.insert(API_KEY_HEADER, key);
    Ok(headers)
}

/// Read a response body as text for error reporting.
///
/// A body that cannot be read is reported inline rather than masking the
/// status code the caller already has.
pub async fn read_body(response: reqwest::Response) -> String {
    match response.text().await {
        Ok(body) => body,
        Err(err) => format!("<unreadable body: {err}>"),
    }
}
