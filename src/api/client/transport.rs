//! HTTP dispatch helpers for the request pipeline.

use crate::api::parse_retry_after_secs;
use crate::error::ApiError;
use std::time::Duration;

/// Build an HTTP client with timeout applied.
pub(super) fn build_http_client(timeout: Duration) -> reqwest::Client {
    // Fall back to reqwest defaults if builder creation fails for any reason.
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

/// Send one request, attaching the bearer credential when present.
///
/// Non-2xx statuses come back as [`ApiError::Status`] with any `Retry-After`
/// value parsed out; transport failures surface as [`ApiError::Http`]. The
/// caller decides what, if anything, is retried.
pub(super) async fn send_request(
    http: &reqwest::Client,
    method: reqwest::Method,
    url: &str,
    body: Option<&serde_json::Value>,
    bearer: Option<&str>,
) -> Result<reqwest::Response, ApiError> {
    let mut request = http.request(method, url);
    if let Some(token) = bearer.filter(|value| !value.trim().is_empty()) {
        request = request.header(
            reqwest::header::AUTHORIZATION,
            format!("Bearer {token}"),
        );
    }
    if let Some(payload) = body {
        request = request.json(payload);
    }

    let response = request.send().await?;
    if !response.status().is_success() {
        let status = response.status().as_u16();
        let retry_after_secs = parse_retry_after_secs(response.headers());
        let body = response.text().await.unwrap_or_default();
        return Err(ApiError::status(status, body, retry_after_secs));
    }
    Ok(response)
}
