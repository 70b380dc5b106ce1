//! HTTP layer for the learning-platform API.
//!
//! The API layer is split into cohesive modules:
//! - `policy`: which endpoints are public.
//! - `client`: bearer resolution, dispatch, and 401 recovery.
//!
//! Course/lesson/progress endpoints have no typed surface here on purpose;
//! callers use the generic JSON methods on [`ApiClient`] for those.

mod client;
pub mod policy;

pub use client::ApiClient;

/// Parse a `Retry-After` header value: either delta-seconds or an HTTP-date.
pub(crate) fn parse_retry_after_secs(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    let raw = headers
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim();
    if let Ok(secs) = raw.parse::<u64>() {
        return Some(secs);
    }
    let when = httpdate::parse_http_date(raw).ok()?;
    when.duration_since(std::time::SystemTime::now())
        .ok()
        .map(|delta| delta.as_secs())
}
