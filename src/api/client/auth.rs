//! Bearer resolution for outbound requests.
//!
//! Keeping this separate from the HTTP dispatch flow makes token behavior
//! easy to test and reason about without touching transport logic.

use std::sync::Arc;
use std::time::Duration;

use crate::api::policy;
use crate::auth::refresh::RefreshCoordinator;
use crate::auth::store::TokenStore;
use crate::auth::types::unix_now_millis;
use crate::error::ApiError;

/// Resolve the bearer token for one outbound request.
///
/// Resolution order:
/// 1. Public endpoints carry nothing.
/// 2. A pair close to expiry triggers a pre-emptive refresh, but only when
///    no refresh is already running; a request must not block behind a
///    cycle it did not need. If one is in flight, the current token goes
///    out as-is and the 401 path joins the queue reactively.
/// 3. Otherwise the stored access token, when present.
///
/// An unreadable store counts as "no credential": the request is sent
/// unauthenticated and the 401 path decides what happens next.
pub(super) async fn resolve_bearer(
    store: &Arc<dyn TokenStore>,
    refresher: &RefreshCoordinator,
    expiry_buffer: Duration,
    path: &str,
) -> Result<Option<String>, ApiError> {
    if policy::is_public_path(path) {
        return Ok(None);
    }

    let tokens = match store.get().await {
        Ok(tokens) => tokens,
        Err(err) => {
            tracing::warn!(err = %err, "credential store unreadable; sending request unauthenticated");
            None
        }
    };
    let Some(pair) = tokens else {
        return Ok(None);
    };

    if pair.is_expiring_soon(unix_now_millis(), expiry_buffer) && !refresher.is_refreshing().await
    {
        // Refresh eagerly so requests are not sent with near-expiry
        // credentials; failure here already tore the session down.
        let rotated = refresher.refresh_access_token().await?;
        return Ok(Some(rotated.access_token));
    }

    Ok(Some(pair.access_token))
}
