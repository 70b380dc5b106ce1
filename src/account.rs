//! Session lifecycle operations: login, register, logout, profile.
//!
//! These sit above the request pipeline and are the only writers of the
//! credential store besides the refresh coordinator. Login and register go
//! out unauthenticated (public endpoints); logout and profile lookups ride
//! the full pipeline.

use serde::Deserialize;

use crate::api::ApiClient;
use crate::auth::types::{unix_now_millis, TokenSet};
use crate::error::ClientError;

/// Wire shape of the `POST /auth/login` response.
#[derive(Debug, Deserialize)]
struct LoginResponse {
    access_token: Option<String>,
    refresh_token: Option<String>,
    token_type: Option<String>,
    expires_in: Option<u64>,
}

/// Sign in and persist the received credential pair.
///
/// The pair is only stored after both tokens validate as non-empty, and is
/// stored as one atomic record with `issued_at` stamped client-side.
pub async fn login(api: &ApiClient, email: &str, password: &str) -> Result<TokenSet, ClientError> {
    let payload = serde_json::json!({
        "email": email.trim().to_lowercase(),
        "password": password,
    });
    let response: LoginResponse = api.post("/auth/login", &payload).await?;

    let access_token = response.access_token.unwrap_or_default().trim().to_string();
    if access_token.is_empty() {
        return Err(ClientError::Invalid(
            "login response did not include access_token".to_string(),
        ));
    }
    let refresh_token = response
        .refresh_token
        .unwrap_or_default()
        .trim()
        .to_string();
    if refresh_token.is_empty() {
        return Err(ClientError::Invalid(
            "login response did not include refresh_token".to_string(),
        ));
    }

    let pair = TokenSet::issued_now(
        access_token,
        refresh_token,
        response.token_type,
        response.expires_in,
        unix_now_millis(),
    );
    api.token_store().set_all(&pair).await?;
    tracing::info!("login succeeded; credentials persisted");
    Ok(pair)
}

/// Create an account. Returns the created profile as the server sent it.
pub async fn register(
    api: &ApiClient,
    name: &str,
    email: &str,
    password: &str,
) -> Result<serde_json::Value, ClientError> {
    let payload = serde_json::json!({
        "name": name.trim(),
        "email": email.trim().to_lowercase(),
        "password": password,
    });
    Ok(api.post("/auth/register", &payload).await?)
}

/// Fetch the authenticated user's profile.
pub async fn me(api: &ApiClient) -> Result<serde_json::Value, ClientError> {
    Ok(api.get("/auth/me").await?)
}

/// Sign out: best-effort server-side logout, unconditional local clearing.
///
/// A failed or unreachable server never leaves credentials behind: the
/// local record is removed regardless of the remote outcome.
pub async fn logout(api: &ApiClient) -> Result<(), ClientError> {
    if let Err(err) = api
        .post::<serde_json::Value, _>("/auth/logout", &serde_json::json!({}))
        .await
    {
        tracing::warn!(err = %err, "server-side logout failed; clearing local credentials anyway");
    }
    api.token_store().clear().await?;
    tracing::info!("logged out; local credentials cleared");
    Ok(())
}
