//! Request pipeline orchestration.
//!
//! The client facade intentionally remains small:
//! - bearer resolution is delegated to `auth`.
//! - dispatch wiring is delegated to `transport`.
//! - public-endpoint rules live in `policy` one level up.
//!
//! Recovery policy: a 401 on a protected request triggers one refresh and
//! one replay of the original request, nothing more. Every other failure
//! (403, 404, 429, 5xx, timeouts) is classified and handed back to the
//! caller untouched.

mod auth;
mod transport;

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::api::policy;
use crate::auth::notify::SessionNotifier;
use crate::auth::refresh::RefreshCoordinator;
use crate::auth::store::TokenStore;
use crate::config::Config;
use crate::error::ApiError;

/// Authenticated JSON client for the learning-platform API.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    store: Arc<dyn TokenStore>,
    refresher: Arc<RefreshCoordinator>,
    expiry_buffer: Duration,
}

impl ApiClient {
    /// Build a client from resolved configuration.
    ///
    /// The refresh coordinator gets its own HTTP client with the shorter
    /// exchange timeout; both share the injected store and notifier.
    pub fn new(
        config: &Config,
        store: Arc<dyn TokenStore>,
        notifier: Arc<SessionNotifier>,
    ) -> Self {
        Self::with_request_timeout(config, store, notifier, config.request_timeout())
    }

    fn with_request_timeout(
        config: &Config,
        store: Arc<dyn TokenStore>,
        notifier: Arc<SessionNotifier>,
        request_timeout: Duration,
    ) -> Self {
        let base_url = config.api.base_url.trim_end_matches('/').to_string();
        let refresher = Arc::new(RefreshCoordinator::new(
            &base_url,
            Arc::clone(&store),
            notifier,
            config.refresh_exchange_timeout(),
        ));
        Self {
            http: transport::build_http_client(request_timeout),
            base_url,
            store,
            refresher,
            expiry_buffer: config.expiry_buffer(),
        }
    }

    /// The credential store this client reads tokens from.
    pub fn token_store(&self) -> &Arc<dyn TokenStore> {
        &self.store
    }

    /// The refresh coordinator serializing exchanges for this client.
    pub fn refresher(&self) -> &Arc<RefreshCoordinator> {
        &self.refresher
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request_json(reqwest::Method::GET, path, None).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let payload = encode_body(body)?;
        self.request_json(reqwest::Method::POST, path, Some(payload))
            .await
    }

    pub async fn put<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let payload = encode_body(body)?;
        self.request_json(reqwest::Method::PUT, path, Some(payload))
            .await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request_json(reqwest::Method::DELETE, path, None).await
    }

    async fn request_json<T: DeserializeOwned>(
        &self,
        method: reqwest::Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<T, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        let bearer =
            auth::resolve_bearer(&self.store, &self.refresher, self.expiry_buffer, path).await?;

        let result = transport::send_request(
            &self.http,
            method.clone(),
            &url,
            body.as_ref(),
            bearer.as_deref(),
        )
        .await;

        let response = match result {
            Err(err) if err.is_unauthorized() && !policy::is_public_path(path) => {
                // One refresh, one replay. When another flow already has an
                // exchange in flight this joins its queue and replays with
                // whatever token that cycle produced. A second 401 below
                // propagates as-is, never a second refresh from here.
                let rotated = self.refresher.refresh_access_token().await?;
                transport::send_request(
                    &self.http,
                    method,
                    &url,
                    body.as_ref(),
                    Some(rotated.access_token.as_str()),
                )
                .await?
            }
            other => other?,
        };

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|err| {
            ApiError::InvalidResponse(format!("failed to decode response body: {err}"))
        })
    }
}

fn encode_body<B: Serialize>(body: &B) -> Result<serde_json::Value, ApiError> {
    serde_json::to_value(body)
        .map_err(|err| ApiError::InvalidResponse(format!("failed to encode request body: {err}")))
}
