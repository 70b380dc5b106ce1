//! Single-flight token refresh coordination.
//!
//! At most one refresh exchange is on the wire at any time. Callers that
//! observe an in-flight refresh queue up as waiters and receive the same
//! outcome the leader got, in the order they arrived. A failed cycle ends
//! the session: the store is cleared and the session notifier fires once.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tokio::sync::{oneshot, Mutex};

use super::notify::SessionNotifier;
use super::store::TokenStore;
use super::types::{unix_now_millis, TokenSet};
use crate::error::RefreshError;

/// Wire shape of the `POST /auth/refresh` response.
#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: Option<String>,
    refresh_token: Option<String>,
    token_type: Option<String>,
    expires_in: Option<u64>,
}

type WaiterTx = oneshot::Sender<Result<TokenSet, RefreshError>>;

/// Coordinator-owned state: the in-flight flag and the waiter queue live
/// under one lock so check-and-set is a single step with no await between.
struct RefreshState {
    refreshing: bool,
    waiters: Vec<WaiterTx>,
}

/// Serializes refresh exchanges for one credential store.
///
/// Constructed once per process and injected into the request pipeline;
/// holds its own HTTP client with the (shorter) exchange timeout.
pub struct RefreshCoordinator {
    http: reqwest::Client,
    refresh_url: String,
    store: Arc<dyn TokenStore>,
    notifier: Arc<SessionNotifier>,
    state: Mutex<RefreshState>,
}

impl RefreshCoordinator {
    pub fn new(
        base_url: &str,
        store: Arc<dyn TokenStore>,
        notifier: Arc<SessionNotifier>,
        exchange_timeout: Duration,
    ) -> Self {
        let http = reqwest::Client::builder()
            .timeout(exchange_timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            http,
            refresh_url: format!("{}/auth/refresh", base_url.trim_end_matches('/')),
            store,
            notifier,
            state: Mutex::new(RefreshState {
                refreshing: false,
                waiters: Vec::new(),
            }),
        }
    }

    /// True while a refresh exchange is on the wire.
    ///
    /// The pre-flight path uses this to avoid blocking a request behind a
    /// refresh it did not need: when one is already running, the request is
    /// sent with the current token and joins the queue only if it 401s.
    pub async fn is_refreshing(&self) -> bool {
        self.state.lock().await.refreshing
    }

    /// Obtain a fresh credential pair, starting an exchange or joining the
    /// one already in flight.
    pub async fn refresh_access_token(&self) -> Result<TokenSet, RefreshError> {
        let waiter = {
            let mut state = self.state.lock().await;
            if state.refreshing {
                let (tx, rx) = oneshot::channel();
                state.waiters.push(tx);
                Some(rx)
            } else {
                state.refreshing = true;
                None
            }
        };

        if let Some(rx) = waiter {
            return match rx.await {
                Ok(outcome) => outcome,
                // Leader dropped mid-cycle (process teardown); nothing to
                // salvage from this flow.
                Err(_) => Err(RefreshError::Exchange {
                    status: None,
                    detail: "refresh cycle ended before completion".to_string(),
                }),
            };
        }

        let outcome = self.run_exchange().await;

        let waiters = {
            let mut state = self.state.lock().await;
            state.refreshing = false;
            std::mem::take(&mut state.waiters)
        };

        if let Err(err) = &outcome {
            // Terminal: the refresh credential itself is unusable. Clear
            // before fan-out so any follow-up refresh fails fast with
            // NoRefreshToken instead of re-trying a dead credential.
            if let Err(clear_err) = self.store.clear().await {
                tracing::warn!(err = %clear_err, "failed to clear credentials after refresh failure");
            }
            self.notifier.notify_expired();
            tracing::warn!(err = %err, waiters = waiters.len(), "refresh cycle failed; session ended");
        } else {
            tracing::debug!(waiters = waiters.len(), "credentials refreshed");
        }

        // FIFO fan-out: every queued waiter receives the leader's outcome.
        for tx in waiters {
            let _ = tx.send(outcome.clone());
        }

        outcome
    }

    async fn run_exchange(&self) -> Result<TokenSet, RefreshError> {
        let current = match self.store.get().await {
            Ok(Some(pair)) => pair,
            Ok(None) => return Err(RefreshError::NoRefreshToken),
            Err(err) => {
                // Unreadable storage means no usable credential.
                tracing::warn!(err = %err, "credential store unreadable before refresh");
                return Err(RefreshError::NoRefreshToken);
            }
        };
        if current.refresh_token.trim().is_empty() {
            return Err(RefreshError::NoRefreshToken);
        }

        let response = self
            .http
            .post(&self.refresh_url)
            .header(
                reqwest::header::AUTHORIZATION,
                format!("Bearer {}", current.refresh_token),
            )
            .json(&serde_json::json!({}))
            .send()
            .await
            .map_err(|err| RefreshError::Exchange {
                status: err.status().map(|s| s.as_u16()),
                detail: err.to_string(),
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(RefreshError::Exchange {
                status: Some(status),
                detail: body,
            });
        }

        let payload: RefreshResponse =
            response.json().await.map_err(|err| RefreshError::Exchange {
                status: None,
                detail: format!("malformed refresh response: {err}"),
            })?;

        let access_token = payload.access_token.unwrap_or_default().trim().to_string();
        if access_token.is_empty() {
            return Err(RefreshError::Exchange {
                status: None,
                detail: "refresh response did not include access_token".to_string(),
            });
        }
        // Some deployments rotate the refresh credential on every exchange,
        // others only return a new access token; keep the current refresh
        // credential when the response omits one.
        let refresh_token = payload
            .refresh_token
            .filter(|token| !token.trim().is_empty())
            .unwrap_or(current.refresh_token);

        let rotated = TokenSet::issued_now(
            access_token,
            refresh_token,
            payload.token_type,
            payload.expires_in,
            unix_now_millis(),
        );
        self.store
            .set_all(&rotated)
            .await
            .map_err(|err| RefreshError::Exchange {
                status: None,
                detail: format!("failed to persist refreshed credentials: {err}"),
            })?;
        Ok(rotated)
    }
}
