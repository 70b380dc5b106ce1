//! Credential pair model and expiry policy.

use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Access-token lifetime assumed when the server omits `expires_in`.
pub const DEFAULT_EXPIRES_IN_SECS: u64 = 1800;
/// Token scheme tag assumed when the server omits `token_type`.
pub const DEFAULT_TOKEN_TYPE: &str = "bearer";
/// Refresh this long before the access token actually expires.
pub const DEFAULT_EXPIRY_BUFFER: Duration = Duration::from_secs(5 * 60);

/// Stored credential pair for one authenticated session.
///
/// Field names follow the storage keys the backend contract fixes, so the
/// persisted record stays readable across client versions. `login_timestamp`
/// and `token_expires_in` are optional on read: a record missing either is
/// treated as already expiring (fail safe), while writers always fill them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenSet {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// Client-recorded receipt time, epoch milliseconds.
    #[serde(rename = "login_timestamp")]
    pub issued_at_millis: Option<u64>,
    /// Server-declared access-token lifetime in seconds.
    #[serde(rename = "token_expires_in")]
    pub expires_in_secs: Option<u64>,
}

fn default_token_type() -> String {
    DEFAULT_TOKEN_TYPE.to_string()
}

impl TokenSet {
    /// Build a freshly issued pair, stamping `issued_at` with `now_millis`
    /// and filling protocol defaults for omitted fields.
    pub fn issued_now(
        access_token: String,
        refresh_token: String,
        token_type: Option<String>,
        expires_in_secs: Option<u64>,
        now_millis: u64,
    ) -> Self {
        Self {
            access_token,
            refresh_token,
            token_type: token_type.unwrap_or_else(default_token_type),
            issued_at_millis: Some(now_millis),
            expires_in_secs: Some(expires_in_secs.unwrap_or(DEFAULT_EXPIRES_IN_SECS)),
        }
    }

    /// Absolute expiry time in epoch milliseconds, when known.
    pub fn expires_at_millis(&self) -> Option<u64> {
        let issued = self.issued_at_millis?;
        let lifetime = self.expires_in_secs?;
        Some(issued.saturating_add(lifetime.saturating_mul(1000)))
    }

    /// True when the access token is within `buffer` of expiry.
    ///
    /// A pair with unknown issue time or lifetime counts as expiring:
    /// missing information must push toward a refresh, not past one.
    pub fn is_expiring_soon(&self, now_millis: u64, buffer: Duration) -> bool {
        match self.expires_at_millis() {
            Some(expires_at) => {
                expires_at.saturating_sub(now_millis) < buffer.as_millis() as u64
            }
            None => true,
        }
    }

    /// Whole seconds of access-token lifetime left; 0 when expired or when
    /// expiry information is missing.
    pub fn remaining_seconds(&self, now_millis: u64) -> u64 {
        match self.expires_at_millis() {
            Some(expires_at) => expires_at.saturating_sub(now_millis) / 1000,
            None => 0,
        }
    }
}

/// Snapshot of stored-credential state for status surfaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenHealth {
    pub has_tokens: bool,
    pub expiring_soon: bool,
    pub remaining_seconds: u64,
    pub expires_at_millis: Option<u64>,
}

/// Current wall-clock time in epoch milliseconds.
pub fn unix_now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
