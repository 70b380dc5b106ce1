//! Unified error types for the client core.

use std::fmt;

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Errors when loading or parsing configuration.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Toml(toml::de::Error),
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "io: {e}"),
            Self::Toml(e) => write!(f, "toml: {e}"),
            Self::Invalid(msg) => write!(f, "invalid config: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        Self::Toml(e)
    }
}

// ---------------------------------------------------------------------------
// StoreError
// ---------------------------------------------------------------------------

/// Errors from the persistent credential store.
///
/// Callers treat any store error as "no valid credential": a pair that
/// cannot be read or written must lead toward re-authentication, never be
/// papered over as success.
#[derive(Debug)]
pub enum StoreError {
    Io(std::io::Error),
    /// Corrupt, undecryptable, or unparseable store contents.
    Invalid(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "io: {e}"),
            Self::Invalid(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

// ---------------------------------------------------------------------------
// RefreshError
// ---------------------------------------------------------------------------

/// Terminal outcomes of a token refresh cycle.
///
/// Cloneable so one outcome can fan out to every waiter queued behind the
/// in-flight exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshError {
    /// Refresh attempted with no persisted refresh credential.
    NoRefreshToken,
    /// The remote exchange failed: non-2xx status, transport error,
    /// malformed response body, or a persistence failure afterwards.
    Exchange {
        status: Option<u16>,
        detail: String,
    },
}

impl fmt::Display for RefreshError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoRefreshToken => write!(f, "no refresh token available"),
            Self::Exchange {
                status: Some(code),
                detail,
            } => write!(f, "refresh exchange failed ({code}): {detail}"),
            Self::Exchange {
                status: None,
                detail,
            } => write!(f, "refresh exchange failed: {detail}"),
        }
    }
}

impl std::error::Error for RefreshError {}

// ---------------------------------------------------------------------------
// ApiError
// ---------------------------------------------------------------------------

/// Errors from the HTTP request pipeline.
#[derive(Debug)]
pub enum ApiError {
    /// Network / reqwest-level error (timeout, connect failure).
    Http(reqwest::Error),
    /// Non-2xx status from the API, propagated unchanged.
    Status {
        code: u16,
        body: String,
        /// Parsed `Retry-After` header, when the server sent one.
        retry_after_secs: Option<u64>,
    },
    /// The session could not be salvaged by a token refresh. The store has
    /// already been cleared and the session notifier fired by the time this
    /// surfaces.
    SessionExpired(RefreshError),
    /// 2xx response with an undecodable body.
    InvalidResponse(String),
}

impl ApiError {
    /// Build a `Status` error from response parts.
    pub fn status(code: u16, body: String, retry_after_secs: Option<u64>) -> Self {
        Self::Status {
            code,
            body,
            retry_after_secs,
        }
    }

    /// HTTP status code carried by this error, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { code, .. } => Some(*code),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Parsed `Retry-After` seconds, if the server provided the header.
    pub fn retry_after_secs(&self) -> Option<u64> {
        match self {
            Self::Status {
                retry_after_secs, ..
            } => *retry_after_secs,
            _ => None,
        }
    }

    /// True for 401 responses.
    pub fn is_unauthorized(&self) -> bool {
        self.status_code() == Some(401)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http(e) => write!(f, "http: {e}"),
            Self::Status { code, body, .. } => write!(f, "status {code}: {body}"),
            Self::SessionExpired(e) => write!(f, "session expired: {e}"),
            Self::InvalidResponse(msg) => write!(f, "invalid response: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e)
    }
}

impl From<RefreshError> for ApiError {
    fn from(e: RefreshError) -> Self {
        Self::SessionExpired(e)
    }
}

// ---------------------------------------------------------------------------
// ClientError — top-level
// ---------------------------------------------------------------------------

/// Top-level error type for account operations and the CLI.
#[derive(Debug)]
pub enum ClientError {
    Config(ConfigError),
    Api(ApiError),
    Store(StoreError),
    /// Server response missing data the client requires (e.g. a login
    /// response without tokens).
    Invalid(String),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Api(e) => write!(f, "api: {e}"),
            Self::Store(e) => write!(f, "store: {e}"),
            Self::Invalid(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for ClientError {}

impl From<ConfigError> for ClientError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<ApiError> for ClientError {
    fn from(e: ApiError) -> Self {
        Self::Api(e)
    }
}

impl From<StoreError> for ClientError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refresh_error_display() {
        assert_eq!(
            RefreshError::NoRefreshToken.to_string(),
            "no refresh token available"
        );
        assert_eq!(
            RefreshError::Exchange {
                status: Some(401),
                detail: "invalid refresh token".into()
            }
            .to_string(),
            "refresh exchange failed (401): invalid refresh token"
        );
        assert_eq!(
            RefreshError::Exchange {
                status: None,
                detail: "connection reset".into()
            }
            .to_string(),
            "refresh exchange failed: connection reset"
        );
    }

    #[test]
    fn api_error_status_accessors() {
        let e = ApiError::status(429, "slow down".into(), Some(7));
        assert_eq!(e.status_code(), Some(429));
        assert_eq!(e.retry_after_secs(), Some(7));
        assert!(!e.is_unauthorized());
        assert_eq!(e.to_string(), "status 429: slow down");
    }

    #[test]
    fn api_error_unauthorized_detection() {
        let e = ApiError::status(401, "expired".into(), None);
        assert!(e.is_unauthorized());
    }

    #[test]
    fn session_expired_wraps_refresh_error() {
        let e = ApiError::from(RefreshError::NoRefreshToken);
        assert_eq!(e.to_string(), "session expired: no refresh token available");
        assert_eq!(e.status_code(), None);
    }

    #[test]
    fn config_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let e = ConfigError::from(io_err);
        let s = e.to_string();
        assert!(s.starts_with("io:"), "got: {s}");
        assert!(s.contains("file not found"));
    }

    #[test]
    fn client_error_from_store_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let ce = ClientError::from(StoreError::from(io_err));
        assert!(ce.to_string().starts_with("store:"), "got: {ce}");
    }
}
