//! Credential lifecycle: token model, encrypted persistence, single-flight
//! refresh, and the session-expiry signal.
//!
//! The pieces compose around two injected collaborators: a [`TokenStore`]
//! owning the persisted credential bytes and a [`SessionNotifier`] owned by
//! whoever drives the session (CLI, app shell). The [`RefreshCoordinator`]
//! is the only writer of tokens after login and the only component allowed
//! to declare the session over.

mod crypto;
pub mod notify;
pub mod refresh;
pub mod store;
pub mod types;

pub use notify::SessionNotifier;
pub use refresh::RefreshCoordinator;
pub use store::{default_token_file_path, token_health, FileTokenStore, TokenStore};
pub use types::{
    unix_now_millis, TokenHealth, TokenSet, DEFAULT_EXPIRES_IN_SECS, DEFAULT_EXPIRY_BUFFER,
    DEFAULT_TOKEN_TYPE,
};
