//! coursehub: the authenticated-HTTP core of a learning-platform client.
//!
//! This crate owns the credential lifecycle for a REST backend: an
//! encrypted on-disk token store, a pure expiry policy, a single-flight
//! refresh coordinator that fans one exchange out to every waiting request,
//! and a request pipeline that recovers transparently from a single 401 and
//! classifies everything else. Screens, navigation, and the course/lesson
//! CRUD surface live elsewhere; callers get generic JSON methods and a
//! session-expired signal.
//!
//! # Quick start
//!
//! ```no_run
//! use std::sync::Arc;
//! use coursehub::api::ApiClient;
//! use coursehub::auth::{FileTokenStore, SessionNotifier, TokenStore};
//! use coursehub::config::load_config;
//!
//! # async fn example() {
//! let config = load_config(None).unwrap();
//! let store: Arc<dyn TokenStore> =
//!     Arc::new(FileTokenStore::new(config.token_file_path().unwrap()));
//! let notifier = Arc::new(SessionNotifier::new());
//! notifier.on_session_expired(|| eprintln!("signed out"));
//!
//! let api = ApiClient::new(&config, Arc::clone(&store), notifier);
//! let tokens = coursehub::account::login(&api, "ada@example.com", "hunter2")
//!     .await
//!     .unwrap();
//! println!("signed in as {}", tokens.access_token);
//! # }
//! ```

pub mod account;
pub mod api;
pub mod auth;
pub mod config;
pub mod error;
#[cfg(test)]
pub mod testsupport;
