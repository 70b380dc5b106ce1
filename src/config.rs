//! Configuration loading from TOML files and environment variables.
//!
//! Config is loaded in this order of precedence (highest wins):
//! 1. Environment variables (`COURSEHUB_BASE_URL`)
//! 2. TOML file specified via --config CLI flag
//! 3. ./coursehub.toml in the current directory
//! 4. $XDG_CONFIG_HOME/coursehub/coursehub.toml
//!    (or ~/.config/coursehub/coursehub.toml)
//! 5. Built-in defaults
//!
//! The prototype variants of this client disagreed on buffer minutes,
//! timeouts, and storage locations; those all live here as plain settings.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::auth::store::default_token_file_path;
use crate::error::ConfigError;

const DEFAULT_BASE_URL: &str = "http://localhost:8001";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_REFRESH_TIMEOUT_SECS: u64 = 10;
const DEFAULT_EXPIRY_BUFFER_MINUTES: u64 = 5;

/// Resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub api: ApiConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Backend base URL, without a trailing slash.
    pub base_url: String,
    /// Timeout for ordinary API requests.
    pub timeout_secs: u64,
    /// Timeout for the token refresh exchange.
    pub refresh_timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Refresh when less than this many minutes of lifetime remain.
    pub expiry_buffer_minutes: u64,
    /// Credential file override; defaults to the per-user config dir.
    pub store_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                base_url: DEFAULT_BASE_URL.to_string(),
                timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
                refresh_timeout_secs: DEFAULT_REFRESH_TIMEOUT_SECS,
            },
            auth: AuthConfig {
                expiry_buffer_minutes: DEFAULT_EXPIRY_BUFFER_MINUTES,
                store_path: None,
            },
        }
    }
}

impl Config {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }

    pub fn refresh_exchange_timeout(&self) -> Duration {
        Duration::from_secs(self.api.refresh_timeout_secs)
    }

    pub fn expiry_buffer(&self) -> Duration {
        Duration::from_secs(self.auth.expiry_buffer_minutes * 60)
    }

    /// Credential file path: explicit override or the per-user default.
    pub fn token_file_path(&self) -> Option<PathBuf> {
        self.auth
            .store_path
            .clone()
            .or_else(default_token_file_path)
    }
}

// ---------------------------------------------------------------------------
// File shape
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    #[serde(default)]
    api: FileApiConfig,
    #[serde(default)]
    auth: FileAuthConfig,
}

#[derive(Debug, Default, Deserialize)]
struct FileApiConfig {
    base_url: Option<String>,
    timeout_secs: Option<u64>,
    refresh_timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct FileAuthConfig {
    expiry_buffer_minutes: Option<u64>,
    store_path: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Load configuration from disk and environment.
///
/// `path_override` is an explicit config file path (from the --config flag).
pub fn load_config(path_override: Option<&str>) -> Result<Config, ConfigError> {
    let text = read_config_text(path_override)?;
    let parsed: FileConfig = match text {
        Some(text) => toml::from_str(&text)?,
        None => FileConfig::default(),
    };
    let mut config = resolve(parsed);
    apply_env_overrides(&mut config, |name| std::env::var(name).ok());
    validate(&config)?;
    Ok(config)
}

fn read_config_text(path_override: Option<&str>) -> Result<Option<String>, ConfigError> {
    if let Some(path) = path_override {
        // Explicit paths must exist; a typo should not silently mean
        // "defaults".
        return std::fs::read_to_string(Path::new(path))
            .map(Some)
            .map_err(ConfigError::Io);
    }

    let mut candidates = vec![PathBuf::from("coursehub.toml")];
    if let Some(dir) = dirs::config_dir() {
        candidates.push(dir.join("coursehub").join("coursehub.toml"));
    }
    for candidate in candidates {
        match std::fs::read_to_string(&candidate) {
            Ok(text) => return Ok(Some(text)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => continue,
            Err(err) => return Err(ConfigError::Io(err)),
        }
    }
    Ok(None)
}

fn resolve(file: FileConfig) -> Config {
    let defaults = Config::default();
    Config {
        api: ApiConfig {
            base_url: file
                .api
                .base_url
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.api.base_url),
            timeout_secs: file.api.timeout_secs.unwrap_or(defaults.api.timeout_secs),
            refresh_timeout_secs: file
                .api
                .refresh_timeout_secs
                .unwrap_or(defaults.api.refresh_timeout_secs),
        },
        auth: AuthConfig {
            expiry_buffer_minutes: file
                .auth
                .expiry_buffer_minutes
                .unwrap_or(defaults.auth.expiry_buffer_minutes),
            store_path: file.auth.store_path,
        },
    }
}

fn apply_env_overrides<F>(config: &mut Config, env_lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = env_lookup("COURSEHUB_BASE_URL") {
        config.api.base_url = url.trim_end_matches('/').to_string();
    }
}

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.api.base_url.trim().is_empty() {
        return Err(ConfigError::Invalid(
            "api.base_url must not be empty".to_string(),
        ));
    }
    if config.api.timeout_secs == 0 || config.api.refresh_timeout_secs == 0 {
        return Err(ConfigError::Invalid(
            "timeouts must be at least one second".to_string(),
        ));
    }
    Ok(())
}
