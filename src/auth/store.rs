//! Persistent credential storage.
//!
//! The store owns the credential bytes on disk and nothing else: one record,
//! written whole or not at all. Reads and writes are suspension points for
//! the flows that call them, so the trait is async even though the file
//! backend does plain synchronous I/O underneath.

use async_trait::async_trait;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use super::crypto::{decrypt_tokens, encrypt_tokens, looks_encrypted_file, EncryptedTokenFile};
use super::types::{TokenHealth, TokenSet};
use crate::error::StoreError;

/// Storage contract the refresh coordinator and request pipeline consume.
///
/// `set_all` is atomic across the whole credential record: a concurrent
/// `get` sees either the previous pair or the new one, never a mix.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Load the stored pair, `None` when nothing is persisted.
    async fn get(&self) -> Result<Option<TokenSet>, StoreError>;

    /// Replace the stored pair atomically.
    async fn set_all(&self, tokens: &TokenSet) -> Result<(), StoreError>;

    /// Remove all stored credential fields.
    async fn clear(&self) -> Result<(), StoreError>;
}

/// Default credential file path (`~/.config/coursehub/auth.json`).
pub fn default_token_file_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("coursehub").join("auth.json"))
}

/// Encrypted-at-rest credential file.
///
/// Writes go through a unique temp file plus rename so readers never see a
/// half-written record, and concurrent saves cannot corrupt each other.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_record(&self) -> Result<Option<TokenSet>, StoreError> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(StoreError::Io(err)),
        };

        let value: serde_json::Value = serde_json::from_str(&text).map_err(|err| {
            StoreError::Invalid(format!(
                "failed to parse credential file `{}`: {err}",
                self.path.display()
            ))
        })?;

        if looks_encrypted_file(&value) {
            let encrypted: EncryptedTokenFile = serde_json::from_value(value).map_err(|err| {
                StoreError::Invalid(format!(
                    "failed to parse encrypted credential file `{}`: {err}",
                    self.path.display()
                ))
            })?;
            return decrypt_tokens(&encrypted).map(Some);
        }

        // Legacy plaintext record: still readable, re-written encrypted.
        let tokens: TokenSet = serde_json::from_value(value).map_err(|err| {
            StoreError::Invalid(format!(
                "failed to parse credential file `{}`: {err}",
                self.path.display()
            ))
        })?;
        if let Err(err) = self.write_record(&tokens) {
            tracing::warn!(err = %err, "failed to migrate plaintext credential file");
        }
        Ok(Some(tokens))
    }

    fn write_record(&self, tokens: &TokenSet) -> Result<(), StoreError> {
        static COUNTER: AtomicU32 = AtomicU32::new(0);

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                let _ = std::fs::set_permissions(parent, std::fs::Permissions::from_mode(0o700));
            }
        }

        let encrypted = encrypt_tokens(tokens)?;
        let text = serde_json::to_string_pretty(&encrypted).map_err(|err| {
            StoreError::Invalid(format!("failed to serialize credential file: {err}"))
        })?;

        // Unique temp name (PID + counter) so concurrent saves cannot race
        // on the same temp file and leave trailing bytes behind.
        let seq = COUNTER.fetch_add(1, Ordering::Relaxed);
        let tmp_name = format!(
            "{}.{}.{}.tmp",
            self.path
                .file_name()
                .unwrap_or_default()
                .to_string_lossy(),
            std::process::id(),
            seq,
        );
        let tmp_path = self.path.with_file_name(tmp_name);

        let mut options = std::fs::OpenOptions::new();
        options.create(true).truncate(true).write(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(&tmp_path)?;
        file.write_all(text.as_bytes())?;
        file.flush()?;
        std::fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }

    fn remove_record(&self) -> Result<(), StoreError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(StoreError::Io(err)),
        }
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn get(&self) -> Result<Option<TokenSet>, StoreError> {
        self.read_record()
    }

    async fn set_all(&self, tokens: &TokenSet) -> Result<(), StoreError> {
        self.write_record(tokens)
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.remove_record()
    }
}

/// Inspect stored credentials without modifying them.
pub async fn token_health(
    store: &dyn TokenStore,
    now_millis: u64,
    buffer: Duration,
) -> Result<TokenHealth, StoreError> {
    let tokens = store.get().await?;
    Ok(match tokens {
        Some(pair) => TokenHealth {
            has_tokens: true,
            expiring_soon: pair.is_expiring_soon(now_millis, buffer),
            remaining_seconds: pair.remaining_seconds(now_millis),
            expires_at_millis: pair.expires_at_millis(),
        },
        None => TokenHealth {
            has_tokens: false,
            expiring_soon: true,
            remaining_seconds: 0,
            expires_at_millis: None,
        },
    })
}
