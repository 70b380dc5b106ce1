//! Shared test fixtures for auth/store/pipeline test modules.
//!
//! Keeping tiny but reusable helpers here prevents each test module from
//! rebuilding ad-hoc temp-dir, fake-server, and in-memory-store code.

use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use crate::auth::notify::SessionNotifier;
use crate::auth::store::TokenStore;
use crate::auth::types::TokenSet;
use crate::error::StoreError;

static TEST_DIR_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Temporary directory fixture with best-effort cleanup.
#[derive(Debug)]
pub struct TestTempDir {
    path: PathBuf,
}

impl TestTempDir {
    /// Create a unique temporary directory with a readable prefix.
    pub fn new(prefix: &str) -> Self {
        let suffix = TEST_DIR_COUNTER.fetch_add(1, Ordering::Relaxed);
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        let dir = std::env::temp_dir().join(format!("coursehub-{prefix}-{millis}-{suffix}"));
        fs::create_dir_all(&dir).expect("failed to create temporary fixture directory");
        Self { path: dir }
    }

    /// Root directory path for this fixture.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Build a child path under the fixture root.
    pub fn child(&self, relative: &str) -> PathBuf {
        self.path.join(relative)
    }
}

impl Drop for TestTempDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

// ---------------------------------------------------------------------------
// In-memory token store
// ---------------------------------------------------------------------------

/// In-memory [`TokenStore`] for tests, with an optional failure switch to
/// exercise the "store errors mean no valid credential" paths.
#[derive(Default)]
pub struct MemoryTokenStore {
    record: Mutex<Option<TokenSet>>,
    fail_reads: AtomicBool,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seeded(tokens: TokenSet) -> Self {
        let store = Self::new();
        *store.record.lock().expect("store lock") = Some(tokens);
        store
    }

    /// Make subsequent `get` calls fail with an I/O error.
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Direct snapshot of the stored record, bypassing the trait.
    pub fn snapshot(&self) -> Option<TokenSet> {
        self.record.lock().expect("store lock").clone()
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn get(&self) -> Result<Option<TokenSet>, StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Io(std::io::Error::other("simulated read failure")));
        }
        Ok(self.record.lock().expect("store lock").clone())
    }

    async fn set_all(&self, tokens: &TokenSet) -> Result<(), StoreError> {
        *self.record.lock().expect("store lock") = Some(tokens.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        *self.record.lock().expect("store lock") = None;
        Ok(())
    }
}

/// Notifier wired to a counter so tests can assert exactly-once semantics.
pub fn counting_notifier() -> (Arc<SessionNotifier>, Arc<AtomicUsize>) {
    let notifier = Arc::new(SessionNotifier::new());
    let fired = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&fired);
    notifier.on_session_expired(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    (notifier, fired)
}

/// A healthy credential pair issued at `issued_at_millis` with the default
/// 1800 s lifetime.
pub fn pair_issued_at(access: &str, refresh: &str, issued_at_millis: u64) -> TokenSet {
    TokenSet::issued_now(access.into(), refresh.into(), None, Some(1800), issued_at_millis)
}

/// Standard JSON body for a successful token exchange.
pub fn token_response_body(access: &str, refresh: &str) -> String {
    serde_json::json!({
        "access_token": access,
        "refresh_token": refresh,
        "token_type": "bearer",
        "expires_in": 1800,
    })
    .to_string()
}

// ---------------------------------------------------------------------------
// Scripted fake HTTP server
// ---------------------------------------------------------------------------

/// One scripted HTTP response served by [`FakeApi`].
#[derive(Debug, Clone)]
pub struct CannedResponse {
    pub status: u16,
    pub body: String,
    pub delay: Duration,
    pub retry_after: Option<u64>,
}

impl CannedResponse {
    pub fn json(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            delay: Duration::ZERO,
            retry_after: None,
        }
    }

    /// Hold the response for `delay` after the request arrives. Used to keep
    /// an exchange in flight while other callers pile up behind it.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_retry_after(mut self, secs: u64) -> Self {
        self.retry_after = Some(secs);
        self
    }
}

/// Request head captured by the fake server, one entry per connection.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub authorization: Option<String>,
}

/// Minimal scripted HTTP server on a real socket.
///
/// Serves the canned responses in order, one connection each
/// (`Connection: close`), recording the request line and auth header. A
/// request beyond the script gets a refused connection, which makes any
/// unexpected extra call fail the test loudly.
pub struct FakeApi {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    hits: Arc<AtomicUsize>,
}

impl FakeApi {
    pub async fn start(responses: Vec<CannedResponse>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake api listener");
        let addr = listener.local_addr().expect("fake api local addr");
        let requests: Arc<Mutex<Vec<RecordedRequest>>> = Arc::new(Mutex::new(Vec::new()));
        let hits = Arc::new(AtomicUsize::new(0));

        let task_requests = Arc::clone(&requests);
        let task_hits = Arc::clone(&hits);
        tokio::spawn(async move {
            for canned in responses {
                let Ok((mut stream, _)) = listener.accept().await else {
                    return;
                };
                task_hits.fetch_add(1, Ordering::SeqCst);

                let mut buf = vec![0u8; 8192];
                let read = stream.read(&mut buf).await.unwrap_or(0);
                let head = String::from_utf8_lossy(&buf[..read]).to_string();
                if let Some(request) = parse_request_head(&head) {
                    task_requests
                        .lock()
                        .expect("request log lock")
                        .push(request);
                }

                if canned.delay > Duration::ZERO {
                    tokio::time::sleep(canned.delay).await;
                }

                let retry_after = canned
                    .retry_after
                    .map(|secs| format!("Retry-After: {secs}\r\n"))
                    .unwrap_or_default();
                let response = format!(
                    "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\n{}Content-Length: {}\r\nConnection: close\r\n\r\n{}",
                    canned.status,
                    reason_phrase(canned.status),
                    retry_after,
                    canned.body.len(),
                    canned.body,
                );
                let _ = stream.write_all(response.as_bytes()).await;
            }
        });

        Self {
            addr,
            requests,
            hits,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Connections accepted so far.
    pub fn request_count(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    /// Snapshot of the recorded request heads, in arrival order.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().expect("request log lock").clone()
    }
}

fn parse_request_head(head: &str) -> Option<RecordedRequest> {
    let mut lines = head.lines();
    let request_line = lines.next()?;
    let mut parts = request_line.split_whitespace();
    let method = parts.next()?.to_string();
    let path = parts.next()?.to_string();

    let authorization = lines
        .take_while(|line| !line.is_empty())
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.eq_ignore_ascii_case("authorization")
                .then(|| value.trim().to_string())
        });

    Some(RecordedRequest {
        method,
        path,
        authorization,
    })
}

fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "OK",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temp_dir_fixture_resolves_child_paths() {
        let fixture = TestTempDir::new("fixture");
        let child = fixture.child("auth.json");
        assert!(child.starts_with(fixture.path()));
    }

    #[test]
    fn request_head_parsing_extracts_method_path_and_auth() {
        let head = "POST /auth/refresh HTTP/1.1\r\nhost: x\r\nAuthorization: Bearer R1\r\n\r\n{}";
        let parsed = parse_request_head(head).expect("parse head");
        assert_eq!(parsed.method, "POST");
        assert_eq!(parsed.path, "/auth/refresh");
        assert_eq!(parsed.authorization.as_deref(), Some("Bearer R1"));
    }

    #[tokio::test]
    async fn fake_api_serves_scripted_responses_in_order() {
        let api = FakeApi::start(vec![
            CannedResponse::json(200, r#"{"ok":true}"#),
            CannedResponse::json(401, r#"{"detail":"expired"}"#),
        ])
        .await;

        let client = reqwest::Client::new();
        let first = client
            .get(format!("{}/health", api.base_url()))
            .send()
            .await
            .expect("first request");
        assert_eq!(first.status().as_u16(), 200);

        let second = client
            .get(format!("{}/courses", api.base_url()))
            .send()
            .await
            .expect("second request");
        assert_eq!(second.status().as_u16(), 401);

        assert_eq!(api.request_count(), 2);
        let log = api.requests();
        assert_eq!(log[0].path, "/health");
        assert_eq!(log[1].path, "/courses");
    }
}
