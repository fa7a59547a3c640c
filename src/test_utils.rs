//! Test utilities for keycheck.
//!
//! Provides shared helpers, test data factories, and assertion macros
//! for use across all test modules.
//!
//! # Usage
//!
//! ```rust,ignore
//! use keycheck::test_utils::*;
//!
//! let orchestrator = make_test_orchestrator(&mock_server.uri());
//! let server = TestServer::start(orchestrator, 4096).await;
//! let dir = TestDir::new();
//! dir.create_file("config.toml", &make_test_config_toml(&mock_server.uri()));
//! ```

use std::fs;
use std::io::{self, Write as IoWrite};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

pub use crate::core::clock::{FixedClock, FixedRandom};
use crate::core::models::TokenUsage;
use crate::core::orchestrator::ValidationOrchestrator;
use crate::server::{self, ServerState};

// =============================================================================
// Test Data Factories
// =============================================================================

/// A fixed weekday instant (Tuesday 2026-03-10 12:00 UTC).
///
/// Heuristic estimates depend on the weekday and day of month, so tests pin
/// the clock here.
///
/// # Panics
///
/// Never: the date is valid.
#[must_use]
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0)
        .single()
        .expect("fixed test instant is valid")
}

/// A `TokenUsage` with `used` of `limit` and no request counts.
#[must_use]
pub fn make_test_token_usage(used: u64, limit: u64) -> TokenUsage {
    TokenUsage {
        used,
        limit,
        requests_used: None,
        requests_limit: None,
        reset_date: Some(fixed_now() + chrono::Duration::days(1)),
    }
}

/// Orchestrator with every provider pointed at `base`, a pinned clock, and
/// zero jitter.
///
/// # Panics
///
/// Panics if the HTTP client cannot be built.
#[must_use]
pub fn make_test_orchestrator(base: &str) -> ValidationOrchestrator {
    make_test_orchestrator_with_timeout(base, Duration::from_secs(5))
}

/// Same as [`make_test_orchestrator`] with an explicit per-call timeout.
///
/// # Panics
///
/// Panics if the HTTP client cannot be built.
#[must_use]
pub fn make_test_orchestrator_with_timeout(
    base: &str,
    timeout: Duration,
) -> ValidationOrchestrator {
    ValidationOrchestrator::builder()
        .all_endpoints(base)
        .probe_timeout(timeout)
        .usage_timeout(timeout)
        .clock(Arc::new(FixedClock(fixed_now())))
        .random(Arc::new(FixedRandom(0)))
        .build()
        .expect("Failed to build test orchestrator")
}

/// Config file content pointing every provider at `base`.
#[must_use]
pub fn make_test_config_toml(base: &str) -> String {
    format!(
        r#"[server]
bind = "127.0.0.1:0"
max_body_bytes = 4096

[general]
probe_timeout_seconds = 5
usage_timeout_seconds = 5
log_level = "info"

[providers.openai]
api_base = "{base}"

[providers.anthropic]
api_base = "{base}"

[providers.cohere]
api_base = "{base}"

[providers.gemini]
api_base = "{base}"

[providers.llama]
api_base = "{base}"
"#
    )
}

// =============================================================================
// Test Server
// =============================================================================

/// The HTTP service running on an ephemeral local port.
///
/// # Examples
///
/// ```rust,ignore
/// let server = TestServer::start(make_test_orchestrator(&mock.uri()), 4096).await;
/// let response = reqwest::Client::new()
///     .post(server.url("/validate"))
///     .json(&serde_json::json!({"provider": "llama", "apiKey": "k"}))
///     .send()
///     .await
///     .unwrap();
/// server.shutdown().await;
/// ```
pub struct TestServer {
    addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<crate::Result<()>>,
}

impl TestServer {
    /// Bind `127.0.0.1:0` and serve in the background.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    pub async fn start(orchestrator: ValidationOrchestrator, max_body_bytes: usize) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Failed to read local address");
        let state = Arc::new(ServerState::new(Arc::new(orchestrator), max_body_bytes));
        let (shutdown, signal) = oneshot::channel::<()>();

        let handle = tokio::spawn(server::serve(listener, state, async move {
            let _ = signal.await;
        }));

        Self {
            addr,
            shutdown,
            handle,
        }
    }

    #[must_use]
    pub const fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Absolute URL for `path` on this server.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    /// Stop accepting and wait for the serve loop to finish.
    ///
    /// # Panics
    ///
    /// Panics if the serve task panicked or returned an error.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(());
        self.handle
            .await
            .expect("serve task panicked")
            .expect("serve loop failed");
    }
}

// =============================================================================
// Temporary Directories
// =============================================================================

/// Isolated temporary directory, removed on drop.
///
/// # Examples
///
/// ```rust,ignore
/// use keycheck::test_utils::TestDir;
///
/// let dir = TestDir::new();
/// dir.create_file("config.toml", "[server]\nbind = \"127.0.0.1:0\"");
/// assert!(dir.file_exists("config.toml"));
/// ```
pub struct TestDir {
    inner: tempfile::TempDir,
}

impl TestDir {
    /// Create a new isolated temporary directory.
    ///
    /// # Panics
    ///
    /// Panics if the temporary directory cannot be created.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: tempfile::tempdir().expect("Failed to create temp directory"),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        self.inner.path()
    }

    /// Create a file with the given content, creating parent directories.
    ///
    /// # Panics
    ///
    /// Panics if the file cannot be created or written.
    pub fn create_file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.inner.path().join(name);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directories");
        }

        let mut file = fs::File::create(&path).expect("Failed to create test file");
        file.write_all(content.as_bytes())
            .expect("Failed to write test file");
        path
    }

    /// Read a file from the temporary directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub fn read_file(&self, name: &str) -> io::Result<String> {
        fs::read_to_string(self.inner.path().join(name))
    }

    #[must_use]
    pub fn file_exists(&self, name: &str) -> bool {
        self.inner.path().join(name).exists()
    }

    #[must_use]
    pub fn file_path(&self, name: &str) -> PathBuf {
        self.inner.path().join(name)
    }
}

impl Default for TestDir {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Assertion Macros
// =============================================================================

/// Assert that a string contains a substring.
///
/// # Examples
///
/// ```rust,ignore
/// use keycheck::assert_contains;
///
/// assert_contains!("Hello, world!", "world");
/// ```
#[macro_export]
macro_rules! assert_contains {
    ($haystack:expr, $needle:expr) => {
        let haystack = $haystack;
        let needle = $needle;
        assert!(
            haystack.contains(needle),
            "Expected string to contain {:?}\n\nActual string:\n{:?}",
            needle,
            haystack
        );
    };
    ($haystack:expr, $needle:expr, $($arg:tt)*) => {
        let haystack = $haystack;
        let needle = $needle;
        assert!(
            haystack.contains(needle),
            $($arg)*
        );
    };
}

/// Assert that a string does NOT contain a substring.
///
/// Used to check that credentials stay out of logs and responses.
#[macro_export]
macro_rules! assert_not_contains {
    ($haystack:expr, $needle:expr) => {
        let haystack = $haystack;
        let needle = $needle;
        assert!(
            !haystack.contains(needle),
            "Expected string NOT to contain {:?}\n\nActual string:\n{:?}",
            needle,
            haystack
        );
    };
    ($haystack:expr, $needle:expr, $($arg:tt)*) => {
        let haystack = $haystack;
        let needle = $needle;
        assert!(
            !haystack.contains(needle),
            $($arg)*
        );
    };
}

/// Assert that a string is valid JSON.
#[macro_export]
macro_rules! assert_json_valid {
    ($json:expr) => {
        let json = $json;
        if let Err(e) = serde_json::from_str::<serde_json::Value>(json) {
            panic!(
                "Expected valid JSON, but parsing failed: {}\n\nJSON string:\n{}",
                e, json
            );
        }
    };
}
