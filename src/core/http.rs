//! HTTP client utilities.
//!
//! Provides the shared client used for probes and usage calls.

use std::time::Duration;

use reqwest::{Client, ClientBuilder};

use crate::core::provider::Provider;
use crate::error::{KeycheckError, Result};

/// Default timeout for the validity probe.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Default timeout for usage calls.
pub const DEFAULT_USAGE_TIMEOUT: Duration = Duration::from_secs(10);

/// Connect timeout applied to every outbound call.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Build a configured HTTP client.
///
/// Redirects are not followed: a probe answers with exactly what the
/// provider said, and credentials never travel to another host.
///
/// # Errors
///
/// Returns error if client construction fails.
pub fn build_client(timeout: Duration) -> Result<Client> {
    ClientBuilder::new()
        .timeout(timeout)
        .connect_timeout(CONNECT_TIMEOUT.min(timeout))
        .redirect(reqwest::redirect::Policy::none())
        .user_agent(format!("keycheck/{}", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| KeycheckError::Other(anyhow::anyhow!("build HTTP client: {e}")))
}

/// Map a transport failure to a network error.
///
/// The message comes from the error kind only; reqwest's `Display` includes
/// the request URL, which may carry a credential.
#[must_use]
pub fn transport_error(provider: Provider, err: &reqwest::Error, timeout: Duration) -> KeycheckError {
    if err.is_timeout() {
        return KeycheckError::Timeout {
            provider,
            seconds: timeout.as_secs(),
        };
    }
    let message = if err.is_connect() {
        "connection failed"
    } else if err.is_request() {
        "request failed"
    } else if err.is_body() || err.is_decode() {
        "response body could not be read"
    } else {
        "transport error"
    };
    KeycheckError::Network {
        provider,
        message: message.to_string(),
    }
}
