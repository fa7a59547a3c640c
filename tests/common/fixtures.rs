//! Test fixtures and mock provider helpers for integration tests.
//!
//! Provides fixture loaders and wiremock mounts that stand in for the
//! provider APIs keycheck talks to.
//!
//! # Usage
//!
//! ```rust,ignore
//! use common::fixtures::*;
//!
//! let server = MockServer::start().await;
//! mount_probe(&server, "/v1/models", 200).await;
//! mount_openai_billing(&server).await;
//! let body = validate_body("openai", TEST_KEY);
//! ```
#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;

use serde::de::DeserializeOwned;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Credential used throughout the suite; asserted absent from every log.
pub const TEST_KEY: &str = "sk-test-DO-NOT-LOG-4f9c2a7e1b";

/// A second credential, for concurrency checks.
pub const OTHER_KEY: &str = "sk-test-ALSO-SECRET-77d0e5";

// =============================================================================
// Fixture Loading
// =============================================================================

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

/// Load a JSON fixture file and deserialize it.
///
/// # Panics
///
/// Panics if the file cannot be read or parsed.
pub fn load_fixture<T: DeserializeOwned>(path: &str) -> T {
    let full_path = fixtures_dir().join(path);
    let content = fs::read_to_string(&full_path)
        .unwrap_or_else(|e| panic!("Failed to read fixture {}: {}", full_path.display(), e));
    serde_json::from_str(&content)
        .unwrap_or_else(|e| panic!("Failed to parse fixture {}: {}", full_path.display(), e))
}

/// Load a raw JSON fixture file as `serde_json::Value`.
pub fn load_fixture_json(path: &str) -> serde_json::Value {
    load_fixture(path)
}

/// `POST /validate` request body.
pub fn validate_body(provider: &str, key: &str) -> serde_json::Value {
    serde_json::json!({ "provider": provider, "apiKey": key })
}

// =============================================================================
// Provider Mocks
// =============================================================================

/// Listing probe answering `status` with an empty body.
pub async fn mount_probe(server: &MockServer, probe_path: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(probe_path))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

/// OpenAI listing probe that requires `key` as a bearer token and carries
/// token rate-limit headers.
pub async fn mount_openai_probe_with_limits(
    server: &MockServer,
    key: &str,
    limit: u64,
    remaining: u64,
    reset: &str,
) {
    Mock::given(method("GET"))
        .and(path("/v1/models"))
        .and(header("authorization", format!("Bearer {key}").as_str()))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("x-ratelimit-limit-tokens", limit.to_string().as_str())
                .insert_header("x-ratelimit-remaining-tokens", remaining.to_string().as_str())
                .insert_header("x-ratelimit-reset-tokens", reset)
                .set_body_json(load_fixture_json("openai/models.json")),
        )
        .mount(server)
        .await;
}

/// Both OpenAI billing endpoints, answered from fixtures.
pub async fn mount_openai_billing(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/v1/dashboard/billing/subscription"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(load_fixture_json("openai/billing_subscription.json")),
        )
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/dashboard/billing/usage"))
        .and(query_param("start_date", "2026-03-01"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(load_fixture_json("openai/billing_usage.json")),
        )
        .mount(server)
        .await;
}

/// Anthropic listing probe without rate-limit headers.
pub async fn mount_anthropic_probe(server: &MockServer, status: u16) {
    Mock::given(method("GET"))
        .and(path("/v1/models"))
        .and(header("anthropic-version", "2023-06-01"))
        .respond_with(
            ResponseTemplate::new(status).set_body_json(load_fixture_json("anthropic/models.json")),
        )
        .mount(server)
        .await;
}

/// Anthropic one-token generation answering with rate-limit headers.
pub async fn mount_anthropic_generation(server: &MockServer, limit: u64, remaining: u64) {
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("anthropic-ratelimit-tokens-limit", limit.to_string().as_str())
                .insert_header(
                    "anthropic-ratelimit-tokens-remaining",
                    remaining.to_string().as_str(),
                ),
        )
        .mount(server)
        .await;
}

/// Gemini listing probe that requires `key` in the query string.
pub async fn mount_gemini_probe(server: &MockServer, key: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path("/v1beta/models"))
        .and(query_param("key", key))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}
