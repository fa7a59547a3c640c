//! Minimal generation call whose response headers carry rate limits.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Client;

use super::headers::usage_from_headers;
use crate::core::http::transport_error;
use crate::core::models::TokenUsage;
use crate::core::provider::{GenerationProbe, ProviderDescriptor};
use crate::error::Result;

/// Issue the one-token generation call and read its rate-limit headers.
///
/// The status code does not matter: providers attach rate-limit headers to
/// rejections too. The response body is discarded unread.
///
/// # Errors
///
/// Returns error if the request cannot be built or the transport fails.
pub async fn fetch(
    client: &Client,
    timeout: Duration,
    descriptor: &ProviderDescriptor,
    base: &str,
    key: &str,
    probe: &GenerationProbe,
    now: DateTime<Utc>,
) -> Result<Option<TokenUsage>> {
    let headers = (descriptor.auth_headers)(key)?;
    let url = descriptor.request_url(base, probe.path, key)?;

    let response = client
        .post(url)
        .headers(headers)
        .json(&(probe.body)(probe.model))
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| transport_error(descriptor.id, &e, timeout))?;

    tracing::debug!(
        provider = %descriptor.id,
        status = response.status().as_u16(),
        "Generation probe answered"
    );

    Ok(usage_from_headers(response.headers(), probe.headers, now))
}
