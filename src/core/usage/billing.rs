//! Billing dashboard probe.
//!
//! Two requests that together count as one usage operation: the subscription
//! summary for the spending cap, then the current period's usage summary.
//! Dollar figures are converted into token equivalents at a flat rate.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use super::resolve_reset;
use crate::core::http::transport_error;
use crate::core::models::TokenUsage;
use crate::core::provider::{BillingEndpoints, ProviderDescriptor};
use crate::error::{KeycheckError, Result};
use crate::util::time::{first_of_month, next_day_midnight};

/// Flat dollar cost of one token, used to express spend as tokens.
pub const COST_PER_TOKEN_USD: f64 = 0.000_002;

#[derive(Debug, Deserialize)]
struct Subscription {
    hard_limit_usd: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct UsageSummary {
    /// Spend in cents.
    total_usage: Option<f64>,
    #[serde(default)]
    daily_costs: Vec<DailyCost>,
}

#[derive(Debug, Deserialize)]
struct DailyCost {
    #[serde(default)]
    line_items: Vec<serde_json::Value>,
}

/// Query both billing endpoints and convert to a token estimate.
///
/// # Errors
///
/// Returns error on transport failure, a non-success status, an unparsable
/// body, or a missing spending cap.
pub async fn fetch(
    client: &Client,
    timeout: Duration,
    descriptor: &ProviderDescriptor,
    base: &str,
    key: &str,
    endpoints: &BillingEndpoints,
    now: DateTime<Utc>,
) -> Result<TokenUsage> {
    let subscription: Subscription =
        get_json(client, timeout, descriptor, base, key, endpoints.subscription_path, &[]).await?;
    let hard_limit_usd = subscription
        .hard_limit_usd
        .filter(|usd| usd.is_finite() && *usd > 0.0)
        .ok_or_else(|| KeycheckError::UsageUnavailable("billing cap missing".to_string()))?;

    let start = first_of_month(now).format("%Y-%m-%d").to_string();
    let end = next_day_midnight(now).format("%Y-%m-%d").to_string();
    let summary: UsageSummary = get_json(
        client,
        timeout,
        descriptor,
        base,
        key,
        endpoints.usage_path,
        &[("start_date", start.as_str()), ("end_date", end.as_str())],
    )
    .await?;

    let usage_usd = summary.total_usage.unwrap_or(0.0).max(0.0) / 100.0;
    let limit = usd_to_tokens(hard_limit_usd);
    if limit == 0 {
        return Err(KeycheckError::UsageUnavailable("billing cap missing".to_string()));
    }
    let line_items: usize = summary.daily_costs.iter().map(|d| d.line_items.len()).sum();

    Ok(TokenUsage {
        used: usd_to_tokens(usage_usd),
        limit,
        requests_used: Some(line_items as u64),
        requests_limit: None,
        reset_date: Some(resolve_reset(None, limit, now)),
    })
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn usd_to_tokens(usd: f64) -> u64 {
    let tokens = (usd / COST_PER_TOKEN_USD).round();
    if tokens.is_finite() && tokens > 0.0 {
        tokens as u64
    } else {
        0
    }
}

async fn get_json<T: DeserializeOwned>(
    client: &Client,
    timeout: Duration,
    descriptor: &ProviderDescriptor,
    base: &str,
    key: &str,
    path: &str,
    query: &[(&str, &str)],
) -> Result<T> {
    let headers = (descriptor.auth_headers)(key)?;
    let mut url = descriptor.request_url(base, path, key)?;
    if !query.is_empty() {
        url.query_pairs_mut().extend_pairs(query);
    }

    let response = client
        .get(url)
        .headers(headers)
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| transport_error(descriptor.id, &e, timeout))?;

    let status = response.status();
    if !status.is_success() {
        return Err(KeycheckError::UsageUnavailable(format!(
            "billing endpoint returned {}",
            status.as_u16()
        )));
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| transport_error(descriptor.id, &e, timeout))?;
    // serde's message can quote body content; keep only the position.
    serde_json::from_slice(&body).map_err(|e| {
        KeycheckError::ParseResponse(format!(
            "billing payload ({:?} error at line {} column {})",
            e.classify(),
            e.line(),
            e.column()
        ))
    })
}
