//! Rate-limit header extraction.

use chrono::{DateTime, Utc};
use reqwest::header::HeaderMap;

use super::resolve_reset;
use crate::core::models::TokenUsage;
use crate::core::provider::RateLimitHeaders;
use crate::util::time::parse_reset_value;

/// Raw figures read from rate-limit headers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RateLimitReading {
    pub tokens_limit: Option<u64>,
    pub tokens_remaining: Option<u64>,
    pub requests_limit: Option<u64>,
    pub requests_remaining: Option<u64>,
    pub reset: Option<DateTime<Utc>>,
}

/// Read every configured header.
///
/// Limit and remaining come from the same header family: the first position
/// in the name lists where both are present and numeric wins.
#[must_use]
pub fn read(headers: &HeaderMap, names: &RateLimitHeaders, now: DateTime<Utc>) -> RateLimitReading {
    let (tokens_limit, tokens_remaining) =
        first_pair(headers, names.tokens_limit, names.tokens_remaining).unzip();
    let (requests_limit, requests_remaining) =
        first_pair(headers, names.requests_limit, names.requests_remaining).unzip();
    RateLimitReading {
        tokens_limit,
        tokens_remaining,
        requests_limit,
        requests_remaining,
        reset: names
            .reset
            .iter()
            .filter_map(|name| header_str(headers, name))
            .find_map(|raw| parse_reset_value(raw, now)),
    }
}

/// Token usage from rate-limit headers, when both token limit and remaining
/// are present and the limit is non-zero.
#[must_use]
pub fn usage_from_headers(
    headers: &HeaderMap,
    names: &RateLimitHeaders,
    now: DateTime<Utc>,
) -> Option<TokenUsage> {
    let reading = read(headers, names, now);
    let limit = reading.tokens_limit.filter(|limit| *limit > 0)?;
    let remaining = reading.tokens_remaining?;

    let requests_used = match (reading.requests_limit, reading.requests_remaining) {
        (Some(limit), Some(remaining)) => Some(limit.saturating_sub(remaining)),
        _ => None,
    };

    Some(TokenUsage {
        used: limit.saturating_sub(remaining),
        limit,
        requests_used,
        requests_limit: reading.requests_limit,
        reset_date: Some(resolve_reset(reading.reset, limit, now)),
    })
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

fn number(headers: &HeaderMap, name: &str) -> Option<u64> {
    header_str(headers, name).and_then(parse_count)
}

fn first_pair(headers: &HeaderMap, limits: &[&str], remainings: &[&str]) -> Option<(u64, u64)> {
    limits
        .iter()
        .zip(remainings)
        .find_map(|(limit, remaining)| Some((number(headers, limit)?, number(headers, remaining)?)))
}

/// Parse a non-negative count; tolerates a fractional part.
fn parse_count(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    if let Ok(value) = raw.parse::<u64>() {
        return Some(value);
    }
    let value = raw.parse::<f64>().ok()?;
    if !value.is_finite() || value < 0.0 {
        return None;
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    Some(value.floor() as u64)
}
