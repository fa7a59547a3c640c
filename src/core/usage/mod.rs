//! Best-effort usage estimation.
//!
//! Walks a descriptor's ordered strategies; the first one that yields a
//! [`TokenUsage`] wins. Every failure inside a strategy is logged at debug and
//! treated as "no data", so estimation can never change a validity verdict.

pub mod billing;
pub mod generation;
pub mod headers;
pub mod heuristic;

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use reqwest::Client;
use reqwest::header::HeaderMap;

use crate::core::clock::{Clock, RandomSource, SystemClock, ThreadRandom};
use crate::core::http::build_client;
use crate::core::models::{TokenUsage, UsageSource};
use crate::core::provider::{ProviderDescriptor, UsageStrategy};
use crate::error::Result;
use crate::util::time::{first_of_next_month, next_day_midnight};

/// Limits at or below this are treated as a free tier that resets daily.
pub const FREE_TIER_LIMIT: u64 = 100_000;

/// Pick the reset instant for an estimate.
///
/// A provider-reported reset wins when it lies strictly after `now`. Otherwise
/// free tiers reset at the next UTC midnight and paid tiers on the first of
/// next month.
#[must_use]
pub fn resolve_reset(
    reported: Option<DateTime<Utc>>,
    limit: u64,
    now: DateTime<Utc>,
) -> DateTime<Utc> {
    match reported {
        Some(at) if at > now => at,
        _ if limit <= FREE_TIER_LIMIT => next_day_midnight(now),
        _ => first_of_next_month(now),
    }
}

/// Produces advisory usage figures for an accepted key.
#[derive(Clone)]
pub struct UsageEstimator {
    client: Client,
    timeout: Duration,
    clock: Arc<dyn Clock>,
    random: Arc<dyn RandomSource>,
}

impl std::fmt::Debug for UsageEstimator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UsageEstimator")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl UsageEstimator {
    /// Estimator on the system clock and thread RNG.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built.
    pub fn new(timeout: Duration) -> Result<Self> {
        Ok(Self::with_parts(
            build_client(timeout)?,
            timeout,
            Arc::new(SystemClock),
            Arc::new(ThreadRandom),
        ))
    }

    #[must_use]
    pub fn with_parts(
        client: Client,
        timeout: Duration,
        clock: Arc<dyn Clock>,
        random: Arc<dyn RandomSource>,
    ) -> Self {
        Self {
            client,
            timeout,
            clock,
            random,
        }
    }

    /// Replace the clock.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replace the random source.
    #[must_use]
    pub fn with_random(mut self, random: Arc<dyn RandomSource>) -> Self {
        self.random = random;
        self
    }

    /// Current time according to the injected clock.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Try each strategy in order and return the first estimate.
    ///
    /// `probe_headers` are the response headers of the validity probe.
    pub async fn estimate(
        &self,
        descriptor: &ProviderDescriptor,
        base: &str,
        key: &str,
        probe_headers: &HeaderMap,
    ) -> Option<(TokenUsage, UsageSource)> {
        if descriptor.usage.is_empty() {
            tracing::debug!(provider = %descriptor.id, "No usage strategy for provider");
            return None;
        }

        for strategy in &descriptor.usage {
            let started = Instant::now();
            let attempt = self
                .run_strategy(strategy, descriptor, base, key, probe_headers)
                .await;
            #[allow(clippy::cast_possible_truncation)]
            let duration_ms = started.elapsed().as_millis() as u64;

            match attempt {
                Ok(Some(usage)) => {
                    tracing::debug!(
                        provider = %descriptor.id,
                        strategy = strategy.label(),
                        used = usage.used,
                        limit = usage.limit,
                        duration_ms,
                        "Usage strategy succeeded"
                    );
                    return Some((usage, source_of(strategy)));
                }
                Ok(None) => {
                    tracing::debug!(
                        provider = %descriptor.id,
                        strategy = strategy.label(),
                        duration_ms,
                        "Usage strategy found no data"
                    );
                }
                Err(err) => {
                    tracing::debug!(
                        provider = %descriptor.id,
                        strategy = strategy.label(),
                        error_code = err.error_code(),
                        error = %err,
                        duration_ms,
                        "Usage strategy failed"
                    );
                }
            }
        }

        None
    }

    async fn run_strategy(
        &self,
        strategy: &UsageStrategy,
        descriptor: &ProviderDescriptor,
        base: &str,
        key: &str,
        probe_headers: &HeaderMap,
    ) -> Result<Option<TokenUsage>> {
        let now = self.clock.now();
        match strategy {
            UsageStrategy::Headers(names) => Ok(headers::usage_from_headers(probe_headers, names, now)),
            UsageStrategy::Generation(probe) => {
                generation::fetch(&self.client, self.timeout, descriptor, base, key, probe, now)
                    .await
            }
            UsageStrategy::Billing(endpoints) => {
                billing::fetch(&self.client, self.timeout, descriptor, base, key, endpoints, now)
                    .await
                    .map(Some)
            }
            UsageStrategy::Heuristic(profile) => {
                Ok(Some(heuristic::estimate(profile, now, self.random.as_ref())))
            }
        }
    }
}

const fn source_of(strategy: &UsageStrategy) -> UsageSource {
    match strategy {
        UsageStrategy::Headers(_) => UsageSource::Headers,
        UsageStrategy::Generation(_) => UsageSource::Generation,
        UsageStrategy::Billing(_) => UsageSource::Billing,
        UsageStrategy::Heuristic(_) => UsageSource::Heuristic,
    }
}
