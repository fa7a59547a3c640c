//! Validation entry point.
//!
//! Composes registry lookup, the validity probe, and usage estimation into one
//! call. Input problems and unsupported providers are rejected before any
//! network traffic; a rejected key is an `Ok` result, not an error; usage
//! estimation runs only after acceptance and cannot change the verdict.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::Instrument;

use crate::core::clock::{Clock, RandomSource, SystemClock, ThreadRandom};
use crate::core::http::{DEFAULT_PROBE_TIMEOUT, DEFAULT_USAGE_TIMEOUT, build_client};
use crate::core::models::{ValidationRequest, ValidationResult};
use crate::core::provider::{Provider, ProviderDescriptor, ProviderRegistry};
use crate::core::usage::UsageEstimator;
use crate::core::validator::KeyValidator;
use crate::error::{KeycheckError, Result};
use crate::storage::config::ResolvedConfig;

/// Message for a request missing its provider or key.
const MISSING_INPUT: &str = "Provider and API key are required";

// =============================================================================
// Orchestrator
// =============================================================================

/// Shared, stateless validation service.
///
/// Cheap to share behind an `Arc`; the only shared parts are the immutable
/// registry and a pooled HTTP client.
#[derive(Debug)]
pub struct ValidationOrchestrator {
    registry: &'static ProviderRegistry,
    endpoints: HashMap<Provider, String>,
    disabled: HashSet<Provider>,
    validator: KeyValidator,
    estimator: UsageEstimator,
}

impl ValidationOrchestrator {
    #[must_use]
    pub fn builder() -> OrchestratorBuilder {
        OrchestratorBuilder::default()
    }

    /// Build from resolved configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built.
    pub fn from_config(config: &ResolvedConfig) -> Result<Self> {
        let mut builder = Self::builder()
            .probe_timeout(config.probe_timeout)
            .usage_timeout(config.usage_timeout);
        for (provider, base) in &config.endpoints {
            builder = builder.endpoint(*provider, base.clone());
        }
        for provider in &config.disabled {
            builder = builder.disable(*provider);
        }
        builder.build()
    }

    #[must_use]
    pub const fn registry(&self) -> &'static ProviderRegistry {
        self.registry
    }

    /// Whether operators left this provider enabled.
    #[must_use]
    pub fn is_enabled(&self, provider: Provider) -> bool {
        !self.disabled.contains(&provider)
    }

    /// API base in effect for `descriptor`.
    #[must_use]
    pub fn endpoint<'a>(&'a self, descriptor: &'a ProviderDescriptor) -> &'a str {
        self.endpoints
            .get(&descriptor.id)
            .map_or(descriptor.api_base, String::as_str)
    }

    /// Validate one credential.
    ///
    /// The request is consumed; its key buffer is wiped when this returns.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for a missing provider or key,
    /// `UnsupportedProvider` for an unknown or disabled provider, and an
    /// internal error when the probe request cannot be built. Provider
    /// rejections are returned as `Ok` with `is_valid == false`.
    pub async fn validate(&self, request: ValidationRequest) -> Result<ValidationResult> {
        let fingerprint = if request.key().is_empty() {
            String::new()
        } else {
            request.key_fingerprint()
        };
        let span = tracing::info_span!(
            "validate",
            provider = %request.provider(),
            key_fp = %fingerprint,
            verdict = tracing::field::Empty,
            status = tracing::field::Empty,
            usage_source = tracing::field::Empty,
            duration_ms = tracing::field::Empty,
        );

        self.run(&request).instrument(span).await
    }

    async fn run(&self, request: &ValidationRequest) -> Result<ValidationResult> {
        let started = Instant::now();
        let span = tracing::Span::current();

        if request.provider().is_empty() || request.key().is_empty() {
            tracing::info!("Rejected request with missing provider or key");
            return Err(KeycheckError::InvalidInput(MISSING_INPUT.to_string()));
        }

        let descriptor = self.registry.lookup(request.provider())?;
        if !self.is_enabled(descriptor.id) {
            tracing::info!("Provider disabled by configuration");
            return Err(KeycheckError::UnsupportedProvider(
                descriptor.id.id().to_string(),
            ));
        }

        let base = self.endpoint(descriptor);
        let outcome = self.validator.probe(descriptor, base, request.key()).await?;
        span.record("verdict", outcome.verdict.as_str());
        if let Some(status) = outcome.status {
            span.record("status", status);
        }

        let result = match outcome.verdict.error_kind() {
            Some(kind) => {
                if let Some(err) = outcome.rejection(descriptor.id, self.validator.timeout()) {
                    tracing::debug!(error_code = err.error_code(), error = %err, "Key not accepted");
                }
                ValidationResult::invalid(kind)
            }
            None => {
                let usage = self
                    .estimator
                    .estimate(descriptor, base, request.key(), &outcome.headers)
                    .await;
                if let Some((_, source)) = &usage {
                    span.record("usage_source", source.as_str());
                }
                ValidationResult::valid(usage)
            }
        };

        #[allow(clippy::cast_possible_truncation)]
        let duration_ms = started.elapsed().as_millis() as u64;
        span.record("duration_ms", duration_ms);
        tracing::info!(
            is_valid = result.is_valid,
            has_usage = result.token_usage.is_some(),
            duration_ms,
            "Validation finished"
        );

        Ok(result)
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Builder for [`ValidationOrchestrator`].
pub struct OrchestratorBuilder {
    probe_timeout: Duration,
    usage_timeout: Duration,
    endpoints: HashMap<Provider, String>,
    disabled: HashSet<Provider>,
    clock: Arc<dyn Clock>,
    random: Arc<dyn RandomSource>,
}

impl Default for OrchestratorBuilder {
    fn default() -> Self {
        Self {
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            usage_timeout: DEFAULT_USAGE_TIMEOUT,
            endpoints: HashMap::new(),
            disabled: HashSet::new(),
            clock: Arc::new(SystemClock),
            random: Arc::new(ThreadRandom),
        }
    }
}

impl OrchestratorBuilder {
    #[must_use]
    pub fn probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    #[must_use]
    pub fn usage_timeout(mut self, timeout: Duration) -> Self {
        self.usage_timeout = timeout;
        self
    }

    /// Override the API base for one provider.
    #[must_use]
    pub fn endpoint(mut self, provider: Provider, base: impl Into<String>) -> Self {
        self.endpoints.insert(provider, base.into());
        self
    }

    /// Point every provider at the same base (mock servers).
    #[must_use]
    pub fn all_endpoints(mut self, base: &str) -> Self {
        for provider in Provider::ALL {
            self.endpoints.insert(*provider, base.to_string());
        }
        self
    }

    /// Treat `provider` as unsupported.
    #[must_use]
    pub fn disable(mut self, provider: Provider) -> Self {
        self.disabled.insert(provider);
        self
    }

    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn random(mut self, random: Arc<dyn RandomSource>) -> Self {
        self.random = random;
        self
    }

    /// Build the orchestrator around one pooled client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built.
    pub fn build(self) -> Result<ValidationOrchestrator> {
        let client = build_client(self.probe_timeout.max(self.usage_timeout))?;
        Ok(ValidationOrchestrator {
            registry: ProviderRegistry::global(),
            endpoints: self.endpoints,
            disabled: self.disabled,
            validator: KeyValidator::with_client(client.clone(), self.probe_timeout),
            estimator: UsageEstimator::with_parts(
                client,
                self.usage_timeout,
                self.clock,
                self.random,
            ),
        })
    }
}
