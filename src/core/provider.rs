//! Provider descriptors and registry.
//!
//! Defines the closed provider catalog and one capability record per provider:
//! where to probe, how to attach the credential, and which usage strategies to
//! try. Adding a provider means adding a descriptor here; the validator and the
//! estimator never branch on the provider itself.

use std::collections::HashMap;
use std::sync::LazyLock;

use reqwest::Url;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};

use crate::error::{KeycheckError, Result};

// =============================================================================
// Provider Enum
// =============================================================================

/// Supported LLM providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    OpenAI,
    Anthropic,
    Cohere,
    Gemini,
    Llama,
}

impl Provider {
    /// All providers in display order.
    pub const ALL: &'static [Self] = &[
        Self::OpenAI,
        Self::Anthropic,
        Self::Cohere,
        Self::Gemini,
        Self::Llama,
    ];

    /// Wire identifier for this provider.
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::OpenAI => "openai",
            Self::Anthropic => "anthropic",
            Self::Cohere => "cohere",
            Self::Gemini => "gemini",
            Self::Llama => "llama",
        }
    }

    /// Display name for human output.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::OpenAI => "OpenAI",
            Self::Anthropic => "Anthropic",
            Self::Cohere => "Cohere",
            Self::Gemini => "Google Gemini",
            Self::Llama => "Meta Llama",
        }
    }

    /// Parse from a wire identifier (case-insensitive, surrounding whitespace ignored).
    pub fn from_id(name: &str) -> Result<Self> {
        let lower = name.trim().to_lowercase();
        Self::ALL
            .iter()
            .find(|p| p.id() == lower)
            .copied()
            .ok_or_else(|| KeycheckError::UnsupportedProvider(name.trim().to_string()))
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

// =============================================================================
// Usage Strategy Tags
// =============================================================================

/// Header names carrying rate-limit telemetry, first complete pair wins.
#[derive(Debug)]
pub struct RateLimitHeaders {
    /// Paired by position with `tokens_remaining`.
    pub tokens_limit: &'static [&'static str],
    pub tokens_remaining: &'static [&'static str],
    /// Paired by position with `requests_remaining`.
    pub requests_limit: &'static [&'static str],
    pub requests_remaining: &'static [&'static str],
    pub reset: &'static [&'static str],
}

/// A minimal-cost generation call whose response headers carry rate limits.
#[derive(Debug)]
pub struct GenerationProbe {
    pub path: &'static str,
    /// Cheapest model the provider still serves; update when it is retired.
    pub model: &'static str,
    pub body: fn(&str) -> serde_json::Value,
    pub headers: &'static RateLimitHeaders,
}

/// Account-level billing endpoints.
#[derive(Debug)]
pub struct BillingEndpoints {
    pub subscription_path: &'static str,
    pub usage_path: &'static str,
}

/// Parameters of the synthetic time-based estimate.
#[derive(Debug)]
pub struct HeuristicProfile {
    /// Tokens per elapsed hour of the current month.
    pub scale: u64,
    /// Multiplier applied on Saturday and Sunday.
    pub weekend_factor: Option<f64>,
    /// Jitter bound; the estimate moves by at most this many tokens either way.
    pub jitter: u64,
    /// Candidate limits. One entry is a fixed tier; more are drawn from at random.
    pub limits: &'static [u64],
}

/// How to obtain a usage estimate for a provider.
#[derive(Debug, Clone, Copy)]
pub enum UsageStrategy {
    /// Rate-limit headers on the primary probe response.
    Headers(&'static RateLimitHeaders),
    /// Rate-limit headers on a secondary minimal generation call.
    Generation(&'static GenerationProbe),
    /// Secondary billing/subscription probe.
    Billing(&'static BillingEndpoints),
    /// Advisory estimate from wall-clock time and jitter.
    Heuristic(&'static HeuristicProfile),
}

impl UsageStrategy {
    /// Short label for logs and the `usageSource` field.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Headers(_) => "headers",
            Self::Generation(_) => "generation",
            Self::Billing(_) => "billing",
            Self::Heuristic(_) => "heuristic",
        }
    }

    /// Whether this strategy issues its own outbound request.
    #[must_use]
    pub const fn performs_io(&self) -> bool {
        matches!(self, Self::Generation(_) | Self::Billing(_))
    }

    /// Whether this strategy reads real provider telemetry.
    #[must_use]
    pub const fn is_real_signal(&self) -> bool {
        !matches!(self, Self::Heuristic(_))
    }
}

static OPENAI_RATE_LIMITS: RateLimitHeaders = RateLimitHeaders {
    tokens_limit: &["x-ratelimit-limit-tokens", "x-ratelimit-limit"],
    tokens_remaining: &["x-ratelimit-remaining-tokens", "x-ratelimit-remaining"],
    requests_limit: &["x-ratelimit-limit-requests"],
    requests_remaining: &["x-ratelimit-remaining-requests"],
    reset: &["x-ratelimit-reset-tokens", "x-ratelimit-reset"],
};

static ANTHROPIC_RATE_LIMITS: RateLimitHeaders = RateLimitHeaders {
    tokens_limit: &[
        "anthropic-ratelimit-tokens-limit",
        "anthropic-ratelimit-input-tokens-limit",
        "x-ratelimit-limit",
    ],
    tokens_remaining: &[
        "anthropic-ratelimit-tokens-remaining",
        "anthropic-ratelimit-input-tokens-remaining",
        "x-ratelimit-remaining",
    ],
    requests_limit: &["anthropic-ratelimit-requests-limit"],
    requests_remaining: &["anthropic-ratelimit-requests-remaining"],
    reset: &[
        "anthropic-ratelimit-tokens-reset",
        "anthropic-ratelimit-input-tokens-reset",
        "x-ratelimit-reset",
    ],
};

static ANTHROPIC_GENERATION: GenerationProbe = GenerationProbe {
    path: "/v1/messages",
    model: "claude-3-5-haiku-latest",
    body: anthropic_generation_body,
    headers: &ANTHROPIC_RATE_LIMITS,
};

static OPENAI_BILLING: BillingEndpoints = BillingEndpoints {
    subscription_path: "/v1/dashboard/billing/subscription",
    usage_path: "/v1/dashboard/billing/usage",
};

static ANTHROPIC_HEURISTIC: HeuristicProfile = HeuristicProfile {
    scale: 1_200,
    weekend_factor: Some(0.6),
    jitter: 2_500,
    limits: &[1_000_000],
};

static COHERE_HEURISTIC: HeuristicProfile = HeuristicProfile {
    scale: 100,
    weekend_factor: Some(0.5),
    jitter: 500,
    limits: &[100_000],
};

static GEMINI_HEURISTIC: HeuristicProfile = HeuristicProfile {
    scale: 1_200,
    weekend_factor: None,
    jitter: 5_000,
    limits: &[1_000_000, 2_000_000, 4_000_000],
};

fn anthropic_generation_body(model: &str) -> serde_json::Value {
    serde_json::json!({
        "model": model,
        "max_tokens": 1,
        "messages": [{"role": "user", "content": "hi"}]
    })
}

// =============================================================================
// Auth Capabilities
// =============================================================================

/// Builds the auth headers for a key.
pub type AuthHeaderFn = fn(&str) -> Result<HeaderMap>;

/// Builds a key-bearing URL from an endpoint.
pub type KeyUrlFn = fn(&str, &str) -> Result<Url>;

fn sensitive_value(raw: &str) -> Result<HeaderValue> {
    let mut value = HeaderValue::from_str(raw).map_err(|_| {
        KeycheckError::InvalidInput(
            "API key contains characters that cannot be sent to the provider".to_string(),
        )
    })?;
    value.set_sensitive(true);
    Ok(value)
}

fn bearer_auth(key: &str) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, sensitive_value(&format!("Bearer {key}"))?);
    Ok(headers)
}

fn anthropic_auth(key: &str) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(HeaderName::from_static("x-api-key"), sensitive_value(key)?);
    headers.insert(
        HeaderName::from_static("anthropic-version"),
        HeaderValue::from_static("2023-06-01"),
    );
    Ok(headers)
}

#[allow(clippy::unnecessary_wraps)]
fn no_auth_headers(_key: &str) -> Result<HeaderMap> {
    Ok(HeaderMap::new())
}

fn query_key_url(endpoint: &str, key: &str) -> Result<Url> {
    Url::parse_with_params(endpoint, &[("key", key)])
        .map_err(|e| KeycheckError::Config(format!("invalid provider endpoint: {e}")))
}

// =============================================================================
// Provider Descriptor
// =============================================================================

/// Capability record for one provider.
#[derive(Debug, Clone)]
pub struct ProviderDescriptor {
    pub id: Provider,
    /// Default API base URL (no trailing slash).
    pub api_base: &'static str,
    /// Path of the lightweight listing endpoint used as the validity probe.
    pub probe_path: &'static str,
    pub auth_headers: AuthHeaderFn,
    /// Set for providers that authenticate through a query parameter.
    pub key_url: Option<KeyUrlFn>,
    /// How the credential travels, for listings.
    pub auth_label: &'static str,
    /// Usage strategies in priority order; empty means unsupported.
    pub usage: Vec<UsageStrategy>,
}

impl ProviderDescriptor {
    /// Build the request URL for `path` under `base`, embedding the key when
    /// this provider authenticates via the URL.
    ///
    /// The returned URL may carry the credential and must not be logged.
    pub fn request_url(&self, base: &str, path: &str, key: &str) -> Result<Url> {
        let endpoint = join_url(base, path);
        match self.key_url {
            Some(build) => build(&endpoint, key),
            None => Url::parse(&endpoint)
                .map_err(|e| KeycheckError::Config(format!("invalid provider endpoint: {e}"))),
        }
    }

    /// Whether any usage strategy is configured.
    #[must_use]
    pub fn supports_usage(&self) -> bool {
        !self.usage.is_empty()
    }
}

/// Join a base URL and a path without doubling slashes.
#[must_use]
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

// =============================================================================
// Provider Registry
// =============================================================================

static GLOBAL_REGISTRY: LazyLock<ProviderRegistry> = LazyLock::new(ProviderRegistry::new);

/// Registry of all provider descriptors.
#[derive(Debug)]
pub struct ProviderRegistry {
    descriptors: HashMap<Provider, ProviderDescriptor>,
}

impl ProviderRegistry {
    /// Create the registry with all providers.
    #[must_use]
    pub fn new() -> Self {
        let mut descriptors = HashMap::new();

        descriptors.insert(
            Provider::OpenAI,
            ProviderDescriptor {
                id: Provider::OpenAI,
                api_base: "https://api.openai.com",
                probe_path: "/v1/models",
                auth_headers: bearer_auth,
                key_url: None,
                auth_label: "bearer token",
                usage: vec![
                    UsageStrategy::Headers(&OPENAI_RATE_LIMITS),
                    UsageStrategy::Billing(&OPENAI_BILLING),
                ],
            },
        );

        descriptors.insert(
            Provider::Anthropic,
            ProviderDescriptor {
                id: Provider::Anthropic,
                api_base: "https://api.anthropic.com",
                probe_path: "/v1/models",
                auth_headers: anthropic_auth,
                key_url: None,
                auth_label: "x-api-key header",
                usage: vec![
                    UsageStrategy::Headers(&ANTHROPIC_RATE_LIMITS),
                    UsageStrategy::Generation(&ANTHROPIC_GENERATION),
                    UsageStrategy::Heuristic(&ANTHROPIC_HEURISTIC),
                ],
            },
        );

        descriptors.insert(
            Provider::Cohere,
            ProviderDescriptor {
                id: Provider::Cohere,
                api_base: "https://api.cohere.com",
                probe_path: "/v1/models",
                auth_headers: bearer_auth,
                key_url: None,
                auth_label: "bearer token",
                usage: vec![UsageStrategy::Heuristic(&COHERE_HEURISTIC)],
            },
        );

        descriptors.insert(
            Provider::Gemini,
            ProviderDescriptor {
                id: Provider::Gemini,
                api_base: "https://generativelanguage.googleapis.com",
                probe_path: "/v1beta/models",
                auth_headers: no_auth_headers,
                key_url: Some(query_key_url),
                auth_label: "query parameter",
                usage: vec![UsageStrategy::Heuristic(&GEMINI_HEURISTIC)],
            },
        );

        descriptors.insert(
            Provider::Llama,
            ProviderDescriptor {
                id: Provider::Llama,
                api_base: "https://api.llama.com",
                probe_path: "/v1/models",
                auth_headers: bearer_auth,
                key_url: None,
                auth_label: "bearer token",
                usage: Vec::new(),
            },
        );

        Self { descriptors }
    }

    /// The process-wide registry, built on first use and never mutated.
    #[must_use]
    pub fn global() -> &'static Self {
        &GLOBAL_REGISTRY
    }

    /// Get descriptor for a provider.
    #[must_use]
    pub fn get(&self, provider: Provider) -> Option<&ProviderDescriptor> {
        self.descriptors.get(&provider)
    }

    /// Resolve a provider identifier to its descriptor.
    pub fn lookup(&self, name: &str) -> Result<&ProviderDescriptor> {
        let provider = Provider::from_id(name)?;
        self.get(provider)
            .ok_or_else(|| KeycheckError::UnsupportedProvider(name.trim().to_string()))
    }

    /// Iterate descriptors in display order.
    pub fn iter(&self) -> impl Iterator<Item = &ProviderDescriptor> {
        Provider::ALL.iter().filter_map(|p| self.descriptors.get(p))
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}
