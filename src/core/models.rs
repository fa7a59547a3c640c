//! Core data models.
//!
//! Everything here lives for exactly one validation call. The credential sits
//! in a zeroize-on-drop buffer and never appears in `Debug` output.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use zeroize::{Zeroize, Zeroizing};

use crate::error::ErrorKind;

// =============================================================================
// Validation Request
// =============================================================================

/// A provider identifier plus a credential, scoped to one call.
pub struct ValidationRequest {
    provider: String,
    key: Zeroizing<String>,
}

impl ValidationRequest {
    /// Take ownership of the raw key, trimming it and wiping the original buffer.
    #[must_use]
    pub fn new(provider: impl Into<String>, raw_key: String) -> Self {
        let mut raw_key = raw_key;
        let key = Zeroizing::new(raw_key.trim().to_owned());
        raw_key.zeroize();
        Self {
            provider: provider.into().trim().to_owned(),
            key,
        }
    }

    /// Provider identifier as given by the caller (trimmed).
    #[must_use]
    pub fn provider(&self) -> &str {
        &self.provider
    }

    /// The trimmed credential.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Short, non-reversible fingerprint of the key for log correlation.
    #[must_use]
    pub fn key_fingerprint(&self) -> String {
        key_fingerprint(&self.key)
    }
}

impl std::fmt::Debug for ValidationRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidationRequest")
            .field("provider", &self.provider)
            .field("key", &"<redacted>")
            .finish()
    }
}

/// First 8 hex characters of the SHA-256 of `key`.
#[must_use]
pub fn key_fingerprint(key: &str) -> String {
    let digest = Sha256::digest(key.as_bytes());
    hex::encode(&digest[..4])
}

// =============================================================================
// Token Usage
// =============================================================================

/// Best-effort quota estimate. Advisory, never authoritative.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsage {
    pub used: u64,
    pub limit: u64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub requests_used: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub requests_limit: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_date: Option<DateTime<Utc>>,
}

impl TokenUsage {
    /// Tokens left before the limit, saturating at zero.
    #[must_use]
    pub const fn remaining(&self) -> u64 {
        self.limit.saturating_sub(self.used)
    }
}

/// Where a usage estimate came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UsageSource {
    Headers,
    Generation,
    Billing,
    Heuristic,
}

impl UsageSource {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Headers => "headers",
            Self::Generation => "generation",
            Self::Billing => "billing",
            Self::Heuristic => "heuristic",
        }
    }

    /// Whether the figures came from provider telemetry.
    #[must_use]
    pub const fn is_real(self) -> bool {
        !matches!(self, Self::Heuristic)
    }
}

// =============================================================================
// Validation Result
// =============================================================================

/// Uniform answer for one validation call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_usage: Option<TokenUsage>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_real_time_data: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage_source: Option<UsageSource>,

    /// Outcome kind of a rejected key; not serialized.
    #[serde(skip)]
    pub kind: Option<ErrorKind>,
}

impl ValidationResult {
    /// Key accepted, with or without a usage estimate.
    #[must_use]
    pub fn valid(usage: Option<(TokenUsage, UsageSource)>) -> Self {
        let (token_usage, usage_source) = usage.map_or((None, None), |(u, s)| (Some(u), Some(s)));
        Self {
            is_valid: true,
            error: None,
            has_real_time_data: Some(token_usage.is_some()),
            token_usage,
            usage_source,
            kind: None,
        }
    }

    /// Key not accepted; `kind` selects the fixed message.
    #[must_use]
    pub fn invalid(kind: ErrorKind) -> Self {
        Self::rejected(kind, kind.message().to_string())
    }

    /// Rejected with a specific message (input errors echo their detail).
    #[must_use]
    pub fn rejected(kind: ErrorKind, message: String) -> Self {
        Self {
            is_valid: false,
            error: Some(message),
            token_usage: None,
            has_real_time_data: None,
            usage_source: None,
            kind: Some(kind),
        }
    }
}
