//! Single-probe key validation.
//!
//! One authenticated request against the provider's listing endpoint, no
//! retries. The status code alone decides the verdict; the response body is
//! never read.

use std::time::{Duration, Instant};

use reqwest::Client;
use reqwest::header::HeaderMap;

use crate::core::http::{build_client, transport_error};
use crate::core::provider::{Provider, ProviderDescriptor};
use crate::error::{ErrorKind, KeycheckError, Result};

/// What a probe concluded about the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeVerdict {
    Accepted,
    AuthError,
    RateLimited,
    ProviderUnavailable,
    NetworkError,
    GenericInvalid,
}

impl ProbeVerdict {
    /// Map an HTTP status to a verdict.
    #[must_use]
    pub const fn from_status(status: u16) -> Self {
        match status {
            200..=299 => Self::Accepted,
            401 | 403 => Self::AuthError,
            429 => Self::RateLimited,
            500..=599 => Self::ProviderUnavailable,
            _ => Self::GenericInvalid,
        }
    }

    /// Outcome kind for a rejection; `None` when accepted.
    #[must_use]
    pub const fn error_kind(self) -> Option<ErrorKind> {
        match self {
            Self::Accepted => None,
            Self::AuthError => Some(ErrorKind::AuthError),
            Self::RateLimited => Some(ErrorKind::RateLimited),
            Self::ProviderUnavailable => Some(ErrorKind::ProviderUnavailable),
            Self::NetworkError => Some(ErrorKind::NetworkError),
            Self::GenericInvalid => Some(ErrorKind::GenericInvalid),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Accepted => "accepted",
            Self::AuthError => "auth_error",
            Self::RateLimited => "rate_limited",
            Self::ProviderUnavailable => "provider_unavailable",
            Self::NetworkError => "network_error",
            Self::GenericInvalid => "generic_invalid",
        }
    }
}

/// Result of one probe.
#[derive(Debug, Clone)]
pub struct ProbeOutcome {
    pub verdict: ProbeVerdict,
    /// HTTP status, absent on transport failure.
    pub status: Option<u16>,
    /// Response headers, kept for rate-limit extraction.
    pub headers: HeaderMap,
    /// Transport failure was a timeout.
    pub timed_out: bool,
}

impl ProbeOutcome {
    #[must_use]
    pub fn accepted(&self) -> bool {
        self.verdict == ProbeVerdict::Accepted
    }

    /// The typed error describing a rejection, or `None` when accepted.
    #[must_use]
    pub fn rejection(&self, provider: Provider, timeout: Duration) -> Option<KeycheckError> {
        let status = self.status.unwrap_or_default();
        match self.verdict {
            ProbeVerdict::Accepted => None,
            ProbeVerdict::AuthError => Some(KeycheckError::AuthRejected { provider, status }),
            ProbeVerdict::RateLimited => Some(KeycheckError::RateLimited { provider }),
            ProbeVerdict::ProviderUnavailable => {
                Some(KeycheckError::ProviderUnavailable { provider, status })
            }
            ProbeVerdict::GenericInvalid => {
                Some(KeycheckError::UnexpectedStatus { provider, status })
            }
            ProbeVerdict::NetworkError if self.timed_out => Some(KeycheckError::Timeout {
                provider,
                seconds: timeout.as_secs(),
            }),
            ProbeVerdict::NetworkError => Some(KeycheckError::Network {
                provider,
                message: "probe failed".to_string(),
            }),
        }
    }
}

/// Issues the validity probe.
#[derive(Debug, Clone)]
pub struct KeyValidator {
    client: Client,
    timeout: Duration,
}

impl KeyValidator {
    /// Create a validator with its own client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built.
    pub fn new(timeout: Duration) -> Result<Self> {
        Ok(Self::with_client(build_client(timeout)?, timeout))
    }

    /// Create a validator around an existing client.
    #[must_use]
    pub const fn with_client(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Probe `descriptor`'s listing endpoint under `base` with `key`.
    ///
    /// Transport failures are a verdict, not an error. Errors are reserved for
    /// requests that cannot be built at all (unusable key, bad endpoint).
    pub async fn probe(
        &self,
        descriptor: &ProviderDescriptor,
        base: &str,
        key: &str,
    ) -> Result<ProbeOutcome> {
        let headers = (descriptor.auth_headers)(key)?;
        let url = descriptor.request_url(base, descriptor.probe_path, key)?;

        let started = Instant::now();
        let response = self
            .client
            .get(url)
            .headers(headers)
            .timeout(self.timeout)
            .send()
            .await;
        #[allow(clippy::cast_possible_truncation)]
        let elapsed_ms = started.elapsed().as_millis() as u64;

        let outcome = match response {
            Ok(response) => {
                let status = response.status().as_u16();
                ProbeOutcome {
                    verdict: ProbeVerdict::from_status(status),
                    status: Some(status),
                    headers: response.headers().clone(),
                    timed_out: false,
                }
            }
            Err(err) => {
                let mapped = transport_error(descriptor.id, &err, self.timeout);
                tracing::debug!(
                    provider = %descriptor.id,
                    error_code = mapped.error_code(),
                    error = %mapped,
                    "Probe transport failure"
                );
                ProbeOutcome {
                    verdict: ProbeVerdict::NetworkError,
                    status: None,
                    headers: HeaderMap::new(),
                    timed_out: err.is_timeout(),
                }
            }
        };

        tracing::debug!(
            provider = %descriptor.id,
            status = outcome.status,
            verdict = outcome.verdict.as_str(),
            elapsed_ms,
            "Probe finished"
        );

        Ok(outcome)
    }
}
