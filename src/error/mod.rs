//! Error types for keycheck.
//!
//! Uses `thiserror` for structured error types that map to HTTP statuses,
//! user-facing messages, and CLI exit codes.
//!
//! ## Error Taxonomy
//!
//! Every error resolves to one [`ErrorKind`]:
//! - **Input** (`InputError`, `UnsupportedProvider`): rejected before any network call, HTTP 400
//! - **Provider outcomes** (`AuthError`, `RateLimited`, `ProviderUnavailable`,
//!   `NetworkError`, `GenericInvalid`): a normal business result, HTTP 200 with `isValid=false`
//! - **Internal** (`InternalError`): HTTP 500 with a generic message
//!
//! Each error also has a stable error code (e.g., `KC-I001`) for programmatic handling.
//! Raw provider responses and raw error text are never part of a user-facing message.

use thiserror::Error;

use crate::core::provider::Provider;

// =============================================================================
// Error Categories
// =============================================================================

/// High-level error categories for classification and log routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Caller input problems (missing fields, unknown provider).
    Input,
    /// The provider answered, but not with an acceptance.
    Provider,
    /// Transport problems (timeout, DNS, refused connection).
    Network,
    /// Configuration problems (invalid file, bad values).
    Configuration,
    /// Unexpected errors, bugs, or unclassified issues.
    Internal,
}

impl ErrorCategory {
    /// Returns a human-readable description of the category.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::Input => "Input error",
            Self::Provider => "Provider error",
            Self::Network => "Network error",
            Self::Configuration => "Configuration error",
            Self::Internal => "Internal error",
        }
    }

    /// Returns a short code prefix for this category.
    #[must_use]
    pub const fn code_prefix(&self) -> &'static str {
        match self {
            Self::Input => "I",
            Self::Provider => "P",
            Self::Network => "N",
            Self::Configuration => "C",
            Self::Internal => "X",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

// =============================================================================
// Error Kinds
// =============================================================================

/// Uniform outcome kinds a validation can end in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub enum ErrorKind {
    InputError,
    UnsupportedProvider,
    AuthError,
    RateLimited,
    ProviderUnavailable,
    NetworkError,
    GenericInvalid,
    InternalError,
}

impl ErrorKind {
    /// HTTP status the service answers with for this kind.
    ///
    /// Provider outcomes are business results and answer 200.
    #[must_use]
    pub const fn http_status(self) -> u16 {
        match self {
            Self::InputError | Self::UnsupportedProvider => 400,
            Self::InternalError => 500,
            Self::AuthError
            | Self::RateLimited
            | Self::ProviderUnavailable
            | Self::NetworkError
            | Self::GenericInvalid => 200,
        }
    }

    /// Fixed, human-readable message for provider outcomes.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::InputError => "Provider and API key are required",
            Self::UnsupportedProvider => "Unsupported provider",
            Self::AuthError => {
                "Invalid API key: the provider rejected the credential (unauthorized)"
            }
            Self::RateLimited => {
                "The provider is rate limiting this key; try again later"
            }
            Self::ProviderUnavailable => {
                "The provider is temporarily unavailable; try again later"
            }
            Self::NetworkError => "Could not reach the provider (network error or timeout)",
            Self::GenericInvalid => "The provider did not accept the API key",
            Self::InternalError => "Internal server error",
        }
    }

    /// Whether this kind is a provider-side outcome (HTTP 200, `isValid=false`).
    #[must_use]
    pub const fn is_provider_outcome(self) -> bool {
        self.http_status() == 200
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::InputError => "InputError",
            Self::UnsupportedProvider => "UnsupportedProvider",
            Self::AuthError => "AuthError",
            Self::RateLimited => "RateLimited",
            Self::ProviderUnavailable => "ProviderUnavailable",
            Self::NetworkError => "NetworkError",
            Self::GenericInvalid => "GenericInvalid",
            Self::InternalError => "InternalError",
        };
        f.write_str(name)
    }
}

// =============================================================================
// Exit Codes
// =============================================================================

/// Exit codes for the `keycheck` binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    /// Key valid / command succeeded
    Success = 0,
    /// Key was checked and not accepted
    KeyInvalid = 1,
    /// Missing input or unsupported provider
    InputError = 2,
    /// Configuration or unexpected failure
    GeneralError = 3,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

/// Main error type for keycheck operations.
#[derive(Error, Debug)]
pub enum KeycheckError {
    // ==========================================================================
    // Input errors (Category: Input)
    // ==========================================================================
    /// Request is missing a field or carries an unusable value.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Provider identifier is not in the catalog (or disabled by configuration).
    #[error("unsupported provider: {0}")]
    UnsupportedProvider(String),

    // ==========================================================================
    // Provider outcomes (Category: Provider)
    // ==========================================================================
    /// Provider rejected the credential (401/403).
    #[error("credential rejected by {provider} (HTTP {status})")]
    AuthRejected { provider: Provider, status: u16 },

    /// Provider is rate limiting the credential (429).
    #[error("rate limited by {provider}")]
    RateLimited { provider: Provider },

    /// Provider answered with a server error (5xx).
    #[error("provider {provider} unavailable (HTTP {status})")]
    ProviderUnavailable { provider: Provider, status: u16 },

    /// Provider answered with some other non-success status.
    #[error("provider {provider} returned HTTP {status}")]
    UnexpectedStatus { provider: Provider, status: u16 },

    // ==========================================================================
    // Network errors (Category: Network)
    // ==========================================================================
    /// Request timed out.
    #[error("request to {provider} timed out after {seconds}s")]
    Timeout { provider: Provider, seconds: u64 },

    /// Connection, DNS, or TLS failure.
    #[error("network error talking to {provider}: {message}")]
    Network { provider: Provider, message: String },

    // ==========================================================================
    // Configuration errors (Category: Configuration)
    // ==========================================================================
    /// Invalid configuration file or value.
    #[error("configuration error: {0}")]
    Config(String),

    // ==========================================================================
    // Usage estimation (Category: Provider, never surfaced to callers)
    // ==========================================================================
    /// A usage strategy had nothing usable to work with.
    #[error("usage data unavailable: {0}")]
    UsageUnavailable(String),

    /// Provider response could not be parsed.
    #[error("failed to parse response: {0}")]
    ParseResponse(String),

    // ==========================================================================
    // Internal errors (Category: Internal)
    // ==========================================================================
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Catch-all for other errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl KeycheckError {
    /// The uniform outcome kind for this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput(_) => ErrorKind::InputError,
            Self::UnsupportedProvider(_) => ErrorKind::UnsupportedProvider,
            Self::AuthRejected { .. } => ErrorKind::AuthError,
            Self::RateLimited { .. } => ErrorKind::RateLimited,
            Self::ProviderUnavailable { .. } => ErrorKind::ProviderUnavailable,
            Self::UnexpectedStatus { .. } => ErrorKind::GenericInvalid,
            Self::Timeout { .. } | Self::Network { .. } => ErrorKind::NetworkError,
            Self::Config(_)
            | Self::UsageUnavailable(_)
            | Self::ParseResponse(_)
            | Self::Io(_)
            | Self::Json(_)
            | Self::Other(_) => ErrorKind::InternalError,
        }
    }

    /// Returns the error category for classification and routing.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidInput(_) | Self::UnsupportedProvider(_) => ErrorCategory::Input,

            Self::AuthRejected { .. }
            | Self::RateLimited { .. }
            | Self::ProviderUnavailable { .. }
            | Self::UnexpectedStatus { .. }
            | Self::UsageUnavailable(_)
            | Self::ParseResponse(_) => ErrorCategory::Provider,

            Self::Timeout { .. } | Self::Network { .. } => ErrorCategory::Network,

            Self::Config(_) => ErrorCategory::Configuration,

            Self::Io(_) | Self::Json(_) | Self::Other(_) => ErrorCategory::Internal,
        }
    }

    /// Returns a stable error code for programmatic handling.
    ///
    /// Format: `KC-{category}{number}`.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            // Input errors (I001-I099)
            Self::InvalidInput(_) => "KC-I001",
            Self::UnsupportedProvider(_) => "KC-I002",

            // Provider errors (P001-P099)
            Self::AuthRejected { .. } => "KC-P001",
            Self::RateLimited { .. } => "KC-P002",
            Self::ProviderUnavailable { .. } => "KC-P003",
            Self::UnexpectedStatus { .. } => "KC-P004",
            Self::UsageUnavailable(_) => "KC-P010",
            Self::ParseResponse(_) => "KC-P020",

            // Network errors (N001-N099)
            Self::Timeout { .. } => "KC-N001",
            Self::Network { .. } => "KC-N099",

            // Configuration errors (C001-C099)
            Self::Config(_) => "KC-C001",

            // Internal errors (X001-X099)
            Self::Io(_) => "KC-X001",
            Self::Json(_) => "KC-X002",
            Self::Other(_) => "KC-X099",
        }
    }

    /// HTTP status for this error when it reaches the service boundary.
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        self.kind().http_status()
    }

    /// Sanitized message safe to hand to callers.
    ///
    /// Input errors keep their detail (it only echoes caller input); everything
    /// else collapses to the fixed message for its kind.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidInput(detail) => detail.clone(),
            Self::UnsupportedProvider(name) => {
                let known = Provider::ALL
                    .iter()
                    .map(|p| p.id())
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("Unsupported provider '{name}'. Supported providers: {known}")
            }
            other => other.kind().message().to_string(),
        }
    }

    /// Map error to the CLI exit code.
    #[must_use]
    pub const fn exit_code(&self) -> ExitCode {
        match self.kind() {
            ErrorKind::InputError | ErrorKind::UnsupportedProvider => ExitCode::InputError,
            ErrorKind::InternalError => ExitCode::GeneralError,
            ErrorKind::AuthError
            | ErrorKind::RateLimited
            | ErrorKind::ProviderUnavailable
            | ErrorKind::NetworkError
            | ErrorKind::GenericInvalid => ExitCode::KeyInvalid,
        }
    }

    /// Returns the provider if this error is provider-specific.
    #[must_use]
    pub const fn provider(&self) -> Option<Provider> {
        match self {
            Self::AuthRejected { provider, .. }
            | Self::RateLimited { provider }
            | Self::ProviderUnavailable { provider, .. }
            | Self::UnexpectedStatus { provider, .. }
            | Self::Timeout { provider, .. }
            | Self::Network { provider, .. } => Some(*provider),
            _ => None,
        }
    }
}

/// Result type alias for keycheck operations.
pub type Result<T> = std::result::Result<T, KeycheckError>;
