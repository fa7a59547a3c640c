//! Structured logging setup.
//!
//! Logs go to stderr (or a file) so stdout stays clean for `check --json`.
//! Credentials never reach a log line: callers log the key fingerprint only.

use std::fs::OpenOptions;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

pub const LOG_LEVEL_ENV: &str = "KEYCHECK_LOG";
pub const LOG_FORMAT_ENV: &str = "KEYCHECK_LOG_FORMAT";
pub const LOG_FILE_ENV: &str = "KEYCHECK_LOG_FILE";

/// Third-party crates stay at this level unless a directive says otherwise.
const DEPENDENCY_LEVEL: &str = "warn";

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable logs.
    #[default]
    Human,
    /// JSON logs (one event per line).
    Json,
    /// Compact logs (single line, terse).
    Compact,
}

impl LogFormat {
    /// Parse from string (case-insensitive).
    #[must_use]
    pub fn from_arg(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "human" | "pretty" => Some(Self::Human),
            "json" => Some(Self::Json),
            "compact" => Some(Self::Compact),
            _ => None,
        }
    }
}

/// Log verbosity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Parse from CLI argument or config value.
    #[must_use]
    pub fn from_arg(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "trace" => Some(Self::Trace),
            "verbose" | "debug" => Some(Self::Debug),
            "info" => Some(Self::Info),
            "warn" | "warning" => Some(Self::Warn),
            "error" => Some(Self::Error),
            _ => None,
        }
    }

    /// Convert to tracing filter string.
    #[must_use]
    pub const fn as_filter(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    #[must_use]
    pub const fn as_tracing_level(self) -> Level {
        match self {
            Self::Trace => Level::TRACE,
            Self::Debug => Level::DEBUG,
            Self::Info => Level::INFO,
            Self::Warn => Level::WARN,
            Self::Error => Level::ERROR,
        }
    }

    /// One step more verbose per `-v`, stopping at trace.
    #[must_use]
    pub const fn raised_by(self, steps: u8) -> Self {
        let mut level = self;
        let mut remaining = steps;
        while remaining > 0 {
            level = match level {
                Self::Error => Self::Warn,
                Self::Warn => Self::Info,
                Self::Info => Self::Debug,
                Self::Debug | Self::Trace => Self::Trace,
            };
            remaining -= 1;
        }
        level
    }
}

// =============================================================================
// Environment
// =============================================================================

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

/// Raw `KEYCHECK_LOG` value: a level name or a full filter directive.
#[must_use]
pub fn log_directive_from_env() -> Option<String> {
    non_empty_env(LOG_LEVEL_ENV)
}

/// Level named by `KEYCHECK_LOG`, when it is a plain level.
#[must_use]
pub fn parse_log_level_from_env() -> Option<Level> {
    log_directive_from_env()
        .and_then(|value| LogLevel::from_arg(&value))
        .map(LogLevel::as_tracing_level)
}

/// Format named by `KEYCHECK_LOG_FORMAT`.
#[must_use]
pub fn parse_log_format_from_env() -> Option<LogFormat> {
    non_empty_env(LOG_FORMAT_ENV).and_then(|value| LogFormat::from_arg(&value))
}

/// Log file named by `KEYCHECK_LOG_FILE`.
#[must_use]
pub fn parse_log_file_from_env() -> Option<PathBuf> {
    non_empty_env(LOG_FILE_ENV).map(PathBuf::from)
}

// =============================================================================
// Filter
// =============================================================================

/// Build the filter for `level`, or from `directive` when it is more than a
/// bare level name (e.g. `keycheck=debug,hyper=info`).
#[must_use]
pub fn build_filter(level: LogLevel, directive: Option<&str>) -> EnvFilter {
    let fallback = || {
        EnvFilter::new(format!(
            "{DEPENDENCY_LEVEL},keycheck={}",
            level.as_filter()
        ))
    };

    match directive {
        Some(raw) if LogLevel::from_arg(raw).is_none() => {
            EnvFilter::try_new(raw).unwrap_or_else(|_| fallback())
        }
        _ => fallback(),
    }
}

// =============================================================================
// Init
// =============================================================================

/// Initialize the global subscriber. A second call is a no-op.
///
/// `level` is already resolved by the caller. A `KEYCHECK_LOG` value that is a
/// full filter directive replaces it.
pub fn init(level: LogLevel, format: LogFormat, log_file: Option<PathBuf>) {
    let directive = log_directive_from_env();

    let file = log_file.and_then(|path| {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|err| eprintln!("keycheck: cannot open log file {}: {err}", path.display()))
            .ok()
    });

    let make_writer = |file: Option<&std::fs::File>| -> BoxMakeWriter {
        if let Some(file) = file.and_then(|inner| inner.try_clone().ok()) {
            BoxMakeWriter::new(file)
        } else {
            BoxMakeWriter::new(std::io::stderr)
        }
    };

    let filter = build_filter(level, directive.as_deref());
    let writer = make_writer(file.as_ref());

    match format {
        LogFormat::Json => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .json()
                .with_current_span(true)
                .with_writer(writer)
                .with_span_events(FmtSpan::CLOSE)
                .try_init()
                .ok();
        }
        LogFormat::Compact => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .compact()
                .with_writer(writer)
                .with_target(true)
                .try_init()
                .ok();
        }
        LogFormat::Human => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_target(false)
                .try_init()
                .ok();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

    #[allow(unsafe_code)]
    fn with_env_var(key: &str, value: &str, f: impl FnOnce()) {
        let _guard = ENV_LOCK.lock().unwrap();
        let prior = std::env::var(key).ok();
        unsafe {
            std::env::set_var(key, value);
        }
        f();
        match prior {
            Some(val) => unsafe {
                std::env::set_var(key, val);
            },
            None => unsafe {
                std::env::remove_var(key);
            },
        }
    }

    #[test]
    fn test_env_var_log_level_parsing() {
        with_env_var(LOG_LEVEL_ENV, "trace", || {
            assert_eq!(parse_log_level_from_env(), Some(Level::TRACE));
        });

        with_env_var(LOG_LEVEL_ENV, "warn", || {
            assert_eq!(parse_log_level_from_env(), Some(Level::WARN));
        });

        with_env_var(LOG_LEVEL_ENV, "keycheck=debug", || {
            assert_eq!(parse_log_level_from_env(), None);
            assert_eq!(log_directive_from_env().as_deref(), Some("keycheck=debug"));
        });
    }

    #[test]
    fn test_env_var_format_and_file() {
        with_env_var(LOG_FORMAT_ENV, "JSON", || {
            assert_eq!(parse_log_format_from_env(), Some(LogFormat::Json));
        });
        with_env_var(LOG_FILE_ENV, "  ", || {
            assert_eq!(parse_log_file_from_env(), None);
        });
    }

    #[test]
    fn verbosity_steps() {
        assert_eq!(LogLevel::Warn.raised_by(0), LogLevel::Warn);
        assert_eq!(LogLevel::Warn.raised_by(1), LogLevel::Info);
        assert_eq!(LogLevel::Info.raised_by(2), LogLevel::Trace);
        assert_eq!(LogLevel::Debug.raised_by(9), LogLevel::Trace);
    }

    #[test]
    fn filter_scopes_crate_level() {
        let filter = build_filter(LogLevel::Debug, None).to_string();
        assert!(filter.contains("keycheck=debug"));
        let custom = build_filter(LogLevel::Info, Some("keycheck=trace,hyper=info")).to_string();
        assert!(custom.contains("keycheck=trace"));
        let plain = build_filter(LogLevel::Info, Some("error")).to_string();
        assert!(plain.contains("keycheck=info"));
    }
}
