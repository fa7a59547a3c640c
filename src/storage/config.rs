//! Configuration file loading and resolution.
//!
//! Loads configuration from:
//! - Linux: `~/.config/keycheck/config.toml`
//! - macOS: `~/Library/Application Support/keycheck/config.toml`
//! - Windows: `%APPDATA%/keycheck/config.toml`
//!
//! ## Precedence
//!
//! Settings are resolved with the following precedence (highest first):
//! 1. CLI flags
//! 2. Environment variables
//! 3. Config file
//! 4. Built-in defaults
//!
//! ## Environment Variables
//!
//! - `KEYCHECK_CONFIG`: Override config file path
//! - `KEYCHECK_BIND`: Listen address for `serve`
//! - `KEYCHECK_TIMEOUT`: Timeout in seconds for every provider call
//!
//! ## Example
//!
//! ```toml
//! [server]
//! bind = "127.0.0.1:8787"
//! max_body_bytes = 16384
//!
//! [general]
//! probe_timeout_seconds = 10
//! usage_timeout_seconds = 10
//! log_level = "info"
//!
//! [providers.llama]
//! enabled = false
//!
//! [providers.openai]
//! api_base = "https://openai-proxy.internal"
//! ```

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::Url;
use serde::{Deserialize, Serialize};

use super::AppPaths;
use crate::core::logging::LogLevel;
use crate::core::provider::Provider;
use crate::error::{KeycheckError, Result};

// =============================================================================
// Environment Variable Names
// =============================================================================

/// Environment variable to override config file path.
pub const ENV_CONFIG: &str = "KEYCHECK_CONFIG";
/// Environment variable for the listen address.
pub const ENV_BIND: &str = "KEYCHECK_BIND";
/// Environment variable for timeout in seconds.
pub const ENV_TIMEOUT: &str = "KEYCHECK_TIMEOUT";

// =============================================================================
// Defaults and Bounds
// =============================================================================

pub const DEFAULT_BIND: &str = "127.0.0.1:8787";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 10;
pub const DEFAULT_MAX_BODY_BYTES: usize = 16 * 1024;

const MIN_TIMEOUT_SECONDS: u64 = 1;
const MAX_TIMEOUT_SECONDS: u64 = 120;
const MIN_BODY_BYTES: usize = 256;
const MAX_BODY_BYTES: usize = 1024 * 1024;

// =============================================================================
// Overrides
// =============================================================================

/// Values supplied on the command line.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub config_path: Option<PathBuf>,
    pub bind: Option<String>,
    pub timeout_seconds: Option<u64>,
}

// =============================================================================
// Resolved Configuration
// =============================================================================

/// Fully resolved configuration after merging CLI, env vars, and config file.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Listen address for the HTTP service.
    pub bind: SocketAddr,
    /// Largest accepted request body.
    pub max_body_bytes: usize,
    /// Timeout for the validity probe.
    pub probe_timeout: Duration,
    /// Timeout for each usage call.
    pub usage_timeout: Duration,
    /// Log level from the config file, if set.
    pub log_level: Option<LogLevel>,
    /// Per-provider API base overrides.
    pub endpoints: HashMap<Provider, String>,
    /// Providers switched off by the operator.
    pub disabled: HashSet<Provider>,
    /// Config file that was consulted (it may not exist).
    pub config_path: PathBuf,
    /// Source of each setting for debugging.
    pub sources: ConfigSources,
}

/// Tracks the source of each configuration value.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    pub config_path: ConfigSource,
    pub bind: ConfigSource,
    pub timeout: ConfigSource,
    pub log_level: ConfigSource,
}

/// Where a configuration value came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConfigSource {
    /// Value from CLI flag.
    Cli,
    /// Value from environment variable.
    Env,
    /// Value from config file.
    ConfigFile,
    /// Built-in default.
    #[default]
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cli => write!(f, "CLI flag"),
            Self::Env => write!(f, "environment variable"),
            Self::ConfigFile => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

impl ResolvedConfig {
    /// Resolve final configuration from CLI overrides, the process
    /// environment, and the config file.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but is invalid, or any
    /// resolved value is out of bounds.
    pub fn resolve(overrides: &ConfigOverrides) -> Result<Self> {
        Self::resolve_with_env(overrides, &|name| std::env::var(name).ok())
    }

    /// Same as [`resolve`](Self::resolve) with an explicit environment lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but is invalid, or any
    /// resolved value is out of bounds.
    pub fn resolve_with_env(
        overrides: &ConfigOverrides,
        env: &dyn Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let mut sources = ConfigSources::default();
        let config_path = Self::resolve_config_path(overrides, env, &mut sources.config_path);
        let config = Config::load_from(&config_path)?;
        Self::from_parts(&config, overrides, env, config_path, sources)
    }

    /// Merge an already loaded config file with overrides and environment.
    ///
    /// # Errors
    ///
    /// Returns an error if any value fails validation.
    pub fn from_parts(
        config: &Config,
        overrides: &ConfigOverrides,
        env: &dyn Fn(&str) -> Option<String>,
        config_path: PathBuf,
        mut sources: ConfigSources,
    ) -> Result<Self> {
        config.validate()?;

        let bind = Self::resolve_bind(overrides, config, env, &mut sources.bind)?;
        let (probe_timeout, usage_timeout) =
            Self::resolve_timeouts(overrides, config, env, &mut sources.timeout)?;

        let log_level = config.general.log_level.as_deref().and_then(LogLevel::from_arg);
        sources.log_level = if log_level.is_some() {
            ConfigSource::ConfigFile
        } else {
            ConfigSource::Default
        };

        let mut endpoints = HashMap::new();
        let mut disabled = HashSet::new();
        for (name, settings) in &config.providers {
            let provider = Provider::from_id(name)?;
            if let Some(base) = &settings.api_base {
                endpoints.insert(provider, base.trim_end_matches('/').to_string());
            }
            if !settings.enabled {
                disabled.insert(provider);
            }
        }

        Ok(Self {
            bind,
            max_body_bytes: config.server.max_body_bytes,
            probe_timeout,
            usage_timeout,
            log_level,
            endpoints,
            disabled,
            config_path,
            sources,
        })
    }

    fn resolve_config_path(
        overrides: &ConfigOverrides,
        env: &dyn Fn(&str) -> Option<String>,
        source: &mut ConfigSource,
    ) -> PathBuf {
        // 1. CLI --config
        if let Some(path) = &overrides.config_path {
            *source = ConfigSource::Cli;
            return path.clone();
        }

        // 2. KEYCHECK_CONFIG
        if let Some(path) = env(ENV_CONFIG).filter(|p| !p.trim().is_empty()) {
            *source = ConfigSource::Env;
            return PathBuf::from(path);
        }

        // 3. Platform default
        *source = ConfigSource::Default;
        AppPaths::new().config_file()
    }

    fn resolve_bind(
        overrides: &ConfigOverrides,
        config: &Config,
        env: &dyn Fn(&str) -> Option<String>,
        source: &mut ConfigSource,
    ) -> Result<SocketAddr> {
        let (raw, from) = if let Some(bind) = &overrides.bind {
            (bind.clone(), ConfigSource::Cli)
        } else if let Some(bind) = env(ENV_BIND).filter(|b| !b.trim().is_empty()) {
            (bind, ConfigSource::Env)
        } else if let Some(bind) = &config.server.bind {
            (bind.clone(), ConfigSource::ConfigFile)
        } else {
            (DEFAULT_BIND.to_string(), ConfigSource::Default)
        };

        *source = from;
        raw.trim().parse().map_err(|_| {
            KeycheckError::Config(format!("Invalid bind address \"{raw}\" (from {from})"))
        })
    }

    fn resolve_timeouts(
        overrides: &ConfigOverrides,
        config: &Config,
        env: &dyn Fn(&str) -> Option<String>,
        source: &mut ConfigSource,
    ) -> Result<(Duration, Duration)> {
        // 1. CLI --timeout applies to every provider call
        if let Some(seconds) = overrides.timeout_seconds {
            *source = ConfigSource::Cli;
            let timeout = timeout_from_seconds(seconds, "--timeout")?;
            return Ok((timeout, timeout));
        }

        // 2. Environment variable
        if let Some(raw) = env(ENV_TIMEOUT).filter(|t| !t.trim().is_empty()) {
            *source = ConfigSource::Env;
            let seconds = raw.trim().parse::<u64>().map_err(|_| {
                KeycheckError::Config(format!("{ENV_TIMEOUT} must be a whole number of seconds"))
            })?;
            let timeout = timeout_from_seconds(seconds, ENV_TIMEOUT)?;
            return Ok((timeout, timeout));
        }

        // 3. Config file (defaults fill in when the file is silent)
        let general = &config.general;
        *source = if general.probe_timeout_seconds == DEFAULT_TIMEOUT_SECONDS
            && general.usage_timeout_seconds == DEFAULT_TIMEOUT_SECONDS
        {
            ConfigSource::Default
        } else {
            ConfigSource::ConfigFile
        };
        Ok((
            Duration::from_secs(general.probe_timeout_seconds),
            Duration::from_secs(general.usage_timeout_seconds),
        ))
    }
}

fn parse_bind(raw: &str) -> Result<SocketAddr> {
    raw.trim()
        .parse()
        .map_err(|_| KeycheckError::Config(format!("Invalid bind address \"{raw}\"")))
}

fn timeout_from_seconds(seconds: u64, what: &str) -> Result<Duration> {
    check_timeout(seconds, what)?;
    Ok(Duration::from_secs(seconds))
}

fn check_timeout(seconds: u64, what: &str) -> Result<()> {
    if (MIN_TIMEOUT_SECONDS..=MAX_TIMEOUT_SECONDS).contains(&seconds) {
        Ok(())
    } else {
        Err(KeycheckError::Config(format!(
            "{what} must be between {MIN_TIMEOUT_SECONDS} and {MAX_TIMEOUT_SECONDS} seconds"
        )))
    }
}

// =============================================================================
// File Model
// =============================================================================

/// Application configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP service settings.
    pub server: ServerConfig,
    /// General settings.
    pub general: GeneralConfig,
    /// Per-provider settings keyed by provider identifier.
    pub providers: BTreeMap<String, ProviderSettings>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address (e.g. "127.0.0.1:8787").
    pub bind: Option<String>,
    /// Largest accepted request body in bytes.
    pub max_body_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Timeout for the validity probe in seconds.
    pub probe_timeout_seconds: u64,
    /// Timeout for each usage call in seconds.
    pub usage_timeout_seconds: u64,
    /// Default log level (error, warn, info, debug, trace).
    pub log_level: Option<String>,
}

/// Settings for a specific provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    /// Whether this provider is offered at all.
    pub enabled: bool,
    /// Custom API base URL (if different from default).
    pub api_base: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: None,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            probe_timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            usage_timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            log_level: None,
        }
    }
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            api_base: None,
        }
    }
}

impl Config {
    /// Load configuration from the default config file path.
    ///
    /// Returns default config if the file doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns error only if the file exists but is invalid.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().config_file())
    }

    /// Load configuration from a specific path.
    ///
    /// Returns default config if the file doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns error only if the file exists but is invalid.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(?path, "Config file not found, using defaults");
            return Ok(Self::default());
        }

        tracing::debug!(?path, "Loading config file");
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns error if the text is not a valid config document.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| KeycheckError::Config(format!("Invalid config file: {e}")))
    }

    /// Validate configuration values.
    ///
    /// Checks that:
    /// - Provider identifiers are known
    /// - Provider API bases are absolute http(s) URLs
    /// - Timeouts are within 1-120 seconds
    /// - The bind address parses
    /// - The body limit is within 256 B - 1 MiB
    ///
    /// # Errors
    ///
    /// Returns a configuration error naming the first invalid value.
    pub fn validate(&self) -> Result<()> {
        let valid_providers = Provider::ALL
            .iter()
            .map(|provider| provider.id())
            .collect::<Vec<_>>()
            .join(", ");

        for (name, settings) in &self.providers {
            Provider::from_id(name).map_err(|_| {
                KeycheckError::Config(format!(
                    "Invalid provider \"{name}\" in [providers]. Valid providers: {valid_providers}",
                ))
            })?;

            if let Some(base) = &settings.api_base {
                let url = Url::parse(base).map_err(|_| {
                    KeycheckError::Config(format!("Invalid api_base for {name}: \"{base}\""))
                })?;
                if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
                    return Err(KeycheckError::Config(format!(
                        "api_base for {name} must be an absolute http(s) URL"
                    )));
                }
            }
        }

        check_timeout(self.general.probe_timeout_seconds, "probe_timeout_seconds")?;
        check_timeout(self.general.usage_timeout_seconds, "usage_timeout_seconds")?;

        if let Some(level) = &self.general.log_level
            && LogLevel::from_arg(level).is_none()
        {
            return Err(KeycheckError::Config(format!(
                "Invalid log_level \"{level}\". Valid levels: trace, debug, info, warn, error"
            )));
        }

        if let Some(bind) = &self.server.bind {
            parse_bind(bind)?;
        }

        if !(MIN_BODY_BYTES..=MAX_BODY_BYTES).contains(&self.server.max_body_bytes) {
            return Err(KeycheckError::Config(format!(
                "max_body_bytes must be between {MIN_BODY_BYTES} and {MAX_BODY_BYTES}"
            )));
        }

        Ok(())
    }
}
