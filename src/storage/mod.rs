//! Configuration storage.

pub mod config;
pub mod paths;

pub use config::{
    Config, ConfigOverrides, ConfigSource, ConfigSources, ENV_BIND, ENV_CONFIG, ENV_TIMEOUT,
    ResolvedConfig,
};
pub use paths::AppPaths;
