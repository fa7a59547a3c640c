//! Serve command implementation.

use crate::error::Result;
use crate::server;
use crate::storage::config::ResolvedConfig;

/// Execute the serve command. Runs until Ctrl-C.
///
/// # Errors
///
/// Returns error if the listener cannot be bound.
pub async fn execute(config: &ResolvedConfig) -> Result<()> {
    tracing::debug!(
        config_path = %config.config_path.display(),
        config_path_source = %config.sources.config_path,
        bind_source = %config.sources.bind,
        timeout_source = %config.sources.timeout,
        probe_timeout_secs = config.probe_timeout.as_secs(),
        usage_timeout_secs = config.usage_timeout.as_secs(),
        disabled = config.disabled.len(),
        "Configuration resolved"
    );
    server::run(config).await
}
