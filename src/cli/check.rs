//! Check command implementation.

use std::io::BufRead;

use chrono::{DateTime, Utc};

use crate::cli::args::CheckArgs;
use crate::core::models::{ValidationRequest, ValidationResult};
use crate::core::orchestrator::ValidationOrchestrator;
use crate::core::provider::Provider;
use crate::error::{ExitCode, KeycheckError, Result};
use crate::storage::config::ResolvedConfig;
use crate::util::{format_countdown, format_share, format_tokens};

/// Execute the check command.
///
/// Returns `KeyInvalid` when the provider did not accept the key; input and
/// configuration problems come back as errors.
///
/// # Errors
///
/// Returns error if the key cannot be read, the provider is unknown or
/// disabled, or the key is empty.
pub async fn execute(args: &CheckArgs, config: &ResolvedConfig) -> Result<ExitCode> {
    let raw_key = read_key(args.key_env.as_deref())?;
    let orchestrator = ValidationOrchestrator::from_config(config)?;

    let result = orchestrator
        .validate(ValidationRequest::new(args.provider.as_str(), raw_key))
        .await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        let name = Provider::from_id(args.provider.trim())
            .map_or_else(|_| args.provider.clone(), |p| p.display_name().to_string());
        println!("{}", render_human(&name, &result, Utc::now()));
    }

    Ok(if result.is_valid {
        ExitCode::Success
    } else {
        ExitCode::KeyInvalid
    })
}

fn read_key(key_env: Option<&str>) -> Result<String> {
    match key_env {
        Some(name) => std::env::var(name).map_err(|_| {
            KeycheckError::InvalidInput(format!("Environment variable {name} is not set"))
        }),
        None => read_key_from(std::io::stdin().lock()),
    }
}

/// First line of `reader`; trimming happens in [`ValidationRequest::new`].
fn read_key_from(mut reader: impl BufRead) -> Result<String> {
    let mut line = String::new();
    reader.read_line(&mut line)?;
    Ok(line)
}

pub(crate) fn render_human(name: &str, result: &ValidationResult, now: DateTime<Utc>) -> String {
    if !result.is_valid {
        let reason = result.error.as_deref().unwrap_or("not accepted");
        return format!("{name}: invalid ({reason})");
    }

    let mut lines = vec![format!("{name}: valid")];
    match (&result.token_usage, result.usage_source) {
        (Some(usage), source) => {
            lines.push(format!(
                "  tokens:   {} used of {} ({})",
                format_tokens(usage.used),
                format_tokens(usage.limit),
                format_share(usage.used, usage.limit)
            ));
            if let (Some(used), Some(limit)) = (usage.requests_used, usage.requests_limit) {
                lines.push(format!("  requests: {used} of {limit}"));
            }
            if let Some(reset) = usage.reset_date {
                lines.push(format!("  resets:   {}", format_countdown(reset, now)));
            }
            if let Some(source) = source {
                let note = if source.is_real() { "" } else { " (estimate)" };
                lines.push(format!("  source:   {}{note}", source.as_str()));
            }
        }
        (None, _) => lines.push("  usage:    not available".to_string()),
    }
    lines.join("\n")
}
