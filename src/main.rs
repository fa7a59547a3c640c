//! keycheck - LLM provider API key validation
//!
//! CLI entry point.

#![forbid(unsafe_code)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

use clap::Parser;
use std::process::ExitCode;

use keycheck::cli::{Cli, Commands};
use keycheck::core::logging;
use keycheck::error::{ErrorKind, KeycheckError};
use keycheck::storage::config::ResolvedConfig;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = ResolvedConfig::resolve(&cli.overrides());

    // Initialize logging: --log-level, then KEYCHECK_LOG, then config file
    let log_level = cli
        .log_level
        .as_deref()
        .and_then(logging::LogLevel::from_arg)
        .or_else(|| {
            logging::log_directive_from_env()
                .as_deref()
                .and_then(logging::LogLevel::from_arg)
        })
        .or_else(|| config.as_ref().ok().and_then(|c| c.log_level))
        .unwrap_or_default()
        .raised_by(cli.verbose);
    let log_format = if cli.json_output {
        logging::LogFormat::Json
    } else {
        logging::parse_log_format_from_env().unwrap_or_default()
    };
    logging::init(log_level, log_format, logging::parse_log_file_from_env());

    let result = match config {
        Ok(config) => run(cli, &config).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(code) => ExitCode::from(code as u8),
        Err(e) => {
            tracing::debug!(error_code = e.error_code(), "Command failed");
            eprintln!("Error [{}]: {}", e.error_code(), describe(&e));
            ExitCode::from(e.exit_code() as u8)
        }
    }
}

async fn run(cli: Cli, config: &ResolvedConfig) -> keycheck::Result<keycheck::ExitCode> {
    match cli.command {
        Commands::Serve(_) => {
            keycheck::cli::serve::execute(config).await?;
            Ok(keycheck::ExitCode::Success)
        }
        Commands::Check(args) => keycheck::cli::check::execute(&args, config).await,
        Commands::Providers(args) => {
            keycheck::cli::providers::execute(&args, config)?;
            Ok(keycheck::ExitCode::Success)
        }
    }
}

/// Terminal message for a failed command. Internal errors keep their detail
/// here; the HTTP surface collapses them.
fn describe(e: &KeycheckError) -> String {
    if e.kind() == ErrorKind::InternalError {
        e.to_string()
    } else {
        e.user_message()
    }
}
