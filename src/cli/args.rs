//! CLI argument definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::storage::config::ConfigOverrides;

/// keycheck - validate LLM provider API keys and estimate remaining quota.
#[derive(Parser, Debug)]
#[command(name = "keycheck")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    // === Global flags ===
    /// Config file path (overrides KEYCHECK_CONFIG and the platform default)
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Emit JSON logs to stderr
    #[arg(long, global = true)]
    pub json_output: bool,

    /// Increase log verbosity (repeatable)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

impl Cli {
    /// Configuration overrides carried by the command line.
    #[must_use]
    pub fn overrides(&self) -> ConfigOverrides {
        let (bind, timeout_seconds) = match &self.command {
            Commands::Serve(args) => (args.bind.clone(), args.timeout),
            Commands::Check(args) => (None, args.timeout),
            Commands::Providers(_) => (None, None),
        };
        ConfigOverrides {
            config_path: self.config.clone(),
            bind,
            timeout_seconds,
        }
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP validation service
    Serve(ServeArgs),

    /// Validate one key from the terminal
    Check(CheckArgs),

    /// List supported providers
    Providers(ProvidersArgs),
}

/// Arguments for the `serve` command.
#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    /// Address to listen on (e.g. 127.0.0.1:8787)
    #[arg(long, value_name = "ADDR")]
    pub bind: Option<String>,

    /// Timeout for each provider call, in seconds
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<u64>,
}

/// Arguments for the `check` command.
///
/// The key is never taken from argv: it would land in shell history and in
/// the process table.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Provider identifier (openai, anthropic, cohere, gemini, llama)
    #[arg(long, value_name = "PROVIDER")]
    pub provider: String,

    /// Read the key from this environment variable instead of stdin
    #[arg(long, value_name = "VAR")]
    pub key_env: Option<String>,

    /// Timeout for each provider call, in seconds
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<u64>,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `providers` command.
#[derive(Args, Debug, Default)]
pub struct ProvidersArgs {
    /// Print the catalog as JSON
    #[arg(long)]
    pub json: bool,
}
