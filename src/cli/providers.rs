//! Providers command implementation.

use serde::Serialize;

use crate::cli::args::ProvidersArgs;
use crate::core::provider::{ProviderDescriptor, ProviderRegistry};
use crate::error::Result;
use crate::storage::config::ResolvedConfig;

/// One catalog row.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ProviderListing {
    pub id: &'static str,
    pub name: &'static str,
    pub api_base: String,
    pub auth_style: &'static str,
    pub enabled: bool,
    pub usage_strategies: Vec<&'static str>,
}

impl ProviderListing {
    fn new(descriptor: &ProviderDescriptor, config: &ResolvedConfig) -> Self {
        Self {
            id: descriptor.id.id(),
            name: descriptor.id.display_name(),
            api_base: config
                .endpoints
                .get(&descriptor.id)
                .map_or_else(|| descriptor.api_base.to_string(), Clone::clone),
            auth_style: descriptor.auth_label,
            enabled: !config.disabled.contains(&descriptor.id),
            usage_strategies: descriptor.usage.iter().map(|s| s.label()).collect(),
        }
    }
}

/// Execute the providers command.
///
/// # Errors
///
/// Returns error if JSON serialization fails.
pub fn execute(args: &ProvidersArgs, config: &ResolvedConfig) -> Result<()> {
    let listings = listings(ProviderRegistry::global(), config);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&listings)?);
    } else {
        println!("{}", render_table(&listings));
    }
    Ok(())
}

pub(crate) fn listings(registry: &ProviderRegistry, config: &ResolvedConfig) -> Vec<ProviderListing> {
    registry
        .iter()
        .map(|descriptor| ProviderListing::new(descriptor, config))
        .collect()
}

pub(crate) fn render_table(listings: &[ProviderListing]) -> String {
    let mut out = format!(
        "{:<10} {:<18} {:<8} {}\n{:-<10} {:-<18} {:-<8} {:-<24}",
        "Provider", "Auth", "Enabled", "Usage", "", "", "", ""
    );
    for row in listings {
        let usage = if row.usage_strategies.is_empty() {
            "none".to_string()
        } else {
            row.usage_strategies.join(" > ")
        };
        let enabled = if row.enabled { "yes" } else { "no" };
        out.push_str(&format!(
            "\n{:<10} {:<18} {:<8} {usage}",
            row.id, row.auth_style, enabled
        ));
    }
    out
}
