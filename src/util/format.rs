//! Number formatting utilities.

/// Format a token count compactly (`12.5K`, `1.5M`).
#[must_use]
pub fn format_tokens(value: u64) -> String {
    fn format_compact(value: u64, divisor: u64, suffix: &str) -> String {
        let major = value / divisor;
        let minor = (value % divisor) / (divisor / 10);
        format!("{major}.{minor}{suffix}")
    }

    if value >= 1_000_000 {
        format_compact(value, 1_000_000, "M")
    } else if value >= 1_000 {
        format_compact(value, 1_000, "K")
    } else {
        value.to_string()
    }
}

/// Share of `limit` consumed by `used`, as a whole percentage.
#[must_use]
pub fn format_share(used: u64, limit: u64) -> String {
    if limit == 0 {
        return "n/a".to_string();
    }
    #[allow(clippy::cast_precision_loss)]
    let pct = used as f64 / limit as f64 * 100.0;
    format!("{pct:.0}%")
}
