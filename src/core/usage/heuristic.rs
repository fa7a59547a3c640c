//! Synthetic usage estimate from wall-clock time.
//!
//! Used only for providers that expose no usage signal. The figure grows
//! linearly through the month, dips on weekends, and carries bounded jitter.

use chrono::{DateTime, Datelike, Timelike, Utc, Weekday};

use super::resolve_reset;
use crate::core::clock::RandomSource;
use crate::core::models::TokenUsage;
use crate::core::provider::HeuristicProfile;

/// Produce the advisory estimate for `profile` at `now`.
#[must_use]
pub fn estimate(profile: &HeuristicProfile, now: DateTime<Utc>, random: &dyn RandomSource) -> TokenUsage {
    let limit = pick_limit(profile, random);

    let units = u64::from(now.day() - 1) * 24 + u64::from(now.hour());
    let mut base = units.saturating_mul(profile.scale);
    if let Some(factor) = profile.weekend_factor
        && matches!(now.weekday(), Weekday::Sat | Weekday::Sun)
    {
        base = scale_by(base, factor);
    }

    let jitter = profile.jitter;
    let draw = random.below(jitter.saturating_mul(2).saturating_add(1));
    let used = (base.saturating_add(draw)).saturating_sub(jitter).min(limit);

    TokenUsage {
        used,
        limit,
        requests_used: None,
        requests_limit: None,
        reset_date: Some(resolve_reset(None, limit, now)),
    }
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn scale_by(value: u64, factor: f64) -> u64 {
    (value as f64 * factor).round().max(0.0) as u64
}

fn pick_limit(profile: &HeuristicProfile, random: &dyn RandomSource) -> u64 {
    match profile.limits {
        [] => 1,
        [only] => (*only).max(1),
        tiers => {
            #[allow(clippy::cast_possible_truncation)]
            let index = random.below(tiers.len() as u64) as usize;
            tiers.get(index).copied().unwrap_or(tiers[0]).max(1)
        }
    }
}
