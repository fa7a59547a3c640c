//! Time helpers: reset boundaries, reset header parsing, countdowns.

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};

/// Epoch-second values at or above this are absolute timestamps; below are offsets.
const ABSOLUTE_EPOCH_THRESHOLD: f64 = 1_000_000_000.0;

/// Longest duration accepted from a reset header (about 31 years).
const MAX_DURATION_MS: f64 = 1e12;

/// Midnight UTC at the start of the day after `now`.
#[must_use]
pub fn next_day_midnight(now: DateTime<Utc>) -> DateTime<Utc> {
    let tomorrow = now.date_naive() + Duration::days(1);
    Utc.from_utc_datetime(&tomorrow.and_time(chrono::NaiveTime::MIN))
}

/// Midnight UTC on the first day of the month after `now`.
#[must_use]
pub fn first_of_next_month(now: DateTime<Utc>) -> DateTime<Utc> {
    let (year, month) = if now.month() == 12 {
        (now.year() + 1, 1)
    } else {
        (now.year(), now.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1).map_or_else(
        || next_day_midnight(now),
        |date| Utc.from_utc_datetime(&date.and_time(chrono::NaiveTime::MIN)),
    )
}

/// First day of the month containing `now`.
#[must_use]
pub fn first_of_month(now: DateTime<Utc>) -> NaiveDate {
    now.date_naive().with_day(1).unwrap_or_else(|| now.date_naive())
}

/// Interpret a provider reset header value relative to `now`.
///
/// Accepts epoch seconds (absolute when at least 1e9, otherwise an offset),
/// RFC 3339 timestamps, and Go-style durations such as `6m0s` or `250ms`.
#[must_use]
pub fn parse_reset_value(raw: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(seconds) = raw.parse::<f64>() {
        if !seconds.is_finite() || seconds < 0.0 {
            return None;
        }
        #[allow(clippy::cast_possible_truncation)]
        let millis = (seconds * 1000.0).round() as i64;
        return if seconds >= ABSOLUTE_EPOCH_THRESHOLD {
            DateTime::from_timestamp_millis(millis)
        } else {
            Duration::try_milliseconds(millis).and_then(|offset| now.checked_add_signed(offset))
        };
    }

    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.with_timezone(&Utc));
    }

    parse_go_duration(raw).and_then(|offset| now.checked_add_signed(offset))
}

/// Parse durations like `1h2m3s`, `6m0s`, `1.5s`, `250ms`.
fn parse_go_duration(raw: &str) -> Option<Duration> {
    let mut total_ms = 0.0_f64;
    let mut number = String::new();
    let mut chars = raw.chars().peekable();
    let mut saw_unit = false;

    while let Some(c) = chars.next() {
        if c.is_ascii_digit() || c == '.' {
            number.push(c);
            continue;
        }
        let value: f64 = number.parse().ok()?;
        number.clear();
        let factor = match c {
            'h' => 3_600_000.0,
            'm' if chars.peek() == Some(&'s') => {
                chars.next();
                1.0
            }
            'm' => 60_000.0,
            's' => 1_000.0,
            _ => return None,
        };
        total_ms += value * factor;
        saw_unit = true;
    }

    if !number.is_empty() || !saw_unit || !(0.0..MAX_DURATION_MS).contains(&total_ms) {
        return None;
    }
    #[allow(clippy::cast_possible_truncation)]
    Duration::try_milliseconds(total_ms.round() as i64)
}

/// Format a countdown from `now` to a future time.
#[must_use]
pub fn format_countdown(target: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let duration = target.signed_duration_since(now);

    if duration.num_seconds() <= 0 {
        return "now".to_string();
    }

    let hours = duration.num_hours();
    let minutes = duration.num_minutes() % 60;

    if hours > 24 {
        let days = hours / 24;
        format!("in {days} day{}", if days == 1 { "" } else { "s" })
    } else if hours > 0 {
        format!("in {hours}h {minutes}m")
    } else if minutes > 0 {
        format!("in {minutes}m")
    } else {
        let seconds = duration.num_seconds();
        format!("in {seconds}s")
    }
}
