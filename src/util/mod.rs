//! Utility functions.

pub mod format;
pub mod time;

pub use format::{format_share, format_tokens};
pub use time::{first_of_next_month, format_countdown, next_day_midnight, parse_reset_value};
