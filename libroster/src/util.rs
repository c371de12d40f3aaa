//! Formatting and validation helpers

use chrono::{DateTime, Local, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

pub const DEFAULT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is valid"));

/// Syntactic email check; one `@`, no whitespace, dotted domain.
pub fn is_valid_email(s: &str) -> bool {
    EMAIL_RE.is_match(s)
}

/// Uppercase the first character, lowercase the rest.
pub fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().chain(chars.flat_map(|c| c.to_lowercase())).collect(),
    }
}

/// Current local time in the default format.
pub fn format_current_time() -> String {
    format_time(Utc::now())
}

pub fn format_time(time: DateTime<Utc>) -> String {
    time.with_timezone(&Local)
        .format(DEFAULT_TIME_FORMAT)
        .to_string()
}

pub fn format_time_with(time: DateTime<Utc>, pattern: &str) -> String {
    time.with_timezone(&Local).format(pattern).to_string()
}
