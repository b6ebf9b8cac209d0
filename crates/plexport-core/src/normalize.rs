//! Field normalization for CSV output
//!
//! Pure, total transformations from raw server fields to display-ready
//! strings. Every function is defined for empty/absent input and returns
//! an empty string (or a stable zero form) rather than failing.

use chrono::TimeZone;
use unicode_normalization::UnicodeNormalization;

/// Binary units used by [`format_size`]
const SIZE_UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];

/// Normalize a free-text field.
///
/// Decodes HTML entities, applies Unicode canonical composition (NFC) and
/// collapses interior whitespace runs to single spaces, trimming the ends.
/// Idempotent on its own output: feeding the result back in returns it
/// unchanged.
///
/// # Examples
/// ```
/// use plexport_core::normalize::clean_text;
///
/// assert_eq!(clean_text("Alien&sup3;  \n (1992)"), "Alien³ (1992)");
/// assert_eq!(clean_text(""), "");
/// ```
pub fn clean_text(raw: &str) -> String {
    let decoded = html_escape::decode_html_entities(raw);
    let composed: String = decoded.nfc().collect();
    composed.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Format a duration in milliseconds as `{m}m` or `{h}h {m}m`.
///
/// Zero or absent input yields an empty string.
///
/// # Examples
/// ```
/// use plexport_core::normalize::format_duration;
///
/// assert_eq!(format_duration(0), "");
/// assert_eq!(format_duration(5_400_000), "1h 30m");
/// ```
pub fn format_duration(duration_ms: u64) -> String {
    if duration_ms == 0 {
        return String::new();
    }

    let total_minutes = duration_ms / 60_000;
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;

    if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{}m", minutes)
    }
}

/// Whole minutes of a millisecond duration, as a decimal string.
///
/// Used by the movie schema, which carries runtime as a plain minute count.
pub fn duration_minutes(duration_ms: u64) -> String {
    (duration_ms / 60_000).to_string()
}

/// Format a byte count with binary (1024) unit steps.
///
/// One decimal place, stopping at the largest unit where the value is
/// still below 1024 or units are exhausted. Zero yields `0B`.
///
/// # Examples
/// ```
/// use plexport_core::normalize::format_size;
///
/// assert_eq!(format_size(0), "0B");
/// assert_eq!(format_size(1536), "1.5KiB");
/// ```
pub fn format_size(size_bytes: u64) -> String {
    if size_bytes == 0 {
        return "0B".to_string();
    }

    let mut value = size_bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1}{}", value, SIZE_UNITS[unit])
}

/// Format a 0.0-10.0 scale rating as a percentage.
///
/// Multiplies by ten and rounds to the nearest integer. Absent or
/// unparseable input yields an empty string.
pub fn format_rating(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }
    match raw.parse::<f64>() {
        Ok(value) => format!("{:.0}%", (value * 10.0).round()),
        Err(_) => String::new(),
    }
}

/// Format an epoch-seconds timestamp string as a local date-time.
///
/// Absent or unparseable input yields an empty string.
pub fn format_timestamp(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }
    let secs: i64 = match raw.parse() {
        Ok(secs) => secs,
        Err(_) => return String::new(),
    };
    match chrono::Local.timestamp_opt(secs, 0) {
        chrono::LocalResult::Single(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        _ => String::new(),
    }
}

/// Join a multi-valued tag list with the literal separator `" , "`.
pub fn join_tags(tags: &[String]) -> String {
    tags.join(" , ")
}
