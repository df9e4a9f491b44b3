//! Formatting helpers for log lines and CLI tables.

use chrono::{DateTime, Utc};

/// Scale `value` by `base` until it fits the largest applicable unit.
fn scaled(value: f64, base: f64, units: &[&str]) -> (f64, usize) {
    let mut value = value;
    let mut unit = 0;
    while value >= base && unit + 1 < units.len() {
        value /= base;
        unit += 1;
    }
    (value, unit)
}

/// Compact line/range counts: `950`, `1.5K`, `2.3M`.
///
/// ```
/// use blocklister::utils::format_count;
/// assert_eq!(format_count(950), "950");
/// assert_eq!(format_count(23_400), "23.4K");
/// ```
pub fn format_count(count: usize) -> String {
    const UNITS: [&str; 3] = ["", "K", "M"];
    match scaled(count as f64, 1000.0, &UNITS) {
        (_, 0) => count.to_string(),
        (value, unit) => format!("{:.1}{}", value, UNITS[unit]),
    }
}

/// Cache file sizes in binary units.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    match scaled(bytes as f64, 1024.0, &UNITS) {
        (_, 0) => format!("{} B", bytes),
        (value, unit) => format!("{:.1} {}", value, UNITS[unit]),
    }
}

/// Age of a cache file relative to `now`, coarsest unit only.
pub fn format_age(dt: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let age = now.signed_duration_since(dt);
    if age.num_days() > 0 {
        format!("{}d ago", age.num_days())
    } else if age.num_hours() > 0 {
        format!("{}h ago", age.num_hours())
    } else if age.num_minutes() > 0 {
        format!("{}m ago", age.num_minutes())
    } else {
        "just now".to_string()
    }
}

/// Cut `s` to at most `max_chars` characters, marking the cut with `...`.
pub fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        None => s.to_string(),
        Some(_) => {
            let keep = max_chars.saturating_sub(3);
            let cut = s.char_indices().nth(keep).map_or(s.len(), |(i, _)| i);
            format!("{}...", &s[..cut])
        }
    }
}
