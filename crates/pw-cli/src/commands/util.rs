//! Shared utilities for CLI commands.

use std::sync::LazyLock;

use anyhow::Context;
use chrono::{DateTime, Days, Local, NaiveDate};
use regex::Regex;

/// Pre-compiled regex for relative date parsing.
static RELATIVE_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\s+(day|week)s?\s+ago$").unwrap());

/// Conservative bound for relative dates (~1000 years in days).
const MAX_RELATIVE_DAYS: u64 = 1000 * 365;

/// Parse a date string relative to `today`.
///
/// Supports:
/// - Calendar dates: "2026-01-15"
/// - RFC 3339: "2026-01-15T10:30:00Z" (converted to the local date)
/// - Keywords: "today", "yesterday"
/// - Relative: "3 days ago", "1 week ago"
pub fn parse_date(s: &str, today: NaiveDate) -> anyhow::Result<NaiveDate> {
    let s = s.trim();

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Local).date_naive());
    }
    match s {
        "today" => return Ok(today),
        "yesterday" => {
            return today
                .pred_opt()
                .context("date out of range");
        }
        _ => {}
    }

    let Some(caps) = RELATIVE_DATE_RE.captures(s) else {
        anyhow::bail!(
            "Invalid date: {s}. Use YYYY-MM-DD, RFC 3339, 'today', 'yesterday' or relative (e.g., '3 days ago')"
        );
    };

    let n: u64 = caps[1]
        .parse()
        .context("failed to parse number in relative date")?;

    let days_per_unit = match &caps[2] {
        "day" => 1,
        "week" => 7,
        unit => anyhow::bail!("Unknown date unit: {unit}"),
    };

    if n > MAX_RELATIVE_DAYS / days_per_unit {
        anyhow::bail!("Relative date value too large: {n} {}", &caps[2]);
    }

    today
        .checked_sub_days(Days::new(n * days_per_unit))
        .context("date out of range")
}

/// Formats minutes as duration string.
/// Returns "Xh Ym" if >= 1 hour, "Xm" if < 1 hour.
/// Negative durations are shown as 0m.
pub fn format_duration(minutes: i64) -> String {
    if minutes < 0 {
        return "0m".to_string();
    }
    let hours = minutes / 60;
    let minutes = minutes % 60;

    if hours >= 1 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}

/// Generates a 10-character progress bar.
/// Values <5% of max get a single block for visibility.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn progress_bar(value: i64, max: i64) -> String {
    if max <= 0 {
        return "░░░░░░░░░░".to_string();
    }

    let ratio = value as f64 / max as f64;
    let filled = if ratio < 0.05 && value > 0 {
        1
    } else {
        (ratio * 10.0).round().clamp(0.0, 10.0) as usize
    };

    let empty = 10 - filled;
    format!("{}{}", "█".repeat(filled), "░".repeat(empty))
}
