//! Metrics command for the productivity dashboard.
//!
//! Aggregates the trailing window (default 7 days, ending today) of an
//! exported event set and prints a text summary or JSON.

use std::fmt::Write as _;
use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use chrono::Local;
use clap::Args;
use pw_core::{MetricsSnapshot, build_snapshot};

use crate::Config;
use crate::commands::util::{format_duration, parse_date, progress_bar};
use crate::input;

#[derive(Debug, Args)]
pub struct MetricsArgs {
    /// JSON file with events.
    pub events: PathBuf,

    /// JSON file with goal completion records.
    #[arg(long)]
    pub goals: Option<PathBuf>,

    /// Last day of the window (YYYY-MM-DD, "yesterday", "3 days ago").
    #[arg(long)]
    pub today: Option<String>,

    /// Window length in days (defaults to `window_days`).
    #[arg(long)]
    pub window_days: Option<u32>,

    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

pub fn run<W: Write>(writer: &mut W, args: &MetricsArgs, config: &Config) -> Result<()> {
    let events = input::load_events(&args.events)?;
    let goals = match &args.goals {
        Some(path) => input::load_goals(path)?,
        None => Vec::new(),
    };

    let now = Local::now().date_naive();
    let today = match &args.today {
        Some(value) => parse_date(value, now)?,
        None => now,
    };
    let window_days = args.window_days.unwrap_or(config.window_days);

    let snapshot = build_snapshot(&events, &goals, today, window_days, &Local);

    if args.json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&snapshot)?)?;
    } else {
        write!(writer, "{}", format_metrics(&snapshot))?;
    }
    Ok(())
}

/// Formats the human-readable metrics summary.
pub fn format_metrics(snapshot: &MetricsSnapshot) -> String {
    let mut output = String::new();

    let day_word = if snapshot.window_days == 1 { "day" } else { "days" };
    writeln!(
        output,
        "METRICS: {} {day_word} ending {}",
        snapshot.window_days,
        snapshot.today.format("%b %-d, %Y")
    )
    .unwrap();

    writeln!(output).unwrap();
    writeln!(output, "BY CATEGORY").unwrap();
    writeln!(output, "───────────").unwrap();

    if snapshot.category_minutes.is_empty() {
        writeln!(output, "(no events)").unwrap();
    } else {
        let mut categories: Vec<(&String, &i64)> = snapshot.category_minutes.iter().collect();
        categories.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        let max = categories.first().map_or(0, |(_, minutes)| **minutes);

        for (category, minutes) in categories {
            let duration = format_duration(*minutes);
            let bar = progress_bar(*minutes, max);
            writeln!(output, "{category:<20}{duration:>8}  {bar}").unwrap();
        }
    }

    writeln!(output).unwrap();
    writeln!(output, "SUMMARY").unwrap();
    writeln!(output, "───────").unwrap();
    writeln!(
        output,
        "Focus time:       {} of {}",
        format_duration(snapshot.focus_minutes),
        format_duration(snapshot.total_tracked_minutes)
    )
    .unwrap();
    writeln!(output, "Context switches: {}", snapshot.context_switches).unwrap();
    writeln!(output, "Goals completed:  {}%", snapshot.goal_completion_rate).unwrap();
    let streak_word = if snapshot.streak_days == 1 { "day" } else { "days" };
    writeln!(output, "Streak:           {} {streak_word}", snapshot.streak_days).unwrap();
    writeln!(output, "Productivity:     {}/100", snapshot.productivity_score).unwrap();

    output
}
