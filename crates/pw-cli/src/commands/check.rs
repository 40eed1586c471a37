//! Check command: runs the conflict guards over an exported event set.
//!
//! With `--previous`, the detector first observes the earlier export, so
//! events that moved or disappeared since then are reported as well.

use std::fmt::Write as _;
use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use pw_core::event::format_range;
use pw_core::{AnomalyRecord, ConflictDetector, GuardReport, OverlapMode};
use serde::Serialize;

use crate::Config;
use crate::input;

#[derive(Debug, Args)]
pub struct CheckArgs {
    /// JSON file with the current events.
    pub events: PathBuf,

    /// JSON file with the events as they were before the last edit.
    #[arg(long)]
    pub previous: Option<PathBuf>,

    /// Context to check for overlaps (defaults to `default_context`).
    ///
    /// Records without a context belong to the empty context `""`.
    #[arg(long)]
    pub context: Option<String>,

    /// Report every overlapping pair, not only start-order neighbours.
    #[arg(long)]
    pub exhaustive: bool,

    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

pub fn run<W: Write>(writer: &mut W, args: &CheckArgs, config: &Config) -> Result<()> {
    let events = input::load_events(&args.events)?;

    let mode = if args.exhaustive {
        OverlapMode::Exhaustive
    } else {
        config.overlap_mode
    };
    let mut detector = ConflictDetector::with_mode(mode);

    if let Some(previous) = &args.previous {
        let previous = input::load_events(previous)?;
        // Cold start: only records the baseline snapshot.
        detector.detect_event_jumping(&previous);
    }

    let context = args
        .context
        .as_deref()
        .unwrap_or(&config.default_context);
    let report = detector.run_all_guards(&events, context);
    let in_context = events
        .iter()
        .filter(|e| e.is_live() && e.context == context)
        .count();
    if in_context == 0 && !events.is_empty() {
        tracing::warn!(context, "no live events in context, overlaps not checked");
    }
    let anomalies: Vec<&AnomalyRecord> = detector.anomalies().collect();

    tracing::debug!(
        context,
        events = events.len(),
        findings = report.has_findings(),
        "conflict check finished"
    );

    if args.json {
        let output = JsonCheck {
            context,
            event_count: events.len(),
            context_event_count: in_context,
            report: &report,
            anomalies: &anomalies,
        };
        writeln!(writer, "{}", serde_json::to_string_pretty(&output)?)?;
    } else {
        write!(
            writer,
            "{}",
            format_report(context, events.len(), in_context, &report, &anomalies)
        )?;
    }

    Ok(())
}

#[derive(Debug, Serialize)]
struct JsonCheck<'a> {
    context: &'a str,
    event_count: usize,
    context_event_count: usize,
    report: &'a GuardReport,
    anomalies: &'a [&'a AnomalyRecord],
}

fn section(output: &mut String, title: &str) {
    writeln!(output).unwrap();
    writeln!(output, "{title}").unwrap();
    writeln!(output, "{}", "─".repeat(title.chars().count())).unwrap();
}

/// Formats the human-readable guard report.
pub fn format_report(
    context: &str,
    event_count: usize,
    in_context: usize,
    report: &GuardReport,
    anomalies: &[&AnomalyRecord],
) -> String {
    let mut output = String::new();
    writeln!(output, "CONFLICT CHECK: {context} ({event_count} events)").unwrap();

    section(&mut output, "OVERLAPS");
    if in_context == 0 && event_count > 0 {
        writeln!(output, "no events in context \"{context}\"").unwrap();
    } else if report.overlaps.is_empty() {
        writeln!(output, "none").unwrap();
    }
    for pair in &report.overlaps {
        writeln!(
            output,
            "{} [{}]  {}",
            pair.first.title, pair.first.id, pair.first.span
        )
        .unwrap();
        writeln!(
            output,
            "  overlaps {} [{}]  {}",
            pair.second.title, pair.second.id, pair.second.span
        )
        .unwrap();
    }

    section(&mut output, "ORDERING");
    if report.ordering_issue {
        writeln!(output, "start times go backwards (see anomaly log)").unwrap();
    } else {
        writeln!(output, "ok").unwrap();
    }

    section(&mut output, "JUMPS");
    if report.jumps.is_empty() {
        writeln!(output, "none").unwrap();
    }
    for jump in &report.jumps {
        writeln!(output, "{} [{}]", jump.title, jump.id).unwrap();
        writeln!(
            output,
            "  was {}",
            format_range(jump.previous_start, jump.previous_end)
        )
        .unwrap();
        writeln!(
            output,
            "  now {}",
            format_range(jump.current_start, jump.current_end)
        )
        .unwrap();
    }

    section(&mut output, "SKIPPED");
    if report.skipped.is_empty() {
        writeln!(output, "none").unwrap();
    }
    for record in &report.skipped {
        writeln!(
            output,
            "{} [{}]  last seen {}",
            record.title,
            record.id,
            format_range(record.last_start, record.last_end)
        )
        .unwrap();
    }

    section(&mut output, &format!("ANOMALY LOG ({})", anomalies.len()));
    if anomalies.is_empty() {
        writeln!(output, "empty").unwrap();
    }
    for record in anomalies {
        writeln!(output, "{}  {}", record.kind.as_str(), record.details).unwrap();
    }

    output
}
