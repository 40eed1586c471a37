//! Loading exported event and goal records.

use std::path::Path;

use anyhow::{Context, Result};
use pw_core::{Event, GoalRecord, RawEvent, RawGoal};

/// Reads a JSON array of event records.
pub fn load_events(path: &Path) -> Result<Vec<Event>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let events =
        parse_events(&content).with_context(|| format!("invalid events in {}", path.display()))?;
    tracing::debug!(path = %path.display(), count = events.len(), "loaded events");
    Ok(events)
}

/// Reads a JSON array of goal records.
pub fn load_goals(path: &Path) -> Result<Vec<GoalRecord>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let goals =
        parse_goals(&content).with_context(|| format!("invalid goals in {}", path.display()))?;
    tracing::debug!(path = %path.display(), count = goals.len(), "loaded goals");
    Ok(goals)
}

fn parse_events(content: &str) -> Result<Vec<Event>> {
    let raw: Vec<RawEvent> =
        serde_json::from_str(content).context("expected a JSON array of events")?;
    raw.into_iter()
        .enumerate()
        .map(|(idx, record)| {
            Event::try_from(record).with_context(|| format!("invalid event at index {idx}"))
        })
        .collect()
}

fn parse_goals(content: &str) -> Result<Vec<GoalRecord>> {
    let raw: Vec<RawGoal> =
        serde_json::from_str(content).context("expected a JSON array of goals")?;
    Ok(raw.into_iter().map(GoalRecord::from).collect())
}
