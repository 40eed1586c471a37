//! Overlap detection and event-set stability guards.
//!
//! A [`ConflictDetector`] is owned by one calendar session. Besides the pure
//! overlap and ordering checks it keeps the last observed event set so that
//! repeated calls can flag events that moved (`jumps`) or vanished (`skipped`)
//! between two renders. Every finding is returned as data and appended to the
//! detector's [`AnomalyLog`].

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::anomaly::{AnomalyKind, AnomalyLog, AnomalyRecord};
use crate::event::{Event, Span, format_instant, format_range};
use crate::types::EventId;

/// Which pairs of start-sorted events are tested for intersection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlapMode {
    /// Only neighbours in start order. Cheap, but misses an overlap between
    /// two events separated by a third one that starts in between.
    #[default]
    Adjacent,
    /// Every intersecting pair.
    Exhaustive,
}

/// One side of an overlap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlapSide {
    pub id: EventId,
    pub title: String,
    pub span: Span,
}

/// Two events in the same context whose ranges intersect.
///
/// `first` starts no later than `second`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlapPair {
    pub first: OverlapSide,
    pub second: OverlapSide,
}

/// An event whose start or end changed since the previous observation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JumpRecord {
    pub id: EventId,
    pub title: String,
    pub previous_start: Option<DateTime<Utc>>,
    pub previous_end: Option<DateTime<Utc>>,
    pub current_start: Option<DateTime<Utc>>,
    pub current_end: Option<DateTime<Utc>>,
}

/// An event seen previously that is missing from the current set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedRecord {
    pub id: EventId,
    pub title: String,
    pub last_start: Option<DateTime<Utc>>,
    pub last_end: Option<DateTime<Utc>>,
}

/// Combined result of [`ConflictDetector::run_all_guards`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardReport {
    pub overlaps: Vec<OverlapPair>,
    pub ordering_issue: bool,
    pub jumps: Vec<JumpRecord>,
    pub skipped: Vec<SkippedRecord>,
    pub checked_at: DateTime<Utc>,
}

impl GuardReport {
    /// Whether any guard found something.
    pub fn has_findings(&self) -> bool {
        !self.overlaps.is_empty()
            || self.ordering_issue
            || !self.jumps.is_empty()
            || !self.skipped.is_empty()
    }
}

/// What the detector remembers about a live event between calls.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Observed {
    title: String,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
}

impl From<&Event> for Observed {
    fn from(event: &Event) -> Self {
        Self {
            title: event.title.clone(),
            start: event.start,
            end: event.end,
        }
    }
}

/// Overlap, ordering and stability checks for one calendar session.
#[derive(Debug, Clone, Default)]
pub struct ConflictDetector {
    mode: OverlapMode,
    /// Live events from the last stateful call, keyed by id. Empty = cold.
    previous: BTreeMap<EventId, Observed>,
    log: AnomalyLog,
}

impl ConflictDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mode(mode: OverlapMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub const fn mode(&self) -> OverlapMode {
        self.mode
    }

    /// Finds overlapping live events within `context`.
    pub fn detect_overlaps(&mut self, events: &[Event], context: &str) -> Vec<OverlapPair> {
        let mut candidates: Vec<(&Event, Span)> = events
            .iter()
            .filter(|e| e.is_live() && e.context == context)
            .filter_map(|e| e.span().map(|span| (e, span)))
            .collect();
        candidates.sort_by_key(|(_, span)| span.start);

        let mut pairs = Vec::new();
        match self.mode {
            OverlapMode::Adjacent => {
                for window in candidates.windows(2) {
                    let (a, a_span) = window[0];
                    let (b, b_span) = window[1];
                    if a_span.overlaps(&b_span) {
                        pairs.push(overlap_pair(a, a_span, b, b_span));
                    }
                }
            }
            OverlapMode::Exhaustive => {
                for (i, &(a, a_span)) in candidates.iter().enumerate() {
                    for &(b, b_span) in &candidates[i + 1..] {
                        // Later candidates start even later.
                        if b_span.start >= a_span.end {
                            break;
                        }
                        if a_span.overlaps(&b_span) {
                            pairs.push(overlap_pair(a, a_span, b, b_span));
                        }
                    }
                }
            }
        }

        for pair in &pairs {
            self.log.push(
                AnomalyKind::Overlap,
                json!({
                    "context": context,
                    "first": {
                        "id": pair.first.id,
                        "title": pair.first.title,
                        "range": pair.first.span.to_string(),
                    },
                    "second": {
                        "id": pair.second.id,
                        "title": pair.second.title,
                        "range": pair.second.span.to_string(),
                    },
                }),
            );
        }

        pairs
    }

    /// Reports whether live events, in the given order, ever go back in time.
    ///
    /// Stops at the first inversion. Events without a start are skipped.
    pub fn detect_ordering_issues(&mut self, events: &[Event]) -> bool {
        let mut last: Option<(&Event, DateTime<Utc>)> = None;

        for event in events.iter().filter(|e| e.is_live()) {
            let Some(start) = event.start else {
                continue;
            };
            if let Some((prev, prev_start)) = last {
                if start < prev_start {
                    self.log.push(
                        AnomalyKind::OrderingIssue,
                        json!({
                            "previous": {
                                "id": prev.id,
                                "title": prev.title,
                                "start": format_instant(Some(prev_start)),
                            },
                            "current": {
                                "id": event.id,
                                "title": event.title,
                                "start": format_instant(Some(start)),
                            },
                        }),
                    );
                    return true;
                }
            }
            last = Some((event, start));
        }

        false
    }

    /// Reports events whose range changed since the previous call, then
    /// remembers `current`.
    pub fn detect_event_jumping(&mut self, current: &[Event]) -> Vec<JumpRecord> {
        let jumps = self.find_jumps(current);
        self.log_jumps(&jumps);
        self.record_snapshot(current);
        jumps
    }

    /// Reports events seen in the previous call that are absent now, then
    /// remembers `current`.
    pub fn detect_skipped_events(&mut self, current: &[Event]) -> Vec<SkippedRecord> {
        let skipped = self.find_skipped(current);
        self.log_skipped(&skipped);
        self.record_snapshot(current);
        skipped
    }

    /// Runs every guard once: overlaps, ordering, jumps, skipped.
    ///
    /// Jumps and skipped events are both measured against the same previous
    /// snapshot, which is replaced once at the end.
    pub fn run_all_guards(&mut self, events: &[Event], context: &str) -> GuardReport {
        let overlaps = self.detect_overlaps(events, context);
        let ordering_issue = self.detect_ordering_issues(events);

        let jumps = self.find_jumps(events);
        self.log_jumps(&jumps);
        let skipped = self.find_skipped(events);
        self.log_skipped(&skipped);
        self.record_snapshot(events);

        GuardReport {
            overlaps,
            ordering_issue,
            jumps,
            skipped,
            checked_at: Utc::now(),
        }
    }

    /// Forgets the previous snapshot; the next stateful call is a cold start.
    pub fn clear(&mut self) {
        self.previous.clear();
    }

    /// Whether a previous snapshot is held.
    pub fn has_snapshot(&self) -> bool {
        !self.previous.is_empty()
    }

    /// Logged anomalies, oldest first.
    pub fn anomalies(&self) -> impl Iterator<Item = &AnomalyRecord> {
        self.log.entries()
    }

    pub const fn anomaly_log(&self) -> &AnomalyLog {
        &self.log
    }

    pub fn clear_anomalies(&mut self) {
        self.log.clear();
    }

    fn find_jumps(&self, current: &[Event]) -> Vec<JumpRecord> {
        if self.previous.is_empty() {
            tracing::debug!("no previous snapshot, skipping jump detection");
            return Vec::new();
        }

        current
            .iter()
            .filter(|e| e.is_live())
            .filter_map(|event| {
                let before = self.previous.get(&event.id)?;
                if before.start == event.start && before.end == event.end {
                    return None;
                }
                Some(JumpRecord {
                    id: event.id.clone(),
                    title: event.title.clone(),
                    previous_start: before.start,
                    previous_end: before.end,
                    current_start: event.start,
                    current_end: event.end,
                })
            })
            .collect()
    }

    fn find_skipped(&self, current: &[Event]) -> Vec<SkippedRecord> {
        // A soft-deleted event is still present, so it is not reported.
        let present: HashSet<&EventId> = current.iter().map(|e| &e.id).collect();

        self.previous
            .iter()
            .filter(|(id, _)| !present.contains(id))
            .map(|(id, before)| SkippedRecord {
                id: id.clone(),
                title: before.title.clone(),
                last_start: before.start,
                last_end: before.end,
            })
            .collect()
    }

    fn log_jumps(&mut self, jumps: &[JumpRecord]) {
        for jump in jumps {
            self.log.push(
                AnomalyKind::EventJump,
                json!({
                    "id": jump.id,
                    "title": jump.title,
                    "previous": format_range(jump.previous_start, jump.previous_end),
                    "current": format_range(jump.current_start, jump.current_end),
                }),
            );
        }
    }

    fn log_skipped(&mut self, skipped: &[SkippedRecord]) {
        for record in skipped {
            self.log.push(
                AnomalyKind::SkippedEvent,
                json!({
                    "id": record.id,
                    "title": record.title,
                    "last_seen": format_range(record.last_start, record.last_end),
                }),
            );
        }
    }

    fn record_snapshot(&mut self, current: &[Event]) {
        self.previous = current
            .iter()
            .filter(|e| e.is_live())
            .map(|e| (e.id.clone(), Observed::from(e)))
            .collect();
        tracing::debug!(events = self.previous.len(), "recorded event snapshot");
    }
}

fn overlap_pair(a: &Event, a_span: Span, b: &Event, b_span: Span) -> OverlapPair {
    OverlapPair {
        first: OverlapSide {
            id: a.id.clone(),
            title: a.title.clone(),
            span: a_span,
        },
        second: OverlapSide {
            id: b.id.clone(),
            title: b.title.clone(),
            span: b_span,
        },
    }
}
