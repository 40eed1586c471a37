//! Bounded in-memory log of guard findings.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum number of retained anomalies.
pub const ANOMALY_LOG_CAPACITY: usize = 100;

/// What a guard found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    Overlap,
    OrderingIssue,
    EventJump,
    SkippedEvent,
}

impl AnomalyKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Overlap => "overlap",
            Self::OrderingIssue => "ordering_issue",
            Self::EventJump => "event_jump",
            Self::SkippedEvent => "skipped_event",
        }
    }
}

/// A single logged finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyRecord {
    pub kind: AnomalyKind,
    pub at: DateTime<Utc>,
    /// Free-form diagnostic payload.
    pub details: serde_json::Value,
}

/// Ring buffer of anomalies; the oldest entry is evicted once full.
#[derive(Debug, Clone)]
pub struct AnomalyLog {
    entries: VecDeque<AnomalyRecord>,
    capacity: usize,
}

impl Default for AnomalyLog {
    fn default() -> Self {
        Self::new(ANOMALY_LOG_CAPACITY)
    }
}

impl AnomalyLog {
    /// Creates a log holding at most `capacity` entries (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends a finding and mirrors it to the tracing output.
    pub fn push(&mut self, kind: AnomalyKind, details: serde_json::Value) {
        tracing::warn!(kind = kind.as_str(), %details, "calendar anomaly");

        if self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(AnomalyRecord {
            kind,
            at: Utc::now(),
            details,
        });
    }

    /// Entries from oldest to newest.
    pub fn entries(&self) -> impl Iterator<Item = &AnomalyRecord> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn evicts_oldest_past_capacity() {
        let mut log = AnomalyLog::default();
        for n in 0..(ANOMALY_LOG_CAPACITY + 5) {
            log.push(AnomalyKind::Overlap, json!({ "n": n }));
        }

        assert_eq!(log.len(), ANOMALY_LOG_CAPACITY);
        let first = log.entries().next().unwrap();
        assert_eq!(first.details["n"], 5);
        let last = log.entries().last().unwrap();
        assert_eq!(last.details["n"], ANOMALY_LOG_CAPACITY + 4);
    }

    #[test]
    fn clear_empties_log() {
        let mut log = AnomalyLog::new(3);
        log.push(AnomalyKind::SkippedEvent, json!({}));
        assert!(!log.is_empty());

        log.clear();
        assert!(log.is_empty());
        assert_eq!(log.capacity(), 3);
    }

    #[test]
    fn zero_capacity_keeps_latest() {
        let mut log = AnomalyLog::new(0);
        log.push(AnomalyKind::EventJump, json!({ "n": 1 }));
        log.push(AnomalyKind::EventJump, json!({ "n": 2 }));
        assert_eq!(log.len(), 1);
        assert_eq!(log.entries().next().unwrap().details["n"], 2);
    }

    #[test]
    fn kind_serializes_snake_case() {
        let json = serde_json::to_string(&AnomalyKind::OrderingIssue).unwrap();
        assert_eq!(json, "\"ordering_issue\"");
        assert_eq!(AnomalyKind::OrderingIssue.as_str(), "ordering_issue");
    }
}
