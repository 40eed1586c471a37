//! Calendar event and goal records, and their validation at the boundary.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{EventId, ValidationError};

/// A half-open time range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Span {
    /// Open-interval intersection: `s1 < e2 && s2 < e1`.
    ///
    /// Touching ranges and zero-length ranges never intersect at their boundary.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && other.start < self.end
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {}",
            self.start.to_rfc3339_opts(SecondsFormat::Secs, true),
            self.end.to_rfc3339_opts(SecondsFormat::Secs, true)
        )
    }
}

/// Formats an optional instant as RFC 3339, or `?` when unknown.
pub fn format_instant(instant: Option<DateTime<Utc>>) -> String {
    instant.map_or_else(
        || "?".to_string(),
        |dt| dt.to_rfc3339_opts(SecondsFormat::Secs, true),
    )
}

/// Formats a possibly incomplete range the way [`Span`] displays.
pub fn format_range(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> String {
    format!("{} - {}", format_instant(start), format_instant(end))
}

/// A calendar entry as seen by the guards and the metrics engine.
///
/// `start`/`end` are `None` when the source record had no usable value; such
/// events are not comparable and are skipped by overlap and ordering checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    /// Display label, only used in diagnostics.
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub category: String,
    /// Partition label scoping overlap checks (e.g. "personal", "family").
    #[serde(default)]
    pub context: String,
    #[serde(default)]
    pub deleted: bool,
    /// Precomputed duration in minutes.
    #[serde(default)]
    pub duration_minutes: i64,
}

impl Event {
    /// Creates a live event with empty labels and no duration.
    pub fn new(id: EventId, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            id,
            title: String::new(),
            start: Some(start),
            end: Some(end),
            category: String::new(),
            context: String::new(),
            deleted: false,
            duration_minutes: 0,
        }
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }

    #[must_use]
    pub const fn with_duration(mut self, minutes: i64) -> Self {
        self.duration_minutes = minutes;
        self
    }

    #[must_use]
    pub const fn mark_deleted(mut self) -> Self {
        self.deleted = true;
        self
    }

    /// Returns the event's time range if both ends are known.
    pub fn span(&self) -> Option<Span> {
        Some(Span {
            start: self.start?,
            end: self.end?,
        })
    }

    /// Whether the event takes part in computations.
    pub const fn is_live(&self) -> bool {
        !self.deleted
    }
}

/// A loosely-typed event record as exported by the data layer.
///
/// Every field is optional; [`Event::try_from`] applies defaults and validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawEvent {
    /// String or numeric identifier.
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    #[serde(default)]
    pub title: Option<String>,
    /// Timestamp string; any other JSON type is treated as missing.
    #[serde(default)]
    pub start: Option<serde_json::Value>,
    #[serde(default)]
    pub end: Option<serde_json::Value>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub context: Option<String>,
    #[serde(default)]
    pub deleted: Option<bool>,
    /// Minutes; fractional values are rounded.
    #[serde(default)]
    pub duration: Option<serde_json::Value>,
}

impl TryFrom<RawEvent> for Event {
    type Error = ValidationError;

    fn try_from(raw: RawEvent) -> Result<Self, Self::Error> {
        let id = match raw.id {
            Some(serde_json::Value::String(s)) => EventId::new(s)?,
            Some(serde_json::Value::Number(n)) => EventId::new(n.to_string())?,
            _ => return Err(ValidationError::Empty { field: "event ID" }),
        };

        let start = raw
            .start
            .as_ref()
            .and_then(|v| parse_timestamp(v, &id, "start"));
        let end = raw.end.as_ref().and_then(|v| parse_timestamp(v, &id, "end"));
        let deleted = raw.deleted.unwrap_or(false);

        if let (Some(start), Some(end)) = (start, end) {
            if !deleted && end < start {
                return Err(ValidationError::InvertedInterval { id: id.to_string() });
            }
        }

        let duration_minutes = raw
            .duration
            .as_ref()
            .map_or(0, |v| parse_minutes(v, &id));
        if duration_minutes < 0 {
            return Err(ValidationError::NegativeDuration {
                id: id.to_string(),
                minutes: duration_minutes,
            });
        }

        Ok(Self {
            id,
            title: raw.title.unwrap_or_default(),
            start,
            end,
            category: raw.category.unwrap_or_default(),
            context: raw.context.unwrap_or_default(),
            deleted,
            duration_minutes,
        })
    }
}

/// Parses an RFC 3339 timestamp, falling back to a naive datetime read as UTC.
///
/// Unparsable values and non-string JSON yield `None` rather than an error.
fn parse_timestamp(
    value: &serde_json::Value,
    id: &EventId,
    field: &'static str,
) -> Option<DateTime<Utc>> {
    if let serde_json::Value::String(text) = value {
        let text = text.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
            return Some(dt.with_timezone(&Utc));
        }
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S") {
            return Some(naive.and_utc());
        }
    }
    if !value.is_null() {
        tracing::debug!(event_id = %id, field, %value, "unparsable timestamp treated as missing");
    }
    None
}

/// Reads a duration in minutes, rounding fractional values.
///
/// Non-numeric values count as zero.
#[allow(clippy::cast_possible_truncation)]
fn parse_minutes(value: &serde_json::Value, id: &EventId) -> i64 {
    if let Some(minutes) = value.as_i64() {
        return minutes;
    }
    if let Some(minutes) = value.as_f64() {
        // Float to int casts saturate.
        return minutes.round() as i64;
    }
    if !value.is_null() {
        tracing::debug!(event_id = %id, %value, "non-numeric duration treated as zero");
    }
    0
}

/// A goal or habit completion record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GoalRecord {
    pub completed: bool,
    /// The day the record belongs to, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
}

impl GoalRecord {
    pub const fn new(completed: bool) -> Self {
        Self {
            completed,
            date: None,
        }
    }
}

/// A loosely-typed goal record as exported by the data layer.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawGoal {
    #[serde(default)]
    pub completed: Option<bool>,
    /// `YYYY-MM-DD` or a full RFC 3339 timestamp.
    #[serde(default)]
    pub date: Option<String>,
}

impl From<RawGoal> for GoalRecord {
    fn from(raw: RawGoal) -> Self {
        let date = raw.date.as_deref().and_then(|value| {
            let value = value.trim();
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .or_else(|| {
                    DateTime::parse_from_rfc3339(value)
                        .ok()
                        .map(|dt| dt.date_naive())
                })
        });
        Self {
            completed: raw.completed.unwrap_or(false),
            date,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn raw(json: &str) -> RawEvent {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn raw_event_applies_defaults() {
        let event = Event::try_from(raw(
            r#"{"id":"e1","start":"2025-03-03T09:00:00Z","end":"2025-03-03T10:00:00Z"}"#,
        ))
        .unwrap();

        assert_eq!(event.id.as_str(), "e1");
        assert_eq!(event.title, "");
        assert_eq!(event.category, "");
        assert!(!event.deleted);
        assert_eq!(event.duration_minutes, 0);
        assert_eq!(
            event.start,
            Some(Utc.with_ymd_and_hms(2025, 3, 3, 9, 0, 0).unwrap())
        );
    }

    #[test]
    fn raw_event_accepts_numeric_id() {
        let event = Event::try_from(raw(r#"{"id":42}"#)).unwrap();
        assert_eq!(event.id.as_str(), "42");
    }

    #[test]
    fn raw_event_rejects_missing_id() {
        let err = Event::try_from(raw(r#"{"title":"standup"}"#)).unwrap_err();
        assert_eq!(err, ValidationError::Empty { field: "event ID" });
    }

    #[test]
    fn raw_event_rejects_inverted_interval() {
        let err = Event::try_from(raw(
            r#"{"id":"e1","start":"2025-03-03T10:00:00Z","end":"2025-03-03T09:00:00Z"}"#,
        ))
        .unwrap_err();
        assert_eq!(err, ValidationError::InvertedInterval { id: "e1".into() });
    }

    #[test]
    fn deleted_raw_event_may_be_inverted() {
        let event = Event::try_from(raw(
            r#"{"id":"e1","start":"2025-03-03T10:00:00Z","end":"2025-03-03T09:00:00Z","deleted":true}"#,
        ))
        .unwrap();
        assert!(event.deleted);
    }

    #[test]
    fn raw_event_rejects_negative_duration() {
        let err = Event::try_from(raw(r#"{"id":"e1","duration":-5}"#)).unwrap_err();
        assert!(matches!(err, ValidationError::NegativeDuration { minutes: -5, .. }));
    }

    #[test]
    fn unparsable_timestamp_becomes_missing() {
        let event = Event::try_from(raw(
            r#"{"id":"e1","start":"next tuesday","end":"2025-03-03T09:00:00Z"}"#,
        ))
        .unwrap();
        assert!(event.start.is_none());
        assert!(event.span().is_none());
    }

    #[test]
    fn non_string_timestamp_becomes_missing() {
        let event = Event::try_from(raw(
            r#"{"id":"e1","start":1741000000000,"end":"2025-03-03T09:00:00Z"}"#,
        ))
        .unwrap();
        assert!(event.start.is_none());
        assert!(event.end.is_some());
    }

    #[test]
    fn fractional_duration_is_rounded() {
        let event = Event::try_from(raw(r#"{"id":"e1","duration":30.5}"#)).unwrap();
        assert_eq!(event.duration_minutes, 31);

        let event = Event::try_from(raw(r#"{"id":"e1","duration":"soon"}"#)).unwrap();
        assert_eq!(event.duration_minutes, 0);
    }

    #[test]
    fn naive_timestamp_is_read_as_utc() {
        let event = Event::try_from(raw(r#"{"id":"e1","start":"2025-03-03T09:00:00"}"#)).unwrap();
        assert_eq!(
            event.start,
            Some(Utc.with_ymd_and_hms(2025, 3, 3, 9, 0, 0).unwrap())
        );
    }

    #[test]
    fn span_overlap_is_open_interval() {
        let at = |h| Utc.with_ymd_and_hms(2025, 3, 3, h, 0, 0).unwrap();
        let a = Span { start: at(9), end: at(10) };
        let b = Span { start: at(10), end: at(11) };
        let c = Span { start: at(9), end: at(11) };
        let point = Span { start: at(9), end: at(9) };

        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&c));
        assert!(c.overlaps(&b));
        assert!(!point.overlaps(&point));
    }

    #[test]
    fn span_display_uses_literal_times() {
        let span = Span {
            start: Utc.with_ymd_and_hms(2025, 3, 3, 9, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2025, 3, 3, 9, 30, 0).unwrap(),
        };
        assert_eq!(span.to_string(), "2025-03-03T09:00:00Z - 2025-03-03T09:30:00Z");
    }

    #[test]
    fn format_range_marks_unknown_ends() {
        let start = Utc.with_ymd_and_hms(2025, 3, 3, 9, 0, 0).unwrap();
        assert_eq!(format_range(Some(start), None), "2025-03-03T09:00:00Z - ?");
    }

    #[test]
    fn raw_goal_parses_dates_leniently() {
        let goal: RawGoal = serde_json::from_str(r#"{"completed":true,"date":"2025-03-03"}"#).unwrap();
        let goal = GoalRecord::from(goal);
        assert!(goal.completed);
        assert_eq!(goal.date, NaiveDate::from_ymd_opt(2025, 3, 3));

        let goal: RawGoal =
            serde_json::from_str(r#"{"date":"2025-03-03T18:00:00+00:00"}"#).unwrap();
        let goal = GoalRecord::from(goal);
        assert!(!goal.completed);
        assert_eq!(goal.date, NaiveDate::from_ymd_opt(2025, 3, 3));

        let goal = GoalRecord::from(RawGoal {
            completed: Some(true),
            date: Some("someday".into()),
        });
        assert_eq!(goal.date, None);
    }
}
