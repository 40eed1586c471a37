//! Core domain logic for planwise.
//!
//! This crate contains the algorithmic part of the calendar:
//! - Conflict guards: overlapping entries, ordering inversions, and events
//!   that jump or disappear between two observations of the same calendar
//! - Metrics: focus time, context switches, goal completion, streaks and the
//!   0-100 productivity score
//!
//! Records enter through [`RawEvent`] / [`RawGoal`] and are validated into
//! [`Event`] / [`GoalRecord`]; nothing in here touches storage or the network.

pub mod anomaly;
pub mod conflict;
pub mod event;
pub mod metrics;
mod registry;
pub mod types;

pub use anomaly::{ANOMALY_LOG_CAPACITY, AnomalyKind, AnomalyLog, AnomalyRecord};
pub use conflict::{
    ConflictDetector, GuardReport, JumpRecord, OverlapMode, OverlapPair, OverlapSide,
    SkippedRecord,
};
pub use event::{Event, GoalRecord, RawEvent, RawGoal, Span};
pub use metrics::{
    MetricsSnapshot, ProductivityInputs, build_snapshot, calculate_context_switches,
    calculate_focus_time, calculate_goal_completion_rate, calculate_productivity_score,
    calculate_streak, category_minutes, total_tracked_minutes, trailing_window,
};
pub use registry::DetectorRegistry;
pub use types::{EventId, SessionId, ValidationError};
