//! Productivity metrics derived from calendar events.
//!
//! All functions are total: empty input yields zero, deleted events are
//! ignored, and nothing here returns an error.
//!
//! # Score
//!
//! ```text
//! focus_ratio    = tracked > 0 ? min(100, focus / tracked * 100) : 0
//! goal_score     = clamp(goal_rate, 0, 100)
//! switch_penalty = tracked > 0 ? max(0, 100 - switches * 10) : 0
//! score          = round(clamp(0.4 * focus_ratio + 0.4 * goal_score + 0.2 * switch_penalty, 0, 100))
//! ```
//!
//! With no tracked time the switch term is zero as well, so an empty day scores
//! 0 and goals alone cap the score at 40 (e.g. `goal_rate = 100` gives 40, not 60).

use std::collections::{BTreeMap, HashSet};

use chrono::{Days, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};

use crate::event::{Event, GoalRecord};

/// Categories counted as focused work (compared case-insensitively).
pub const FOCUS_CATEGORIES: [&str; 4] = ["work", "deep-work", "coding", "learning"];

/// Weight of the focus ratio in the score.
pub const FOCUS_WEIGHT: f64 = 0.4;

/// Weight of the goal completion rate in the score.
pub const GOAL_WEIGHT: f64 = 0.4;

/// Weight of the context-switch penalty term in the score.
pub const SWITCH_WEIGHT: f64 = 0.2;

/// Points lost from the switch term per context switch.
pub const SWITCH_PENALTY_POINTS: f64 = 10.0;

/// Streaks never look back further than this many days.
pub const MAX_STREAK_DAYS: u32 = 365;

/// Category label used for events without one.
pub const UNCATEGORIZED: &str = "uncategorized";

/// Returns true if `category` counts toward focus time.
pub fn is_focus_category(category: &str) -> bool {
    FOCUS_CATEGORIES
        .iter()
        .any(|focus| focus.eq_ignore_ascii_case(category))
}

/// Sums durations (minutes) of live events in a focus category.
///
/// Saturates at `i64::MAX`.
pub fn calculate_focus_time(events: &[Event]) -> i64 {
    events
        .iter()
        .filter(|e| e.is_live() && is_focus_category(&e.category))
        .fold(0, |total: i64, e| total.saturating_add(e.duration_minutes))
}

/// Sums durations (minutes) of all live events.
///
/// Saturates at `i64::MAX`.
pub fn total_tracked_minutes(events: &[Event]) -> i64 {
    events
        .iter()
        .filter(|e| e.is_live())
        .fold(0, |total: i64, e| total.saturating_add(e.duration_minutes))
}

/// Counts category changes between consecutive live events.
///
/// Events must already be in time order.
pub fn calculate_context_switches(events: &[Event]) -> u32 {
    let live: Vec<&Event> = events.iter().filter(|e| e.is_live()).collect();
    let switches = live
        .windows(2)
        .filter(|pair| pair[0].category != pair[1].category)
        .count();
    u32::try_from(switches).unwrap_or(u32::MAX)
}

/// Percentage of completed goals, rounded. Zero for no goals.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn calculate_goal_completion_rate(goals: &[GoalRecord]) -> u8 {
    if goals.is_empty() {
        return 0;
    }
    let completed = goals.iter().filter(|g| g.completed).count();
    (completed as f64 / goals.len() as f64 * 100.0).round() as u8
}

/// Inputs to [`calculate_productivity_score`].
///
/// Values are taken as given; out-of-range rates or negative switch counts
/// are absorbed by the formula's clamps.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ProductivityInputs {
    pub focus_time_minutes: f64,
    pub goal_completion_rate: f64,
    pub context_switches: i64,
    pub total_tracked_minutes: f64,
}

/// Computes the 0-100 productivity score.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::suboptimal_flops
)]
pub fn calculate_productivity_score(inputs: &ProductivityInputs) -> u8 {
    let focus_ratio = if inputs.total_tracked_minutes > 0.0 {
        (inputs.focus_time_minutes / inputs.total_tracked_minutes * 100.0).min(100.0)
    } else {
        0.0
    };
    let goal_score = inputs.goal_completion_rate.clamp(0.0, 100.0);
    // A day with no tracked time has no switches worth rewarding.
    let switch_penalty = if inputs.total_tracked_minutes > 0.0 {
        (100.0 - inputs.context_switches as f64 * SWITCH_PENALTY_POINTS).max(0.0)
    } else {
        0.0
    };

    let score = focus_ratio * FOCUS_WEIGHT
        + goal_score * GOAL_WEIGHT
        + switch_penalty * SWITCH_WEIGHT;

    // NaN casts to 0.
    score.clamp(0.0, 100.0).round() as u8
}

/// Counts consecutive days, ending with `today`, that have at least one
/// live event starting on them (calendar days in `tz`).
pub fn calculate_streak<Tz: TimeZone>(events: &[Event], today: NaiveDate, tz: &Tz) -> u32 {
    let active_days: HashSet<NaiveDate> = events
        .iter()
        .filter(|e| e.is_live())
        .filter_map(|e| e.start)
        .map(|start| start.with_timezone(tz).date_naive())
        .collect();

    let mut streak = 0;
    let mut day = today;
    while streak < MAX_STREAK_DAYS && active_days.contains(&day) {
        streak += 1;
        let Some(previous) = day.pred_opt() else {
            break;
        };
        day = previous;
    }
    streak
}

/// Total minutes per category over the given events.
pub fn category_minutes(events: &[Event]) -> BTreeMap<String, i64> {
    let mut totals = BTreeMap::new();
    for event in events.iter().filter(|e| e.is_live()) {
        let category = if event.category.is_empty() {
            UNCATEGORIZED
        } else {
            event.category.as_str()
        };
        let total: &mut i64 = totals.entry(category.to_string()).or_insert(0);
        *total = total.saturating_add(event.duration_minutes);
    }
    totals
}

/// First day of a `days`-long window ending with `today`.
fn window_start(today: NaiveDate, days: u32) -> NaiveDate {
    today
        .checked_sub_days(Days::new(u64::from(days.saturating_sub(1))))
        .unwrap_or(NaiveDate::MIN)
}

/// Events starting within the `days` calendar days ending with `today`.
///
/// Events without a start are dropped. `days == 0` selects nothing.
pub fn trailing_window<Tz: TimeZone>(
    events: &[Event],
    today: NaiveDate,
    days: u32,
    tz: &Tz,
) -> Vec<Event> {
    if days == 0 {
        return Vec::new();
    }
    let first = window_start(today, days);
    events
        .iter()
        .filter(|e| {
            e.start.is_some_and(|start| {
                let day = start.with_timezone(tz).date_naive();
                day >= first && day <= today
            })
        })
        .cloned()
        .collect()
}

/// Dashboard aggregate for one window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub today: NaiveDate,
    pub window_days: u32,
    pub focus_minutes: i64,
    pub total_tracked_minutes: i64,
    pub context_switches: u32,
    pub goal_completion_rate: u8,
    pub category_minutes: BTreeMap<String, i64>,
    pub streak_days: u32,
    pub productivity_score: u8,
}

/// Builds the dashboard aggregate.
///
/// Focus, tracked time, switches and categories cover the trailing
/// `window_days`; goals dated outside the window are ignored (undated goals
/// always count). The streak looks at every event.
#[allow(clippy::cast_precision_loss)]
pub fn build_snapshot<Tz: TimeZone>(
    events: &[Event],
    goals: &[GoalRecord],
    today: NaiveDate,
    window_days: u32,
    tz: &Tz,
) -> MetricsSnapshot {
    let mut window = trailing_window(events, today, window_days, tz);
    window.sort_by_key(|e| e.start);

    let first = window_start(today, window_days);
    let goals: Vec<GoalRecord> = goals
        .iter()
        .filter(|g| {
            g.date
                .is_none_or(|day| window_days > 0 && day >= first && day <= today)
        })
        .copied()
        .collect();

    let focus_minutes = calculate_focus_time(&window);
    let total_tracked = total_tracked_minutes(&window);
    let context_switches = calculate_context_switches(&window);
    let goal_completion_rate = calculate_goal_completion_rate(&goals);

    let productivity_score = calculate_productivity_score(&ProductivityInputs {
        focus_time_minutes: focus_minutes as f64,
        goal_completion_rate: f64::from(goal_completion_rate),
        context_switches: i64::from(context_switches),
        total_tracked_minutes: total_tracked as f64,
    });

    tracing::debug!(
        events = window.len(),
        goals = goals.len(),
        productivity_score,
        "built metrics snapshot"
    );

    MetricsSnapshot {
        today,
        window_days,
        focus_minutes,
        total_tracked_minutes: total_tracked,
        context_switches,
        goal_completion_rate,
        category_minutes: category_minutes(&window),
        streak_days: calculate_streak(events, today, tz),
        productivity_score,
    }
}
