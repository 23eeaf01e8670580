//! Completion ledger model.
//!
//! # Responsibility
//! - Define completion events and their task-enriched read projection.
//! - Own the calendar-day window used by the dedup rule.
//!
//! # Invariants
//! - Day windows are half-open `[midnight, midnight + 24h)` in UTC.
//! - The stored day key and the dedup window come from the same
//!   [`DayWindow`] computation.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

use crate::model::task::TaskId;

/// Store-assigned ledger identifier.
pub type CompletionId = i64;

/// A timestamped record that a user performed a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionEvent {
    pub id: CompletionId,
    /// Weak reference into the catalog; the task may no longer exist.
    pub task_id: TaskId,
    pub user_id: String,
    pub completed_at: DateTime<Utc>,
}

/// Completion event joined with catalog metadata.
///
/// `task_name`/`task_points` are `None` when the referenced task is gone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionRecord {
    #[serde(flatten)]
    pub event: CompletionEvent,
    pub task_name: Option<String>,
    pub task_points: Option<u32>,
}

impl CompletionRecord {
    /// Points this completion contributes to the total (0 for unknown tasks).
    pub fn points_earned(&self) -> u32 {
        self.task_points.unwrap_or(0)
    }
}

/// UTC calendar day containing an instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayWindow {
    pub day: NaiveDate,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DayWindow {
    pub fn containing(instant: DateTime<Utc>) -> Self {
        let day = instant.date_naive();
        let start = day.and_time(NaiveTime::MIN).and_utc();
        Self {
            day,
            start,
            end: start + Duration::days(1),
        }
    }

    /// `YYYY-MM-DD` key persisted next to each completion.
    pub fn day_key(&self) -> String {
        self.day.format("%Y-%m-%d").to_string()
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant < self.end
    }
}

/// Expected rejection when a task was already completed in the same day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateCompletion {
    pub task_id: TaskId,
    pub user_id: String,
    pub day: NaiveDate,
}

impl Display for DuplicateCompletion {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "task {} was already completed today ({}) by {}",
            self.task_id, self.day, self.user_id
        )
    }
}

/// Result of a completion attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionOutcome {
    Recorded(CompletionEvent),
    Duplicate(DuplicateCompletion),
}

impl CompletionOutcome {
    pub fn is_recorded(&self) -> bool {
        matches!(self, Self::Recorded(_))
    }
}
