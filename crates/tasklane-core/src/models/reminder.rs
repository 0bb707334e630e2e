//! Task reminders.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::Task;

/// The task date a relative reminder is anchored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderRelation {
    DueDate,
    StartDate,
    EndDate,
}

impl ReminderRelation {
    /// Returns the stored name of the relation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReminderRelation::DueDate => "due_date",
            ReminderRelation::StartDate => "start_date",
            ReminderRelation::EndDate => "end_date",
        }
    }

    /// Parses a stored relation name. Unknown names yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "due_date" => Some(ReminderRelation::DueDate),
            "start_date" => Some(ReminderRelation::StartDate),
            "end_date" => Some(ReminderRelation::EndDate),
            _ => None,
        }
    }

    /// Returns the anchor date of `task` for this relation.
    pub fn anchor(&self, task: &Task) -> Option<DateTime<Utc>> {
        match self {
            ReminderRelation::DueDate => task.due_date,
            ReminderRelation::StartDate => task.start_date,
            ReminderRelation::EndDate => task.end_date,
        }
    }
}

/// A reminder that belongs to exactly one task.
///
/// A reminder either carries an absolute trigger, or a relative period plus
/// the date it is relative to. For relative reminders the trigger is derived
/// from the anchor and is not authoritative.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TaskReminder {
    #[serde(default)]
    pub id: i64,

    #[serde(default)]
    pub task_id: i64,

    /// The absolute trigger instant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminder: Option<DateTime<Utc>>,

    /// Offset in seconds from the anchor; negative values trigger before it.
    #[serde(default)]
    pub relative_period: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relative_to: Option<ReminderRelation>,
}

impl TaskReminder {
    /// Creates an absolute reminder.
    pub fn absolute(at: DateTime<Utc>) -> Self {
        Self {
            reminder: Some(at),
            ..Default::default()
        }
    }

    /// Creates a reminder relative to one of the task's dates.
    pub fn relative(period_seconds: i64, relative_to: ReminderRelation) -> Self {
        Self {
            relative_period: period_seconds,
            relative_to: Some(relative_to),
            ..Default::default()
        }
    }

    /// Returns the offset to the anchor as a duration.
    pub fn period(&self) -> Duration {
        Duration::seconds(self.relative_period)
    }
}
