//! Task model.
//!
//! A task is the primary entity of the store. The stored columns live directly
//! on [`Task`]; reminders, assignees, labels, the creator, the favourite flag
//! and related tasks are hydrated from their own collections after a query.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Label, RelatedTaskMap, TaskReminder, User};

/// Determines how dates move when a repeating task is marked done.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum RepeatMode {
    /// Advance every date by `repeat_after` until it lies in the future.
    #[default]
    Default,
    /// Advance every date by one calendar month, ignoring `repeat_after`.
    Month,
    /// Re-anchor every date at "now + repeat_after".
    FromCurrentDate,
}

impl From<i64> for RepeatMode {
    fn from(value: i64) -> Self {
        match value {
            1 => RepeatMode::Month,
            2 => RepeatMode::FromCurrentDate,
            _ => RepeatMode::Default,
        }
    }
}

impl From<RepeatMode> for i64 {
    fn from(mode: RepeatMode) -> Self {
        match mode {
            RepeatMode::Default => 0,
            RepeatMode::Month => 1,
            RepeatMode::FromCurrentDate => 2,
        }
    }
}

/// A task in a project.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Task {
    /// The unique, numeric id of this task.
    #[serde(default)]
    pub id: i64,

    /// The task text.
    #[serde(default)]
    pub title: String,

    /// The task description.
    #[serde(default)]
    pub description: String,

    /// Whether the task is done.
    #[serde(default)]
    pub done: bool,

    /// When the task was marked done. Always `None` while `done` is false.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub done_at: Option<DateTime<Utc>>,

    /// When the task is due.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,

    /// The project this task belongs to.
    #[serde(default)]
    pub project_id: i64,

    /// Repeat interval in seconds. Zero means the task does not repeat.
    #[serde(default)]
    pub repeat_after: i64,

    /// How the dates move when a repeating task is marked done.
    #[serde(default)]
    pub repeat_mode: RepeatMode,

    /// Free-form priority, only used for filtering and sorting.
    #[serde(default)]
    pub priority: i64,

    /// When the task starts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,

    /// When the task ends.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,

    /// Task colour as six hex digits.
    #[serde(default)]
    pub hex_color: String,

    /// How far the task is from being done, from 0 to 1.
    #[serde(default)]
    pub percent_done: f64,

    /// Sequential index of the task within its project.
    #[serde(default)]
    pub index: i64,

    /// Project identifier plus index, e.g. `WORK-12`. Not stored.
    #[serde(default)]
    pub identifier: String,

    /// Stable external id (used by calendar sync). Never exposed over JSON.
    #[serde(skip)]
    pub uid: String,

    /// Attachment used as the cover image, zero when unset.
    #[serde(default)]
    pub cover_image_attachment_id: i64,

    /// Kanban bucket of the task.
    #[serde(default)]
    pub bucket_id: i64,

    /// Ordering key within the project list.
    #[serde(default)]
    pub position: f64,

    /// Ordering key within the kanban bucket.
    #[serde(default)]
    pub kanban_position: f64,

    /// Id of the user who created the task.
    #[serde(default)]
    pub created_by_id: i64,

    /// When the task was created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,

    /// When the task was last updated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<DateTime<Utc>>,

    /// Reminders, sorted by trigger ascending.
    #[serde(default)]
    pub reminders: Vec<TaskReminder>,

    /// Users assigned to the task.
    #[serde(default)]
    pub assignees: Vec<User>,

    /// Labels attached to the task.
    #[serde(default)]
    pub labels: Vec<Label>,

    /// The user who created the task.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<User>,

    /// Whether the caller marked this task as favourite.
    #[serde(default)]
    pub is_favorite: bool,

    /// Related tasks grouped by relation kind.
    #[serde(default)]
    pub related_tasks: RelatedTaskMap,
}

impl Task {
    /// Returns true if marking this task done moves its dates forward.
    ///
    /// Monthly repetition ignores the stored interval, so a monthly task
    /// repeats even with `repeat_after == 0`.
    pub fn is_repeating(&self) -> bool {
        self.repeat_after > 0 || self.repeat_mode == RepeatMode::Month
    }

    /// Returns the identifier built from the project, or `#<index>`.
    pub fn full_identifier(&self) -> String {
        if self.identifier.is_empty() {
            format!("#{}", self.index)
        } else {
            self.identifier.clone()
        }
    }

    /// Sets the identifier from the project's short identifier.
    pub fn set_identifier(&mut self, project_identifier: &str) {
        self.identifier = if project_identifier.is_empty() {
            String::new()
        } else {
            format!("{}-{}", project_identifier, self.index)
        };
    }
}

/// A stored task column that an update may write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskColumn {
    Title,
    Description,
    Done,
    DoneAt,
    DueDate,
    RepeatAfter,
    RepeatMode,
    Priority,
    StartDate,
    EndDate,
    HexColor,
    PercentDone,
    ProjectId,
    BucketId,
    Position,
    KanbanPosition,
    CoverImageAttachmentId,
    Index,
}

impl TaskColumn {
    /// Columns written by every task update.
    pub const UPDATABLE: &'static [TaskColumn] = &[
        TaskColumn::Title,
        TaskColumn::Description,
        TaskColumn::Done,
        TaskColumn::DueDate,
        TaskColumn::RepeatAfter,
        TaskColumn::Priority,
        TaskColumn::StartDate,
        TaskColumn::EndDate,
        TaskColumn::HexColor,
        TaskColumn::DoneAt,
        TaskColumn::PercentDone,
        TaskColumn::ProjectId,
        TaskColumn::BucketId,
        TaskColumn::Position,
        TaskColumn::RepeatMode,
        TaskColumn::KanbanPosition,
        TaskColumn::CoverImageAttachmentId,
    ];

    /// Returns the storage column name.
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskColumn::Title => "title",
            TaskColumn::Description => "description",
            TaskColumn::Done => "done",
            TaskColumn::DoneAt => "done_at",
            TaskColumn::DueDate => "due_date",
            TaskColumn::RepeatAfter => "repeat_after",
            TaskColumn::RepeatMode => "repeat_mode",
            TaskColumn::Priority => "priority",
            TaskColumn::StartDate => "start_date",
            TaskColumn::EndDate => "end_date",
            TaskColumn::HexColor => "hex_color",
            TaskColumn::PercentDone => "percent_done",
            TaskColumn::ProjectId => "project_id",
            TaskColumn::BucketId => "bucket_id",
            TaskColumn::Position => "position",
            TaskColumn::KanbanPosition => "kanban_position",
            TaskColumn::CoverImageAttachmentId => "cover_image_attachment_id",
            TaskColumn::Index => "index",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeat_mode_serializes_as_integer() {
        assert_eq!(serde_json::to_string(&RepeatMode::Month).unwrap(), "1");
        let mode: RepeatMode = serde_json::from_str("2").unwrap();
        assert_eq!(mode, RepeatMode::FromCurrentDate);
        let mode: RepeatMode = serde_json::from_str("7").unwrap();
        assert_eq!(mode, RepeatMode::Default);
    }

    #[test]
    fn test_is_repeating() {
        let mut task = Task::default();
        assert!(!task.is_repeating());

        task.repeat_after = 3600;
        assert!(task.is_repeating());

        task.repeat_after = 0;
        task.repeat_mode = RepeatMode::Month;
        assert!(task.is_repeating());
    }

    #[test]
    fn test_full_identifier_falls_back_to_index() {
        let mut task = Task {
            index: 12,
            ..Default::default()
        };
        assert_eq!(task.full_identifier(), "#12");

        task.set_identifier("WORK");
        assert_eq!(task.full_identifier(), "WORK-12");
    }

    #[test]
    fn test_task_deserialize_minimal() {
        let task: Task = serde_json::from_str(r#"{"title": "Buy milk"}"#).unwrap();
        assert_eq!(task.title, "Buy milk");
        assert!(!task.done);
        assert!(task.due_date.is_none());
        assert!(task.reminders.is_empty());
    }

    #[test]
    fn test_uid_is_not_serialized() {
        let task = Task {
            uid: "secret-uid".to_string(),
            ..Default::default()
        };
        let json = serde_json::to_string(&task).unwrap();
        assert!(!json.contains("secret-uid"));
    }
}
