//! Collaborators of the task service.
//!
//! The service owns no state. Persistence goes through a [`Session`], access
//! checks through [`Permissions`], and change notifications through an
//! [`EventSink`]. The host decides what backs each of them and owns the
//! transaction a request runs in.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::error::Error as StdError;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::{Bucket, FavoriteKind, Label, Project, Task, TaskColumn, TaskRelation, TaskReminder, User};
use crate::query::{Cond, SortParam, Window};

type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// A failure reported by a [`Session`].
#[derive(Debug, Error)]
#[error("{message}")]
pub struct StoreError {
    message: String,
    #[source]
    source: Option<BoxError>,
}

impl StoreError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Wraps a backend error.
    pub fn with_source(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Result type for session calls.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// A failure reported by an [`EventSink`].
#[derive(Debug, Error)]
#[error("failed to dispatch {event} event: {message}")]
pub struct EventError {
    event: &'static str,
    message: String,
    #[source]
    source: Option<BoxError>,
}

impl EventError {
    pub fn new(event: &'static str, message: impl Into<String>) -> Self {
        Self {
            event,
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        event: &'static str,
        message: impl Into<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        Self {
            event,
            message: message.into(),
            source: Some(source.into()),
        }
    }
}

/// Persistence operations the service needs.
///
/// Lookups by id return `Ok(None)` for missing rows. Bulk lookups take task
/// ids and return rows for any of them, keyed by task id where the row does
/// not carry it.
pub trait Session {
    /// Returns the tasks matching `cond` in the given order.
    fn find_tasks(
        &self,
        cond: &Cond,
        order: &[SortParam],
        window: Option<Window>,
    ) -> StoreResult<Vec<Task>>;

    fn count_tasks(&self, cond: &Cond) -> StoreResult<i64>;

    /// Inserts the stored columns of `task` and returns its new id.
    fn insert_task(&self, task: &Task) -> StoreResult<i64>;

    /// Writes `columns` of `task`, plus its `updated` timestamp.
    fn update_task(&self, task: &Task, columns: &[TaskColumn]) -> StoreResult<()>;

    /// Writes one ordering key of one task without touching `updated`.
    fn set_task_position(&self, task_id: i64, column: TaskColumn, value: f64) -> StoreResult<()>;

    fn delete_tasks(&self, cond: &Cond) -> StoreResult<u64>;

    /// Returns the highest task index in the project, zero for an empty one.
    fn max_task_index(&self, project_id: i64) -> StoreResult<i64>;

    fn reminders_for(&self, task_ids: &[i64]) -> StoreResult<Vec<TaskReminder>>;

    /// Replaces every reminder of the task.
    fn replace_reminders(&self, task_id: i64, reminders: &[TaskReminder]) -> StoreResult<()>;

    fn assignees_for(&self, task_ids: &[i64]) -> StoreResult<Vec<(i64, User)>>;

    /// Replaces the assignees of the task.
    fn set_assignees(&self, task_id: i64, user_ids: &[i64]) -> StoreResult<()>;

    fn users(&self, user_ids: &[i64]) -> StoreResult<Vec<User>>;

    fn labels_for(&self, task_ids: &[i64]) -> StoreResult<Vec<(i64, Label)>>;

    fn delete_label_links(&self, task_id: i64) -> StoreResult<()>;

    /// Returns the subset of `entity_ids` the user marked as favourite.
    fn favorites(&self, user_id: i64, kind: FavoriteKind, entity_ids: &[i64]) -> StoreResult<Vec<i64>>;

    fn add_favorite(&self, user_id: i64, kind: FavoriteKind, entity_id: i64) -> StoreResult<()>;

    /// Removes the favourite for one user, or for every user when `user_id`
    /// is `None`.
    fn remove_favorite(&self, user_id: Option<i64>, kind: FavoriteKind, entity_id: i64) -> StoreResult<()>;

    fn project(&self, project_id: i64) -> StoreResult<Option<Project>>;

    fn projects(&self, project_ids: &[i64]) -> StoreResult<Vec<Project>>;

    fn touch_project(&self, project_id: i64, at: DateTime<Utc>) -> StoreResult<()>;

    fn bucket(&self, bucket_id: i64) -> StoreResult<Option<Bucket>>;

    /// Returns the bucket with the lowest position in the project.
    fn default_bucket(&self, project_id: i64) -> StoreResult<Option<Bucket>>;

    fn done_bucket(&self, project_id: i64) -> StoreResult<Option<Bucket>>;

    /// Returns relations starting at any of the tasks.
    fn relations_for(&self, task_ids: &[i64]) -> StoreResult<Vec<TaskRelation>>;

    /// Removes relations in either direction.
    fn delete_relations(&self, task_id: i64) -> StoreResult<()>;

    /// Returns the task an attachment belongs to.
    fn attachment_task_id(&self, attachment_id: i64) -> StoreResult<Option<i64>>;
}

/// Access checks for the caller of a request.
pub trait Permissions {
    /// Id of the calling user.
    fn user_id(&self) -> i64;

    fn can_read_project(&self, project_id: i64) -> bool;

    /// Every project the caller can read.
    fn visible_project_ids(&self) -> Vec<i64>;
}

/// Permissions backed by a fixed project list.
#[derive(Debug, Clone, Default)]
pub struct StaticPermissions {
    user_id: i64,
    projects: BTreeSet<i64>,
}

impl StaticPermissions {
    pub fn new(user_id: i64, projects: impl IntoIterator<Item = i64>) -> Self {
        Self {
            user_id,
            projects: projects.into_iter().collect(),
        }
    }
}

impl Permissions for StaticPermissions {
    fn user_id(&self) -> i64 {
        self.user_id
    }

    fn can_read_project(&self, project_id: i64) -> bool {
        self.projects.contains(&project_id)
    }

    fn visible_project_ids(&self) -> Vec<i64> {
        self.projects.iter().copied().collect()
    }
}

/// A change to a task.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskEvent {
    Created { task: Task, doer_id: i64 },
    Updated { task: Task, doer_id: i64 },
    Deleted { task: Task, doer_id: i64 },
}

impl TaskEvent {
    pub fn name(&self) -> &'static str {
        match self {
            TaskEvent::Created { .. } => "task.created",
            TaskEvent::Updated { .. } => "task.updated",
            TaskEvent::Deleted { .. } => "task.deleted",
        }
    }

    pub fn task(&self) -> &Task {
        match self {
            TaskEvent::Created { task, .. }
            | TaskEvent::Updated { task, .. }
            | TaskEvent::Deleted { task, .. } => task,
        }
    }
}

/// Receives task events synchronously. An error fails the request.
pub trait EventSink {
    fn dispatch(&self, event: TaskEvent) -> Result<(), EventError>;
}

/// Drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEventSink;

impl EventSink for NoopEventSink {
    fn dispatch(&self, _event: TaskEvent) -> Result<(), EventError> {
        Ok(())
    }
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecordingEventSink {
    events: RefCell<Vec<TaskEvent>>,
}

impl RecordingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the events dispatched so far.
    pub fn events(&self) -> Vec<TaskEvent> {
        self.events.borrow().clone()
    }
}

impl EventSink for RecordingEventSink {
    fn dispatch(&self, event: TaskEvent) -> Result<(), EventError> {
        self.events.borrow_mut().push(event);
        Ok(())
    }
}
