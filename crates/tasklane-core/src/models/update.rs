//! Explicit task update requests.
//!
//! Every updatable field carries a [`FieldUpdate`], so "leave this field
//! alone" and "clear this field" are different values. Clients that send a
//! complete task payload, where a zero value means "clear", are mapped onto
//! this form by [`TaskUpdate::from_payload`]. In that form a field can never
//! be set to its zero value on purpose: a zero due date always clears it.

use chrono::{DateTime, Utc};

use super::{RepeatMode, Task, TaskReminder, User};

/// The update applied to a single field.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FieldUpdate<T> {
    /// Leave the stored value unchanged.
    #[default]
    Keep,
    /// Reset the field to its zero value.
    Clear,
    /// Store the given value.
    Set(T),
}

impl<T: Default + PartialEq> FieldUpdate<T> {
    /// Payload semantics for fields where a zero value clears the field.
    pub fn clear_if_zero(value: T) -> Self {
        if value == T::default() {
            FieldUpdate::Clear
        } else {
            FieldUpdate::Set(value)
        }
    }

    /// Payload semantics for fields where a zero value keeps the stored value.
    pub fn keep_if_zero(value: T) -> Self {
        if value == T::default() {
            FieldUpdate::Keep
        } else {
            FieldUpdate::Set(value)
        }
    }

    /// Writes the update into a plain field.
    pub fn apply_to(self, target: &mut T) {
        match self {
            FieldUpdate::Keep => {}
            FieldUpdate::Clear => *target = T::default(),
            FieldUpdate::Set(value) => *target = value,
        }
    }
}

impl<T> FieldUpdate<T> {
    /// Payload semantics for optional fields: `None` clears.
    pub fn clear_if_none(value: Option<T>) -> Self {
        match value {
            Some(value) => FieldUpdate::Set(value),
            None => FieldUpdate::Clear,
        }
    }

    /// Writes the update into an optional field.
    pub fn apply_to_option(self, target: &mut Option<T>) {
        match self {
            FieldUpdate::Keep => {}
            FieldUpdate::Clear => *target = None,
            FieldUpdate::Set(value) => *target = Some(value),
        }
    }

    /// Returns the new value if this update sets one.
    pub fn as_set(&self) -> Option<&T> {
        match self {
            FieldUpdate::Set(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_keep(&self) -> bool {
        matches!(self, FieldUpdate::Keep)
    }
}

/// A request to update one task.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TaskUpdate {
    pub title: FieldUpdate<String>,
    pub description: FieldUpdate<String>,
    pub done: FieldUpdate<bool>,
    pub due_date: FieldUpdate<DateTime<Utc>>,
    pub start_date: FieldUpdate<DateTime<Utc>>,
    pub end_date: FieldUpdate<DateTime<Utc>>,
    pub repeat_after: FieldUpdate<i64>,
    pub repeat_mode: FieldUpdate<RepeatMode>,
    pub priority: FieldUpdate<i64>,
    pub hex_color: FieldUpdate<String>,
    pub percent_done: FieldUpdate<f64>,
    pub project_id: FieldUpdate<i64>,
    pub bucket_id: FieldUpdate<i64>,
    pub position: FieldUpdate<f64>,
    pub kanban_position: FieldUpdate<f64>,
    pub cover_image_attachment_id: FieldUpdate<i64>,
    pub is_favorite: FieldUpdate<bool>,
    pub reminders: FieldUpdate<Vec<TaskReminder>>,
    pub assignees: FieldUpdate<Vec<User>>,
}

impl TaskUpdate {
    /// Maps a full task payload onto an update, zero values clearing fields.
    ///
    /// `title`, `project_id` and `bucket_id` keep their stored value when
    /// zero. Reminders and assignees are always replaced by the payload.
    pub fn from_payload(task: Task) -> Self {
        Self {
            title: FieldUpdate::keep_if_zero(task.title),
            description: FieldUpdate::clear_if_zero(task.description),
            done: FieldUpdate::clear_if_zero(task.done),
            due_date: FieldUpdate::clear_if_none(task.due_date),
            start_date: FieldUpdate::clear_if_none(task.start_date),
            end_date: FieldUpdate::clear_if_none(task.end_date),
            repeat_after: FieldUpdate::clear_if_zero(task.repeat_after),
            repeat_mode: FieldUpdate::clear_if_zero(task.repeat_mode),
            priority: FieldUpdate::clear_if_zero(task.priority),
            hex_color: FieldUpdate::clear_if_zero(task.hex_color),
            percent_done: FieldUpdate::clear_if_zero(task.percent_done),
            project_id: FieldUpdate::keep_if_zero(task.project_id),
            bucket_id: FieldUpdate::keep_if_zero(task.bucket_id),
            position: FieldUpdate::clear_if_zero(task.position),
            kanban_position: FieldUpdate::clear_if_zero(task.kanban_position),
            cover_image_attachment_id: FieldUpdate::clear_if_zero(task.cover_image_attachment_id),
            is_favorite: FieldUpdate::clear_if_zero(task.is_favorite),
            reminders: FieldUpdate::Set(task.reminders),
            assignees: FieldUpdate::Set(task.assignees),
        }
    }

    /// An update that only changes the done flag.
    pub fn mark_done(done: bool) -> Self {
        Self {
            done: FieldUpdate::Set(done),
            ..Default::default()
        }
    }

    /// An update that moves the task to another kanban bucket.
    pub fn move_to_bucket(bucket_id: i64) -> Self {
        Self {
            bucket_id: FieldUpdate::Set(bucket_id),
            ..Default::default()
        }
    }

    /// Applies every field update except assignees and favourites to `task`.
    ///
    /// Assignees and the favourite flag live in other collections and are
    /// written by the service.
    pub fn apply(&self, task: &mut Task) {
        self.title.clone().apply_to(&mut task.title);
        self.description.clone().apply_to(&mut task.description);
        self.done.clone().apply_to(&mut task.done);
        self.due_date.clone().apply_to_option(&mut task.due_date);
        self.start_date.clone().apply_to_option(&mut task.start_date);
        self.end_date.clone().apply_to_option(&mut task.end_date);
        self.repeat_after.clone().apply_to(&mut task.repeat_after);
        self.repeat_mode.clone().apply_to(&mut task.repeat_mode);
        self.priority.clone().apply_to(&mut task.priority);
        self.hex_color.clone().apply_to(&mut task.hex_color);
        self.percent_done.clone().apply_to(&mut task.percent_done);
        self.project_id.clone().apply_to(&mut task.project_id);
        self.bucket_id.clone().apply_to(&mut task.bucket_id);
        self.position.clone().apply_to(&mut task.position);
        self.kanban_position.clone().apply_to(&mut task.kanban_position);
        self.cover_image_attachment_id
            .clone()
            .apply_to(&mut task.cover_image_attachment_id);
        self.reminders.clone().apply_to(&mut task.reminders);
    }
}
