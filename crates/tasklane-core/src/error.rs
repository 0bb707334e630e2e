//! Error types for task queries and mutations.

use thiserror::Error;

use crate::filter::FilterError;
use crate::session::{EventError, StoreError};

/// A specialized Result type for task operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by queries and mutations.
#[derive(Debug, Error)]
pub enum Error {
    /// The filter could not be parsed or resolved.
    #[error(transparent)]
    Filter(#[from] FilterError),

    /// A sort field is not in the allow-list.
    #[error("invalid sort parameter '{param}'")]
    InvalidSortParam { param: String },

    /// A sort order is neither `asc` nor `desc`.
    #[error("invalid sort order '{order}'")]
    InvalidSortOrder { order: String },

    /// A reminder has a relative period but no date it is relative to.
    #[error("reminder with relative period {period} has no relation (task {task_id})")]
    MissingReminderRelation { task_id: i64, period: i64 },

    /// The target bucket already holds its maximum number of tasks.
    #[error("bucket {bucket_id} has reached its limit of {limit} tasks")]
    BucketLimitExceeded { bucket_id: i64, limit: i64 },

    /// The target bucket belongs to another project.
    #[error("bucket {bucket_id} does not belong to project {project_id}")]
    BucketProjectMismatch { bucket_id: i64, project_id: i64 },

    /// The cover image attachment belongs to another task.
    #[error("attachment {attachment_id} does not belong to task {task_id}")]
    AttachmentNotOwned { task_id: i64, attachment_id: i64 },

    #[error("task {task_id} does not exist")]
    TaskNotFound { task_id: i64 },

    #[error("project {project_id} does not exist")]
    ProjectNotFound { project_id: i64 },

    #[error("bucket {bucket_id} does not exist")]
    BucketNotFound { bucket_id: i64 },

    /// A task needs a non-empty title.
    #[error("task title cannot be empty")]
    TaskTitleEmpty,

    /// The persistence session failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The event sink rejected a dispatch.
    #[error(transparent)]
    Event(#[from] EventError),
}

impl Error {
    /// Returns a stable machine-readable code for the error kind.
    pub fn code(&self) -> &'static str {
        match self {
            Error::Filter(FilterError::InvalidField { .. }) => "invalid_task_field",
            Error::Filter(FilterError::InvalidComparator { .. }) => "invalid_task_filter_comparator",
            Error::Filter(FilterError::InvalidValue { .. }) => "invalid_task_filter_value",
            Error::Filter(_) => "invalid_filter_syntax",
            Error::InvalidSortParam { .. } => "invalid_sort_param",
            Error::InvalidSortOrder { .. } => "invalid_sort_order",
            Error::MissingReminderRelation { .. } => "reminder_relative_to_missing",
            Error::BucketLimitExceeded { .. } => "bucket_limit_exceeded",
            Error::BucketProjectMismatch { .. } => "bucket_does_not_belong_to_project",
            Error::AttachmentNotOwned { .. } => "attachment_does_not_belong_to_task",
            Error::TaskNotFound { .. } => "task_does_not_exist",
            Error::ProjectNotFound { .. } => "project_does_not_exist",
            Error::BucketNotFound { .. } => "bucket_does_not_exist",
            Error::TaskTitleEmpty => "task_title_empty",
            Error::Store(_) => "store_error",
            Error::Event(_) => "event_error",
        }
    }

    /// Returns true when the error means an entity was not found.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::TaskNotFound { .. } | Error::ProjectNotFound { .. } | Error::BucketNotFound { .. }
        )
    }
}
