//! Data models of the task store.

mod project;
mod relation;
mod reminder;
mod task;
mod update;

pub use project::{Bucket, FavoriteKind, Label, Project, User, FAVORITES_PSEUDO_PROJECT_ID};
pub use relation::{RelatedTaskMap, RelatedTaskSummary, RelationKind, TaskRelation};
pub use reminder::{ReminderRelation, TaskReminder};
pub use task::{RepeatMode, Task, TaskColumn};
pub use update::{FieldUpdate, TaskUpdate};
