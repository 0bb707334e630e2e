//! Projects, kanban buckets, users and labels.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Id of the pseudo project that lists the caller's favourite tasks.
pub const FAVORITES_PSEUDO_PROJECT_ID: i64 = -1;

/// The kind of entity a favourite row points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FavoriteKind {
    Task,
    Project,
}

impl FavoriteKind {
    /// Returns the stored discriminant.
    pub fn as_i64(&self) -> i64 {
        match self {
            FavoriteKind::Task => 1,
            FavoriteKind::Project => 2,
        }
    }
}

/// A project (the container tasks belong to).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub title: String,
    /// Short prefix used to build task identifiers, may be empty.
    #[serde(default)]
    pub identifier: String,
    #[serde(default)]
    pub namespace_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<DateTime<Utc>>,
}

impl Project {
    /// Returns true for the favourites pseudo project.
    pub fn is_favorites_pseudo_project(&self) -> bool {
        self.id == FAVORITES_PSEUDO_PROJECT_ID
    }
}

/// A kanban bucket, scoped to one project.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Bucket {
    pub id: i64,
    pub project_id: i64,
    #[serde(default)]
    pub title: String,
    /// Maximum number of tasks in this bucket. Zero means unlimited.
    #[serde(default)]
    pub limit: i64,
    /// Whether moving a task here marks it done.
    #[serde(default)]
    pub is_done_bucket: bool,
    #[serde(default)]
    pub position: f64,
}

/// A user as exposed next to tasks. Email addresses are never included.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub name: String,
}

/// A label that can be attached to tasks.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Label {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub hex_color: String,
}
