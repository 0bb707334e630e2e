//! Task relations.
//!
//! Relations can form cycles (A is related to B which is related to A). A
//! hydrated task embeds its related tasks as [`RelatedTaskSummary`] values,
//! which have no relation field of their own, so the embedded graph is
//! always exactly one level deep.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Task;

/// The kind of a relation between two tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationKind {
    Subtask,
    Parenttask,
    Related,
    Duplicateof,
    Duplicates,
    Blocking,
    Blocked,
    Precedes,
    Follows,
    Copiedfrom,
    Copiedto,
}

impl RelationKind {
    /// Returns the stored name of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationKind::Subtask => "subtask",
            RelationKind::Parenttask => "parenttask",
            RelationKind::Related => "related",
            RelationKind::Duplicateof => "duplicateof",
            RelationKind::Duplicates => "duplicates",
            RelationKind::Blocking => "blocking",
            RelationKind::Blocked => "blocked",
            RelationKind::Precedes => "precedes",
            RelationKind::Follows => "follows",
            RelationKind::Copiedfrom => "copiedfrom",
            RelationKind::Copiedto => "copiedto",
        }
    }

    /// Parses a stored kind name.
    pub fn parse(value: &str) -> Option<Self> {
        let kind = match value {
            "subtask" => RelationKind::Subtask,
            "parenttask" => RelationKind::Parenttask,
            "related" => RelationKind::Related,
            "duplicateof" => RelationKind::Duplicateof,
            "duplicates" => RelationKind::Duplicates,
            "blocking" => RelationKind::Blocking,
            "blocked" => RelationKind::Blocked,
            "precedes" => RelationKind::Precedes,
            "follows" => RelationKind::Follows,
            "copiedfrom" => RelationKind::Copiedfrom,
            "copiedto" => RelationKind::Copiedto,
            _ => return None,
        };
        Some(kind)
    }
}

/// A stored relation from `task_id` to `other_task_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRelation {
    pub task_id: i64,
    pub other_task_id: i64,
    pub relation_kind: RelationKind,
}

/// A one-level snapshot of a related task.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RelatedTaskSummary {
    pub id: i64,
    pub title: String,
    pub done: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    pub project_id: i64,
    pub index: i64,
    pub bucket_id: i64,
    pub position: f64,
    pub is_favorite: bool,
}

impl RelatedTaskSummary {
    /// Takes a snapshot of `task`, dropping its own relations.
    pub fn from_task(task: &Task, is_favorite: bool) -> Self {
        Self {
            id: task.id,
            title: task.title.clone(),
            done: task.done,
            due_date: task.due_date,
            project_id: task.project_id,
            index: task.index,
            bucket_id: task.bucket_id,
            position: task.position,
            is_favorite,
        }
    }
}

/// Related tasks grouped by kind.
pub type RelatedTaskMap = BTreeMap<RelationKind, Vec<RelatedTaskSummary>>;
