//! Sparse ordering keys.
//!
//! Tasks carry two independent float keys: `position` orders the project
//! list and `kanban_position` orders a bucket. New tasks get widely spaced
//! keys so clients can insert between two tasks by averaging their keys.
//! Once a key gets too close to zero the whole collection is respaced.

use tracing::debug;

use crate::models::{Task, TaskColumn};
use crate::query::{Cond, SortOrder, SortParam};
use crate::session::{Session, StoreError, StoreResult};

/// Spacing between default keys (2^16).
pub const DEFAULT_SPACING: f64 = 65_536.0;

/// Keys below this value trigger a rebalance.
pub const MIN_POSITION_SPACING: f64 = 0.1;

/// Upper end of the rebalanced key range (2^32).
const REBALANCE_RANGE: f64 = 4_294_967_296.0;

/// Returns the key a task gets when the client did not choose one.
pub fn default_position(index: i64, position: f64) -> f64 {
    if position == 0.0 {
        index as f64 * DEFAULT_SPACING
    } else {
        position
    }
}

pub fn needs_rebalance(position: f64) -> bool {
    position < MIN_POSITION_SPACING
}

/// Evenly spaced keys for `count` members, in ascending order.
pub fn spread(count: usize) -> Vec<f64> {
    let step = REBALANCE_RANGE / count as f64;
    (1..=count).map(|i| step * i as f64).collect()
}

/// One of the two ordering axes, with the collection it orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// `position` among the tasks of a project.
    List { project_id: i64 },
    /// `kanban_position` among the tasks of a bucket.
    Kanban { bucket_id: i64 },
}

impl Axis {
    pub fn column(&self) -> TaskColumn {
        match self {
            Axis::List { .. } => TaskColumn::Position,
            Axis::Kanban { .. } => TaskColumn::KanbanPosition,
        }
    }

    fn members(&self) -> Cond {
        match self {
            Axis::List { project_id } => Cond::eq("project_id", *project_id),
            Axis::Kanban { bucket_id } => Cond::eq("bucket_id", *bucket_id),
        }
    }

    fn key(&self, task: &Task) -> f64 {
        match self {
            Axis::List { .. } => task.position,
            Axis::Kanban { .. } => task.kanban_position,
        }
    }
}

/// Respaces every member of the axis' collection, keeping their order.
///
/// Returns the number of tasks rewritten.
pub fn rebalance(session: &dyn Session, axis: Axis) -> StoreResult<usize> {
    let column = axis.column();
    let order = [
        SortParam::new(column.as_str(), SortOrder::Asc)
            .map_err(|e| StoreError::with_source("invalid rebalance order", e))?,
        SortParam::new("id", SortOrder::Asc)
            .map_err(|e| StoreError::with_source("invalid rebalance order", e))?,
    ];
    let members = session.find_tasks(&axis.members(), &order, None)?;

    for (task, key) in members.iter().zip(spread(members.len())) {
        if axis.key(task) != key {
            session.set_task_position(task.id, column, key)?;
        }
    }

    debug!(axis = ?axis, tasks = members.len(), "rebalanced task positions");
    Ok(members.len())
}
