//! Compilation of task queries into backend-neutral predicates.
//!
//! [`TaskQuery`] carries the caller's parameters, [`compile`] turns them into
//! a [`QueryPlan`] that a [`Session`](crate::session::Session) executes.

mod compiler;
mod cond;
mod options;
mod sort;

pub use compiler::{compile, compile_filter, search_cond, FavoritesScope, ProjectScope, QueryPlan, Window};
pub use cond::{CmpOp, Cond, Dialect, SqlValue};
pub use options::TaskQuery;
pub use sort::{render_order_by, sort_params, SortOrder, SortParam, SORTABLE_FIELDS};
