//! Sort parameters.
//!
//! Sort fields end up in the ORDER BY text rather than in bind values, so they
//! are checked against [`SORTABLE_FIELDS`] before anything is rendered.

use crate::error::{Error, Result};

use super::cond::Dialect;

/// Task columns that may be sorted by.
pub const SORTABLE_FIELDS: &[&str] = &[
    "id",
    "title",
    "description",
    "done",
    "done_at",
    "due_date",
    "created_by_id",
    "project_id",
    "repeat_after",
    "priority",
    "start_date",
    "end_date",
    "hex_color",
    "percent_done",
    "uid",
    "created",
    "updated",
    "position",
    "kanban_position",
    "bucket_id",
    "index",
    "repeat_mode",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    /// Parses `asc` or `desc`.
    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(Error::InvalidSortOrder {
                order: other.to_string(),
            }),
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// A validated sort directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortParam {
    field: &'static str,
    order: SortOrder,
}

impl SortParam {
    /// Validates a caller-supplied field name.
    pub fn new(field: &str, order: SortOrder) -> Result<Self> {
        let field = SORTABLE_FIELDS
            .iter()
            .copied()
            .find(|allowed| *allowed == field)
            .ok_or_else(|| Error::InvalidSortParam {
                param: field.to_string(),
            })?;
        Ok(Self { field, order })
    }

    pub fn field(&self) -> &'static str {
        self.field
    }

    pub fn order(&self) -> SortOrder {
        self.order
    }
}

/// Builds the sort list from the repeated `sort_by` / `order_by` parameters.
///
/// `order_by[i]` applies to `sort_by[i]` and defaults to ascending. An `id`
/// ascending tie-break is appended unless `id` is already the last field.
pub fn sort_params(sort_by: &[String], order_by: &[String]) -> Result<Vec<SortParam>> {
    let mut params = sort_by
        .iter()
        .enumerate()
        .map(|(i, field)| {
            let order = match order_by.get(i) {
                Some(order) => SortOrder::parse(order)?,
                None => SortOrder::Asc,
            };
            SortParam::new(field, order)
        })
        .collect::<Result<Vec<_>>>()?;

    if params.last().map(SortParam::field) != Some("id") {
        params.push(SortParam {
            field: "id",
            order: SortOrder::Asc,
        });
    }
    Ok(params)
}

/// Renders the ORDER BY list (without the keyword).
///
/// Nulls always sort last. MySQL has no `NULLS LAST`, so an `IS NULL` term
/// is placed before each field there.
pub fn render_order_by(params: &[SortParam], dialect: Dialect) -> String {
    params
        .iter()
        .map(|param| {
            let column = dialect.quote(param.field);
            if dialect.supports_nulls_last() {
                format!("{column} {} NULLS LAST", param.order.as_sql())
            } else {
                format!("{column} IS NULL, {column} {}", param.order.as_sql())
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}
