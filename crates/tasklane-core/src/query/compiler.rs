//! Lowers task queries into a [`QueryPlan`].
//!
//! Terms on fields stored outside the task table are collected per collection
//! and compiled into one `id IN (SELECT task_id ...)` sub-query each. The
//! same operator then joins those sub-queries with the direct task terms, so
//! a compiled filter always has exactly one operator at its top level.

use tracing::debug;

use crate::error::Result;
use crate::filter::{
    Comparator, Concat, FieldResolver, FilterError, FilterResult, FilterTerm, FilterValue, Group,
    Route,
};
use crate::models::FavoriteKind;

use super::cond::{CmpOp, Cond, Dialect, SqlValue};
use super::options::TaskQuery;
use super::sort::{sort_params, SortParam};

/// The projects a query is restricted to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectScope {
    pub project_ids: Vec<i64>,
    /// Set when the favourites pseudo project is part of the scope.
    pub favorites: Option<FavoritesScope>,
}

/// What the favourites pseudo project expands to for one caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FavoritesScope {
    pub user_id: i64,
    /// Every project the caller can see.
    pub visible_project_ids: Vec<i64>,
}

impl ProjectScope {
    pub fn projects(project_ids: Vec<i64>) -> Self {
        Self {
            project_ids,
            favorites: None,
        }
    }

    /// Returns true when no task can match.
    pub fn is_empty(&self) -> bool {
        self.project_ids.is_empty() && self.favorites.is_none()
    }

    fn to_cond(&self) -> Option<Cond> {
        let projects = (!self.project_ids.is_empty())
            .then(|| Cond::in_ids("project_id", &self.project_ids));

        let Some(favorites) = &self.favorites else {
            return projects;
        };
        let favorite_ids = Cond::in_subquery(
            "id",
            "entity_id",
            "favorites",
            Cond::and(vec![
                Cond::eq("user_id", favorites.user_id),
                Cond::eq("kind", FavoriteKind::Task.as_i64()),
            ]),
        );
        let visible = Cond::in_ids("project_id", &favorites.visible_project_ids);
        let favorites = Cond::and(vec![favorite_ids, visible]);

        Some(match projects {
            Some(projects) => Cond::and(vec![projects, favorites]),
            None => favorites,
        })
    }
}

/// A paging window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub limit: i64,
    pub offset: i64,
}

/// A compiled query.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    pub cond: Cond,
    pub order: Vec<SortParam>,
    /// `None` fetches every matching task.
    pub window: Option<Window>,
}

/// Compiles a query for the given project scope.
///
/// # Errors
///
/// Filter errors, sort errors and invalid values for `like` are returned
/// before any storage is touched.
pub fn compile(
    query: &TaskQuery,
    scope: &ProjectScope,
    resolver: &FieldResolver,
    max_per_page: i64,
) -> Result<QueryPlan> {
    let raw = query.raw_filter()?;
    let concat = query.concat(raw.as_ref())?;
    let resolved = raw.map(|group| resolver.resolve_group(group)).transpose()?;
    let order = sort_params(&query.sort_by, &query.order_by)?;

    let mut conds = Vec::new();
    if let Some(projects) = scope.to_cond() {
        conds.push(projects);
    }
    if let Some(search) = search_cond(&query.search) {
        conds.push(search);
    }
    if let Some(group) = &resolved {
        if let Some(filter) = compile_filter(group, concat, query.filter_include_nulls)? {
            conds.push(filter);
        }
    }

    let plan = QueryPlan {
        cond: Cond::and(conds),
        order,
        window: query
            .window(max_per_page)
            .map(|(limit, offset)| Window { limit, offset }),
    };

    if tracing::enabled!(tracing::Level::DEBUG) {
        let (sql, params) = plan.cond.to_sql(Dialect::Sqlite);
        debug!(cond = %sql, params = params.len(), window = ?plan.window, "compiled task query");
    }
    Ok(plan)
}

/// Compiles a resolved filter, joining every term with `concat`.
///
/// Returns `None` for a filter without terms.
pub fn compile_filter(
    group: &Group<FilterTerm>,
    concat: Concat,
    include_nulls: bool,
) -> FilterResult<Option<Cond>> {
    let mut direct = Vec::new();
    let mut reminders = Vec::new();
    let mut assignees = Vec::new();
    let mut labels = Vec::new();
    let mut namespaces = Vec::new();

    for term in group.leaves() {
        let cond = term_cond(term, include_nulls)?;
        match term.field.route {
            Route::Task => direct.push(cond),
            Route::Reminders => reminders.push(cond),
            Route::Assignees => assignees.push(cond),
            Route::Labels => labels.push(cond),
            Route::Namespace => namespaces.push(cond),
        }
    }

    let join = |conds: Vec<Cond>| match concat {
        Concat::And => Cond::and(conds),
        Concat::Or => Cond::or(conds),
    };

    let mut filters = direct;
    if !reminders.is_empty() {
        filters.push(Cond::in_subquery("id", "task_id", "task_reminders", join(reminders)));
    }
    if !assignees.is_empty() {
        let users = Cond::in_subquery("user_id", "id", "users", Cond::or(assignees));
        filters.push(Cond::in_subquery("id", "task_id", "task_assignees", users));
    }
    if !labels.is_empty() {
        filters.push(Cond::in_subquery("id", "task_id", "label_tasks", join(labels)));
    }
    if !namespaces.is_empty() {
        filters.push(Cond::in_subquery("project_id", "id", "projects", join(namespaces)));
    }

    if filters.is_empty() {
        return Ok(None);
    }
    Ok(Some(join(filters)))
}

fn sql_value(value: &FilterValue) -> SqlValue {
    match value {
        FilterValue::Int(i) => SqlValue::Int(*i),
        FilterValue::Float(f) => SqlValue::Float(*f),
        FilterValue::Str(s) => SqlValue::Text(s.clone()),
        FilterValue::Bool(b) => SqlValue::Bool(*b),
        FilterValue::Time(t) => SqlValue::Time(t.with_timezone(&chrono::Utc)),
        FilterValue::IntList(_) | FilterValue::StrList(_) | FilterValue::List(_) => SqlValue::Null,
    }
}

fn sql_values(value: &FilterValue) -> Vec<SqlValue> {
    value.items().iter().map(sql_value).collect()
}

/// Compiles one term against its routed column.
fn term_cond(term: &FilterTerm, include_nulls: bool) -> FilterResult<Cond> {
    let column = term.field.column;
    let compare = |op: CmpOp| {
        if term.value.is_list() {
            Cond::or(
                sql_values(&term.value)
                    .into_iter()
                    .map(|value| Cond::cmp(column, op, value))
                    .collect(),
            )
        } else {
            Cond::cmp(column, op, sql_value(&term.value))
        }
    };

    let cond = match term.comparator {
        Comparator::Equals if term.value.is_list() => {
            Cond::in_values(column, sql_values(&term.value))
        }
        Comparator::NotEquals if term.value.is_list() => Cond::NotIn {
            column: column.to_string(),
            values: sql_values(&term.value),
        },
        Comparator::Equals => compare(CmpOp::Eq),
        Comparator::NotEquals => compare(CmpOp::Ne),
        Comparator::Greater => compare(CmpOp::Gt),
        Comparator::GreaterEquals => compare(CmpOp::Ge),
        Comparator::Less => compare(CmpOp::Lt),
        Comparator::LessEquals => compare(CmpOp::Le),
        Comparator::Like => match &term.value {
            FilterValue::Str(s) => Cond::Like {
                column: column.to_string(),
                pattern: format!("%{s}%"),
            },
            other => {
                return Err(FilterError::invalid_value(column, format!("{other:?}")));
            }
        },
        Comparator::In => Cond::in_values(column, sql_values(&term.value)),
        Comparator::Invalid => return Err(FilterError::invalid_comparator("invalid")),
    };

    if !include_nulls {
        return Ok(cond);
    }
    let mut alternatives = vec![cond, Cond::is_null(column)];
    if term.is_numeric {
        alternatives.push(Cond::eq(column, 0_i64));
    }
    Ok(Cond::or(alternatives))
}

/// Builds the free-text search condition.
///
/// Matches the title case-insensitively. A `#<digits>` token additionally
/// matches the task index.
pub fn search_cond(search: &str) -> Option<Cond> {
    if search.is_empty() {
        return None;
    }
    let title = Cond::ILike {
        column: "title".to_string(),
        pattern: format!("%{search}%"),
    };
    match index_from_search(search) {
        Some(index) if index > 0 => Some(Cond::or(vec![title, Cond::eq("index", index)])),
        _ => Some(title),
    }
}

/// Returns the number of the first `#<digits>` token.
fn index_from_search(search: &str) -> Option<i64> {
    search.match_indices('#').find_map(|(pos, _)| {
        let digits: String = search[pos + 1..]
            .chars()
            .take_while(char::is_ascii_digit)
            .collect();
        if digits.is_empty() {
            None
        } else {
            Some(digits.parse().unwrap_or(0))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use chrono_tz::UTC;

    fn resolver() -> FieldResolver {
        FieldResolver::new(Utc.with_ymd_and_hms(2024, 3, 15, 10, 0, 0).unwrap(), UTC)
    }

    fn plan(query: &TaskQuery) -> QueryPlan {
        compile(query, &ProjectScope::projects(vec![1]), &resolver(), 50).unwrap()
    }

    fn sql(query: &TaskQuery) -> String {
        plan(query).cond.to_sql(Dialect::Sqlite).0
    }

    #[test]
    fn test_compile_project_scope_only() {
        assert_eq!(sql(&TaskQuery::default()), r#""project_id" IN (?)"#);
    }

    #[test]
    fn test_compile_and_filter() {
        let query = TaskQuery::with_filter("priority >= 3 and done = false");
        let plan = plan(&query);
        let (sql, params) = plan.cond.to_sql(Dialect::Sqlite);
        assert_eq!(
            sql,
            r#"("project_id" IN (?) AND ("priority" >= ? AND "done" = ?))"#
        );
        assert_eq!(
            params,
            vec![SqlValue::Int(1), SqlValue::Int(3), SqlValue::Bool(false)]
        );
    }

    #[test]
    fn test_compile_include_nulls() {
        let query = TaskQuery {
            filter_include_nulls: true,
            ..TaskQuery::with_filter("priority = 3")
        };
        assert_eq!(
            sql(&query),
            r#"("project_id" IN (?) AND ("priority" = ? OR "priority" IS NULL OR "priority" = ?))"#
        );

        let query = TaskQuery {
            filter_include_nulls: true,
            ..TaskQuery::with_filter("due_date < 2024-03-01")
        };
        assert_eq!(
            sql(&query),
            r#"("project_id" IN (?) AND ("due_date" < ? OR "due_date" IS NULL))"#
        );
    }

    #[test]
    fn test_compile_related_collections() {
        let query = TaskQuery::with_filter(
            "labels in 4,5 || assignees = alice || reminders > 2024-03-01 || namespace = 2",
        );
        assert_eq!(
            sql(&query),
            concat!(
                r#"("project_id" IN (?) AND ("#,
                r#""id" IN (SELECT "task_id" FROM "task_reminders" WHERE "reminder" > ?)"#,
                r#" OR "id" IN (SELECT "task_id" FROM "task_assignees" WHERE "user_id" IN (SELECT "id" FROM "users" WHERE "username" IN (?)))"#,
                r#" OR "id" IN (SELECT "task_id" FROM "label_tasks" WHERE "label_id" IN (?, ?))"#,
                r#" OR "project_id" IN (SELECT "id" FROM "projects" WHERE "namespace_id" = ?)"#,
                "))"
            )
        );
    }

    #[test]
    fn test_compile_flattens_nested_groups() {
        let query = TaskQuery::with_filter("(priority = 1 || priority = 2) && done = false");
        assert_eq!(
            sql(&query),
            r#"("project_id" IN (?) AND ("priority" = ? AND "priority" = ? AND "done" = ?))"#
        );
    }

    #[test]
    fn test_compile_explicit_concat_overrides_expression() {
        let query = TaskQuery {
            filter_concat: Some("or".to_string()),
            ..TaskQuery::with_filter("priority = 1 && done = false")
        };
        assert_eq!(
            sql(&query),
            r#"("project_id" IN (?) AND ("priority" = ? OR "done" = ?))"#
        );
    }

    #[test]
    fn test_compile_like() {
        let query = TaskQuery::with_filter("title like milk");
        let (_, params) = plan(&query).cond.to_sql(Dialect::Sqlite);
        assert_eq!(params[1], SqlValue::Text("%milk%".to_string()));

        let err = compile(
            &TaskQuery::with_filter("priority like 3"),
            &ProjectScope::projects(vec![1]),
            &resolver(),
            50,
        )
        .unwrap_err();
        assert_eq!(err.code(), "invalid_task_filter_value");
    }

    #[test]
    fn test_compile_not_equals_list() {
        let query = TaskQuery::with_filter("assignees != alice,bob");
        assert!(sql(&query).contains(r#""username" NOT IN (?, ?)"#));
    }

    #[test]
    fn test_compile_search() {
        let query = TaskQuery {
            search: "fix #12".to_string(),
            ..Default::default()
        };
        assert_eq!(
            sql(&query),
            r#"("project_id" IN (?) AND ("title" LIKE ? OR "index" = ?))"#
        );
        assert_eq!(index_from_search("no index # here"), None);
        assert_eq!(index_from_search("#0"), Some(0));
        assert!(matches!(search_cond("#0"), Some(Cond::ILike { .. })));
    }

    #[test]
    fn test_compile_favorites_scope() {
        let scope = ProjectScope {
            project_ids: vec![],
            favorites: Some(FavoritesScope {
                user_id: 7,
                visible_project_ids: vec![1, 2],
            }),
        };
        let plan = compile(&TaskQuery::default(), &scope, &resolver(), 50).unwrap();
        let (sql, params) = plan.cond.to_sql(Dialect::Sqlite);
        assert_eq!(
            sql,
            r#"("id" IN (SELECT "entity_id" FROM "favorites" WHERE ("user_id" = ? AND "kind" = ?)) AND "project_id" IN (?, ?))"#
        );
        assert_eq!(params[0], SqlValue::Int(7));
        assert_eq!(params[1], SqlValue::Int(FavoriteKind::Task.as_i64()));
    }

    #[test]
    fn test_compile_errors_before_storage() {
        let scope = ProjectScope::projects(vec![1]);
        for (query, code) in [
            (TaskQuery::with_filter("colour = red"), "invalid_task_field"),
            (TaskQuery::with_filter("priority !~ 3"), "invalid_task_filter_comparator"),
            (TaskQuery::with_filter("(priority = 3"), "invalid_filter_syntax"),
            (
                TaskQuery {
                    sort_by: vec!["colour".to_string()],
                    ..Default::default()
                },
                "invalid_sort_param",
            ),
        ] {
            let err = compile(&query, &scope, &resolver(), 50).unwrap_err();
            assert_eq!(err.code(), code);
        }
    }

    #[test]
    fn test_compile_window_and_order() {
        let query = TaskQuery {
            page: Some(2),
            per_page: Some(20),
            sort_by: vec!["due_date".to_string()],
            ..Default::default()
        };
        let plan = plan(&query);
        assert_eq!(
            plan.window,
            Some(Window {
                limit: 20,
                offset: 20
            })
        );
        assert_eq!(plan.order.len(), 2);
    }

    #[test]
    fn test_empty_scope() {
        assert!(ProjectScope::default().is_empty());
        assert!(!ProjectScope::projects(vec![3]).is_empty());
    }
}
