//! Task query parameters.
//!
//! The query string is the wire contract for listing tasks:
//!
//! | Parameter | Meaning |
//! |---|---|
//! | `filter` | filter expression |
//! | `filter_by`, `filter_value`, `filter_comparator` | legacy parallel arrays, repeatable, also with a `[]` suffix |
//! | `filter_concat` | `and` or `or` |
//! | `filter_include_nulls` | boolean; unset values match every comparison |
//! | `sort_by`, `order_by` | repeatable sort directives |
//! | `page`, `per_page` | pagination |
//! | `s` | free-text search |

use crate::error::{Error, Result};
use crate::filter::{parse_bool, Concat, FilterError, FilterParser, Group, Node, RawTerm};

/// Parsed task query parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskQuery {
    pub filter: Option<String>,
    pub filter_by: Vec<String>,
    pub filter_value: Vec<String>,
    pub filter_comparator: Vec<String>,
    pub filter_concat: Option<String>,
    pub filter_include_nulls: bool,
    pub sort_by: Vec<String>,
    pub order_by: Vec<String>,
    /// One-based page number. `None` means the first page.
    pub page: Option<i64>,
    /// Page size. `None` means the configured maximum.
    pub per_page: Option<i64>,
    pub search: String,
}

impl TaskQuery {
    /// A query for the given filter expression.
    pub fn with_filter(filter: impl Into<String>) -> Self {
        Self {
            filter: Some(filter.into()),
            ..Default::default()
        }
    }

    /// Parses a URL query string such as `filter=done%20%3D%20false&page=2`.
    ///
    /// Unknown parameters are ignored.
    pub fn from_query_string(query: &str) -> Result<Self> {
        let pairs: Vec<(String, String)> = serde_urlencoded::from_str(query)
            .map_err(|e| FilterError::invalid_syntax(format!("malformed query string: {e}")))?;

        let mut parsed = TaskQuery::default();
        for (key, value) in pairs {
            match key.trim_end_matches("[]") {
                "filter" => parsed.filter = Some(value),
                "filter_by" => parsed.filter_by.push(value),
                "filter_value" => parsed.filter_value.push(value),
                "filter_comparator" => parsed.filter_comparator.push(value),
                "filter_concat" => parsed.filter_concat = Some(value),
                "filter_include_nulls" => {
                    parsed.filter_include_nulls = parse_bool(&value).ok_or_else(|| {
                        FilterError::invalid_value("filter_include_nulls", value.as_str())
                    })?;
                }
                "sort_by" => parsed.sort_by.push(value),
                "order_by" => parsed.order_by.push(value),
                "page" => parsed.page = Some(parse_int("page", &value)?),
                "per_page" => parsed.per_page = Some(parse_int("per_page", &value)?),
                "s" => parsed.search = value,
                _ => {}
            }
        }
        Ok(parsed)
    }

    /// Parses the expression and appends the legacy terms to its root.
    ///
    /// Returns `None` when neither form is present.
    pub fn raw_filter(&self) -> Result<Option<Group<RawTerm>>> {
        let expression = match self.filter.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => Some(FilterParser::parse(text)?),
            _ => None,
        };
        let legacy = FilterParser::parse_legacy(
            &self.filter_by,
            &self.filter_comparator,
            &self.filter_value,
        )?;

        Ok(match (expression, legacy.is_empty()) {
            (None, true) => None,
            (Some(group), true) => Some(group),
            (expression, false) => {
                let mut group = expression.unwrap_or_else(|| Group::new(Concat::Or, Vec::new()));
                group.children.extend(legacy.into_iter().map(Node::Term));
                Some(group)
            }
        })
    }

    /// Returns the operator that joins all compiled terms.
    ///
    /// An explicit `filter_concat` wins, then the root operator of the
    /// expression, then `or`.
    pub fn concat(&self, parsed: Option<&Group<RawTerm>>) -> Result<Concat> {
        if let Some(value) = self.filter_concat.as_deref() {
            return Concat::parse(value).ok_or_else(|| {
                Error::from(FilterError::invalid_syntax(format!(
                    "invalid filter concatenator '{value}'"
                )))
            });
        }
        let from_expression = self
            .filter
            .as_deref()
            .filter(|text| !text.trim().is_empty())
            .and(parsed)
            .map(|group| group.concat);
        Ok(from_expression.unwrap_or(Concat::Or))
    }

    /// Returns `(limit, offset)`, or `None` to fetch every row.
    ///
    /// A page below 1 or a page size of 0 or less disables paging. Page sizes
    /// above `max_per_page` are clamped. An offset past `i64::MAX` saturates,
    /// which yields an empty page.
    pub fn window(&self, max_per_page: i64) -> Option<(i64, i64)> {
        let page = self.page.unwrap_or(1);
        if page < 1 {
            return None;
        }
        let limit = match self.per_page {
            None => max_per_page,
            Some(per_page) if per_page <= 0 => return None,
            Some(per_page) => per_page.min(max_per_page),
        };
        let offset = limit.checked_mul(page - 1).unwrap_or(i64::MAX);
        Some((limit, offset))
    }
}

fn parse_int(name: &str, value: &str) -> Result<i64> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::from(FilterError::invalid_value(name, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::Comparator;

    #[test]
    fn test_from_query_string() {
        let query = TaskQuery::from_query_string(
            "filter=priority%20%3E%3D%203&filter_concat=and&filter_include_nulls=true\
             &sort_by=due_date&sort_by=id&order_by=desc&order_by=asc&page=2&per_page=10&s=milk",
        )
        .unwrap();
        assert_eq!(query.filter.as_deref(), Some("priority >= 3"));
        assert_eq!(query.filter_concat.as_deref(), Some("and"));
        assert!(query.filter_include_nulls);
        assert_eq!(query.sort_by, vec!["due_date", "id"]);
        assert_eq!(query.order_by, vec!["desc", "asc"]);
        assert_eq!(query.page, Some(2));
        assert_eq!(query.per_page, Some(10));
        assert_eq!(query.search, "milk");
    }

    #[test]
    fn test_from_query_string_array_suffix() {
        let query = TaskQuery::from_query_string(
            "filter_by[]=done&filter_value[]=false&filter_comparator[]=equals&filter_by=priority&filter_value=3",
        )
        .unwrap();
        assert_eq!(query.filter_by, vec!["done", "priority"]);
        assert_eq!(query.filter_value, vec!["false", "3"]);
        assert_eq!(query.filter_comparator, vec!["equals"]);
    }

    #[test]
    fn test_from_query_string_rejects_bad_numbers() {
        let err = TaskQuery::from_query_string("page=two").unwrap_err();
        assert_eq!(err.code(), "invalid_task_filter_value");
    }

    #[test]
    fn test_raw_filter_appends_legacy_terms() {
        let query = TaskQuery {
            filter: Some("priority >= 3".to_string()),
            filter_by: vec!["done".to_string()],
            filter_value: vec!["false".to_string()],
            ..Default::default()
        };
        let group = query.raw_filter().unwrap().unwrap();
        let leaves = group.leaves();
        assert_eq!(leaves.len(), 2);
        assert_eq!(leaves[1], &RawTerm::new("done", Comparator::Equals, "false"));
    }

    #[test]
    fn test_raw_filter_absent() {
        assert_eq!(TaskQuery::default().raw_filter().unwrap(), None);
        assert_eq!(TaskQuery::with_filter("  ").raw_filter().unwrap(), None);
    }

    #[test]
    fn test_concat_resolution() {
        let query = TaskQuery::with_filter("a = 1 && b = 2");
        let parsed = query.raw_filter().unwrap();
        assert_eq!(query.concat(parsed.as_ref()).unwrap(), Concat::And);

        let query = TaskQuery {
            filter_concat: Some("or".to_string()),
            ..TaskQuery::with_filter("a = 1 && b = 2")
        };
        assert_eq!(query.concat(parsed.as_ref()).unwrap(), Concat::Or);

        assert_eq!(TaskQuery::default().concat(None).unwrap(), Concat::Or);

        let query = TaskQuery {
            filter_concat: Some("xor".to_string()),
            ..Default::default()
        };
        assert!(query.concat(None).is_err());
    }

    #[test]
    fn test_window() {
        let query = TaskQuery::default();
        assert_eq!(query.window(50), Some((50, 0)));

        let query = TaskQuery {
            page: Some(3),
            per_page: Some(10),
            ..Default::default()
        };
        assert_eq!(query.window(50), Some((10, 20)));

        let query = TaskQuery {
            per_page: Some(500),
            ..Default::default()
        };
        assert_eq!(query.window(50), Some((50, 0)));

        let query = TaskQuery {
            page: Some(0),
            ..Default::default()
        };
        assert_eq!(query.window(50), None);

        let query = TaskQuery {
            per_page: Some(-1),
            ..Default::default()
        };
        assert_eq!(query.window(50), None);
    }

    #[test]
    fn test_window_huge_page_saturates() {
        let query = TaskQuery::from_query_string("page=9223372036854775807&per_page=50").unwrap();
        assert_eq!(query.window(50), Some((50, i64::MAX)));
    }
}
