//! Field registry and term resolution.
//!
//! Every filterable field is listed once in [`FIELDS`] with its storage
//! column, value kind and the collection it lives in. Names are matched after
//! normalisation, so `dueDate`, `due_date` and `DueDate` name the same field.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use super::ast::{Comparator, FilterTerm, Group, RawTerm};
use super::error::{FilterError, FilterResult};
use super::value::{coerce, FilterValue};

/// The native type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Int,
    Float,
    Str,
    Bool,
    Time,
    /// A list of related entities, filtered by their integer ids.
    RelationIds,
}

/// The collection a field is stored in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    /// A column of the task table.
    Task,
    /// The trigger column of the reminders table.
    Reminders,
    /// Usernames of assigned users.
    Assignees,
    /// Label ids of the label link table.
    Labels,
    /// The namespace column of the project table.
    Namespace,
}

/// A registry entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldDef {
    /// Canonical field name.
    pub name: &'static str,
    /// Storage column in the routed table.
    pub column: &'static str,
    pub kind: FieldKind,
    pub route: Route,
}

const fn task_field(name: &'static str, kind: FieldKind) -> FieldDef {
    FieldDef {
        name,
        column: name,
        kind,
        route: Route::Task,
    }
}

/// All filterable fields.
pub const FIELDS: &[FieldDef] = &[
    task_field("id", FieldKind::Int),
    task_field("title", FieldKind::Str),
    task_field("description", FieldKind::Str),
    task_field("done", FieldKind::Bool),
    task_field("done_at", FieldKind::Time),
    task_field("due_date", FieldKind::Time),
    task_field("created_by_id", FieldKind::Int),
    task_field("project_id", FieldKind::Int),
    task_field("repeat_after", FieldKind::Int),
    task_field("repeat_mode", FieldKind::Int),
    task_field("priority", FieldKind::Int),
    task_field("start_date", FieldKind::Time),
    task_field("end_date", FieldKind::Time),
    task_field("hex_color", FieldKind::Str),
    task_field("percent_done", FieldKind::Float),
    task_field("uid", FieldKind::Str),
    task_field("index", FieldKind::Int),
    task_field("cover_image_attachment_id", FieldKind::Int),
    task_field("created", FieldKind::Time),
    task_field("updated", FieldKind::Time),
    task_field("bucket_id", FieldKind::Int),
    task_field("position", FieldKind::Float),
    task_field("kanban_position", FieldKind::Float),
    FieldDef {
        name: "reminders",
        column: "reminder",
        kind: FieldKind::Time,
        route: Route::Reminders,
    },
    FieldDef {
        name: "assignees",
        column: "username",
        kind: FieldKind::Str,
        route: Route::Assignees,
    },
    FieldDef {
        name: "labels",
        column: "label_id",
        kind: FieldKind::RelationIds,
        route: Route::Labels,
    },
    FieldDef {
        name: "namespace",
        column: "namespace_id",
        kind: FieldKind::Int,
        route: Route::Namespace,
    },
];

/// Alternative names mapped to canonical ones.
const ALIASES: &[(&str, &str)] = &[
    ("project", "project_id"),
    ("label_id", "labels"),
    ("namespace_id", "namespace"),
];

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Looks up a field by name.
///
/// # Errors
///
/// Returns `FilterError::InvalidField` for unknown names, with the closest
/// known name as a suggestion when one is near.
pub fn lookup(name: &str) -> FilterResult<&'static FieldDef> {
    let wanted = normalize(name);
    let canonical = ALIASES
        .iter()
        .find(|(alias, _)| normalize(alias) == wanted)
        .map(|(_, target)| normalize(target))
        .unwrap_or(wanted);

    if let Some(def) = FIELDS.iter().find(|def| normalize(def.name) == canonical) {
        return Ok(def);
    }

    Err(FilterError::InvalidField {
        field: name.to_string(),
        suggestion: suggest(&canonical),
    })
}

/// Finds the closest known field name, if any is within two edits.
fn suggest(normalized: &str) -> Option<String> {
    FIELDS
        .iter()
        .map(|def| (strsim::levenshtein(normalized, &normalize(def.name)), def.name))
        .filter(|(distance, _)| *distance <= 2)
        .min_by_key(|(distance, _)| *distance)
        .map(|(_, name)| name.to_string())
}

/// Resolves raw terms against the registry, coercing their literals.
#[derive(Debug, Clone, Copy)]
pub struct FieldResolver {
    now: DateTime<Utc>,
    tz: Tz,
}

impl FieldResolver {
    /// Creates a resolver evaluating relative dates at `now` in `tz`.
    pub fn new(now: DateTime<Utc>, tz: Tz) -> Self {
        Self { now, tz }
    }

    /// Resolves every leaf of a parsed group.
    pub fn resolve_group(&self, group: Group<RawTerm>) -> FilterResult<Group<FilterTerm>> {
        group.try_map(&mut |term| self.resolve(term))
    }

    /// Resolves one term.
    ///
    /// # Errors
    ///
    /// - `InvalidComparator` for the invalid sentinel
    /// - `InvalidField` for unknown field names
    /// - `InvalidValue` for literals that do not fit the field, and for
    ///   `like` on assignees
    pub fn resolve(&self, term: RawTerm) -> FilterResult<FilterTerm> {
        let comparator = term.comparator.validate()?;
        let def = *lookup(&term.field)?;

        if def.route == Route::Assignees {
            if comparator == Comparator::Like {
                return Err(FilterError::invalid_value(term.field, term.value));
            }
            let usernames = term.value.split(',').map(|s| s.trim().to_string()).collect();
            return Ok(FilterTerm {
                field: def,
                comparator,
                value: FilterValue::StrList(usernames),
                is_numeric: false,
            });
        }

        let invalid = || FilterError::invalid_value(term.field.as_str(), term.value.as_str());

        if comparator == Comparator::In {
            let items = term
                .value
                .split(',')
                .map(|raw| coerce(def.kind, raw, self.now, self.tz).ok_or_else(invalid))
                .collect::<FilterResult<Vec<_>>>()?;
            return Ok(FilterTerm {
                field: def,
                comparator,
                value: collect_list(items),
                is_numeric: false,
            });
        }

        let value = coerce(def.kind, &term.value, self.now, self.tz).ok_or_else(invalid)?;
        Ok(FilterTerm {
            field: def,
            comparator,
            value,
            is_numeric: def.kind == FieldKind::Int,
        })
    }
}

/// Packs coerced items into the narrowest list variant.
fn collect_list(items: Vec<FilterValue>) -> FilterValue {
    if items.iter().all(|v| matches!(v, FilterValue::Int(_))) {
        return FilterValue::IntList(
            items
                .into_iter()
                .filter_map(|v| match v {
                    FilterValue::Int(i) => Some(i),
                    _ => None,
                })
                .collect(),
        );
    }
    if items.iter().all(|v| matches!(v, FilterValue::Str(_))) {
        return FilterValue::StrList(
            items
                .into_iter()
                .filter_map(|v| match v {
                    FilterValue::Str(s) => Some(s),
                    _ => None,
                })
                .collect(),
        );
    }
    FilterValue::List(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::UTC;

    fn resolver() -> FieldResolver {
        FieldResolver::new(Utc.with_ymd_and_hms(2024, 3, 15, 10, 0, 0).unwrap(), UTC)
    }

    fn resolve(field: &str, comparator: Comparator, value: &str) -> FilterResult<FilterTerm> {
        resolver().resolve(RawTerm::new(field, comparator, value))
    }

    #[test]
    fn test_lookup_normalizes_names() {
        assert_eq!(lookup("due_date").unwrap().name, "due_date");
        assert_eq!(lookup("dueDate").unwrap().name, "due_date");
        assert_eq!(lookup("DueDate").unwrap().name, "due_date");
        assert_eq!(lookup("PERCENT_DONE").unwrap().name, "percent_done");
    }

    #[test]
    fn test_lookup_aliases() {
        assert_eq!(lookup("project").unwrap().name, "project_id");
        assert_eq!(lookup("label_id").unwrap().name, "labels");
        assert_eq!(lookup("namespace_id").unwrap().route, Route::Namespace);
    }

    #[test]
    fn test_lookup_unknown_field_suggests() {
        let err = lookup("priorty").unwrap_err();
        assert_eq!(
            err,
            FilterError::InvalidField {
                field: "priorty".to_string(),
                suggestion: Some("priority".to_string()),
            }
        );
        assert_eq!(
            err.to_string(),
            "invalid task field 'priorty', did you mean 'priority'?"
        );

        let err = lookup("colour_of_the_sky").unwrap_err();
        assert!(matches!(err, FilterError::InvalidField { suggestion: None, .. }));
    }

    #[test]
    fn test_resolve_integer_is_numeric() {
        let term = resolve("priority", Comparator::GreaterEquals, "3").unwrap();
        assert_eq!(term.value, FilterValue::Int(3));
        assert!(term.is_numeric);
        assert_eq!(term.field.column, "priority");
    }

    #[test]
    fn test_resolve_bool_is_not_numeric() {
        let term = resolve("done", Comparator::Equals, "false").unwrap();
        assert_eq!(term.value, FilterValue::Bool(false));
        assert!(!term.is_numeric);
    }

    #[test]
    fn test_resolve_project_is_rewritten() {
        let term = resolve("project", Comparator::Equals, "4").unwrap();
        assert_eq!(term.field.column, "project_id");
        assert_eq!(term.value, FilterValue::Int(4));
    }

    #[test]
    fn test_resolve_assignees_split_without_type_lookup() {
        let term = resolve("assignees", Comparator::In, "alice,bob").unwrap();
        assert_eq!(
            term.value,
            FilterValue::StrList(vec!["alice".to_string(), "bob".to_string()])
        );
        assert_eq!(term.field.route, Route::Assignees);

        let term = resolve("assignees", Comparator::Equals, "alice").unwrap();
        assert_eq!(term.value, FilterValue::StrList(vec!["alice".to_string()]));
    }

    #[test]
    fn test_resolve_assignees_like_is_invalid_value() {
        let err = resolve("assignees", Comparator::Like, "ali").unwrap_err();
        assert!(matches!(err, FilterError::InvalidValue { .. }));
    }

    #[test]
    fn test_resolve_reminders_is_time() {
        let term = resolve("reminders", Comparator::Greater, "2024-03-01").unwrap();
        assert_eq!(term.field.route, Route::Reminders);
        assert_eq!(term.field.column, "reminder");
        assert!(matches!(term.value, FilterValue::Time(_)));
    }

    #[test]
    fn test_resolve_labels_parse_ids() {
        let term = resolve("labels", Comparator::Equals, "7").unwrap();
        assert_eq!(term.value, FilterValue::Int(7));
        assert!(!term.is_numeric);

        let err = resolve("labels", Comparator::Equals, "urgent").unwrap_err();
        assert!(matches!(err, FilterError::InvalidValue { .. }));
    }

    #[test]
    fn test_resolve_in_splits_and_coerces() {
        let term = resolve("priority", Comparator::In, "1,2,3").unwrap();
        assert_eq!(term.value, FilterValue::IntList(vec![1, 2, 3]));
        assert!(!term.is_numeric);

        let term = resolve("title", Comparator::In, "a,b").unwrap();
        assert_eq!(
            term.value,
            FilterValue::StrList(vec!["a".to_string(), "b".to_string()])
        );

        let term = resolve("done", Comparator::In, "true,false").unwrap();
        assert_eq!(
            term.value,
            FilterValue::List(vec![FilterValue::Bool(true), FilterValue::Bool(false)])
        );

        let err = resolve("priority", Comparator::In, "1,x").unwrap_err();
        assert!(matches!(err, FilterError::InvalidValue { .. }));
    }

    #[test]
    fn test_resolve_invalid_sentinel_fails() {
        let err = resolve("priority", Comparator::Invalid, "1").unwrap_err();
        assert_eq!(err, FilterError::invalid_comparator("invalid"));
    }

    #[test]
    fn test_resolve_unparseable_value_fails() {
        for (field, value) in [
            ("priority", "high"),
            ("done", "maybe"),
            ("due_date", "someday"),
            ("percent_done", "half"),
        ] {
            let err = resolve(field, Comparator::Equals, value).unwrap_err();
            assert!(
                matches!(err, FilterError::InvalidValue { .. }),
                "{field} = {value}"
            );
        }
    }

    #[test]
    fn test_resolve_relative_date() {
        let term = resolve("due_date", Comparator::Less, "now+1d").unwrap();
        let FilterValue::Time(t) = term.value else {
            panic!("expected a time value");
        };
        assert_eq!(
            t.with_timezone(&Utc),
            Utc.with_ymd_and_hms(2024, 3, 16, 10, 0, 0).unwrap()
        );
    }
}
