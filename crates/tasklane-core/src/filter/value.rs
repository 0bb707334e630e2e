//! Typed filter values and literal coercion.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

use super::datemath;
use super::fields::FieldKind;

/// The typed value of a resolved filter term.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    /// A timestamp normalised to the configured server zone.
    Time(DateTime<Tz>),
    IntList(Vec<i64>),
    StrList(Vec<String>),
    /// Items of an `in` list whose field is neither integer nor string.
    List(Vec<FilterValue>),
}

impl FilterValue {
    /// Returns true for the list variants.
    pub fn is_list(&self) -> bool {
        matches!(
            self,
            FilterValue::IntList(_) | FilterValue::StrList(_) | FilterValue::List(_)
        )
    }

    /// Flattens the value into its scalar items.
    pub fn items(&self) -> Vec<FilterValue> {
        match self {
            FilterValue::IntList(ids) => ids.iter().copied().map(FilterValue::Int).collect(),
            FilterValue::StrList(values) => values.iter().cloned().map(FilterValue::Str).collect(),
            FilterValue::List(values) => values.clone(),
            scalar => vec![scalar.clone()],
        }
    }
}

/// Parses a boolean literal.
///
/// Accepts `1 t T TRUE true True` and `0 f F FALSE false False`.
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

/// Parses an absolute timestamp in one of the accepted input formats.
///
/// Tried in order: RFC 3339, `YYYY-MM-DD HH:MM` (what some browsers send
/// instead of RFC 3339), `YYYY-MM-DD`, then a lenient `Y-M-D` split such as
/// `2022-11-1`. Zone-less forms are read as UTC. The result is converted to
/// `tz`.
pub fn parse_user_time(raw: &str, tz: Tz) -> Option<DateTime<Tz>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&tz));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M") {
        return Some(Utc.from_utc_datetime(&naive).with_timezone(&tz));
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        let midnight = date.and_hms_opt(0, 0, 0)?;
        return Some(Utc.from_utc_datetime(&midnight).with_timezone(&tz));
    }

    let parts: Vec<&str> = raw.split('-').collect();
    if parts.len() < 3 {
        return None;
    }
    let year: i32 = parts[0].parse().ok()?;
    let month: u32 = parts[1].parse().ok()?;
    let day: u32 = parts[2].parse().ok()?;
    let utc = Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).single()?;
    Some(utc.with_timezone(&tz))
}

/// Coerces one literal to the given kind.
///
/// Time literals are tried as date math first, then as absolute timestamps.
pub fn coerce(kind: FieldKind, raw: &str, now: DateTime<Utc>, tz: Tz) -> Option<FilterValue> {
    match kind {
        FieldKind::Int | FieldKind::RelationIds => raw.trim().parse().ok().map(FilterValue::Int),
        FieldKind::Float => raw.trim().parse().ok().map(FilterValue::Float),
        FieldKind::Str => Some(FilterValue::Str(raw.to_string())),
        FieldKind::Bool => parse_bool(raw.trim()).map(FilterValue::Bool),
        FieldKind::Time => datemath::parse(raw, now, tz)
            .or_else(|| parse_user_time(raw.trim(), tz))
            .map(FilterValue::Time),
    }
}
