//! Relative date expressions.
//!
//! Two forms are understood:
//!
//! - date math: an anchor (`now`, `today`, `tomorrow`, `yesterday` or
//!   `<date>||`) followed by any number of `+N<unit>`, `-N<unit>` and
//!   `/<unit>` operations, e.g. `now-1d/d`. Units are `y M w d h H m s`.
//! - natural language: `-3 days`, `+1 week`, `3 days ago`, `in 2 hours`.
//!
//! `today`, `tomorrow`, `yesterday` and rounding are computed in the server
//! zone.

use chrono::{
    DateTime, Datelike, Days, Duration, LocalResult, Months, NaiveDate, NaiveDateTime, TimeZone,
    Timelike, Utc,
};
use chrono_tz::Tz;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Unit {
    Year,
    Month,
    Week,
    Day,
    Hour,
    Minute,
    Second,
}

impl Unit {
    fn from_symbol(c: char) -> Option<Self> {
        match c {
            'y' => Some(Unit::Year),
            'M' => Some(Unit::Month),
            'w' => Some(Unit::Week),
            'd' => Some(Unit::Day),
            'h' | 'H' => Some(Unit::Hour),
            'm' => Some(Unit::Minute),
            's' => Some(Unit::Second),
            _ => None,
        }
    }

    fn from_word(word: &str) -> Option<Self> {
        match word.to_ascii_lowercase().as_str() {
            "year" | "years" => Some(Unit::Year),
            "month" | "months" => Some(Unit::Month),
            "week" | "weeks" => Some(Unit::Week),
            "day" | "days" => Some(Unit::Day),
            "hour" | "hours" => Some(Unit::Hour),
            "minute" | "minutes" | "min" | "mins" => Some(Unit::Minute),
            "second" | "seconds" | "sec" | "secs" => Some(Unit::Second),
            _ => None,
        }
    }
}

/// Evaluates a relative date expression at `now` in `tz`.
///
/// Returns `None` when the text is not a relative date.
pub fn parse(expr: &str, now: DateTime<Utc>, tz: Tz) -> Option<DateTime<Tz>> {
    let expr = expr.trim();
    if expr.is_empty() {
        return None;
    }
    let now = now.with_timezone(&tz);

    if let Some((anchor, ops)) = split_anchor(expr, now, tz) {
        return apply_ops(anchor, ops, tz);
    }
    parse_natural(expr, now)
}

/// Splits the anchor from the operations that follow it.
fn split_anchor<'a>(
    expr: &'a str,
    now: DateTime<Tz>,
    tz: Tz,
) -> Option<(DateTime<Tz>, &'a str)> {
    if let Some((date, ops)) = expr.split_once("||") {
        return Some((parse_anchor_date(date.trim(), tz)?, ops));
    }

    let lower = expr.to_ascii_lowercase();
    let relative_days: [(&str, i64); 3] = [("tomorrow", 1), ("yesterday", -1), ("today", 0)];
    for (word, offset_days) in relative_days {
        if lower.starts_with(word) {
            let day = now.date_naive();
            let day = if offset_days >= 0 {
                day.checked_add_days(Days::new(offset_days as u64))?
            } else {
                day.checked_sub_days(Days::new(offset_days.unsigned_abs()))?
            };
            return Some((local_midnight(day, tz)?, &expr[word.len()..]));
        }
    }
    if lower.starts_with("now") {
        return Some((now, &expr[3..]));
    }
    None
}

fn parse_anchor_date(date: &str, tz: Tz) -> Option<DateTime<Tz>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(date) {
        return Some(parsed.with_timezone(&tz));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(date, "%Y-%m-%d %H:%M") {
        return resolve_local(tz.from_local_datetime(&naive));
    }
    let day = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
    local_midnight(day, tz)
}

/// Applies `+N<unit>`, `-N<unit>` and `/<unit>` operations in order.
fn apply_ops(mut time: DateTime<Tz>, ops: &str, tz: Tz) -> Option<DateTime<Tz>> {
    let mut chars = ops.trim().chars().peekable();
    while let Some(op) = chars.next() {
        match op {
            '+' | '-' => {
                let mut digits = String::new();
                while let Some(c) = chars.peek().copied().filter(char::is_ascii_digit) {
                    digits.push(c);
                    chars.next();
                }
                let amount: i64 = if digits.is_empty() {
                    1
                } else {
                    digits.parse().ok()?
                };
                let unit = Unit::from_symbol(chars.next()?)?;
                let amount = if op == '-' { -amount } else { amount };
                time = shift(time, amount, unit)?;
            }
            '/' => {
                let unit = Unit::from_symbol(chars.next()?)?;
                time = round_down(time, unit, tz)?;
            }
            _ => return None,
        }
    }
    Some(time)
}

/// Parses `[+|-]N unit`, `N unit ago` and `in N unit`.
fn parse_natural(expr: &str, now: DateTime<Tz>) -> Option<DateTime<Tz>> {
    let words: Vec<&str> = expr.split_whitespace().collect();
    let (amount, unit) = match words.as_slice() {
        [amount, unit, ago] if ago.eq_ignore_ascii_case("ago") => {
            (-amount.parse::<i64>().ok()?, *unit)
        }
        [in_word, amount, unit] if in_word.eq_ignore_ascii_case("in") => {
            (amount.parse::<i64>().ok()?, *unit)
        }
        [amount, unit] => {
            let amount = amount.strip_prefix('+').unwrap_or(*amount);
            (amount.parse::<i64>().ok()?, *unit)
        }
        _ => return None,
    };
    shift(now, amount, Unit::from_word(unit)?)
}

fn shift(time: DateTime<Tz>, amount: i64, unit: Unit) -> Option<DateTime<Tz>> {
    match unit {
        Unit::Year => shift_months(time, amount.checked_mul(12)?),
        Unit::Month => shift_months(time, amount),
        Unit::Week => shift_days(time, amount.checked_mul(7)?),
        Unit::Day => shift_days(time, amount),
        Unit::Hour => time.checked_add_signed(Duration::try_hours(amount)?),
        Unit::Minute => time.checked_add_signed(Duration::try_minutes(amount)?),
        Unit::Second => time.checked_add_signed(Duration::try_seconds(amount)?),
    }
}

fn shift_months(time: DateTime<Tz>, months: i64) -> Option<DateTime<Tz>> {
    let count = Months::new(u32::try_from(months.unsigned_abs()).ok()?);
    if months >= 0 {
        time.checked_add_months(count)
    } else {
        time.checked_sub_months(count)
    }
}

fn shift_days(time: DateTime<Tz>, days: i64) -> Option<DateTime<Tz>> {
    let count = Days::new(days.unsigned_abs());
    if days >= 0 {
        time.checked_add_days(count)
    } else {
        time.checked_sub_days(count)
    }
}

fn round_down(time: DateTime<Tz>, unit: Unit, tz: Tz) -> Option<DateTime<Tz>> {
    let local = time.naive_local();
    let date = local.date();
    let rounded = match unit {
        Unit::Year => NaiveDate::from_ymd_opt(date.year(), 1, 1)?.and_hms_opt(0, 0, 0)?,
        Unit::Month => NaiveDate::from_ymd_opt(date.year(), date.month(), 1)?.and_hms_opt(0, 0, 0)?,
        Unit::Week => {
            let back = u64::from(date.weekday().num_days_from_monday());
            date.checked_sub_days(Days::new(back))?.and_hms_opt(0, 0, 0)?
        }
        Unit::Day => date.and_hms_opt(0, 0, 0)?,
        Unit::Hour => date.and_hms_opt(local.hour(), 0, 0)?,
        Unit::Minute => date.and_hms_opt(local.hour(), local.minute(), 0)?,
        Unit::Second => date.and_hms_opt(local.hour(), local.minute(), local.second())?,
    };
    resolve_local(tz.from_local_datetime(&rounded))
}

fn local_midnight(day: NaiveDate, tz: Tz) -> Option<DateTime<Tz>> {
    resolve_local(tz.from_local_datetime(&day.and_hms_opt(0, 0, 0)?))
}

/// Picks the earlier instant of an ambiguous local time.
fn resolve_local(result: LocalResult<DateTime<Tz>>) -> Option<DateTime<Tz>> {
    result.earliest()
}
