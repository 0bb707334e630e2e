//! Recurrence engine.
//!
//! When a repeating task is marked done its dates move forward and it is
//! reopened. How far they move depends on the [`RepeatMode`]:
//!
//! - `Default`: every date is advanced by `repeat_after` at least once, then
//!   until it lies strictly after now.
//! - `Month`: every date is advanced by one calendar month in the server
//!   zone, without catching up.
//! - `FromCurrentDate`: the due date becomes now plus `repeat_after`, the
//!   other dates keep their distance to it.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Months, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::{Error, Result};
use crate::models::{RepeatMode, Task, TaskReminder};

/// Applies a change of the done flag from `old` to `new`.
///
/// Only a false to true transition reschedules. `old` is the stored task and
/// the source of truth for the dates and reminders being moved; `new` receives
/// the results. Afterwards `done_at` is set exactly when `new.done` is.
pub fn update_done(old: &Task, new: &mut Task, now: DateTime<Utc>, tz: Tz) {
    if !old.done && new.done {
        match old.repeat_mode {
            RepeatMode::Month => repeat_monthly(old, new, tz),
            RepeatMode::FromCurrentDate => repeat_from_current_date(old, new, now),
            RepeatMode::Default => repeat_default(old, new, now),
        }
        new.done_at = new.done.then_some(now);
    }

    if old.done && !new.done {
        new.done_at = None;
    }
}

fn interval(old: &Task) -> Option<Duration> {
    (old.repeat_after > 0)
        .then(|| Duration::try_seconds(old.repeat_after))
        .flatten()
}

/// Adds `step` once, then until the result is after `now`.
fn advance_past(date: DateTime<Utc>, step: Duration, now: DateTime<Utc>) -> DateTime<Utc> {
    let Some(next) = date.checked_add_signed(step) else {
        return date;
    };
    if next > now {
        return next;
    }
    let behind = (now - next).num_seconds();
    let steps = behind / step.num_seconds().max(1) + 1;
    i32::try_from(steps)
        .ok()
        .and_then(|n| step.checked_mul(n))
        .and_then(|total| next.checked_add_signed(total))
        .unwrap_or_else(|| catch_up_slowly(next, step, now))
}

fn catch_up_slowly(mut date: DateTime<Utc>, step: Duration, now: DateTime<Utc>) -> DateTime<Utc> {
    while date <= now {
        match date.checked_add_signed(step) {
            Some(next) => date = next,
            None => break,
        }
    }
    date
}

fn repeat_default(old: &Task, new: &mut Task, now: DateTime<Utc>) {
    let Some(step) = interval(old) else {
        return;
    };
    let advance = |date: Option<DateTime<Utc>>| date.map(|d| advance_past(d, step, now));

    new.due_date = advance(old.due_date);
    new.reminders = old
        .reminders
        .iter()
        .map(|r| TaskReminder {
            reminder: advance(r.reminder),
            ..r.clone()
        })
        .collect();
    new.start_date = advance(old.start_date);
    new.end_date = advance(old.end_date);
    new.done = false;
}

/// Adds one calendar month in `tz`, clamping the day to the target month.
pub fn add_one_month(date: DateTime<Utc>, tz: Tz) -> DateTime<Utc> {
    let local = date.with_timezone(&tz).naive_local();
    let Some(target) = local.checked_add_months(Months::new(1)) else {
        return date;
    };
    match tz.from_local_datetime(&target).earliest() {
        Some(moved) => moved.with_timezone(&Utc),
        // The wall time falls into a DST gap.
        None => date
            .checked_add_signed(target - local)
            .unwrap_or(date),
    }
}

fn repeat_monthly(old: &Task, new: &mut Task, tz: Tz) {
    let month = |date: Option<DateTime<Utc>>| date.map(|d| add_one_month(d, tz));

    new.due_date = month(old.due_date);
    new.reminders = old
        .reminders
        .iter()
        .map(|r| TaskReminder {
            reminder: month(r.reminder),
            ..r.clone()
        })
        .collect();

    match (old.start_date, old.end_date) {
        (Some(start), Some(end)) => {
            let moved = add_one_month(start, tz);
            new.start_date = Some(moved);
            new.end_date = moved.checked_add_signed(end - start).or(Some(end));
        }
        (start, end) => {
            new.start_date = month(start);
            new.end_date = month(end);
        }
    }
    new.done = false;
}

fn repeat_from_current_date(old: &Task, new: &mut Task, now: DateTime<Utc>) {
    let Some(step) = interval(old) else {
        return;
    };
    let Some(base) = now.checked_add_signed(step) else {
        return;
    };

    new.due_date = old.due_date.map(|_| base);

    // Offsets are taken from the earliest set trigger. Reminders without one
    // keep it unset; anchored ones are recomputed from the moved dates.
    let first = old.reminders.iter().filter_map(|r| r.reminder).min();
    let mut reminders = old.reminders.clone();
    reminders.sort_by_key(|r| r.reminder);
    new.reminders = reminders
        .iter()
        .map(|r| TaskReminder {
            reminder: r
                .reminder
                .zip(first)
                .and_then(|(at, first)| base.checked_add_signed(at - first)),
            ..r.clone()
        })
        .collect();

    match old.due_date {
        None => match (old.start_date, old.end_date) {
            (Some(start), Some(end)) => {
                new.start_date = Some(base);
                new.end_date = base.checked_add_signed(end - start);
            }
            (start, end) => {
                new.start_date = start.map(|_| base);
                new.end_date = end.map(|_| base);
            }
        },
        Some(due) => {
            let keep_gap = |date: DateTime<Utc>| base.checked_sub_signed(due - date);
            if let Some(start) = old.start_date {
                new.start_date = keep_gap(start);
            }
            if let Some(end) = old.end_date {
                new.end_date = keep_gap(end);
            }
        }
    }
    new.done = false;
}

/// Derives the trigger of every relative reminder from the task's dates,
/// then deduplicates the reminders by trigger second and sorts them.
///
/// # Errors
///
/// `MissingReminderRelation` when a reminder has a period but no anchor.
/// Nothing is changed in that case.
pub fn resolve_reminders(task: &mut Task) -> Result<()> {
    if let Some(orphan) = task
        .reminders
        .iter()
        .find(|r| r.relative_to.is_none() && r.relative_period != 0)
    {
        return Err(Error::MissingReminderRelation {
            task_id: task.id,
            period: orphan.relative_period,
        });
    }

    let anchors = task.clone();
    let resolved = task
        .reminders
        .drain(..)
        .map(|r| match r.relative_to {
            Some(relation) => TaskReminder {
                reminder: relation
                    .anchor(&anchors)
                    .and_then(|anchor| anchor.checked_add_signed(r.period())),
                ..r
            },
            None => r,
        })
        .collect();
    task.reminders = normalize_reminders(task.id, resolved);
    Ok(())
}

/// Keeps one reminder per trigger second, sorted ascending.
///
/// Later entries win over earlier ones with the same trigger.
pub fn normalize_reminders(task_id: i64, reminders: Vec<TaskReminder>) -> Vec<TaskReminder> {
    let mut by_trigger = BTreeMap::new();
    for reminder in reminders {
        by_trigger.insert(reminder.reminder.map(|at| at.timestamp()), reminder);
    }
    by_trigger
        .into_values()
        .map(|reminder| TaskReminder { task_id, ..reminder })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ReminderRelation;
    use chrono::{Datelike, Timelike};
    use chrono_tz::{Europe, UTC};

    const DAY: i64 = 86_400;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    fn now() -> DateTime<Utc> {
        at(2024, 3, 15, 10, 30)
    }

    fn mark_done(old: &Task, tz: Tz) -> Task {
        let mut new = old.clone();
        new.done = true;
        update_done(old, &mut new, now(), tz);
        new
    }

    // ==================== Default ====================

    #[test]
    fn test_default_advances_past_now() {
        let old = Task {
            due_date: Some(at(2024, 3, 1, 9, 0)),
            repeat_after: DAY,
            ..Default::default()
        };
        let new = mark_done(&old, UTC);
        let due = new.due_date.unwrap();
        assert!(due > now());
        assert_eq!(due, at(2024, 3, 16, 9, 0));
        assert_eq!((due - old.due_date.unwrap()).num_seconds() % DAY, 0);
        assert!(!new.done);
        assert!(new.done_at.is_none());
    }

    #[test]
    fn test_default_advances_future_date_once() {
        let old = Task {
            due_date: Some(at(2024, 4, 1, 9, 0)),
            repeat_after: DAY,
            ..Default::default()
        };
        assert_eq!(mark_done(&old, UTC).due_date, Some(at(2024, 4, 2, 9, 0)));
    }

    #[test]
    fn test_default_moves_all_dates_and_reminders() {
        let old = Task {
            due_date: Some(at(2024, 3, 14, 12, 0)),
            start_date: Some(at(2024, 3, 14, 8, 0)),
            end_date: Some(at(2024, 3, 14, 13, 0)),
            repeat_after: DAY,
            reminders: vec![TaskReminder::absolute(at(2024, 3, 14, 11, 0))],
            ..Default::default()
        };
        let new = mark_done(&old, UTC);
        assert_eq!(new.due_date, Some(at(2024, 3, 15, 12, 0)));
        assert_eq!(new.start_date, Some(at(2024, 3, 16, 8, 0)));
        assert_eq!(new.end_date, Some(at(2024, 3, 15, 13, 0)));
        assert_eq!(new.reminders[0].reminder, Some(at(2024, 3, 15, 11, 0)));
    }

    #[test]
    fn test_default_property_over_intervals() {
        for interval in [3600, DAY, 7 * DAY] {
            for days_ago in [0, 1, 30, 400] {
                let due = now() - Duration::days(days_ago) - Duration::minutes(7);
                let old = Task {
                    due_date: Some(due),
                    repeat_after: interval,
                    ..Default::default()
                };
                let new_due = mark_done(&old, UTC).due_date.unwrap();
                assert!(new_due > now());
                assert!(new_due - Duration::seconds(interval) <= now());
                assert_eq!((new_due - due).num_seconds() % interval, 0);
            }
        }
    }

    #[test]
    fn test_default_without_interval_stays_done() {
        let old = Task {
            due_date: Some(at(2024, 3, 1, 9, 0)),
            ..Default::default()
        };
        let new = mark_done(&old, UTC);
        assert!(new.done);
        assert_eq!(new.done_at, Some(now()));
        assert_eq!(new.due_date, old.due_date);
    }

    // ==================== Month ====================

    #[test]
    fn test_month_clamps_to_month_end() {
        let old = Task {
            due_date: Some(at(2024, 1, 31, 9, 0)),
            repeat_mode: RepeatMode::Month,
            ..Default::default()
        };
        let new = mark_done(&old, UTC);
        assert_eq!(new.due_date, Some(at(2024, 2, 29, 9, 0)));
        assert!(!new.done);
    }

    #[test]
    fn test_month_does_not_catch_up() {
        let old = Task {
            due_date: Some(at(2023, 6, 10, 9, 0)),
            repeat_mode: RepeatMode::Month,
            ..Default::default()
        };
        assert_eq!(mark_done(&old, UTC).due_date, Some(at(2023, 7, 10, 9, 0)));
    }

    #[test]
    fn test_month_keeps_wall_time_in_server_zone() {
        // 09:00 in Berlin, across the March DST switch.
        let old = Task {
            due_date: Some(at(2024, 3, 10, 8, 0)),
            repeat_mode: RepeatMode::Month,
            ..Default::default()
        };
        let due = mark_done(&old, Europe::Berlin).due_date.unwrap();
        let local = due.with_timezone(&Europe::Berlin);
        assert_eq!((local.month(), local.day(), local.hour()), (4, 10, 9));
    }

    #[test]
    fn test_month_keeps_start_end_gap() {
        let old = Task {
            start_date: Some(at(2024, 1, 31, 9, 0)),
            end_date: Some(at(2024, 2, 2, 9, 0)),
            repeat_mode: RepeatMode::Month,
            ..Default::default()
        };
        let new = mark_done(&old, UTC);
        assert_eq!(new.start_date, Some(at(2024, 2, 29, 9, 0)));
        assert_eq!(new.end_date, Some(at(2024, 3, 2, 9, 0)));
    }

    // ==================== FromCurrentDate ====================

    #[test]
    fn test_from_current_date_anchors_at_now() {
        let old = Task {
            due_date: Some(at(2024, 1, 1, 12, 0)),
            start_date: Some(at(2024, 1, 1, 10, 0)),
            end_date: Some(at(2024, 1, 1, 14, 0)),
            repeat_after: DAY,
            repeat_mode: RepeatMode::FromCurrentDate,
            reminders: vec![
                TaskReminder::absolute(at(2024, 1, 1, 11, 0)),
                TaskReminder::absolute(at(2024, 1, 1, 9, 0)),
            ],
            ..Default::default()
        };
        let new = mark_done(&old, UTC);
        let base = now() + Duration::days(1);
        assert_eq!(new.due_date, Some(base));
        assert_eq!(new.start_date, Some(base - Duration::hours(2)));
        assert_eq!(new.end_date, Some(base + Duration::hours(2)));
        let triggers: Vec<_> = new.reminders.iter().map(|r| r.reminder.unwrap()).collect();
        assert_eq!(triggers, vec![base, base + Duration::hours(2)]);
    }

    #[test]
    fn test_from_current_date_without_due_date() {
        let old = Task {
            start_date: Some(at(2024, 1, 1, 10, 0)),
            end_date: Some(at(2024, 1, 1, 14, 0)),
            repeat_after: DAY,
            repeat_mode: RepeatMode::FromCurrentDate,
            ..Default::default()
        };
        let new = mark_done(&old, UTC);
        let base = now() + Duration::days(1);
        assert_eq!(new.due_date, None);
        assert_eq!(new.start_date, Some(base));
        assert_eq!(new.end_date, Some(base + Duration::hours(4)));
    }

    #[test]
    fn test_from_current_date_keeps_gaps_past_unanchored_reminder() {
        let old = Task {
            due_date: Some(at(2024, 1, 1, 12, 0)),
            repeat_after: DAY,
            repeat_mode: RepeatMode::FromCurrentDate,
            reminders: vec![
                TaskReminder::relative(600, ReminderRelation::StartDate),
                TaskReminder::absolute(at(2024, 1, 1, 9, 0)),
                TaskReminder::absolute(at(2024, 1, 1, 11, 0)),
            ],
            ..Default::default()
        };
        let mut new = mark_done(&old, UTC);
        let base = now() + Duration::days(1);
        let triggers: Vec<_> = new.reminders.iter().map(|r| r.reminder).collect();
        assert_eq!(triggers, vec![None, Some(base), Some(base + Duration::hours(2))]);

        resolve_reminders(&mut new).unwrap();
        let absolute = new.reminders.iter().filter(|r| r.relative_to.is_none()).count();
        assert_eq!(absolute, 2);
    }

    #[test]
    fn test_from_current_date_extreme_gap_does_not_panic() {
        let old = Task {
            due_date: Some(at(2024, 1, 1, 12, 0)),
            start_date: Some(DateTime::<Utc>::MIN_UTC),
            repeat_after: DAY,
            repeat_mode: RepeatMode::FromCurrentDate,
            ..Default::default()
        };
        let new = mark_done(&old, UTC);
        assert_eq!(new.due_date, Some(now() + Duration::days(1)));
        assert_eq!(new.start_date, None);
    }

    #[test]
    fn test_month_extreme_gap_does_not_panic() {
        let old = Task {
            start_date: Some(at(2024, 1, 31, 9, 0)),
            end_date: Some(DateTime::<Utc>::MAX_UTC),
            repeat_mode: RepeatMode::Month,
            ..Default::default()
        };
        let new = mark_done(&old, UTC);
        assert_eq!(new.start_date, Some(at(2024, 2, 29, 9, 0)));
        assert_eq!(new.end_date, Some(DateTime::<Utc>::MAX_UTC));
    }

    // ==================== done_at ====================

    #[test]
    fn test_unmarking_clears_done_at_only() {
        let old = Task {
            done: true,
            done_at: Some(at(2024, 3, 1, 9, 0)),
            due_date: Some(at(2024, 3, 1, 9, 0)),
            repeat_after: DAY,
            ..Default::default()
        };
        let mut new = old.clone();
        new.done = false;
        update_done(&old, &mut new, now(), UTC);
        assert!(!new.done);
        assert!(new.done_at.is_none());
        assert_eq!(new.due_date, old.due_date);
    }

    #[test]
    fn test_no_transition_changes_nothing() {
        let old = Task {
            due_date: Some(at(2024, 3, 1, 9, 0)),
            repeat_after: DAY,
            ..Default::default()
        };
        let mut new = old.clone();
        update_done(&old, &mut new, now(), UTC);
        assert_eq!(new, old);
    }

    // ==================== Reminders ====================

    #[test]
    fn test_resolve_relative_reminders() {
        let mut task = Task {
            id: 5,
            due_date: Some(at(2024, 3, 20, 12, 0)),
            reminders: vec![
                TaskReminder::relative(-3600, ReminderRelation::DueDate),
                TaskReminder::relative(600, ReminderRelation::StartDate),
                TaskReminder::absolute(at(2024, 3, 19, 8, 0)),
            ],
            ..Default::default()
        };
        resolve_reminders(&mut task).unwrap();
        let triggers: Vec<_> = task.reminders.iter().map(|r| r.reminder).collect();
        assert_eq!(
            triggers,
            vec![None, Some(at(2024, 3, 19, 8, 0)), Some(at(2024, 3, 20, 11, 0))]
        );
        assert!(task.reminders.iter().all(|r| r.task_id == 5));
    }

    #[test]
    fn test_resolve_rejects_period_without_relation() {
        let mut task = Task {
            reminders: vec![TaskReminder {
                relative_period: 60,
                ..Default::default()
            }],
            ..Default::default()
        };
        let err = resolve_reminders(&mut task).unwrap_err();
        assert_eq!(err.code(), "reminder_relative_to_missing");
        assert_eq!(task.reminders.len(), 1);
    }

    #[test]
    fn test_normalize_deduplicates_by_second() {
        let reminders = vec![
            TaskReminder::absolute(at(2024, 3, 2, 9, 0)),
            TaskReminder::absolute(at(2024, 3, 1, 9, 0)),
            TaskReminder::absolute(at(2024, 3, 2, 9, 0)),
        ];
        let normalized = normalize_reminders(1, reminders);
        assert_eq!(normalized.len(), 2);
        assert_eq!(normalized[0].reminder, Some(at(2024, 3, 1, 9, 0)));
    }
}
