//! Pure functions that derive views out of a task collection
//!
//! None of them mutates its input, and they all keep the order of the collection. Callers re-derive their views
//! whenever the collection, the selected date or the search query changes.

use chrono::{Local, NaiveDate, TimeZone};

use crate::task::{DueDate, Task};

/// Whether `due` falls on the calendar day `day`, as seen from timezone `tz`
pub fn is_same_day<Tz: TimeZone>(due: &DueDate, day: NaiveDate, tz: &Tz) -> bool {
    due.day_in(tz) == day
}

/// Tasks due on `day`, in the local timezone
pub fn tasks_due_on(tasks: &[Task], day: NaiveDate) -> Vec<&Task> {
    tasks_due_on_in(tasks, day, &Local)
}

/// Tasks due on `day`, as seen from timezone `tz`
pub fn tasks_due_on_in<'a, Tz: TimeZone>(tasks: &'a [Task], day: NaiveDate, tz: &Tz) -> Vec<&'a Task> {
    tasks.iter()
        .filter(|task| is_same_day(task.duedate(), day, tz))
        .collect()
}

/// Tasks whose title contains `query`, ignoring case. An empty query matches every task
pub fn tasks_matching<'a>(tasks: &'a [Task], query: &str) -> Vec<&'a Task> {
    let needle = query.to_lowercase();
    tasks.iter()
        .filter(|task| task.title().to_lowercase().contains(&needle))
        .collect()
}

/// A plain `month/day/year` rendering of a day
pub fn format_date(day: NaiveDate) -> String {
    day.format("%-m/%-d/%Y").to_string()
}

/// `"Today"`, `"Tomorrow"` or a plain date, depending on how far `due` is from `today`
pub fn format_relative_due_date(due: NaiveDate, today: NaiveDate) -> String {
    if due == today {
        String::from("Today")
    } else if Some(due) == today.succ_opt() {
        String::from("Tomorrow")
    } else {
        format_date(due)
    }
}

/// Same as [`format_relative_due_date`], relative to the current local day
pub fn format_relative_due_date_now(due: &DueDate) -> String {
    format_relative_due_date(due.local_day(), Local::now().date_naive())
}
