//! What front-ends render, and what they send back
//!
//! A front-end never touches the task collection directly. It renders a [`ShellView`] built by the
//! [`Session`](crate::session::Session) and reports user actions as [`UiEvent`]s.

use chrono::{Local, NaiveDate};

use crate::filter::format_relative_due_date;
use crate::form::CreateDraft;
use crate::task::{Task, TaskId, TaskStatus};

/// Shown in place of the "due" list when nothing is due on the selected day
pub const NO_TASKS_DUE: &str = "No tasks due today";

/// One line of a task list
#[derive(Clone, Debug, PartialEq)]
pub struct TaskRow {
    pub id: TaskId,
    pub title: String,
    pub completed: bool,
    /// How the due date is displayed
    pub due_label: String,
}

impl TaskRow {
    /// A row of the searchable list, with a relative due date ("Today", "Tomorrow"...)
    pub fn with_relative_date(task: &Task, today: NaiveDate) -> Self {
        Self::with_label(task, format_relative_due_date(task.duedate().local_day(), today))
    }

    /// A row of the "due" list, with the date part of the due date
    pub fn with_plain_date(task: &Task) -> Self {
        Self::with_label(task, task.duedate().date_part().to_string())
    }

    fn with_label(task: &Task, due_label: String) -> Self {
        Self {
            id: task.id().clone(),
            title: task.title().to_string(),
            completed: task.is_completed(),
            due_label,
        }
    }
}

/// Everything the main screen displays
#[derive(Clone, Debug, PartialEq)]
pub struct ShellView {
    pub selected_date: NaiveDate,
    pub search_query: String,
    /// Tasks due on the selected date
    pub due_on_selected: Vec<TaskRow>,
    /// Tasks matching the search query
    pub matching_search: Vec<TaskRow>,
    pub create_form: Option<CreateDraft>,
    pub edit_form: Option<Task>,
    /// Whether a form is waiting for the service
    pub submitting: bool,
}

impl ShellView {
    /// Build the view out of the tasks to display, relative to `today`
    pub fn new(
        selected_date: NaiveDate, search_query: &str,
        due_on_selected: &[&Task], matching_search: &[&Task], today: NaiveDate,
    ) -> Self {
        Self {
            selected_date,
            search_query: search_query.to_string(),
            due_on_selected: due_on_selected.iter().map(|t| TaskRow::with_plain_date(t)).collect(),
            matching_search: matching_search.iter().map(|t| TaskRow::with_relative_date(t, today)).collect(),
            create_form: None,
            edit_form: None,
            submitting: false,
        }
    }

    /// The placeholder to display instead of an empty "due" list
    pub fn empty_due_message(&self) -> Option<&'static str> {
        if self.due_on_selected.is_empty() {
            Some(NO_TASKS_DUE)
        } else {
            None
        }
    }
}

/// Today, as the local clock sees it
pub fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

/// A user action
#[derive(Clone, Debug, PartialEq)]
pub enum UiEvent {
    /// A day has been picked in the calendar
    SelectDate(NaiveDate),
    /// The search box has changed
    Search(String),

    /// The "create" button has been pressed
    ToggleCreateForm,
    SetCreateTitle(String),
    SetCreateDueDate(Option<NaiveDate>),
    SetCreateStatus(Option<TaskStatus>),
    SubmitCreate,

    /// The completion radio of a row has been clicked
    Complete(TaskId),
    /// The "edit" button of a row has been pressed
    Edit(TaskId),
    /// The "delete" button of a row has been pressed
    Delete(TaskId),

    SetEditTitle(String),
    SetEditDueDate(NaiveDate),
    SetEditStatus(TaskStatus),
    SubmitEdit,
    CancelEdit,
}


#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn rows() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let tomorrow = Task::new(TaskId::from(1), "Buy milk", "2024-05-02T10:00:00".parse().unwrap(), TaskStatus::Completed);

        let relative = TaskRow::with_relative_date(&tomorrow, today);
        assert_eq!(relative.due_label, "Tomorrow");
        assert!(relative.completed);

        let plain = TaskRow::with_plain_date(&tomorrow);
        assert_eq!(plain.due_label, "2024-05-02");
        assert_eq!(plain.title, "Buy milk");

        let later = Task::new(TaskId::from(2), "Call Bob", (today + Duration::days(10)).into(), TaskStatus::Pending);
        assert_eq!(TaskRow::with_relative_date(&later, today).due_label, "5/11/2024");
    }

    #[test]
    fn empty_due_list_placeholder() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let view = ShellView::new(today, "", &[], &[], today);
        assert_eq!(view.empty_due_message(), Some(NO_TASKS_DUE));
    }
}
