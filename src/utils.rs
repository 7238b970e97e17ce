//! Some utility functions

use crate::view::{ShellView, TaskRow};

/// A debug utility that pretty-prints a task row
pub fn print_task(row: &TaskRow) {
    let completion = if row.completed { "✓" } else { " " };
    println!("    {} {}\t({})\t{}", completion, row.title, row.due_label, row.id);
}

/// A debug utility that pretty-prints the main screen
pub fn print_shell_view(view: &ShellView) {
    println!("Due on {}", view.selected_date);
    match view.empty_due_message() {
        Some(message) => println!("    {}", message),
        None => view.due_on_selected.iter().for_each(print_task),
    }

    if view.search_query.is_empty() {
        println!("All tasks");
    } else {
        println!("Tasks matching {:?}", view.search_query);
    }
    view.matching_search.iter().for_each(print_task);
}
