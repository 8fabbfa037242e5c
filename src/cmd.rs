//! Command implementations for the CLI interface.
//!
//! This module contains the subcommands and their handlers. Handlers work on a
//! `TaskService` that `main` has already loaded; saving happens once afterwards.

use anyhow::{anyhow, bail, Result};
use chrono::NaiveDate;
use clap::{CommandFactory, Subcommand};
use clap_complete::{generate, Shell};

use crate::cli::Cli;
use crate::dates::{format_relative, parse_date_input};
use crate::fields::*;
use crate::service::TaskService;
use crate::task::{Task, TaskEdit};
use crate::tui::run::run_tui;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Open the interactive menu (default when no command is given).
    Menu,

    /// Print today's tasks.
    Today,

    /// Print tomorrow's tasks.
    Tomorrow,

    /// Add a new task.
    Add {
        /// Task name.
        name: String,
        /// Optional longer description.
        #[arg(long, default_value = "")]
        desc: String,
        /// Deadline: YYYY-MM-DD, "today", "tomorrow", "in Nd", "friday", ...
        #[arg(long)]
        due: String,
        /// Priority: low | medium | high | urgent (or 1-4).
        #[arg(long, value_enum, default_value_t = Priority::Medium)]
        priority: Priority,
    },

    /// Print all tasks grouped by deadline.
    List,

    /// Print the tasks due on a date.
    Date {
        date: String,
    },

    /// Find tasks whose name contains the query (case-insensitive).
    Find {
        query: String,
    },

    /// Complete a task. Without a number, completes the top task of the day.
    Done {
        /// Task number as shown in the listing for the date.
        number: Option<usize>,
        /// Day the task is due.
        #[arg(long, default_value = "today")]
        date: String,
    },

    /// Edit fields of a task.
    Edit {
        /// Day the task is due.
        date: String,
        /// Task number as shown in the listing for the date.
        number: usize,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        desc: Option<String>,
        /// New deadline.
        #[arg(long)]
        due: Option<String>,
        #[arg(long, value_enum)]
        priority: Option<Priority>,
    },

    /// Delete a task without recording it in the history.
    Delete {
        /// Day the task is due.
        date: String,
        /// Task number as shown in the listing for the date.
        number: usize,
    },

    /// Show task statistics.
    Stats,

    /// Reset all statistics to zero.
    ClearStats,

    /// Show completed and failed tasks.
    History,

    /// Delete the task history.
    ClearHistory,

    /// Generate shell completion scripts.
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Launch the interactive menu.
pub fn cmd_menu(svc: &mut TaskService, today: NaiveDate) -> Result<()> {
    run_tui(svc, today)?;
    Ok(())
}

/// Print the tasks due on `date`, numbered.
pub fn cmd_show_date(svc: &TaskService, date: NaiveDate, today: NaiveDate) {
    println!("Tasks of {date} ({})", format_relative(date, today));
    let tasks = svc.find_tasks_by_date(date);
    if tasks.is_empty() {
        println!("No tasks found.");
    } else {
        print_numbered(tasks);
    }
}

/// Add a new task to the store.
pub fn cmd_add(
    svc: &mut TaskService,
    today: NaiveDate,
    name: String,
    desc: String,
    due: &str,
    priority: Priority,
) -> Result<()> {
    let deadline = parse_date(due, today)?;
    let task = Task::create(name, desc, deadline, priority, today)?;
    println!("Task \"{}\" added for {}.", task.name(), task.deadline());
    svc.add_task(task);
    Ok(())
}

/// Print every active task grouped by deadline.
pub fn cmd_list(svc: &TaskService, today: NaiveDate) {
    if svc.tasks().is_empty() {
        println!("The task list is empty.");
        return;
    }
    for (date, tasks) in svc.tasks() {
        println!("{date} ({})", format_relative(*date, today));
        print_numbered(tasks);
        println!();
    }
}

/// Search tasks by name.
pub fn cmd_find(svc: &TaskService, query: &str, today: NaiveDate) {
    let found = svc.find_tasks_by_name(query);
    if found.is_empty() {
        println!("No tasks found.");
    } else {
        print_table(&found, today);
    }
}

/// Complete a task, or the top task of the day when no number is given.
pub fn cmd_done(
    svc: &mut TaskService,
    today: NaiveDate,
    date: &str,
    number: Option<usize>,
) -> Result<()> {
    let date = parse_date(date, today)?;
    let task = match number {
        None => svc.end_and_return_first_task(date)?,
        Some(n) => {
            let id = svc.get_task_by_date_and_index(date, to_index(n)?)?.id();
            svc.end_task(id)?
        }
    };
    println!("The task \"{}\" has been completed.", task.name());
    Ok(())
}

/// Edit a task in place of the old one.
#[allow(clippy::too_many_arguments)]
pub fn cmd_edit(
    svc: &mut TaskService,
    today: NaiveDate,
    date: &str,
    number: usize,
    name: Option<String>,
    desc: Option<String>,
    due: Option<String>,
    priority: Option<Priority>,
) -> Result<()> {
    let date = parse_date(date, today)?;
    let old = svc.get_task_by_date_and_index(date, to_index(number)?)?;
    let id = old.id();
    println!("Old task data");
    println!("{old}");

    let edit = TaskEdit {
        name,
        description: desc,
        deadline: due.as_deref().map(|d| parse_date(d, today)).transpose()?,
        priority,
    };
    if edit.is_empty() {
        bail!("nothing to change; pass --name, --desc, --due or --priority");
    }
    let edited = svc.edit_task(id, &edit, today)?;
    println!("Task edited successfully.");
    println!("{edited}");
    Ok(())
}

/// Delete a task outright.
pub fn cmd_delete(svc: &mut TaskService, today: NaiveDate, date: &str, number: usize) -> Result<()> {
    let date = parse_date(date, today)?;
    let id = svc.get_task_by_date_and_index(date, to_index(number)?)?.id();
    let task = svc.remove_task(id)?;
    println!("Task \"{}\" deleted successfully.", task.name());
    Ok(())
}

pub fn cmd_stats(svc: &TaskService) {
    println!("{}", svc.get_statistics());
}

pub fn cmd_clear_stats(svc: &mut TaskService) {
    svc.clear_statistics();
    println!("Statistics cleared successfully.");
}

pub fn cmd_history(svc: &TaskService, today: NaiveDate) {
    println!("History");
    let history: Vec<&Task> = svc.history().iter().collect();
    if history.is_empty() {
        println!("No tasks found.");
    } else {
        print_table(&history, today);
    }
}

pub fn cmd_clear_history(svc: &mut TaskService) {
    svc.clear_history();
    println!("History deleted successfully.");
}

/// Generate shell completion scripts.
pub fn cmd_completions(shell: Shell) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "taskcli", &mut std::io::stdout());
}

/// Parse a date argument or fail with a readable message.
pub fn parse_date(input: &str, today: NaiveDate) -> Result<NaiveDate> {
    parse_date_input(input, today).ok_or_else(|| {
        anyhow!("incorrect date '{input}', use YYYY-MM-DD, 'today', 'tomorrow', 'in Nd' or a weekday")
    })
}

/// Convert a 1-based task number into a bucket index.
fn to_index(number: usize) -> Result<usize> {
    number
        .checked_sub(1)
        .ok_or_else(|| anyhow!("task numbers start at 1"))
}

/// Print one day's tasks with their 1-based numbers.
fn print_numbered(tasks: &[Task]) {
    println!("{:<4} {:<8} {:<32} {}", "#", "Priority", "Name", "Description");
    for (i, t) in tasks.iter().enumerate() {
        println!(
            "{:<4} {:<8} {:<32} {}",
            i + 1,
            t.priority().as_token(),
            truncate(t.name(), 32),
            t.description()
        );
    }
}

/// Print tasks across days, with deadline and status.
fn print_table(tasks: &[&Task], today: NaiveDate) {
    println!(
        "{:<12} {:<10} {:<7} {:<8} {}",
        "Deadline", "Due", "Status", "Priority", "Name"
    );
    for t in tasks {
        println!(
            "{:<12} {:<10} {:<7} {:<8} {}",
            t.deadline().to_string(),
            format_relative(t.deadline(), today),
            t.status().as_token(),
            t.priority().as_token(),
            t.name()
        );
    }
}

/// Truncate a string to a maximum width, adding ellipsis if needed.
pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(width.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}
