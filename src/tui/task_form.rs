//! Task form for adding and editing tasks in the menu.

use anyhow::{anyhow, Result};
use chrono::NaiveDate;

use crate::dates::parse_date_input;
use crate::fields::Priority;
use crate::task::{Task, TaskEdit};
use crate::tui::input::InputField;

pub const NAME_FIELD: usize = 0;
pub const DESCRIPTION_FIELD: usize = 1;
pub const DUE_FIELD: usize = 2;
pub const PRIORITY_FIELD: usize = 3;
const FIELD_COUNT: usize = 4;

/// Form state for creating and editing tasks.
#[derive(Clone, Debug)]
pub struct TaskForm {
    pub name: InputField,
    pub description: InputField,
    pub due: InputField,
    pub priority: usize,
    pub current_field: usize,
}

impl Default for TaskForm {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskForm {
    /// Empty form: due today, medium priority.
    pub fn new() -> Self {
        let mut form = Self {
            name: InputField::new(),
            description: InputField::new(),
            due: InputField::with_value("today"),
            priority: priority_index(Priority::Medium),
            current_field: NAME_FIELD,
        };
        form.update_active_field();
        form
    }

    /// Form populated from an existing task.
    pub fn from_task(task: &Task) -> Self {
        let mut form = Self {
            name: InputField::with_value(task.name()),
            description: InputField::with_value(task.description()),
            due: InputField::with_value(&task.deadline().to_string()),
            priority: priority_index(task.priority()),
            current_field: NAME_FIELD,
        };
        form.update_active_field();
        form
    }

    pub fn selected_priority(&self) -> Priority {
        Priority::ALL[self.priority % Priority::ALL.len()]
    }

    pub fn next_field(&mut self) {
        self.current_field = (self.current_field + 1) % FIELD_COUNT;
        self.update_active_field();
    }

    pub fn prev_field(&mut self) {
        self.current_field = (self.current_field + FIELD_COUNT - 1) % FIELD_COUNT;
        self.update_active_field();
    }

    fn update_active_field(&mut self) {
        let current = self.current_field;
        self.name.active = current == NAME_FIELD;
        self.description.active = current == DESCRIPTION_FIELD;
        self.due.active = current == DUE_FIELD;
    }

    /// Text field under the cursor; `None` on the priority selector.
    pub fn active_input_mut(&mut self) -> Option<&mut InputField> {
        match self.current_field {
            NAME_FIELD => Some(&mut self.name),
            DESCRIPTION_FIELD => Some(&mut self.description),
            DUE_FIELD => Some(&mut self.due),
            _ => None,
        }
    }

    pub fn handle_char(&mut self, c: char) {
        if let Some(field) = self.active_input_mut() {
            field.handle_char(c);
        }
    }

    pub fn handle_backspace(&mut self) {
        if let Some(field) = self.active_input_mut() {
            field.handle_backspace();
        }
    }

    pub fn handle_delete(&mut self) {
        if let Some(field) = self.active_input_mut() {
            field.handle_delete();
        }
    }

    /// Move the cursor, or cycle the priority when the selector is focused.
    pub fn handle_left_right(&mut self, right: bool) {
        let count = Priority::ALL.len();
        match self.active_input_mut() {
            Some(field) if right => field.move_cursor_right(),
            Some(field) => field.move_cursor_left(),
            None if right => self.priority = (self.priority + 1) % count,
            None => self.priority = (self.priority + count - 1) % count,
        }
    }

    fn deadline(&self, today: NaiveDate) -> Result<NaiveDate> {
        let input = self.due.value.trim();
        parse_date_input(input, today).ok_or_else(|| anyhow!("incorrect date '{input}'"))
    }

    /// Build a new task from the form.
    pub fn to_new_task(&self, today: NaiveDate) -> Result<Task> {
        let task = Task::create(
            self.name.value.trim(),
            self.description.value.trim(),
            self.deadline(today)?,
            self.selected_priority(),
            today,
        )?;
        Ok(task)
    }

    /// Collect the fields that differ from `original`.
    pub fn to_edit(&self, original: &Task, today: NaiveDate) -> Result<TaskEdit> {
        let name = self.name.value.trim();
        let description = self.description.value.trim();
        let deadline = self.deadline(today)?;
        let priority = self.selected_priority();
        Ok(TaskEdit {
            name: (name != original.name()).then(|| name.to_string()),
            description: (description != original.description()).then(|| description.to_string()),
            deadline: (deadline != original.deadline()).then_some(deadline),
            priority: (priority != original.priority()).then_some(priority),
        })
    }
}

fn priority_index(priority: Priority) -> usize {
    Priority::ALL
        .iter()
        .position(|&p| p == priority)
        .unwrap_or(0)
}
