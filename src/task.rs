//! Task data structure and its validation rules.
//!
//! A `Task` is a single dated work item. Its name and deadline are validated when
//! it is created or edited; once stored, the task is only replaced as a whole, never
//! mutated while it sits in a deadline bucket.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::TaskError;
use crate::fields::*;

/// Identifier generated once per task. Lookups, removal and equality go through it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(Uuid);

impl TaskId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for TaskId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// A dated work item with a priority and a lifecycle status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    name: String,
    description: String,
    creation_date: NaiveDate,
    deadline: NaiveDate,
    status: Status,
    priority: Priority,
}

/// Field overrides for editing a task. `None` keeps the old value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskEdit {
    pub name: Option<String>,
    pub description: Option<String>,
    pub deadline: Option<NaiveDate>,
    pub priority: Option<Priority>,
}

impl TaskEdit {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.deadline.is_none()
            && self.priority.is_none()
    }
}

impl Task {
    /// Create a new open task. The creation date is `today` and the deadline may not
    /// lie before it.
    pub fn create(
        name: impl Into<String>,
        description: impl Into<String>,
        deadline: NaiveDate,
        priority: Priority,
        today: NaiveDate,
    ) -> Result<Self, TaskError> {
        let name = name.into();
        let description = description.into();
        validate_name(&name)?;
        validate_text("description", &description)?;
        validate_deadline(deadline, today)?;
        Ok(Task {
            id: TaskId::new(),
            name,
            description,
            creation_date: today,
            deadline,
            status: Status::Todo,
            priority,
        })
    }

    /// Rebuild a task read back from storage. Only the text rules apply here; a
    /// stored deadline may legitimately be in the past.
    pub fn restore(
        name: impl Into<String>,
        description: impl Into<String>,
        creation_date: NaiveDate,
        deadline: NaiveDate,
        status: Status,
        priority: Priority,
    ) -> Result<Self, TaskError> {
        let task = Task {
            id: TaskId::new(),
            name: name.into(),
            description: description.into(),
            creation_date,
            deadline,
            status,
            priority,
        };
        task.check()?;
        Ok(task)
    }

    /// Re-check the invariants that hold for every stored task.
    pub fn check(&self) -> Result<(), TaskError> {
        validate_name(&self.name)?;
        validate_text("description", &self.description)
    }

    /// Build the replacement for this task with `edit` applied. Id, creation date
    /// and status carry over. The deadline rule only applies when the edit sets one.
    pub fn apply_edit(&self, edit: &TaskEdit, today: NaiveDate) -> Result<Task, TaskError> {
        let mut next = self.clone();
        if let Some(name) = &edit.name {
            validate_name(name)?;
            next.name = name.clone();
        }
        if let Some(description) = &edit.description {
            validate_text("description", description)?;
            next.description = description.clone();
        }
        if let Some(deadline) = edit.deadline {
            validate_deadline(deadline, today)?;
            next.deadline = deadline;
        }
        if let Some(priority) = edit.priority {
            next.priority = priority;
        }
        Ok(next)
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn creation_date(&self) -> NaiveDate {
        self.creation_date
    }

    pub fn deadline(&self) -> NaiveDate {
        self.deadline
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub(crate) fn set_status(&mut self, status: Status) {
        self.status = status;
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Name: {} | Description: {} | Deadline: {} | Status: {} | Priority: {}",
            self.name, self.description, self.deadline, self.status, self.priority
        )
    }
}

fn validate_name(name: &str) -> Result<(), TaskError> {
    if name.is_empty() {
        return Err(TaskError::EmptyName);
    }
    validate_text("name", name)
}

fn validate_text(field: &'static str, value: &str) -> Result<(), TaskError> {
    if value.contains(&[';', '\n', '\r'][..]) {
        return Err(TaskError::ForbiddenCharacter { field });
    }
    Ok(())
}

fn validate_deadline(deadline: NaiveDate, today: NaiveDate) -> Result<(), TaskError> {
    if deadline < today {
        return Err(TaskError::DeadlineInPast { deadline, today });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    #[test]
    fn test_create_forces_todo_and_today() {
        let t = Task::create("Pay bills", "", day(11), Priority::High, day(10)).unwrap();
        assert_eq!(t.status(), Status::Todo);
        assert_eq!(t.creation_date(), day(10));
        assert_eq!(t.deadline(), day(11));
    }

    #[test]
    fn test_create_rejects_empty_name() {
        let err = Task::create("", "x", day(11), Priority::Low, day(10)).unwrap_err();
        assert_eq!(err, TaskError::EmptyName);
    }

    #[test]
    fn test_create_rejects_past_deadline_but_allows_today() {
        let err = Task::create("a", "", day(9), Priority::Low, day(10)).unwrap_err();
        assert_eq!(
            err,
            TaskError::DeadlineInPast {
                deadline: day(9),
                today: day(10)
            }
        );
        assert!(Task::create("a", "", day(10), Priority::Low, day(10)).is_ok());
    }

    #[test]
    fn test_separator_not_allowed_in_text() {
        let err = Task::create("a;b", "", day(10), Priority::Low, day(10)).unwrap_err();
        assert_eq!(err, TaskError::ForbiddenCharacter { field: "name" });
        let err = Task::create("a", "line\nbreak", day(10), Priority::Low, day(10)).unwrap_err();
        assert_eq!(err, TaskError::ForbiddenCharacter { field: "description" });
    }

    #[test]
    fn test_restore_allows_past_deadline() {
        let t = Task::restore("old", "", day(1), day(2), Status::Failed, Priority::Urgent).unwrap();
        assert_eq!(t.deadline(), day(2));
        assert_eq!(t.status(), Status::Failed);
        assert!(Task::restore("", "", day(1), day(2), Status::Todo, Priority::Low).is_err());
    }

    #[test]
    fn test_apply_edit_keeps_identity() {
        let t = Task::create("Call dentist", "teeth", day(12), Priority::Low, day(10)).unwrap();
        let edit = TaskEdit {
            priority: Some(Priority::High),
            ..TaskEdit::default()
        };
        let next = t.apply_edit(&edit, day(10)).unwrap();
        assert_eq!(next.id(), t.id());
        assert_eq!(next.creation_date(), t.creation_date());
        assert_eq!(next.name(), "Call dentist");
        assert_eq!(next.description(), "teeth");
        assert_eq!(next.priority(), Priority::High);
    }

    #[test]
    fn test_apply_edit_validates_overrides() {
        let t = Task::create("a", "", day(12), Priority::Low, day(10)).unwrap();
        let empty_name = TaskEdit {
            name: Some(String::new()),
            ..TaskEdit::default()
        };
        assert_eq!(t.apply_edit(&empty_name, day(10)), Err(TaskError::EmptyName));

        let past = TaskEdit {
            deadline: Some(day(9)),
            ..TaskEdit::default()
        };
        assert!(t.apply_edit(&past, day(10)).is_err());

        // An unchanged deadline is not re-checked, even once it has passed.
        assert!(t.apply_edit(&TaskEdit::default(), day(20)).is_ok());
    }

    #[test]
    fn test_ids_are_unique() {
        let a = Task::create("same", "", day(12), Priority::Low, day(10)).unwrap();
        let b = Task::create("same", "", day(12), Priority::Low, day(10)).unwrap();
        assert_ne!(a.id(), b.id());
        assert_ne!(a, b);
        assert_eq!(a.id().to_string().parse::<TaskId>().unwrap(), a.id());
    }
}
