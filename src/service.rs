//! Task lifecycle operations on top of the store.
//!
//! `TaskService` is the only place that moves tasks between the active buckets and
//! the history, and the only place that bumps the completion and failure counters.
//! Each transition happens inside a single `&mut self` call, so a task is never seen
//! missing from both the buckets and the history, nor present in both.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::db::{Database, Statistics};
use crate::error::TaskError;
use crate::fields::Status;
use crate::task::{Task, TaskEdit, TaskId};

pub struct TaskService {
    db: Database,
}

impl TaskService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Hand the store back, typically to save it.
    pub fn into_database(self) -> Database {
        self.db
    }

    pub fn tasks(&self) -> &BTreeMap<NaiveDate, Vec<Task>> {
        self.db.tasks()
    }

    /// Store a new task. The store owns the creation counter.
    pub fn add_task(&mut self, task: Task) {
        debug!(id = %task.id(), deadline = %task.deadline(), "adding task");
        self.db.add_task(task);
    }

    /// Complete an active task and move it to the history.
    pub fn end_task(&mut self, id: TaskId) -> Result<Task, TaskError> {
        self.retire(id, Status::Done)
    }

    /// Fail an active task and move it to the history.
    pub fn fail_task(&mut self, id: TaskId) -> Result<Task, TaskError> {
        self.retire(id, Status::Failed)
    }

    /// Complete the highest priority task due on `date`.
    pub fn end_and_return_first_task(&mut self, date: NaiveDate) -> Result<Task, TaskError> {
        if let Some(first) = self.db.find_tasks_by_date(date).first() {
            ensure_open(first)?;
        }
        let task = self.db.pop_first(date)?;
        Ok(self.finish(task, Status::Done))
    }

    /// Replace a task with an edited copy. Validation happens before the store is
    /// touched; the replacement is not counted as a new task.
    pub fn edit_task(
        &mut self,
        id: TaskId,
        edit: &TaskEdit,
        today: NaiveDate,
    ) -> Result<Task, TaskError> {
        let old = self.db.locate(id).ok_or(TaskError::NotFound(id))?;
        let replacement = old.apply_edit(edit, today)?;
        let deadline = old.deadline();
        self.db.remove_task(deadline, id)?;
        debug!(%id, from = %deadline, to = %replacement.deadline(), "editing task");
        self.db.insert(replacement.clone());
        Ok(replacement)
    }

    /// Delete a task outright: no history entry, no counter change.
    pub fn remove_task(&mut self, id: TaskId) -> Result<Task, TaskError> {
        let deadline = self
            .db
            .locate(id)
            .map(Task::deadline)
            .ok_or(TaskError::NotFound(id))?;
        let task = self.db.remove_task(deadline, id)?;
        debug!(%id, "removed task");
        Ok(task)
    }

    pub fn get_task_by_date_and_index(
        &self,
        date: NaiveDate,
        index: usize,
    ) -> Result<&Task, TaskError> {
        self.db.get(date, index)
    }

    pub fn find_tasks_by_date(&self, date: NaiveDate) -> &[Task] {
        self.db.find_tasks_by_date(date)
    }

    pub fn find_tasks_by_name(&self, query: &str) -> Vec<&Task> {
        self.db.find_tasks_by_name(query)
    }

    pub fn get_statistics(&self) -> Statistics {
        self.db.statistics()
    }

    pub fn clear_statistics(&mut self) {
        self.db.clear_statistics();
    }

    pub fn history(&self) -> &[Task] {
        self.db.history()
    }

    pub fn clear_history(&mut self) {
        self.db.clear_history();
    }

    /// Fail every TODO task whose deadline is strictly before `today`. Tasks that
    /// are already DONE or FAILED are left where they are.
    ///
    /// Returns the failed tasks in deadline then priority order.
    pub fn sweep_overdue(&mut self, today: NaiveDate) -> Vec<Task> {
        let mut failed = Vec::new();
        for date in self.db.overdue_dates(today) {
            let open: Vec<TaskId> = self
                .db
                .find_tasks_by_date(date)
                .iter()
                .filter(|t| t.status() == Status::Todo)
                .map(Task::id)
                .collect();
            for id in open {
                if let Ok(task) = self.db.remove_task(date, id) {
                    info!(name = task.name(), deadline = %date, "deadline passed, failing task");
                    failed.push(self.finish(task, Status::Failed));
                }
            }
        }
        failed
    }

    fn retire(&mut self, id: TaskId, status: Status) -> Result<Task, TaskError> {
        let current = self.db.locate(id).ok_or(TaskError::NotFound(id))?;
        ensure_open(current)?;
        let deadline = current.deadline();
        let task = self.db.remove_task(deadline, id)?;
        Ok(self.finish(task, status))
    }

    fn finish(&mut self, mut task: Task, status: Status) -> Task {
        debug_assert!(status.is_terminal());
        task.set_status(status);
        match status {
            Status::Failed => self.db.record_failed(),
            _ => self.db.record_completed(),
        }
        debug!(id = %task.id(), %status, "task moved to history");
        self.db.add_to_history(task.clone());
        task
    }
}

fn ensure_open(task: &Task) -> Result<(), TaskError> {
    if task.status().is_terminal() {
        return Err(TaskError::AlreadyFinished {
            id: task.id(),
            status: task.status(),
        });
    }
    Ok(())
}
