//! In-memory task store.
//!
//! The `Database` keeps active tasks grouped by deadline, each day's bucket ordered
//! by descending priority, together with the history of finished tasks and the
//! aggregate counters. It knows nothing about files; see `storage` for that.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::TaskError;
use crate::task::{Task, TaskId};

/// Aggregate counters kept alongside the tasks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
    pub created: u64,
    pub completed: u64,
    pub failed: u64,
}

impl fmt::Display for Statistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Statistics")?;
        writeln!(f, "Number of all created tasks: {}", self.created)?;
        writeln!(f, "Number of completed tasks: {}", self.completed)?;
        write!(f, "Number of failed tasks: {}", self.failed)
    }
}

/// Date-grouped, priority-ordered task store with history and statistics.
#[derive(Debug, Default, Clone)]
pub struct Database {
    tasks: BTreeMap<NaiveDate, Vec<Task>>,
    history: Vec<Task>,
    stats: Statistics,
}

impl Database {
    /// Add a newly created task and count it.
    pub fn add_task(&mut self, task: Task) {
        self.insert(task);
        self.stats.created += 1;
    }

    /// Place a task in its deadline bucket without touching the counters.
    ///
    /// Used when replaying stored tasks and when swapping in an edited task.
    pub(crate) fn insert(&mut self, task: Task) {
        let bucket = self.tasks.entry(task.deadline()).or_default();
        bucket.push(task);
        // Stable sort keeps insertion order among equal priorities.
        bucket.sort_by(|a, b| b.priority().cmp(&a.priority()));
    }

    /// Remove the task with `id` from the bucket for `date`.
    pub fn remove_task(&mut self, date: NaiveDate, id: TaskId) -> Result<Task, TaskError> {
        let bucket = self.tasks.get_mut(&date).ok_or(TaskError::NotFound(id))?;
        let pos = bucket
            .iter()
            .position(|t| t.id() == id)
            .ok_or(TaskError::NotFound(id))?;
        let task = bucket.remove(pos);
        if bucket.is_empty() {
            self.tasks.remove(&date);
        }
        Ok(task)
    }

    /// Remove and return the first (highest priority) task scheduled for `date`.
    pub(crate) fn pop_first(&mut self, date: NaiveDate) -> Result<Task, TaskError> {
        let bucket = self
            .tasks
            .get_mut(&date)
            .filter(|b| !b.is_empty())
            .ok_or(TaskError::EmptyBucket(date))?;
        let task = bucket.remove(0);
        if bucket.is_empty() {
            self.tasks.remove(&date);
        }
        Ok(task)
    }

    /// The ordered bucket for `date`; empty when nothing is scheduled.
    pub fn find_tasks_by_date(&self, date: NaiveDate) -> &[Task] {
        self.tasks.get(&date).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Case-insensitive substring search over task names, in deadline then
    /// priority order. An empty query matches every task.
    pub fn find_tasks_by_name(&self, query: &str) -> Vec<&Task> {
        let needle = query.to_lowercase();
        self.all_tasks()
            .filter(|t| t.name().to_lowercase().contains(&needle))
            .collect()
    }

    /// Positional lookup into the bucket for `date`.
    pub fn get(&self, date: NaiveDate, index: usize) -> Result<&Task, TaskError> {
        let bucket = self.find_tasks_by_date(date);
        bucket.get(index).ok_or(TaskError::IndexOutOfRange {
            date,
            index,
            len: bucket.len(),
        })
    }

    /// Find an active task by id.
    pub fn locate(&self, id: TaskId) -> Option<&Task> {
        self.all_tasks().find(|t| t.id() == id)
    }

    /// All active tasks grouped by deadline.
    pub fn tasks(&self) -> &BTreeMap<NaiveDate, Vec<Task>> {
        &self.tasks
    }

    /// All active tasks flattened in store order.
    pub fn all_tasks(&self) -> impl Iterator<Item = &Task> + '_ {
        self.tasks.values().flatten()
    }

    pub fn task_count(&self) -> usize {
        self.tasks.values().map(Vec::len).sum()
    }

    /// Deadlines strictly before `today` that still hold tasks.
    pub fn overdue_dates(&self, today: NaiveDate) -> Vec<NaiveDate> {
        self.tasks.range(..today).map(|(date, _)| *date).collect()
    }

    pub fn add_to_history(&mut self, task: Task) {
        self.history.push(task);
    }

    pub fn history(&self) -> &[Task] {
        &self.history
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    pub fn statistics(&self) -> Statistics {
        self.stats
    }

    /// Overwrite the counters, e.g. with the values read back from storage.
    pub fn set_statistics(&mut self, stats: Statistics) {
        self.stats = stats;
    }

    pub(crate) fn record_completed(&mut self) {
        self.stats.completed += 1;
    }

    pub(crate) fn record_failed(&mut self) {
        self.stats.failed += 1;
    }

    /// Reset all counters to zero. Tasks and history are left alone.
    pub fn clear_statistics(&mut self) {
        self.stats = Statistics::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::Priority;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, d).unwrap()
    }

    fn task(name: &str, deadline: NaiveDate, priority: Priority) -> Task {
        Task::create(name, "", deadline, priority, day(1)).unwrap()
    }

    fn names(tasks: &[Task]) -> Vec<&str> {
        tasks.iter().map(Task::name).collect()
    }

    #[test]
    fn test_bucket_sorted_by_descending_priority() {
        let mut db = Database::default();
        db.add_task(task("low", day(3), Priority::Low));
        db.add_task(task("urgent", day(3), Priority::Urgent));
        db.add_task(task("medium", day(3), Priority::Medium));
        db.add_task(task("high", day(3), Priority::High));
        assert_eq!(
            names(db.find_tasks_by_date(day(3))),
            vec!["urgent", "high", "medium", "low"]
        );
        assert_eq!(db.statistics().created, 4);
    }

    #[test]
    fn test_equal_priorities_keep_insertion_order() {
        let mut db = Database::default();
        db.add_task(task("first", day(3), Priority::Medium));
        db.add_task(task("second", day(3), Priority::Medium));
        db.add_task(task("top", day(3), Priority::High));
        db.add_task(task("third", day(3), Priority::Medium));
        assert_eq!(
            names(db.find_tasks_by_date(day(3))),
            vec!["top", "first", "second", "third"]
        );
    }

    #[test]
    fn test_insert_does_not_count() {
        let mut db = Database::default();
        db.insert(task("a", day(3), Priority::Low));
        assert_eq!(db.statistics(), Statistics::default());
        assert_eq!(db.task_count(), 1);
    }

    #[test]
    fn test_buckets_iterate_in_date_order() {
        let mut db = Database::default();
        db.add_task(task("later", day(9), Priority::Urgent));
        db.add_task(task("sooner", day(2), Priority::Low));
        let all: Vec<_> = db.all_tasks().map(Task::name).collect();
        assert_eq!(all, vec!["sooner", "later"]);
    }

    #[test]
    fn test_remove_by_id_and_prune_bucket() {
        let mut db = Database::default();
        let a = task("twin", day(3), Priority::Low);
        let b = task("twin", day(3), Priority::Low);
        let b_id = b.id();
        db.add_task(a.clone());
        db.add_task(b);

        let removed = db.remove_task(day(3), b_id).unwrap();
        assert_eq!(removed.id(), b_id);
        assert_eq!(db.find_tasks_by_date(day(3)), &[a.clone()]);

        db.remove_task(day(3), a.id()).unwrap();
        assert!(db.tasks().is_empty());
        assert_eq!(db.remove_task(day(3), a.id()), Err(TaskError::NotFound(a.id())));
    }

    #[test]
    fn test_find_by_date_missing_is_empty() {
        let db = Database::default();
        assert!(db.find_tasks_by_date(day(4)).is_empty());
    }

    #[test]
    fn test_find_by_name_is_case_insensitive() {
        let mut db = Database::default();
        db.add_task(task("Pay bills", day(4), Priority::Low));
        db.add_task(task("Call dentist", day(2), Priority::Low));
        db.add_task(task("pay rent", day(2), Priority::High));

        let found: Vec<_> = db.find_tasks_by_name("PAY").into_iter().map(Task::name).collect();
        assert_eq!(found, vec!["pay rent", "Pay bills"]);
        assert_eq!(db.find_tasks_by_name("").len(), 3);
        assert!(db.find_tasks_by_name("gym").is_empty());
    }

    #[test]
    fn test_get_by_index() {
        let mut db = Database::default();
        db.add_task(task("only", day(4), Priority::Low));
        assert_eq!(db.get(day(4), 0).unwrap().name(), "only");
        assert_eq!(
            db.get(day(4), 1),
            Err(TaskError::IndexOutOfRange {
                date: day(4),
                index: 1,
                len: 1
            })
        );
        assert!(db.get(day(5), 0).is_err());
    }

    #[test]
    fn test_pop_first_on_empty_bucket() {
        let mut db = Database::default();
        assert_eq!(db.pop_first(day(4)), Err(TaskError::EmptyBucket(day(4))));
    }

    #[test]
    fn test_overdue_dates() {
        let mut db = Database::default();
        db.insert(Task::restore("old", "", day(1), day(2), crate::fields::Status::Todo, Priority::Low).unwrap());
        db.add_task(task("today", day(4), Priority::Low));
        db.add_task(task("later", day(6), Priority::Low));
        assert_eq!(db.overdue_dates(day(4)), vec![day(2)]);
    }

    #[test]
    fn test_clear_statistics_keeps_tasks_and_history() {
        let mut db = Database::default();
        db.add_task(task("a", day(4), Priority::Low));
        db.add_to_history(task("b", day(4), Priority::Low));
        db.record_completed();
        db.record_failed();
        db.clear_statistics();
        assert_eq!(db.statistics(), Statistics::default());
        assert_eq!(db.task_count(), 1);
        assert_eq!(db.history().len(), 1);

        db.clear_history();
        assert!(db.history().is_empty());
        assert_eq!(db.task_count(), 1);
    }

    #[test]
    fn test_statistics_summary() {
        let stats = Statistics {
            created: 3,
            completed: 1,
            failed: 2,
        };
        assert_eq!(
            stats.to_string(),
            "Statistics\nNumber of all created tasks: 3\nNumber of completed tasks: 1\nNumber of failed tasks: 2"
        );
    }
}
