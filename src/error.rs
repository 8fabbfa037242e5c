//! Error types for the task store, its lifecycle operations and persistence.

use std::path::PathBuf;

use chrono::NaiveDate;

use crate::fields::Status;
use crate::task::TaskId;

/// Validation and lookup failures raised by tasks, the store and the service.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TaskError {
    /// A task was given an empty name.
    #[error("task name cannot be empty")]
    EmptyName,

    /// A text field contains the record separator or a line break.
    #[error("task {field} cannot contain ';' or line breaks")]
    ForbiddenCharacter { field: &'static str },

    /// A deadline was set to a day that has already passed.
    #[error("deadline {deadline} must not be before {today}")]
    DeadlineInPast { deadline: NaiveDate, today: NaiveDate },

    /// No active task carries this id.
    #[error("task {0} not found")]
    NotFound(TaskId),

    /// Positional lookup outside the bucket for a date.
    #[error("no task number {} on {date} ({len} task(s) scheduled)", .index + 1)]
    IndexOutOfRange {
        date: NaiveDate,
        index: usize,
        len: usize,
    },

    /// The bucket for a date holds no tasks.
    #[error("no tasks scheduled for {0}")]
    EmptyBucket(NaiveDate),

    /// DONE and FAILED are final; such a task cannot be completed or failed again.
    #[error("task {id} is already {status}")]
    AlreadyFinished { id: TaskId, status: Status },
}

/// An unknown status or priority token.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[error("unknown {kind} '{token}'")]
pub struct ParseTokenError {
    pub kind: &'static str,
    pub token: String,
}

impl ParseTokenError {
    pub fn new(kind: &'static str, token: &str) -> Self {
        Self {
            kind,
            token: token.to_string(),
        }
    }
}

/// Failures while reading or writing a database file.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("error while reading data from {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("error while writing data to {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A record could not be decoded. `line` is 1-based.
    #[error("incorrect data in line {line}: {reason}")]
    Malformed { line: usize, reason: String },

    #[error("snapshot could not be decoded: {0}")]
    Snapshot(#[source] serde_json::Error),

    #[error("unsupported snapshot version {0}")]
    UnsupportedVersion(u32),

    /// A snapshot record failed validation. `index` is 1-based within `section`.
    #[error("invalid {section} record #{index}: {reason}")]
    InvalidRecord {
        section: &'static str,
        index: usize,
        reason: String,
    },
}

impl StorageError {
    pub fn malformed(line: usize, reason: impl ToString) -> Self {
        StorageError::Malformed {
            line,
            reason: reason.to_string(),
        }
    }

    /// True when the underlying file does not exist yet.
    pub fn is_missing_file(&self) -> bool {
        matches!(
            self,
            StorageError::Read { source, .. } if source.kind() == std::io::ErrorKind::NotFound
        )
    }
}
