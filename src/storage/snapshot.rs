//! Whole-store snapshot format.
//!
//! The store is serialized in one piece, task ids included. Decoding never trusts
//! the file's bucket layout: every task is re-validated and placed through the
//! store's own insert path.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{write_atomically, FileManager};
use crate::db::{Database, Statistics};
use crate::error::StorageError;
use crate::task::Task;

const SNAPSHOT_VERSION: u32 = 1;

/// Snapshot database stored at a fixed path.
#[derive(Debug, Clone)]
pub struct SnapshotFileManager {
    path: PathBuf,
}

impl SnapshotFileManager {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl FileManager for SnapshotFileManager {
    fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Database, StorageError> {
        let file = File::open(&self.path).map_err(|source| StorageError::Read {
            path: self.path.clone(),
            source,
        })?;
        decode(BufReader::new(file))
    }

    fn save(&self, db: &Database) -> Result<(), StorageError> {
        write_atomically(&self.path, |w| encode(db, w).map_err(Into::into))
    }
}

#[derive(Serialize)]
struct SnapshotRef<'a> {
    version: u32,
    tasks: Vec<&'a Task>,
    history: &'a [Task],
    statistics: Statistics,
}

#[derive(Deserialize)]
struct Snapshot {
    version: u32,
    tasks: Vec<Task>,
    history: Vec<Task>,
    statistics: Statistics,
}

pub fn encode<W: Write>(db: &Database, w: W) -> Result<(), serde_json::Error> {
    let snapshot = SnapshotRef {
        version: SNAPSHOT_VERSION,
        tasks: db.all_tasks().collect(),
        history: db.history(),
        statistics: db.statistics(),
    };
    serde_json::to_writer(w, &snapshot)
}

pub fn decode<R: Read>(reader: R) -> Result<Database, StorageError> {
    let snapshot: Snapshot = serde_json::from_reader(reader).map_err(StorageError::Snapshot)?;
    if snapshot.version != SNAPSHOT_VERSION {
        return Err(StorageError::UnsupportedVersion(snapshot.version));
    }

    let mut db = Database::default();
    let mut seen = HashSet::new();
    for (idx, task) in snapshot.tasks.into_iter().enumerate() {
        let invalid = |reason: String| StorageError::InvalidRecord {
            section: "task",
            index: idx + 1,
            reason,
        };
        task.check().map_err(|e| invalid(e.to_string()))?;
        if task.status().is_terminal() {
            return Err(invalid(format!("active task has status {}", task.status())));
        }
        if !seen.insert(task.id()) {
            return Err(invalid(format!("duplicate id {}", task.id())));
        }
        db.insert(task);
    }
    for (idx, task) in snapshot.history.into_iter().enumerate() {
        task.check().map_err(|e| StorageError::InvalidRecord {
            section: "history",
            index: idx + 1,
            reason: e.to_string(),
        })?;
        db.add_to_history(task);
    }
    db.set_statistics(snapshot.statistics);
    Ok(db)
}
