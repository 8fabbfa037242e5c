//! Reading and writing the task database file.
//!
//! Two on-disk formats are supported, each behind the `FileManager` trait: a
//! line-oriented semicolon text file and a whole-store snapshot. Both are written
//! through a temp file that is renamed over the target, so the file on disk is
//! always replaced as a whole.

pub mod csv;
pub mod snapshot;

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use tracing::{info, warn};

use crate::db::Database;
use crate::error::StorageError;

pub use self::csv::CsvFileManager;
pub use self::snapshot::SnapshotFileManager;

/// A reader/writer pair for one on-disk database format.
pub trait FileManager {
    /// Location of the database file.
    fn path(&self) -> &Path;

    /// Read the whole store. Any malformed record fails the entire read.
    fn read(&self) -> Result<Database, StorageError>;

    /// Replace the database file with the current store.
    fn save(&self, db: &Database) -> Result<(), StorageError>;
}

/// Available database file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum FileFormat {
    /// Semicolon-separated text records.
    #[default]
    Csv,
    /// Serialized snapshot of the whole store.
    Snapshot,
}

impl FileFormat {
    pub fn file_name(self) -> &'static str {
        match self {
            FileFormat::Csv => "database.csv",
            FileFormat::Snapshot => "database.obj",
        }
    }
}

/// Build the file manager for `format` inside `data_dir`.
pub fn file_manager(format: FileFormat, data_dir: &Path) -> Box<dyn FileManager> {
    let path = data_dir.join(format.file_name());
    match format {
        FileFormat::Csv => Box::new(CsvFileManager::new(path)),
        FileFormat::Snapshot => Box::new(SnapshotFileManager::new(path)),
    }
}

/// Load the store, starting fresh if the file is missing or unreadable.
pub fn load_or_default(manager: &dyn FileManager) -> Database {
    match manager.read() {
        Ok(db) => {
            info!(
                path = %manager.path().display(),
                tasks = db.task_count(),
                history = db.history().len(),
                "database loaded"
            );
            db
        }
        Err(e) if e.is_missing_file() => {
            info!(path = %manager.path().display(), "no database yet, starting fresh");
            Database::default()
        }
        Err(e) => {
            warn!(path = %manager.path().display(), error = %e, "could not load database, starting fresh");
            Database::default()
        }
    }
}

/// Write `path` through a sibling temp file and rename it into place.
pub(crate) fn write_atomically<F>(path: &Path, write: F) -> Result<(), StorageError>
where
    F: FnOnce(&mut BufWriter<File>) -> io::Result<()>,
{
    let tmp = temp_path(path);
    let result = File::create(&tmp).and_then(|file| {
        let mut writer = BufWriter::new(file);
        write(&mut writer)?;
        writer.flush()?;
        writer.get_ref().sync_all()
    });
    let result = result.and_then(|()| fs::rename(&tmp, path));
    if let Err(source) = result {
        let _ = fs::remove_file(&tmp);
        return Err(StorageError::Write {
            path: path.to_path_buf(),
            source,
        });
    }
    info!(path = %path.display(), "database saved");
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}
