//! Runtime configuration: where the database lives and in which format.
//!
//! The data directory comes from `--data-dir`, then the `TASKCLI_DIR` environment
//! variable, then `$HOME/.taskcli`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::cli::Cli;
use crate::storage::{file_manager, FileFormat, FileManager};

pub const DATA_DIR_ENV: &str = "TASKCLI_DIR";
const DEFAULT_DIR_NAME: &str = ".taskcli";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub data_dir: PathBuf,
    pub format: FileFormat,
    /// Fail overdue open tasks right after loading.
    pub sweep: bool,
}

impl Config {
    /// Resolve the configuration from the parsed command line and the environment,
    /// creating the data directory if needed.
    pub fn resolve(cli: &Cli) -> Result<Self> {
        let data_dir = resolve_data_dir(
            cli.data_dir.as_deref(),
            std::env::var_os(DATA_DIR_ENV).map(PathBuf::from),
            std::env::var_os("HOME").map(PathBuf::from),
        );
        std::fs::create_dir_all(&data_dir).with_context(|| {
            format!("failed to create data directory {}", data_dir.display())
        })?;
        Ok(Config {
            data_dir,
            format: cli.format,
            sweep: !cli.no_sweep,
        })
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(self.format.file_name())
    }

    pub fn file_manager(&self) -> Box<dyn FileManager> {
        file_manager(self.format, &self.data_dir)
    }
}

fn resolve_data_dir(flag: Option<&Path>, env: Option<PathBuf>, home: Option<PathBuf>) -> PathBuf {
    if let Some(dir) = flag {
        return dir.to_path_buf();
    }
    if let Some(dir) = env.filter(|d| !d.as_os_str().is_empty()) {
        return dir;
    }
    home.unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_DIR_NAME)
}
