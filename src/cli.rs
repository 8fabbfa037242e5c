use std::path::PathBuf;

use clap::Parser;

use crate::cmd::Commands;
use crate::storage::FileFormat;

/// Simple, file-backed daily task tracker.
/// Storage defaults to ~/.taskcli/database.csv; run without a command for the menu.
#[derive(Parser, Debug)]
#[command(name = "taskcli", version, about = "Daily task management CLI")]
pub struct Cli {
    /// Directory holding the database file.
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Database file format.
    #[arg(long, global = true, value_enum, default_value_t = FileFormat::Csv)]
    pub format: FileFormat,

    /// Do not fail overdue tasks on startup.
    #[arg(long, global = true)]
    pub no_sweep: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}
