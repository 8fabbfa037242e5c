//! # taskcli - Daily Task Tracker
//!
//! A small command-line task tracker that groups tasks by deadline, keeps a
//! history of completed and failed work, and counts what was created, finished,
//! and missed. An interactive terminal menu (TUI) covers the same operations.
//!
//! ## Quick Start
//!
//! ```bash
//! # Launch the interactive menu
//! taskcli
//!
//! # Add a task due tomorrow
//! taskcli add "Pay bills" --due tomorrow --priority high
//!
//! # What is due today?
//! taskcli today
//!
//! # Complete the most important task of the day
//! taskcli done
//! ```
//!
//! ## Storage
//!
//! Data lives in `~/.taskcli/` (override with `--data-dir` or `TASKCLI_DIR`),
//! either as `database.csv` or, with `--format snapshot`, as `database.obj`.
//! The file is loaded on start and rewritten as a whole on exit.
//!
//! On start every open task whose deadline has passed is marked failed and moved
//! to the history; pass `--no-sweep` to skip this.

use chrono::{Local, NaiveDate};
use clap::Parser;
use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter};

pub mod cli;
pub mod cmd;
pub mod config;
pub mod dates;
pub mod db;
pub mod error;
pub mod fields;
pub mod service;
pub mod storage;
pub mod task;
pub mod tui {
    pub mod app;
    pub mod colors;
    pub mod enums;
    pub mod input;
    pub mod run;
    pub mod task_form;
    pub mod utils;
}

use cli::Cli;
use cmd::*;
use config::Config;
use service::TaskService;
use storage::load_or_default;

fn main() {
    let cli = Cli::parse();
    if should_install_tracing(cli.command.as_ref()) {
        install_tracing();
    }

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    // Completions need no data directory.
    if let Some(Commands::Completions { shell }) = &cli.command {
        cmd_completions(*shell);
        return Ok(());
    }

    let config = Config::resolve(&cli)?;
    tracing::debug!(path = %config.database_path().display(), "using database");
    let manager = config.file_manager();
    let mut svc = TaskService::new(load_or_default(manager.as_ref()));
    let today = Local::now().date_naive();

    if config.sweep {
        let failed = svc.sweep_overdue(today);
        if !failed.is_empty() && cli.command.is_some() {
            println!("{} overdue task(s) marked as failed:", failed.len());
            for task in &failed {
                println!("  {} (due {})", task.name(), task.deadline());
            }
        }
    }

    let result = dispatch(&mut svc, cli.command, today);

    // The store is written back even when the command failed, so a sweep or an
    // earlier change in the same run is not lost.
    if let Err(e) = manager.save(&svc.into_database()) {
        eprintln!("Failed to save database: {e}");
    }
    result
}

fn dispatch(svc: &mut TaskService, command: Option<Commands>, today: NaiveDate) -> anyhow::Result<()> {
    match command.unwrap_or(Commands::Menu) {
        Commands::Menu => cmd_menu(svc, today)?,
        Commands::Today => cmd_show_date(svc, today, today),
        Commands::Tomorrow => {
            let tomorrow = today.succ_opt().unwrap_or(today);
            cmd_show_date(svc, tomorrow, today)
        }
        Commands::Add { name, desc, due, priority } => {
            cmd_add(svc, today, name, desc, &due, priority)?
        }
        Commands::List => cmd_list(svc, today),
        Commands::Date { date } => {
            let date = parse_date(&date, today)?;
            cmd_show_date(svc, date, today)
        }
        Commands::Find { query } => cmd_find(svc, &query, today),
        Commands::Done { number, date } => cmd_done(svc, today, &date, number)?,
        Commands::Edit { date, number, name, desc, due, priority } => {
            cmd_edit(svc, today, &date, number, name, desc, due, priority)?
        }
        Commands::Delete { date, number } => cmd_delete(svc, today, &date, number)?,
        Commands::Stats => cmd_stats(svc),
        Commands::ClearStats => cmd_clear_stats(svc),
        Commands::History => cmd_history(svc, today),
        Commands::ClearHistory => cmd_clear_history(svc),
        Commands::Completions { shell } => cmd_completions(shell),
    }
    Ok(())
}

/// Log lines would tear the alternate screen, so the menu runs without a subscriber.
fn should_install_tracing(command: Option<&Commands>) -> bool {
    !matches!(command, None | Some(Commands::Menu))
}

/// INFO unless `RUST_LOG` says otherwise.
fn log_filter(rust_log: Option<&str>) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(tracing::Level::INFO.into())
        .parse_lossy(rust_log.unwrap_or_default())
}

fn install_tracing() {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = log_filter(rust_log.as_deref());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_span_events(FmtSpan::NONE)
        .compact()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::Priority;
    use crate::storage::FileFormat;

    #[test]
    fn parse_add_command() {
        let cli = Cli::parse_from([
            "taskcli",
            "add",
            "Pay bills",
            "--due",
            "tomorrow",
            "--priority",
            "3",
        ]);
        match cli.command {
            Some(Commands::Add { name, desc, due, priority }) => {
                assert_eq!(name, "Pay bills");
                assert_eq!(desc, "");
                assert_eq!(due, "tomorrow");
                assert_eq!(priority, Priority::High);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parse_done_defaults_to_today() {
        let cli = Cli::parse_from(["taskcli", "done"]);
        match cli.command {
            Some(Commands::Done { number, date }) => {
                assert_eq!(number, None);
                assert_eq!(date, "today");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parse_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["taskcli", "list", "--format", "snapshot", "--no-sweep"]);
        assert_eq!(cli.format, FileFormat::Snapshot);
        assert!(cli.no_sweep);
        assert!(matches!(cli.command, Some(Commands::List)));
    }

    #[test]
    fn parse_rejects_unknown_priority() {
        assert!(Cli::try_parse_from(["taskcli", "add", "x", "--due", "today", "--priority", "9"]).is_err());
    }

    #[test]
    fn tracing_skipped_for_menu() {
        assert!(!should_install_tracing(None));
        assert!(!should_install_tracing(Some(&Commands::Menu)));
        assert!(should_install_tracing(Some(&Commands::Stats)));
    }

    #[test]
    fn rust_log_overrides_default_level() {
        use tracing::level_filters::LevelFilter;

        assert_eq!(log_filter(None).max_level_hint(), Some(LevelFilter::INFO));
        assert_eq!(log_filter(Some("")).max_level_hint(), Some(LevelFilter::INFO));
        assert_eq!(log_filter(Some("debug")).max_level_hint(), Some(LevelFilter::DEBUG));
        assert_eq!(log_filter(Some("warn")).max_level_hint(), Some(LevelFilter::WARN));
    }

    #[test]
    fn dispatch_runs_commands_against_the_service() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 3).unwrap();
        let mut svc = TaskService::new(db::Database::default());
        dispatch(
            &mut svc,
            Some(Commands::Add {
                name: "Gym".into(),
                desc: String::new(),
                due: "today".into(),
                priority: Priority::Low,
            }),
            today,
        )
        .unwrap();
        dispatch(&mut svc, Some(Commands::Done { number: None, date: "today".into() }), today).unwrap();
        assert_eq!(svc.history().len(), 1);
        assert!(dispatch(&mut svc, Some(Commands::Date { date: "soon".into() }), today).is_err());
    }
}
