//! Menu entry point and terminal setup.

use std::io;

use chrono::NaiveDate;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{prelude::CrosstermBackend, Terminal};

use crate::service::TaskService;
use crate::tui::app::App;

/// Initialise the terminal, run the menu until the user quits, and restore the
/// terminal even when the menu fails.
pub fn run_tui(svc: &mut TaskService, today: NaiveDate) -> io::Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    restore_on_error(execute!(stdout, EnterAlternateScreen), || {
        let _ = disable_raw_mode();
    })?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = restore_on_error(Terminal::new(backend), || {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    })?;

    let mut app = App::new(svc, today);
    let result = app.run(&mut terminal);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

/// Undo the setup steps already taken when the next one fails.
fn restore_on_error<T>(step: io::Result<T>, restore: impl FnOnce()) -> io::Result<T> {
    if step.is_err() {
        restore();
    }
    step
}
