//! Enumerations for TUI state management.

/// Screen currently shown by the menu.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AppState {
    TaskList,
    AddTask,
    EditTask,
    History,
    Statistics,
    Help,
    Confirm,
}

/// Destructive actions that go through the confirmation dialog.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ConfirmAction {
    DeleteTask,
    ClearHistory,
    ClearStatistics,
}

impl ConfirmAction {
    pub fn prompt(self) -> &'static str {
        match self {
            ConfirmAction::DeleteTask => "Delete the selected task",
            ConfirmAction::ClearHistory => "Delete the whole task history",
            ConfirmAction::ClearStatistics => "Reset all statistics to zero",
        }
    }

    /// Screen to return to once the dialog closes.
    pub fn origin(self) -> AppState {
        match self {
            ConfirmAction::DeleteTask => AppState::TaskList,
            ConfirmAction::ClearHistory => AppState::History,
            ConfirmAction::ClearStatistics => AppState::Statistics,
        }
    }
}
