//! Main application logic for the interactive menu.
//!
//! `App` borrows the task service for the lifetime of the menu, so every action
//! goes through the same lifecycle operations as the command line. The caller
//! saves the store once the menu returns.

use std::io;
use std::time::Duration;

use chrono::NaiveDate;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap},
    Frame, Terminal,
};

use crate::dates::format_relative;
use crate::service::TaskService;
use crate::task::{Task, TaskId};
use crate::tui::{
    colors::{priority_color, DARK_GREEN, DARK_PURPLE, DARK_RED, GOLD},
    enums::{AppState, ConfirmAction},
    input::InputField,
    task_form::{TaskForm, DESCRIPTION_FIELD, DUE_FIELD, NAME_FIELD, PRIORITY_FIELD},
    utils::centered_rect,
};

/// One visible row of the task table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct ListedTask {
    id: TaskId,
    /// 1-based position inside its deadline bucket.
    number: usize,
}

/// Menu state over a borrowed task service.
pub struct App<'a> {
    svc: &'a mut TaskService,
    today: NaiveDate,
    state: AppState,
    table_state: TableState,
    rows: Vec<ListedTask>,
    task_form: TaskForm,
    editing: Option<TaskId>,
    confirm: Option<ConfirmAction>,
    filter: InputField,
    filter_active: bool,
    status_message: String,
}

impl<'a> App<'a> {
    pub fn new(svc: &'a mut TaskService, today: NaiveDate) -> Self {
        let mut app = App {
            svc,
            today,
            state: AppState::TaskList,
            table_state: TableState::default(),
            rows: Vec::new(),
            task_form: TaskForm::new(),
            editing: None,
            confirm: None,
            filter: InputField::new(),
            filter_active: false,
            status_message: String::new(),
        };
        app.refresh_rows();
        app
    }

    /// Rebuild the visible rows from the store, applying the name filter.
    fn refresh_rows(&mut self) {
        let needle = self.filter.value.to_lowercase();
        self.rows = self
            .svc
            .tasks()
            .values()
            .flat_map(|bucket| bucket.iter().enumerate())
            .filter(|(_, task)| needle.is_empty() || task.name().to_lowercase().contains(&needle))
            .map(|(i, task)| ListedTask {
                id: task.id(),
                number: i + 1,
            })
            .collect();

        let selected = match self.table_state.selected() {
            _ if self.rows.is_empty() => None,
            Some(i) => Some(i.min(self.rows.len() - 1)),
            None => Some(0),
        };
        self.table_state.select(selected);
    }

    fn selected_task(&self) -> Option<&Task> {
        let row = self.rows.get(self.table_state.selected()?)?;
        self.svc.database().locate(row.id)
    }

    fn set_status_message(&mut self, msg: impl Into<String>) {
        self.status_message = msg.into();
    }

    fn move_selection(&mut self, down: bool) {
        if self.rows.is_empty() {
            return;
        }
        let last = self.rows.len() - 1;
        let next = match self.table_state.selected() {
            Some(i) if down => (i + 1).min(last),
            Some(i) => i.saturating_sub(1),
            None => 0,
        };
        self.table_state.select(Some(next));
    }

    /// Handle keyboard input on the task table.
    ///
    /// Returns true if the application should quit.
    fn handle_task_list_input(&mut self, key: KeyCode, modifiers: KeyModifiers) -> bool {
        if self.filter_active {
            self.handle_filter_input(key);
            return false;
        }

        match key {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => return true,
            KeyCode::Down | KeyCode::Char('j') => self.move_selection(true),
            KeyCode::Up | KeyCode::Char('k') => self.move_selection(false),
            KeyCode::Char('a') => {
                self.task_form = TaskForm::new();
                self.editing = None;
                self.state = AppState::AddTask;
            }
            KeyCode::Char('e') | KeyCode::Enter => {
                if let Some(task) = self.selected_task() {
                    let form = TaskForm::from_task(task);
                    let id = task.id();
                    self.task_form = form;
                    self.editing = Some(id);
                    self.state = AppState::EditTask;
                }
            }
            KeyCode::Char('c') => self.complete_selected(),
            KeyCode::Char('t') => self.complete_top_of_today(),
            KeyCode::Char('d') => {
                if self.selected_task().is_some() {
                    self.open_confirm(ConfirmAction::DeleteTask);
                }
            }
            KeyCode::Char('/') => {
                self.filter_active = true;
            }
            KeyCode::Char('H') => self.state = AppState::History,
            KeyCode::Char('s') => self.state = AppState::Statistics,
            KeyCode::Char('h') | KeyCode::F(1) => self.state = AppState::Help,
            _ => {}
        }
        false
    }

    fn handle_filter_input(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc => {
                self.filter.clear();
                self.filter_active = false;
            }
            KeyCode::Enter => self.filter_active = false,
            KeyCode::Backspace => self.filter.handle_backspace(),
            KeyCode::Left => self.filter.move_cursor_left(),
            KeyCode::Right => self.filter.move_cursor_right(),
            KeyCode::Char(c) => self.filter.handle_char(c),
            _ => return,
        }
        self.refresh_rows();
    }

    fn complete_selected(&mut self) {
        let Some(id) = self.selected_task().map(Task::id) else {
            return;
        };
        match self.svc.end_task(id) {
            Ok(task) => self.set_status_message(format!("Completed \"{}\"", task.name())),
            Err(e) => self.set_status_message(format!("Error: {e}")),
        }
        self.refresh_rows();
    }

    fn complete_top_of_today(&mut self) {
        match self.svc.end_and_return_first_task(self.today) {
            Ok(task) => self.set_status_message(format!("Completed \"{}\"", task.name())),
            Err(e) => self.set_status_message(format!("Error: {e}")),
        }
        self.refresh_rows();
    }

    fn open_confirm(&mut self, action: ConfirmAction) {
        self.confirm = Some(action);
        self.state = AppState::Confirm;
    }

    /// Handle keyboard input in the add and edit forms.
    fn handle_form_input(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc => self.state = AppState::TaskList,
            KeyCode::Tab | KeyCode::Down => self.task_form.next_field(),
            KeyCode::BackTab | KeyCode::Up => self.task_form.prev_field(),
            KeyCode::Left => self.task_form.handle_left_right(false),
            KeyCode::Right => self.task_form.handle_left_right(true),
            KeyCode::Backspace => self.task_form.handle_backspace(),
            KeyCode::Delete => self.task_form.handle_delete(),
            KeyCode::Home => {
                if let Some(field) = self.task_form.active_input_mut() {
                    field.move_home();
                }
            }
            KeyCode::End => {
                if let Some(field) = self.task_form.active_input_mut() {
                    field.move_end();
                }
            }
            KeyCode::Enter => self.submit_form(),
            KeyCode::Char(c) => self.task_form.handle_char(c),
            _ => {}
        }
    }

    fn submit_form(&mut self) {
        let result = match self.editing {
            None => self.task_form.to_new_task(self.today).map(|task| {
                let msg = format!("Task \"{}\" added for {}", task.name(), task.deadline());
                self.svc.add_task(task);
                msg
            }),
            Some(id) => self.update_task(id),
        };

        match result {
            Ok(msg) => {
                self.set_status_message(msg);
                self.state = AppState::TaskList;
                self.editing = None;
                self.refresh_rows();
            }
            Err(e) => self.set_status_message(format!("Error: {e}")),
        }
    }

    fn update_task(&mut self, id: TaskId) -> anyhow::Result<String> {
        let original = self
            .svc
            .database()
            .locate(id)
            .ok_or_else(|| anyhow::anyhow!("the task no longer exists"))?;
        let edit = self.task_form.to_edit(original, self.today)?;
        if edit.is_empty() {
            return Ok("Nothing changed".to_string());
        }
        let task = self.svc.edit_task(id, &edit, self.today)?;
        Ok(format!("Task \"{}\" updated", task.name()))
    }

    fn handle_confirm_input(&mut self, key: KeyCode) {
        let Some(action) = self.confirm else {
            self.state = AppState::TaskList;
            return;
        };
        match key {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                self.apply_confirmed(action);
                self.confirm = None;
                self.state = action.origin();
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                self.confirm = None;
                self.state = action.origin();
            }
            _ => {}
        }
    }

    fn apply_confirmed(&mut self, action: ConfirmAction) {
        match action {
            ConfirmAction::DeleteTask => {
                let Some(id) = self.selected_task().map(Task::id) else {
                    return;
                };
                match self.svc.remove_task(id) {
                    Ok(task) => self.set_status_message(format!("Task \"{}\" deleted", task.name())),
                    Err(e) => self.set_status_message(format!("Error: {e}")),
                }
                self.refresh_rows();
            }
            ConfirmAction::ClearHistory => {
                self.svc.clear_history();
                self.set_status_message("History deleted");
            }
            ConfirmAction::ClearStatistics => {
                self.svc.clear_statistics();
                self.set_status_message("Statistics cleared");
            }
        }
    }

    /// History and statistics screens share their keys.
    fn handle_report_input(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc | KeyCode::Char('q') => self.state = AppState::TaskList,
            KeyCode::Char('x') if self.state == AppState::History => {
                self.open_confirm(ConfirmAction::ClearHistory)
            }
            KeyCode::Char('x') if self.state == AppState::Statistics => {
                self.open_confirm(ConfirmAction::ClearStatistics)
            }
            KeyCode::Char('H') => self.state = AppState::History,
            KeyCode::Char('s') => self.state = AppState::Statistics,
            _ => {}
        }
    }

    /// Dispatch a key press to the current screen.
    ///
    /// Returns true if the application should quit.
    pub fn handle_key(&mut self, key: KeyCode, modifiers: KeyModifiers) -> bool {
        self.status_message.clear();
        match self.state {
            AppState::TaskList => return self.handle_task_list_input(key, modifiers),
            AppState::AddTask | AppState::EditTask => self.handle_form_input(key),
            AppState::History | AppState::Statistics => self.handle_report_input(key),
            AppState::Help => self.state = AppState::TaskList,
            AppState::Confirm => self.handle_confirm_input(key),
        }
        false
    }

    /// Poll for and handle one keyboard event.
    ///
    /// Returns true if the application should quit.
    fn handle_input(&mut self) -> io::Result<bool> {
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    return Ok(self.handle_key(key.code, key.modifiers));
                }
            }
        }
        Ok(false)
    }

    fn render_header(&self, f: &mut Frame, area: Rect, title: &str, color: Color) {
        let header = Paragraph::new(Line::from(vec![
            Span::styled("TASKS", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("  "),
            Span::styled(
                format!("{title}  Today: {}", self.today),
                Style::default().add_modifier(Modifier::ITALIC),
            ),
        ]))
        .style(Style::default().bg(color).fg(Color::White))
        .block(Block::default().borders(Borders::ALL));
        f.render_widget(header, area);
    }

    fn task_row(&self, task: &Task, number: usize) -> Row<'static> {
        let overdue = task.deadline() < self.today;
        let due_style = if overdue {
            Style::default().fg(Color::Red)
        } else {
            Style::default()
        };
        Row::new(vec![
            Cell::from(number.to_string()),
            Cell::from(task.deadline().to_string()),
            Cell::from(format_relative(task.deadline(), self.today)).style(due_style),
            Cell::from(task.priority().as_token())
                .style(Style::default().fg(priority_color(task.priority()))),
            Cell::from(task.status().as_token()),
            Cell::from(task.name().to_string()),
            Cell::from(task.description().to_string()),
        ])
    }

    fn table_header() -> Row<'static> {
        Row::new(vec!["#", "Deadline", "Due", "Priority", "Status", "Name", "Description"])
            .style(Style::default().add_modifier(Modifier::BOLD))
    }

    fn table_widths() -> [Constraint; 7] {
        [
            Constraint::Length(3),
            Constraint::Length(11),
            Constraint::Length(9),
            Constraint::Length(9),
            Constraint::Length(7),
            Constraint::Min(20),
            Constraint::Min(20),
        ]
    }

    /// Render the main task table.
    fn render_task_list(&mut self, f: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0)])
            .split(area);
        self.render_header(f, chunks[0], "Active tasks", DARK_GREEN);

        let db = self.svc.database();
        let rows: Vec<Row> = self
            .rows
            .iter()
            .filter_map(|row| db.locate(row.id).map(|task| self.task_row(task, row.number)))
            .collect();

        let table = Table::new(rows, Self::table_widths())
            .header(Self::table_header())
            .block(Block::default().borders(Borders::ALL).title(format!(
                "Tasks ({}/{}) - Press 'h' for help",
                self.rows.len(),
                db.task_count()
            )))
            .row_highlight_style(Style::default().bg(Color::Gray).fg(Color::Black))
            .highlight_symbol(">> ");

        f.render_stateful_widget(table, chunks[1], &mut self.table_state);
    }

    fn render_history(&self, f: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0)])
            .split(area);
        self.render_header(f, chunks[0], "History", DARK_PURPLE);

        let rows: Vec<Row> = self
            .svc
            .history()
            .iter()
            .enumerate()
            .map(|(i, task)| self.task_row(task, i + 1))
            .collect();
        let table = Table::new(rows, Self::table_widths())
            .header(Self::table_header())
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("History - 'x' to clear, Esc to return"),
            );
        f.render_widget(table, chunks[1]);
    }

    fn render_statistics(&self, f: &mut Frame, area: Rect) {
        let stats = self.svc.get_statistics();
        let text = vec![
            Line::from(""),
            Line::from(format!("Number of all created tasks: {}", stats.created)),
            Line::from(format!("Number of completed tasks:   {}", stats.completed)),
            Line::from(format!("Number of failed tasks:      {}", stats.failed)),
            Line::from(""),
            Line::from(format!("Active tasks:                {}", self.svc.database().task_count())),
        ];
        let area = centered_rect(60, 50, area);
        let paragraph = Paragraph::new(text).block(
            Block::default()
                .borders(Borders::ALL)
                .title("Statistics - 'x' to clear, Esc to return"),
        );
        f.render_widget(Clear, area);
        f.render_widget(paragraph, area);
    }

    /// Render the add or edit form and place the cursor in the active field.
    fn render_task_form(&self, f: &mut Frame, area: Rect) {
        let title = if self.state == AppState::EditTask {
            "Edit Task"
        } else {
            "Add Task"
        };
        let area = centered_rect(70, 70, area);
        f.render_widget(Clear, area);
        let outer = Block::default().borders(Borders::ALL).title(title);
        let inner = outer.inner(area);
        f.render_widget(outer, area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Min(0),
            ])
            .split(inner);

        let form = &self.task_form;
        let field_style = |index: usize| {
            if form.current_field == index {
                Style::default().fg(GOLD)
            } else {
                Style::default()
            }
        };

        let inputs = [
            (NAME_FIELD, "Name", &form.name),
            (DESCRIPTION_FIELD, "Description", &form.description),
            (DUE_FIELD, "Deadline (YYYY-MM-DD, today, tomorrow, in 3d, friday)", &form.due),
        ];
        for (index, label, field) in inputs {
            let widget = Paragraph::new(field.value.as_str()).block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(label)
                    .border_style(field_style(index)),
            );
            f.render_widget(widget, chunks[index]);
            if field.active {
                let x = chunks[index].x + 1 + field.cursor as u16;
                f.set_cursor_position((x.min(chunks[index].right().saturating_sub(2)), chunks[index].y + 1));
            }
        }

        let priority = form.selected_priority();
        let selector = Paragraph::new(Line::from(vec![
            Span::raw("< "),
            Span::styled(
                format!("{} {}", priority.number(), priority.as_token()),
                Style::default().fg(priority_color(priority)),
            ),
            Span::raw(" >"),
        ]))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Priority")
                .border_style(field_style(PRIORITY_FIELD)),
        );
        f.render_widget(selector, chunks[PRIORITY_FIELD]);

        let help = Paragraph::new("Tab/Up/Down change field  Left/Right change priority  Enter save  Esc cancel")
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        f.render_widget(help, chunks[4]);
    }

    fn render_help(&self, f: &mut Frame, area: Rect) {
        let bold = Style::default().add_modifier(Modifier::BOLD);
        let help_text = vec![
            Line::from(Span::styled("Task Menu Help", bold)),
            Line::from(""),
            Line::from(Span::styled("Task List:", bold)),
            Line::from("  Up/Down, k/j   Select task"),
            Line::from("  a              Add new task"),
            Line::from("  e/Enter        Edit selected task"),
            Line::from("  c              Complete selected task"),
            Line::from("  t              Complete today's most important task"),
            Line::from("  d              Delete selected task"),
            Line::from("  /              Search tasks by name"),
            Line::from("  H              Show history"),
            Line::from("  s              Show statistics"),
            Line::from("  h/F1           Show this help"),
            Line::from("  q/Esc          Save and quit"),
            Line::from(""),
            Line::from(Span::styled("History and Statistics:", bold)),
            Line::from("  x              Clear"),
            Line::from("  Esc/q          Back to task list"),
            Line::from(""),
            Line::from(Span::styled("Deadline Formats:", bold)),
            Line::from("  YYYY-MM-DD     Specific date (e.g., 2026-12-24)"),
            Line::from("  today, tomorrow, in 3d, in 2w, friday, next monday, eow, eom"),
        ];

        let paragraph = Paragraph::new(help_text)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Help - Press any key to return"),
            )
            .wrap(Wrap { trim: true });
        f.render_widget(paragraph, area);
    }

    /// Render a confirmation dialog for destructive actions.
    fn render_confirm(&self, f: &mut Frame, area: Rect) {
        let block = Block::default()
            .title("Confirm Action")
            .borders(Borders::ALL)
            .style(Style::default().bg(DARK_RED));

        let area = centered_rect(50, 30, area);
        f.render_widget(Clear, area);

        let text = vec![
            Line::from(""),
            Line::from(Span::styled(
                "Are you sure you want to:",
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(self.confirm.map(ConfirmAction::prompt).unwrap_or("")),
            Line::from(""),
            Line::from("This action cannot be undone."),
            Line::from(""),
            Line::from("Press 'y' to confirm, 'n' to cancel"),
        ];

        let paragraph = Paragraph::new(text)
            .block(block)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        f.render_widget(paragraph, area);
    }

    fn render_status_bar(&self, f: &mut Frame, area: Rect) {
        let text = if !self.status_message.is_empty() {
            self.status_message.clone()
        } else if self.filter_active {
            format!("Search: {} (Esc to clear, Enter to confirm)", self.filter.value)
        } else if !self.filter.value.is_empty() {
            format!(
                "Tasks: {} (filtered by '{}') | Press 'h' for help",
                self.rows.len(),
                self.filter.value
            )
        } else {
            match self.state {
                AppState::TaskList => format!("Tasks: {} | Press 'h' for help", self.rows.len()),
                AppState::AddTask => "Add New Task".to_string(),
                AppState::EditTask => "Edit Task".to_string(),
                AppState::History => format!("History: {} task(s)", self.svc.history().len()),
                AppState::Statistics => "Statistics".to_string(),
                AppState::Help => "Help".to_string(),
                AppState::Confirm => "Confirm Action".to_string(),
            }
        };
        let status = Paragraph::new(text)
            .style(Style::default().bg(DARK_GREEN).fg(Color::White))
            .alignment(Alignment::Left);
        f.render_widget(status, area);
    }

    /// Main render function that dispatches to the screen renderers.
    fn render(&mut self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(f.area());

        match self.state {
            AppState::TaskList => self.render_task_list(f, chunks[0]),
            AppState::AddTask | AppState::EditTask => {
                self.render_task_list(f, chunks[0]);
                self.render_task_form(f, chunks[0]);
            }
            AppState::History => self.render_history(f, chunks[0]),
            AppState::Statistics => {
                self.render_task_list(f, chunks[0]);
                self.render_statistics(f, chunks[0]);
            }
            AppState::Help => self.render_help(f, chunks[0]),
            AppState::Confirm => {
                match self.confirm.map(ConfirmAction::origin) {
                    Some(AppState::History) => self.render_history(f, chunks[0]),
                    _ => self.render_task_list(f, chunks[0]),
                }
                self.render_confirm(f, chunks[0]);
            }
        }

        self.render_status_bar(f, chunks[1]);
    }

    /// Main event loop. Runs until the user quits.
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            terminal.draw(|f| self.render(f))?;

            if self.handle_input()? {
                break;
            }
        }
        Ok(())
    }
}
