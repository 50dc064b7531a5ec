use std::io;
use std::time::Duration;

use anyhow::Result;
use chrono::NaiveDate;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyModifiers,
    MouseEvent, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Rect;
use ratatui::Terminal;
use tracing::debug;

use perch_core::category::UNCATEGORIZED_NAME;
use perch_core::datetime;
use perch_core::render::short_id;
use perch_core::session::{MenuTarget, Session, Tab};
use perch_core::store::Board;
use perch_core::views;

use crate::form::{FieldKind, FormAction, FormKind, FormState};
use crate::view;

const EVENT_POLL_MS: u64 = 120;

#[derive(Clone, Copy, PartialEq, Eq)]
pub(crate) enum StatusKind {
    Error,
    Info,
}

/// Board selection: a lane, and within it either the header (`None`) or a
/// card index.
#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct BoardCursor {
    pub(crate) lane: usize,
    pub(crate) card: Option<usize>,
}

pub(crate) struct DeleteConfirmState {
    pub(crate) target: MenuTarget,
    pub(crate) label: String,
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub(crate) enum MenuAction {
    ToggleTask,
    EditTask,
    DeleteTask,
    EditCategory,
    DeleteCategory,
    NewTaskHere,
}

pub(crate) struct MenuItem {
    pub(crate) label: &'static str,
    pub(crate) action: MenuAction,
}

/// What the cursor points at right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Selection {
    Task(String),
    Category(String),
    /// Header of the synthetic bucket lane.
    Bucket,
    None,
}

pub(crate) struct AppState {
    pub(crate) board: Board,
    pub(crate) session: Session,
    pub(crate) today: NaiveDate,
    pub(crate) board_cursor: BoardCursor,
    pub(crate) active_cursor: usize,
    pub(crate) checked_cursor: usize,
    pub(crate) form: Option<FormState>,
    pub(crate) delete_confirm: Option<DeleteConfirmState>,
    pub(crate) menu_cursor: usize,
    info_message: Option<String>,
    status_message: Option<String>,
    viewport: Rect,
    should_quit: bool,
}

impl AppState {
    pub(crate) fn new(board: Board) -> Self {
        let today = datetime::board_today(board.now());
        Self {
            board,
            session: Session::new(),
            today,
            board_cursor: BoardCursor::default(),
            active_cursor: 0,
            checked_cursor: 0,
            form: None,
            delete_confirm: None,
            menu_cursor: 0,
            info_message: None,
            status_message: None,
            viewport: Rect::default(),
            should_quit: false,
        }
    }

    fn refresh_today(&mut self) {
        self.today = datetime::board_today(self.board.now());
    }

    fn update_viewport(&mut self, area: Rect) {
        self.viewport = area;
    }

    pub(crate) fn status_line(&self) -> Option<(String, StatusKind)> {
        if let Some(message) = self.status_message.as_ref() {
            return Some((message.clone(), StatusKind::Error));
        }
        if let Some(info) = self.info_message.as_ref() {
            return Some((info.clone(), StatusKind::Info));
        }
        None
    }

    pub(crate) fn footer_hint(&self) -> String {
        if self.delete_confirm.is_some() {
            return "y confirm delete  esc cancel".to_string();
        }
        if let Some(form) = self.form.as_ref() {
            return match form.active_field().kind {
                FieldKind::Choice => {
                    "enter save  tab next  left/right change  esc cancel".to_string()
                }
                FieldKind::Text => "enter save  tab next  esc cancel".to_string(),
            };
        }
        if self.session.menu().is_some() {
            return "j/k move  enter apply  esc close".to_string();
        }
        match self.session.tab() {
            Tab::Board => {
                "tab views  h/l lanes  j/k cards  a add  e edit  x check  d delete  m menu  c new category  q quit"
                    .to_string()
            }
            Tab::Active | Tab::Checked => {
                "tab views  j/k move  a add  e edit  x check  d delete  m menu  q quit".to_string()
            }
        }
    }

    pub(crate) fn totals_summary(&self) -> String {
        let totals = views::totals(self.board.tasks.all());
        format!("{} / {} complete", totals.completed, totals.all)
    }

    fn set_error(&mut self, message: String) {
        self.status_message = Some(message);
        self.info_message = None;
    }

    fn set_info(&mut self, message: String) {
        self.info_message = Some(message);
        self.status_message = None;
    }

    pub(crate) fn menu_items(&self) -> Vec<MenuItem> {
        let Some(menu) = self.session.menu() else {
            return vec![];
        };
        match &menu.target {
            MenuTarget::Task(id) => {
                let completed = self
                    .board
                    .tasks
                    .get(id)
                    .map(|t| t.completed)
                    .unwrap_or(false);
                let toggle = if completed { "Mark active" } else { "Check task" };
                vec![
                    MenuItem {
                        label: toggle,
                        action: MenuAction::ToggleTask,
                    },
                    MenuItem {
                        label: "Edit task",
                        action: MenuAction::EditTask,
                    },
                    MenuItem {
                        label: "Delete task",
                        action: MenuAction::DeleteTask,
                    },
                ]
            }
            MenuTarget::Category(_) => vec![
                MenuItem {
                    label: "Edit category",
                    action: MenuAction::EditCategory,
                },
                MenuItem {
                    label: "Delete category",
                    action: MenuAction::DeleteCategory,
                },
                MenuItem {
                    label: "New task here",
                    action: MenuAction::NewTaskHere,
                },
            ],
        }
    }

    pub(crate) fn selection(&self) -> Selection {
        match self.session.tab() {
            Tab::Board => {
                let view = self.board.view();
                let Some(lane) = view.lanes.get(self.board_cursor.lane) else {
                    return Selection::None;
                };
                match self.board_cursor.card {
                    Some(card) => lane
                        .tasks
                        .get(card)
                        .map(|t| Selection::Task(t.id.clone()))
                        .unwrap_or(Selection::None),
                    None if lane.synthetic => Selection::Bucket,
                    None => Selection::Category(lane.id.clone()),
                }
            }
            Tab::Active => views::active_tasks(self.board.tasks.all())
                .get(self.active_cursor)
                .map(|t| Selection::Task(t.id.clone()))
                .unwrap_or(Selection::None),
            Tab::Checked => views::completed_tasks(self.board.tasks.all())
                .get(self.checked_cursor)
                .map(|t| Selection::Task(t.id.clone()))
                .unwrap_or(Selection::None),
        }
    }

    fn set_tab(&mut self, tab: Tab) {
        self.session.set_tab(tab);
    }

    fn switch_tab(&mut self, delta: isize) {
        let tabs = Tab::ALL;
        let current = tabs
            .iter()
            .position(|t| *t == self.session.tab())
            .unwrap_or(0);
        let next = (current as isize + delta).rem_euclid(tabs.len() as isize) as usize;
        self.set_tab(tabs[next]);
    }

    fn move_vertical(&mut self, delta: isize) {
        match self.session.tab() {
            Tab::Board => {
                let view = self.board.view();
                let Some(lane) = view.lanes.get(self.board_cursor.lane) else {
                    return;
                };
                let count = lane.tasks.len();
                self.board_cursor.card = if delta > 0 {
                    match self.board_cursor.card {
                        None if count > 0 => Some(0),
                        None => None,
                        Some(i) => Some((i + 1).min(count.saturating_sub(1))),
                    }
                } else {
                    match self.board_cursor.card {
                        Some(0) | None => None,
                        Some(i) => Some(i - 1),
                    }
                };
            }
            Tab::Active => {
                let len = views::active_tasks(self.board.tasks.all()).len();
                self.active_cursor = step(self.active_cursor, delta, len);
            }
            Tab::Checked => {
                let len = views::completed_tasks(self.board.tasks.all()).len();
                self.checked_cursor = step(self.checked_cursor, delta, len);
            }
        }
    }

    fn move_horizontal(&mut self, delta: isize) {
        if self.session.tab() != Tab::Board {
            return;
        }
        let view = self.board.view();
        if view.lanes.is_empty() {
            return;
        }
        let max = view.lanes.len() - 1;
        let lane = if delta > 0 {
            (self.board_cursor.lane + 1).min(max)
        } else {
            self.board_cursor.lane.saturating_sub(1)
        };
        if lane == self.board_cursor.lane {
            return;
        }
        self.board_cursor.lane = lane;
        let count = view.lanes[lane].tasks.len();
        self.board_cursor.card = match self.board_cursor.card {
            Some(i) if count > 0 => Some(i.min(count - 1)),
            _ => None,
        };
    }

    /// Selections can dangle after any mutation; pull them back in range.
    fn clamp_cursors(&mut self) {
        let view = self.board.view();
        if view.lanes.is_empty() {
            self.board_cursor = BoardCursor::default();
        } else {
            let lane = self.board_cursor.lane.min(view.lanes.len() - 1);
            let count = view.lanes[lane].tasks.len();
            let card = self
                .board_cursor
                .card
                .and_then(|i| if count == 0 { None } else { Some(i.min(count - 1)) });
            self.board_cursor = BoardCursor { lane, card };
        }

        let active_len = views::active_tasks(self.board.tasks.all()).len();
        self.active_cursor = self.active_cursor.min(active_len.saturating_sub(1));
        let checked_len = views::completed_tasks(self.board.tasks.all()).len();
        self.checked_cursor = self.checked_cursor.min(checked_len.saturating_sub(1));
    }

    fn open_new_task_form(&mut self, category_id: &str) {
        self.form = Some(FormState::new_task(self.board.categories.all(), category_id));
    }

    /// The create form defaults its category to the selected lane.
    fn lane_under_cursor(&self) -> String {
        if self.session.tab() != Tab::Board {
            return String::new();
        }
        let view = self.board.view();
        view.lanes
            .get(self.board_cursor.lane)
            .filter(|lane| !lane.synthetic)
            .map(|lane| lane.id.clone())
            .unwrap_or_default()
    }

    fn open_new_category_form(&mut self) {
        let color = self.board.categories.next_color();
        self.form = Some(FormState::new_category(
            self.board.categories.palette(),
            &color,
        ));
    }

    fn open_task_editor(&mut self, id: &str) {
        let Some(task) = self.board.tasks.get(id).cloned() else {
            self.set_error(format!("No such task: {id}"));
            return;
        };
        self.session.begin_task_edit(&task);
        self.form = Some(FormState::edit_task(
            &task.id,
            &task.draft(),
            self.board.categories.all(),
        ));
    }

    fn open_category_editor(&mut self, id: &str) {
        let Some(category) = self.board.categories.get(id).cloned() else {
            self.set_error(format!("No such category: {id}"));
            return;
        };
        self.session.begin_category_edit(&category);
        self.form = Some(FormState::edit_category(
            &category.id,
            &category.draft(),
            self.board.categories.palette(),
        ));
    }

    fn open_edit_form(&mut self) {
        match self.selection() {
            Selection::Task(id) => self.open_task_editor(&id),
            Selection::Category(id) => self.open_category_editor(&id),
            Selection::Bucket => {
                self.set_info(format!("{UNCATEGORIZED_NAME} is a generated lane."));
            }
            Selection::None => self.set_info("Nothing selected.".to_string()),
        }
    }

    fn open_context_menu(&mut self) {
        let target = match self.selection() {
            Selection::Task(id) => MenuTarget::Task(id),
            Selection::Category(id) => MenuTarget::Category(id),
            Selection::Bucket => {
                self.set_info(format!("{UNCATEGORIZED_NAME} is a generated lane."));
                return;
            }
            Selection::None => {
                self.set_info("Nothing selected.".to_string());
                return;
            }
        };
        let (x, y) = view::selection_position(self, self.viewport)
            .unwrap_or((self.viewport.width / 2, self.viewport.height / 2));
        self.session.open_menu(x, y, target);
        self.menu_cursor = 0;
    }

    fn apply_menu_action(&mut self, action: MenuAction) {
        let Some(menu) = self.session.menu() else {
            return;
        };
        let target = menu.target.clone();
        self.session.close_menu();
        match (action, target) {
            (MenuAction::ToggleTask, MenuTarget::Task(id)) => self.toggle_task(&id),
            (MenuAction::EditTask, MenuTarget::Task(id)) => self.open_task_editor(&id),
            (MenuAction::DeleteTask, MenuTarget::Task(id)) => self.request_task_delete(&id),
            (MenuAction::EditCategory, MenuTarget::Category(id)) => self.open_category_editor(&id),
            (MenuAction::DeleteCategory, MenuTarget::Category(id)) => {
                self.request_category_delete(&id);
            }
            (MenuAction::NewTaskHere, MenuTarget::Category(id)) => self.open_new_task_form(&id),
            _ => {}
        }
    }

    fn toggle_selected(&mut self) {
        match self.selection() {
            Selection::Task(id) => self.toggle_task(&id),
            Selection::Category(_) | Selection::Bucket => {
                self.set_info("Select a task to check.".to_string());
            }
            Selection::None => {}
        }
    }

    fn toggle_task(&mut self, id: &str) {
        match self.board.tasks.toggle_completed(id) {
            Ok(Some(true)) => self.set_info(format!("Checked task {} (now done).", short_id(id))),
            Ok(Some(false)) => {
                self.set_info(format!("Unchecked task {} (active again).", short_id(id)));
            }
            Ok(None) => self.set_error(format!("No such task: {id}")),
            Err(err) => self.set_error(format!("{err:#}")),
        }
        self.clamp_cursors();
    }

    fn request_delete(&mut self) {
        match self.selection() {
            Selection::Task(id) => self.request_task_delete(&id),
            Selection::Category(id) => self.request_category_delete(&id),
            Selection::Bucket => {
                self.set_info(format!("{UNCATEGORIZED_NAME} is a generated lane."));
            }
            Selection::None => {}
        }
    }

    fn request_task_delete(&mut self, id: &str) {
        let Some(task) = self.board.tasks.get(id) else {
            self.set_error(format!("No such task: {id}"));
            return;
        };
        self.delete_confirm = Some(DeleteConfirmState {
            target: MenuTarget::Task(id.to_string()),
            label: task.title.clone(),
        });
    }

    fn request_category_delete(&mut self, id: &str) {
        let Some(category) = self.board.categories.get(id) else {
            self.set_error(format!("No such category: {id}"));
            return;
        };
        self.delete_confirm = Some(DeleteConfirmState {
            target: MenuTarget::Category(id.to_string()),
            label: category.name.clone(),
        });
    }

    fn confirm_delete(&mut self) {
        let Some(confirm) = self.delete_confirm.take() else {
            return;
        };
        match confirm.target {
            MenuTarget::Task(id) => match self.board.tasks.remove(&id) {
                Ok(true) => self.set_info(format!("Deleted task {}.", short_id(&id))),
                Ok(false) => self.set_error(format!("No such task: {id}")),
                Err(err) => self.set_error(format!("{err:#}")),
            },
            MenuTarget::Category(id) => match self.board.remove_category(&id) {
                Ok(Some(detached)) => self.set_info(format!(
                    "Deleted category {id} ({detached} task(s) detached)."
                )),
                Ok(None) => self.set_error(format!("No such category: {id}")),
                Err(err) => self.set_error(format!("{err:#}")),
            },
        }
        self.clamp_cursors();
    }

    /// Keeps the session's edit slot in step with the fields on screen.
    fn sync_session_draft(&mut self) {
        let Some(form) = self.form.as_ref() else {
            return;
        };
        match form.kind() {
            FormKind::EditTask { .. } => {
                if let Some(draft) = self.session.task_draft_mut() {
                    form.write_task_draft(draft);
                }
            }
            FormKind::EditCategory { .. } => {
                if let Some(draft) = self.session.category_draft_mut() {
                    form.write_category_draft(draft);
                }
            }
            _ => {}
        }
    }

    fn cancel_form(&mut self) {
        if let Some(form) = self.form.take() {
            match form.kind() {
                FormKind::EditTask { .. } => self.session.cancel_task_edit(),
                FormKind::EditCategory { .. } => self.session.cancel_category_edit(),
                _ => {}
            }
        }
    }

    fn submit_form(&mut self) {
        let Some(mut form) = self.form.take() else {
            return;
        };
        debug!("submitting form");
        match form.kind().clone() {
            FormKind::NewTask => match form.task_draft(self.today) {
                Ok(draft) => match self.board.tasks.create(draft) {
                    Ok(Some(task)) => {
                        let message = format!("Created task {}.", short_id(&task.id));
                        self.set_info(message);
                    }
                    Ok(None) => {
                        form.set_error("a title is required".to_string());
                        self.form = Some(form);
                    }
                    Err(err) => self.set_error(format!("{err:#}")),
                },
                Err(message) => {
                    form.set_error(message);
                    self.form = Some(form);
                }
            },
            FormKind::EditTask { id } => match form.task_draft(self.today) {
                Ok(draft) => {
                    self.session.take_task_edit();
                    match self.board.tasks.update(&id, draft) {
                        Ok(true) => self.set_info(format!("Modified task {}.", short_id(&id))),
                        Ok(false) => self.set_error(format!("No such task: {id}")),
                        Err(err) => self.set_error(format!("{err:#}")),
                    }
                }
                Err(message) => {
                    form.set_error(message);
                    self.form = Some(form);
                }
            },
            FormKind::NewCategory => match form.category_draft() {
                Ok(draft) => match self.board.categories.create(&draft.name, Some(draft.color)) {
                    Ok(Some(id)) => self.set_info(format!("Created category {id}.")),
                    Ok(None) => {
                        form.set_error("a name is required".to_string());
                        self.form = Some(form);
                    }
                    Err(err) => self.set_error(format!("{err:#}")),
                },
                Err(message) => {
                    form.set_error(message);
                    self.form = Some(form);
                }
            },
            FormKind::EditCategory { id } => match form.category_draft() {
                Ok(draft) => {
                    self.session.take_category_edit();
                    match self.board.categories.update(&id, draft) {
                        Ok(true) => self.set_info(format!("Modified category {id}.")),
                        Ok(false) => self.set_error(format!("No such category: {id}")),
                        Err(err) => self.set_error(format!("{err:#}")),
                    }
                }
                Err(message) => {
                    form.set_error(message);
                    self.form = Some(form);
                }
            },
        }
        self.clamp_cursors();
    }
}

fn step(current: usize, delta: isize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    let max = len - 1;
    if delta > 0 {
        (current + 1).min(max)
    } else {
        current.saturating_sub(1)
    }
}

pub fn run(board: Board) -> Result<()> {
    let mut app = AppState::new(board);
    run_terminal(&mut app)
}

fn run_terminal(app: &mut AppState) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    let size = terminal.size()?;
    app.update_viewport(size);

    let result = run_loop(&mut terminal, app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

fn run_loop(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut AppState) -> Result<()> {
    let mut dirty = true;
    while !app.should_quit {
        if dirty {
            app.refresh_today();
            terminal.draw(|frame| {
                app.update_viewport(frame.size());
                view::render(frame, app);
            })?;
            dirty = false;
        }

        if event::poll(Duration::from_millis(EVENT_POLL_MS))? {
            match event::read()? {
                Event::Key(key) => {
                    handle_key(app, key);
                    dirty = true;
                }
                Event::Mouse(mouse) => {
                    if handle_mouse(app, mouse) {
                        dirty = true;
                    }
                }
                Event::Resize(width, height) => {
                    app.update_viewport(Rect::new(0, 0, width, height));
                    dirty = true;
                }
                _ => {}
            }
        }
    }
    Ok(())
}

pub(crate) fn handle_key(app: &mut AppState, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    if app.delete_confirm.is_some() {
        handle_confirm_key(app, key);
        return;
    }

    if let Some(form) = app.form.as_mut() {
        match form.handle_key(key) {
            FormAction::None => app.sync_session_draft(),
            FormAction::Cancel => app.cancel_form(),
            FormAction::Submit => app.submit_form(),
        }
        return;
    }

    if app.session.menu().is_some() {
        handle_menu_key(app, key);
        return;
    }

    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Esc => app.session.escape(),
        KeyCode::Tab => app.switch_tab(1),
        KeyCode::BackTab => app.switch_tab(-1),
        KeyCode::Char('1') => app.set_tab(Tab::Board),
        KeyCode::Char('2') => app.set_tab(Tab::Active),
        KeyCode::Char('3') => app.set_tab(Tab::Checked),
        KeyCode::Char('j') | KeyCode::Down => app.move_vertical(1),
        KeyCode::Char('k') | KeyCode::Up => app.move_vertical(-1),
        KeyCode::Char('h') | KeyCode::Left => app.move_horizontal(-1),
        KeyCode::Char('l') | KeyCode::Right => app.move_horizontal(1),
        KeyCode::Char('a') => {
            let lane = app.lane_under_cursor();
            app.open_new_task_form(&lane);
        }
        KeyCode::Char('c') => app.open_new_category_form(),
        KeyCode::Char('e') => app.open_edit_form(),
        KeyCode::Char('x') => app.toggle_selected(),
        KeyCode::Char('d') => app.request_delete(),
        KeyCode::Char('m') => app.open_context_menu(),
        _ => {}
    }
}

fn handle_confirm_key(app: &mut AppState, key: KeyEvent) {
    match key.code {
        KeyCode::Char('y') | KeyCode::Enter => app.confirm_delete(),
        KeyCode::Char('n') | KeyCode::Esc | KeyCode::Char('q') => app.delete_confirm = None,
        _ => {}
    }
}

fn handle_menu_key(app: &mut AppState, key: KeyEvent) {
    let items = app.menu_items();
    if items.is_empty() {
        app.session.close_menu();
        return;
    }
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => app.session.escape(),
        KeyCode::Char('j') | KeyCode::Down => {
            app.menu_cursor = (app.menu_cursor + 1) % items.len();
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.menu_cursor = (app.menu_cursor + items.len() - 1) % items.len();
        }
        KeyCode::Enter => {
            let action = items[app.menu_cursor].action;
            app.apply_menu_action(action);
        }
        _ => {}
    }
}

/// Any click dismisses the menu; nothing else responds to the mouse.
pub(crate) fn handle_mouse(app: &mut AppState, mouse: MouseEvent) -> bool {
    if let MouseEventKind::Down(_) = mouse.kind {
        if app.session.menu().is_some() {
            app.session.click_anywhere();
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use crossterm::event::{
        KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
    };
    use tempfile::tempdir;

    use perch_core::datastore::DataStore;
    use perch_core::session::Tab;
    use perch_core::store::Board;
    use perch_core::task::TaskDraft;

    use super::{handle_key, handle_mouse, AppState, Selection};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(app: &mut AppState, text: &str) {
        for ch in text.chars() {
            handle_key(app, key(KeyCode::Char(ch)));
        }
    }

    fn new_app() -> (tempfile::TempDir, AppState) {
        let dir = tempdir().expect("tempdir");
        let store = DataStore::open(dir.path()).expect("open datastore");
        (dir, AppState::new(Board::open(store)))
    }

    fn seed_task(app: &mut AppState, title: &str) -> String {
        let task = app
            .board
            .tasks
            .create(TaskDraft {
                title: title.to_string(),
                ..TaskDraft::default()
            })
            .expect("create")
            .expect("accepted");
        task.id.clone()
    }

    #[test]
    fn a_opens_a_form_and_enter_creates_the_task() {
        let (_dir, mut app) = new_app();
        handle_key(&mut app, key(KeyCode::Char('a')));
        assert!(app.form.is_some());

        type_text(&mut app, "write report");
        handle_key(&mut app, key(KeyCode::Enter));

        assert!(app.form.is_none());
        assert_eq!(app.board.tasks.all().len(), 1);
        assert_eq!(app.board.tasks.all()[0].title, "write report");
    }

    #[test]
    fn submit_without_title_keeps_the_form_open() {
        let (_dir, mut app) = new_app();
        handle_key(&mut app, key(KeyCode::Char('a')));
        handle_key(&mut app, key(KeyCode::Enter));

        let form = app.form.as_ref().expect("form stays open");
        assert_eq!(form.error(), Some("a title is required"));
        assert!(app.board.tasks.all().is_empty());
    }

    #[test]
    fn escape_cancels_the_edit_slot() {
        let (_dir, mut app) = new_app();
        seed_task(&mut app, "water plants");

        handle_key(&mut app, key(KeyCode::Char('j')));
        handle_key(&mut app, key(KeyCode::Char('e')));
        assert!(app.session.task_edit().is_some());

        handle_key(&mut app, key(KeyCode::Esc));
        assert!(app.form.is_none());
        assert!(app.session.task_edit().is_none());
    }

    #[test]
    fn typing_in_the_edit_form_updates_the_session_draft() {
        let (_dir, mut app) = new_app();
        seed_task(&mut app, "plan");

        handle_key(&mut app, key(KeyCode::Char('j')));
        handle_key(&mut app, key(KeyCode::Char('e')));
        type_text(&mut app, "ning");

        let (_, draft) = app.session.task_edit().expect("edit in flight");
        assert_eq!(draft.title, "planning");
    }

    #[test]
    fn x_toggles_completion_from_the_board() {
        let (_dir, mut app) = new_app();
        let id = seed_task(&mut app, "dishes");

        handle_key(&mut app, key(KeyCode::Char('j')));
        handle_key(&mut app, key(KeyCode::Char('x')));

        let task = app.board.tasks.get(&id).expect("task");
        assert!(task.completed);
    }

    #[test]
    fn delete_asks_for_confirmation_first() {
        let (_dir, mut app) = new_app();
        seed_task(&mut app, "old note");

        handle_key(&mut app, key(KeyCode::Char('j')));
        handle_key(&mut app, key(KeyCode::Char('d')));
        assert!(app.delete_confirm.is_some());
        assert_eq!(app.board.tasks.all().len(), 1, "nothing removed yet");

        handle_key(&mut app, key(KeyCode::Char('y')));
        assert!(app.delete_confirm.is_none());
        assert!(app.board.tasks.all().is_empty());
    }

    #[test]
    fn delete_confirmation_can_be_declined() {
        let (_dir, mut app) = new_app();
        seed_task(&mut app, "keep me");

        handle_key(&mut app, key(KeyCode::Char('j')));
        handle_key(&mut app, key(KeyCode::Char('d')));
        handle_key(&mut app, key(KeyCode::Char('n')));

        assert!(app.delete_confirm.is_none());
        assert_eq!(app.board.tasks.all().len(), 1);
    }

    #[test]
    fn menu_opens_on_the_selection_and_a_click_closes_it() {
        let (_dir, mut app) = new_app();
        seed_task(&mut app, "errand");

        handle_key(&mut app, key(KeyCode::Char('j')));
        handle_key(&mut app, key(KeyCode::Char('m')));
        assert!(app.session.menu().is_some());

        let click = MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: 0,
            row: 0,
            modifiers: KeyModifiers::NONE,
        };
        assert!(handle_mouse(&mut app, click));
        assert!(app.session.menu().is_none());
    }

    #[test]
    fn menu_enter_applies_the_highlighted_item() {
        let (_dir, mut app) = new_app();
        let id = seed_task(&mut app, "groceries");

        handle_key(&mut app, key(KeyCode::Char('j')));
        handle_key(&mut app, key(KeyCode::Char('m')));
        handle_key(&mut app, key(KeyCode::Enter));

        assert!(app.session.menu().is_none());
        let task = app.board.tasks.get(&id).expect("task");
        assert!(task.completed, "first item checks the task");
    }

    #[test]
    fn tab_and_digits_switch_views() {
        let (_dir, mut app) = new_app();
        assert_eq!(app.session.tab(), Tab::Board);

        handle_key(&mut app, key(KeyCode::Tab));
        assert_eq!(app.session.tab(), Tab::Active);

        handle_key(&mut app, key(KeyCode::Char('3')));
        assert_eq!(app.session.tab(), Tab::Checked);

        handle_key(&mut app, key(KeyCode::Char('1')));
        assert_eq!(app.session.tab(), Tab::Board);
    }

    #[test]
    fn lane_navigation_clamps_at_the_edges() {
        let (_dir, mut app) = new_app();
        app.board
            .categories
            .create("Work", None)
            .expect("create")
            .expect("id");
        app.board
            .categories
            .create("Home", None)
            .expect("create")
            .expect("id");

        handle_key(&mut app, key(KeyCode::Char('l')));
        assert_eq!(app.board_cursor.lane, 1);
        handle_key(&mut app, key(KeyCode::Char('l')));
        assert_eq!(app.board_cursor.lane, 1, "stays on the last lane");
        handle_key(&mut app, key(KeyCode::Char('h')));
        assert_eq!(app.board_cursor.lane, 0);
    }

    #[test]
    fn c_creates_a_category_through_the_form() {
        let (_dir, mut app) = new_app();
        handle_key(&mut app, key(KeyCode::Char('c')));
        type_text(&mut app, "Errands");
        handle_key(&mut app, key(KeyCode::Enter));

        assert!(app.form.is_none());
        let names: Vec<&str> = app
            .board
            .categories
            .all()
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(names, vec!["Errands"]);
    }

    #[test]
    fn e_on_a_lane_header_renames_the_category() {
        let (_dir, mut app) = new_app();
        app.board
            .categories
            .create("Work", None)
            .expect("create")
            .expect("id");

        handle_key(&mut app, key(KeyCode::Char('e')));
        assert!(app.session.category_edit().is_some());
        type_text(&mut app, "shop");
        handle_key(&mut app, key(KeyCode::Enter));

        assert_eq!(app.board.categories.all()[0].name, "Workshop");
        assert!(app.session.category_edit().is_none());
    }

    #[test]
    fn the_bucket_header_cannot_be_edited_or_deleted() {
        let (_dir, mut app) = new_app();
        seed_task(&mut app, "stray");

        assert_eq!(app.selection(), Selection::Bucket);
        handle_key(&mut app, key(KeyCode::Char('e')));
        assert!(app.form.is_none());
        handle_key(&mut app, key(KeyCode::Char('d')));
        assert!(app.delete_confirm.is_none());
    }

    #[test]
    fn deleting_a_category_detaches_its_tasks() {
        let (_dir, mut app) = new_app();
        let id = app
            .board
            .categories
            .create("Work", None)
            .expect("create")
            .expect("id");
        app.board
            .tasks
            .create(TaskDraft {
                title: "report".to_string(),
                category_id: id.clone(),
                ..TaskDraft::default()
            })
            .expect("create")
            .expect("accepted");

        handle_key(&mut app, key(KeyCode::Char('d')));
        handle_key(&mut app, key(KeyCode::Char('y')));

        assert!(app.board.categories.all().is_empty());
        assert_eq!(app.board.tasks.all()[0].category_id, "");
    }

    #[test]
    fn q_quits_outside_modals_but_not_inside_a_form() {
        let (_dir, mut app) = new_app();
        handle_key(&mut app, key(KeyCode::Char('a')));
        handle_key(&mut app, key(KeyCode::Char('q')));
        assert!(!app.should_quit, "q types into the title field");

        handle_key(&mut app, key(KeyCode::Esc));
        handle_key(&mut app, key(KeyCode::Char('q')));
        assert!(app.should_quit);
    }
}
