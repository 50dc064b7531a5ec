use crate::category::{Category, CategoryDraft};
use crate::task::{Task, TaskDraft};

/// The three views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Board,
    Active,
    Checked,
}

impl Tab {
    pub const ALL: [Tab; 3] = [Tab::Board, Tab::Active, Tab::Checked];

    pub fn title(self) -> &'static str {
        match self {
            Tab::Board => "Board",
            Tab::Active => "Active",
            Tab::Checked => "Checked",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuTarget {
    Task(String),
    Category(String),
}

/// Open context menu: screen position plus the record it points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextMenu {
    pub x: u16,
    pub y: u16,
    pub target: MenuTarget,
}

/// Transient per-run UI state. Nothing here persists; closing the program
/// discards drafts and menu state while the stores stay durable.
///
/// Each entity kind has a single edit slot (id plus draft copy), so at most
/// one task and one category can be mid-edit, and starting an edit on one
/// kind leaves the other kind's slot alone.
#[derive(Debug, Default)]
pub struct Session {
    tab: Tab,
    task_edit: Option<(String, TaskDraft)>,
    category_edit: Option<(String, CategoryDraft)>,
    menu: Option<ContextMenu>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tab(&self) -> Tab {
        self.tab
    }

    pub fn set_tab(&mut self, tab: Tab) {
        self.tab = tab;
    }

    pub fn menu(&self) -> Option<&ContextMenu> {
        self.menu.as_ref()
    }

    pub fn open_menu(&mut self, x: u16, y: u16, target: MenuTarget) {
        self.menu = Some(ContextMenu { x, y, target });
    }

    pub fn close_menu(&mut self) {
        self.menu = None;
    }

    /// Escape closes the menu and nothing else; edits are cancelled
    /// explicitly.
    pub fn escape(&mut self) {
        self.menu = None;
    }

    /// Any click outside the menu dismisses it.
    pub fn click_anywhere(&mut self) {
        self.menu = None;
    }

    /// Copies the record into the task edit slot, replacing whatever edit
    /// was in flight for this kind, and closes the menu that triggered it.
    pub fn begin_task_edit(&mut self, task: &Task) {
        self.task_edit = Some((task.id.clone(), task.draft()));
        self.menu = None;
    }

    pub fn task_edit(&self) -> Option<(&str, &TaskDraft)> {
        self.task_edit.as_ref().map(|(id, draft)| (id.as_str(), draft))
    }

    pub fn task_draft_mut(&mut self) -> Option<&mut TaskDraft> {
        self.task_edit.as_mut().map(|(_, draft)| draft)
    }

    /// Hands the finished edit to the caller (who applies it to the store)
    /// and clears the slot.
    pub fn take_task_edit(&mut self) -> Option<(String, TaskDraft)> {
        self.task_edit.take()
    }

    pub fn cancel_task_edit(&mut self) {
        self.task_edit = None;
    }

    pub fn begin_category_edit(&mut self, category: &Category) {
        self.category_edit = Some((category.id.clone(), category.draft()));
        self.menu = None;
    }

    pub fn category_edit(&self) -> Option<(&str, &CategoryDraft)> {
        self.category_edit
            .as_ref()
            .map(|(id, draft)| (id.as_str(), draft))
    }

    pub fn category_draft_mut(&mut self) -> Option<&mut CategoryDraft> {
        self.category_edit.as_mut().map(|(_, draft)| draft)
    }

    pub fn take_category_edit(&mut self) -> Option<(String, CategoryDraft)> {
        self.category_edit.take()
    }

    pub fn cancel_category_edit(&mut self) {
        self.category_edit = None;
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::{MenuTarget, Session, Tab};
    use crate::category::Category;
    use crate::task::{Task, TaskDraft};

    fn sample_task(id: &str, title: &str) -> Task {
        Task::new(
            TaskDraft {
                title: title.to_string(),
                ..TaskDraft::default()
            },
            Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0)
                .single()
                .expect("valid timestamp"),
            id.to_string(),
        )
    }

    #[test]
    fn escape_and_clicks_close_the_menu() {
        let mut session = Session::new();
        session.open_menu(4, 7, MenuTarget::Task("t1".to_string()));
        assert!(session.menu().is_some());
        session.escape();
        assert!(session.menu().is_none());

        session.open_menu(4, 7, MenuTarget::Category("work".to_string()));
        session.click_anywhere();
        assert!(session.menu().is_none());
    }

    #[test]
    fn task_edit_slot_holds_one_draft_at_a_time() {
        let mut session = Session::new();
        session.begin_task_edit(&sample_task("t1", "first"));
        session.begin_task_edit(&sample_task("t2", "second"));

        let (id, draft) = session.task_edit().expect("edit in flight");
        assert_eq!(id, "t2");
        assert_eq!(draft.title, "second");

        let taken = session.take_task_edit().expect("take edit");
        assert_eq!(taken.0, "t2");
        assert!(session.task_edit().is_none());
    }

    #[test]
    fn edit_slots_are_independent_per_kind() {
        let mut session = Session::new();
        session.begin_task_edit(&sample_task("t1", "task"));
        session.begin_category_edit(&Category {
            id: "work".to_string(),
            name: "Work".to_string(),
            color: "#0ea5e9".to_string(),
        });

        assert!(session.task_edit().is_some());
        assert!(session.category_edit().is_some());

        session.cancel_category_edit();
        assert!(session.task_edit().is_some(), "task edit survives");
    }

    #[test]
    fn starting_an_edit_closes_the_menu() {
        let mut session = Session::new();
        session.open_menu(1, 1, MenuTarget::Task("t1".to_string()));
        session.begin_task_edit(&sample_task("t1", "task"));
        assert!(session.menu().is_none());
    }

    #[test]
    fn tabs_switch_without_touching_edits() {
        let mut session = Session::new();
        session.begin_task_edit(&sample_task("t1", "task"));
        session.set_tab(Tab::Checked);
        assert_eq!(session.tab(), Tab::Checked);
        assert!(session.task_edit().is_some());
    }
}
