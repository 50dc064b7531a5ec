use chrono::NaiveDate;
use crossterm::event::{KeyCode, KeyEvent};

use perch_core::category::{self, Category, CategoryDraft};
use perch_core::datetime;
use perch_core::task::TaskDraft;

pub(crate) const TASK_TITLE: usize = 0;
pub(crate) const TASK_NOTES: usize = 1;
pub(crate) const TASK_ACTION: usize = 2;
pub(crate) const TASK_DEADLINE: usize = 3;
pub(crate) const TASK_CATEGORY: usize = 4;

pub(crate) const CATEGORY_NAME: usize = 0;
pub(crate) const CATEGORY_COLOR: usize = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum FormKind {
    NewTask,
    EditTask { id: String },
    NewCategory,
    EditCategory { id: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FieldKind {
    Text,
    Choice,
}

#[derive(Debug, Clone)]
pub(crate) struct FormField {
    pub(crate) label: &'static str,
    pub(crate) kind: FieldKind,
    pub(crate) value: String,
    /// `(stored value, display text)` pairs; only set on choice fields.
    pub(crate) choices: Vec<(String, String)>,
}

impl FormField {
    fn text(label: &'static str, value: &str) -> Self {
        Self {
            label,
            kind: FieldKind::Text,
            value: value.to_string(),
            choices: vec![],
        }
    }

    fn choice(label: &'static str, value: &str, choices: Vec<(String, String)>) -> Self {
        Self {
            label,
            kind: FieldKind::Choice,
            value: value.to_string(),
            choices,
        }
    }

    pub(crate) fn display(&self) -> &str {
        match self.kind {
            FieldKind::Text => &self.value,
            FieldKind::Choice => self
                .choices
                .iter()
                .find(|(value, _)| *value == self.value)
                .map(|(_, name)| name.as_str())
                .unwrap_or(&self.value),
        }
    }

    fn cycle(&mut self, delta: isize) {
        if self.choices.is_empty() {
            return;
        }
        let len = self.choices.len() as isize;
        let current = self
            .choices
            .iter()
            .position(|(value, _)| *value == self.value)
            .unwrap_or(0) as isize;
        let next = (current + delta).rem_euclid(len) as usize;
        self.value = self.choices[next].0.clone();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FormAction {
    None,
    Cancel,
    Submit,
}

/// A modal form over a fixed field list. Text fields take typed input;
/// choice fields cycle with the left/right arrows (or space).
#[derive(Debug, Clone)]
pub(crate) struct FormState {
    kind: FormKind,
    title: &'static str,
    fields: Vec<FormField>,
    active: usize,
    error: Option<String>,
}

impl FormState {
    pub(crate) fn new_task(categories: &[Category], category_id: &str) -> Self {
        let draft = TaskDraft {
            category_id: category_id.to_string(),
            ..TaskDraft::default()
        };
        Self {
            kind: FormKind::NewTask,
            title: "New task",
            fields: task_fields(&draft, categories),
            active: TASK_TITLE,
            error: None,
        }
    }

    pub(crate) fn edit_task(id: &str, draft: &TaskDraft, categories: &[Category]) -> Self {
        Self {
            kind: FormKind::EditTask { id: id.to_string() },
            title: "Edit task",
            fields: task_fields(draft, categories),
            active: TASK_TITLE,
            error: None,
        }
    }

    pub(crate) fn new_category(palette: &[String], color: &str) -> Self {
        let draft = CategoryDraft {
            name: String::new(),
            color: color.to_string(),
        };
        Self {
            kind: FormKind::NewCategory,
            title: "New category",
            fields: category_fields(&draft, palette),
            active: CATEGORY_NAME,
            error: None,
        }
    }

    pub(crate) fn edit_category(id: &str, draft: &CategoryDraft, palette: &[String]) -> Self {
        Self {
            kind: FormKind::EditCategory { id: id.to_string() },
            title: "Edit category",
            fields: category_fields(draft, palette),
            active: CATEGORY_NAME,
            error: None,
        }
    }

    pub(crate) fn kind(&self) -> &FormKind {
        &self.kind
    }

    pub(crate) fn title(&self) -> &'static str {
        self.title
    }

    pub(crate) fn fields(&self) -> &[FormField] {
        &self.fields
    }

    pub(crate) fn active_index(&self) -> usize {
        self.active
    }

    pub(crate) fn active_field(&self) -> &FormField {
        &self.fields[self.active]
    }

    pub(crate) fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub(crate) fn set_error(&mut self, message: String) {
        self.error = Some(message);
    }

    pub(crate) fn handle_key(&mut self, key: KeyEvent) -> FormAction {
        match key.code {
            KeyCode::Esc => return FormAction::Cancel,
            KeyCode::Enter => return FormAction::Submit,
            KeyCode::Tab | KeyCode::Down => self.focus_next(),
            KeyCode::BackTab | KeyCode::Up => self.focus_prev(),
            KeyCode::Left => self.fields[self.active].cycle(-1),
            KeyCode::Right => self.fields[self.active].cycle(1),
            KeyCode::Backspace => {
                let field = &mut self.fields[self.active];
                if field.kind == FieldKind::Text {
                    field.value.pop();
                    self.error = None;
                }
            }
            KeyCode::Char(ch) => {
                let field = &mut self.fields[self.active];
                match field.kind {
                    FieldKind::Text => {
                        field.value.push(ch);
                        self.error = None;
                    }
                    FieldKind::Choice if ch == ' ' => field.cycle(1),
                    FieldKind::Choice => {}
                }
            }
            _ => {}
        }
        FormAction::None
    }

    fn focus_next(&mut self) {
        self.active = (self.active + 1) % self.fields.len();
    }

    fn focus_prev(&mut self) {
        self.active = (self.active + self.fields.len() - 1) % self.fields.len();
    }

    /// Validates and extracts a task draft; date expressions are resolved
    /// against `today` the same way the command line resolves them.
    pub(crate) fn task_draft(&self, today: NaiveDate) -> Result<TaskDraft, String> {
        let title = self.fields[TASK_TITLE].value.trim().to_string();
        if title.is_empty() {
            return Err("a title is required".to_string());
        }
        let recommended_date = resolve_date(&self.fields[TASK_ACTION].value, today)?;
        let deadline = resolve_date(&self.fields[TASK_DEADLINE].value, today)?;
        Ok(TaskDraft {
            title,
            notes: self.fields[TASK_NOTES].value.trim().to_string(),
            recommended_date,
            deadline,
            category_id: self.fields[TASK_CATEGORY].value.clone(),
        })
    }

    pub(crate) fn category_draft(&self) -> Result<CategoryDraft, String> {
        let name = self.fields[CATEGORY_NAME].value.trim().to_string();
        if name.is_empty() {
            return Err("a name is required".to_string());
        }
        let color = self.fields[CATEGORY_COLOR].value.clone();
        if category::parse_hex_color(&color).is_none() {
            return Err(format!("not a hex color: {color}"));
        }
        Ok(CategoryDraft { name, color })
    }

    /// Mirrors the raw field values into a session draft, dates left
    /// unresolved. Keeps the edit slot in step with what is on screen.
    pub(crate) fn write_task_draft(&self, draft: &mut TaskDraft) {
        draft.title = self.fields[TASK_TITLE].value.clone();
        draft.notes = self.fields[TASK_NOTES].value.clone();
        draft.recommended_date = self.fields[TASK_ACTION].value.clone();
        draft.deadline = self.fields[TASK_DEADLINE].value.clone();
        draft.category_id = self.fields[TASK_CATEGORY].value.clone();
    }

    pub(crate) fn write_category_draft(&self, draft: &mut CategoryDraft) {
        draft.name = self.fields[CATEGORY_NAME].value.clone();
        draft.color = self.fields[CATEGORY_COLOR].value.clone();
    }
}

fn resolve_date(raw: &str, today: NaiveDate) -> Result<String, String> {
    datetime::parse_date_arg(raw, today).map_err(|err| err.to_string())
}

fn task_fields(draft: &TaskDraft, categories: &[Category]) -> Vec<FormField> {
    let mut lanes = vec![(String::new(), category::UNCATEGORIZED_NAME.to_string())];
    lanes.extend(categories.iter().map(|c| (c.id.clone(), c.name.clone())));

    vec![
        FormField::text("Title", &draft.title),
        FormField::text("Notes", &draft.notes),
        FormField::text("Action", &draft.recommended_date),
        FormField::text("Deadline", &draft.deadline),
        FormField::choice("Category", &draft.category_id, lanes),
    ]
}

fn category_fields(draft: &CategoryDraft, palette: &[String]) -> Vec<FormField> {
    let mut colors: Vec<(String, String)> = Vec::new();
    if !draft.color.is_empty() && !palette.contains(&draft.color) {
        colors.push((draft.color.clone(), draft.color.clone()));
    }
    colors.extend(palette.iter().map(|hex| (hex.clone(), hex.clone())));

    vec![
        FormField::text("Name", &draft.name),
        FormField::choice("Color", &draft.color, colors),
    ]
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    use perch_core::category::{Category, CategoryDraft, PALETTE};
    use perch_core::task::TaskDraft;

    use super::{FormAction, FormState, TASK_CATEGORY, TASK_DEADLINE};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(form: &mut FormState, text: &str) {
        for ch in text.chars() {
            form.handle_key(key(KeyCode::Char(ch)));
        }
    }

    fn categories() -> Vec<Category> {
        vec![
            Category {
                id: "work".to_string(),
                name: "Work".to_string(),
                color: "#0ea5e9".to_string(),
            },
            Category {
                id: "home".to_string(),
                name: "Home".to_string(),
                color: "#f97316".to_string(),
            },
        ]
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 2).expect("valid date")
    }

    #[test]
    fn typing_lands_in_the_active_field() {
        let mut form = FormState::new_task(&categories(), "");
        type_text(&mut form, "write report");
        form.handle_key(key(KeyCode::Tab));
        type_text(&mut form, "for friday");

        let draft = form.task_draft(today()).expect("valid draft");
        assert_eq!(draft.title, "write report");
        assert_eq!(draft.notes, "for friday");
    }

    #[test]
    fn blank_title_is_rejected() {
        let form = FormState::new_task(&categories(), "");
        let err = form.task_draft(today()).expect_err("blank title");
        assert_eq!(err, "a title is required");
    }

    #[test]
    fn date_expressions_resolve_on_submit() {
        let mut form = FormState::new_task(&categories(), "");
        type_text(&mut form, "pay rent");
        while form.active_index() != TASK_DEADLINE {
            form.handle_key(key(KeyCode::Tab));
        }
        type_text(&mut form, "+2d");

        let draft = form.task_draft(today()).expect("valid draft");
        assert_eq!(draft.deadline, "2026-03-04");
        assert_eq!(draft.recommended_date, "");
    }

    #[test]
    fn bad_date_expression_surfaces_as_error() {
        let mut form = FormState::new_task(&categories(), "");
        type_text(&mut form, "pay rent");
        while form.active_index() != TASK_DEADLINE {
            form.handle_key(key(KeyCode::Tab));
        }
        type_text(&mut form, "whenever");

        assert!(form.task_draft(today()).is_err());
    }

    #[test]
    fn category_choice_cycles_and_wraps() {
        let mut form = FormState::new_task(&categories(), "work");
        while form.active_index() != TASK_CATEGORY {
            form.handle_key(key(KeyCode::Tab));
        }
        assert_eq!(form.active_field().display(), "Work");

        form.handle_key(key(KeyCode::Right));
        assert_eq!(form.active_field().display(), "Home");
        form.handle_key(key(KeyCode::Right));
        assert_eq!(form.active_field().display(), "No category");

        form.handle_key(key(KeyCode::Left));
        assert_eq!(form.fields()[TASK_CATEGORY].value, "home");
    }

    #[test]
    fn escape_cancels_and_enter_submits() {
        let mut form = FormState::new_task(&categories(), "");
        assert_eq!(form.handle_key(key(KeyCode::Esc)), FormAction::Cancel);
        assert_eq!(form.handle_key(key(KeyCode::Enter)), FormAction::Submit);
    }

    #[test]
    fn new_category_form_offers_the_palette() {
        let palette: Vec<String> = PALETTE.iter().map(|hex| hex.to_string()).collect();
        let mut form = FormState::new_category(&palette, &palette[1]);
        type_text(&mut form, "Errands");
        form.handle_key(key(KeyCode::Tab));
        form.handle_key(key(KeyCode::Right));

        let draft = form.category_draft().expect("valid draft");
        assert_eq!(draft.name, "Errands");
        assert_eq!(draft.color, palette[2]);
    }

    #[test]
    fn off_palette_color_stays_selectable_when_editing() {
        let palette: Vec<String> = PALETTE.iter().map(|hex| hex.to_string()).collect();
        let draft = CategoryDraft {
            name: "Work".to_string(),
            color: "#123456".to_string(),
        };
        let form = FormState::edit_category("work", &draft, &palette);
        let out = form.category_draft().expect("valid draft");
        assert_eq!(out.color, "#123456");
    }

    #[test]
    fn write_through_keeps_raw_values() {
        let mut form = FormState::new_task(&categories(), "");
        type_text(&mut form, "t");
        while form.active_index() != TASK_DEADLINE {
            form.handle_key(key(KeyCode::Tab));
        }
        type_text(&mut form, "tomorrow");

        let mut draft = TaskDraft::default();
        form.write_task_draft(&mut draft);
        assert_eq!(draft.deadline, "tomorrow", "unresolved until submit");
    }
}
