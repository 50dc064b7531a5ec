use chrono::NaiveDate;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::Frame;

use perch_core::category::parse_hex_color;
use perch_core::datetime::{is_overdue, relative_label};
use perch_core::render::short_id;
use perch_core::session::{ContextMenu, MenuTarget, Tab};
use perch_core::task::Task;
use perch_core::views::{self, Lane};

use crate::app::{AppState, DeleteConfirmState, StatusKind};
use crate::form::{FieldKind, FormState};

const LANE_MIN_WIDTH: u16 = 24;
const CARD_ROWS: usize = 2;
const ID_WIDTH: usize = 8;
const CATEGORY_WIDTH: usize = 14;
const DATE_WIDTH: usize = 16;
const FORM_LABEL_WIDTH: usize = 10;

const COLOR_TEXT: Color = Color::Rgb(229, 231, 235);
const COLOR_MUTED: Color = Color::Rgb(156, 163, 175);
const COLOR_MUTED_DARK: Color = Color::Rgb(107, 114, 128);
const COLOR_BG_MUTED: Color = Color::Rgb(55, 60, 66);
const COLOR_INFO: Color = Color::Rgb(125, 196, 228);
const COLOR_WARNING: Color = Color::Rgb(250, 204, 21);
const COLOR_ERROR: Color = Color::Rgb(248, 113, 113);
const COLOR_SUCCESS: Color = Color::Rgb(134, 239, 172);
const COLOR_ACCENT: Color = Color::Rgb(96, 165, 250);

pub(crate) fn render(frame: &mut Frame, app: &AppState) {
    let area = frame.size();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(1),
                Constraint::Min(0),
                Constraint::Length(3),
            ]
            .as_ref(),
        )
        .split(area);
    let tabs = chunks[0];
    let main = chunks[1];
    let footer = chunks[2];

    render_tabs(frame, app, tabs);
    match app.session.tab() {
        Tab::Board => render_board(frame, app, main),
        Tab::Active => render_task_table(frame, app, main, false),
        Tab::Checked => render_task_table(frame, app, main, true),
    }
    render_footer(frame, app, footer);

    if let Some(form) = app.form.as_ref() {
        render_form_modal(frame, area, form);
    }
    if let Some(menu) = app.session.menu() {
        render_context_menu(frame, area, app, menu);
    }
    if let Some(confirm) = app.delete_confirm.as_ref() {
        render_delete_confirm_modal(frame, area, confirm);
    }
}

fn render_tabs(frame: &mut Frame, app: &AppState, area: Rect) {
    let totals = views::totals(app.board.tasks.all());
    let active = totals.all - totals.completed;
    let tabs = vec![
        ("1 Board", Tab::Board, active, COLOR_INFO),
        ("2 Active", Tab::Active, active, COLOR_ACCENT),
        ("3 Checked", Tab::Checked, totals.completed, COLOR_SUCCESS),
    ];

    let current = app.session.tab();
    let mut spans = Vec::new();
    for (idx, (label, tab, count, color)) in tabs.into_iter().enumerate() {
        if idx > 0 {
            spans.push(Span::styled("  ", Style::default().fg(COLOR_MUTED_DARK)));
        }
        let text = format!("{label} ({count})");
        let style = if tab == current {
            Style::default()
                .fg(color)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(COLOR_MUTED)
        };
        spans.push(Span::styled(text, style));
    }

    let widget = Paragraph::new(Line::from(spans));
    frame.render_widget(widget, area);
}

fn render_board(frame: &mut Frame, app: &AppState, area: Rect) {
    let view = app.board.view();
    if view.lanes.is_empty() {
        let hint = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(
                "The board is empty.",
                Style::default().fg(COLOR_MUTED),
            )),
            Line::from(Span::styled(
                "a adds a task, c adds a category.",
                Style::default().fg(COLOR_MUTED_DARK),
            )),
        ])
        .alignment(Alignment::Center);
        frame.render_widget(hint, area);
        return;
    }

    let fit = lane_fit(area.width, view.lanes.len());
    let (start, end) = list_window(view.lanes.len(), Some(app.board_cursor.lane), fit);
    let visible = &view.lanes[start..end];
    let constraints: Vec<Constraint> = visible
        .iter()
        .map(|_| Constraint::Ratio(1, visible.len() as u32))
        .collect();
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(constraints)
        .split(area);

    for (offset, lane) in visible.iter().enumerate() {
        render_lane(frame, app, columns[offset], lane, start + offset);
    }
}

fn render_lane(frame: &mut Frame, app: &AppState, area: Rect, lane: &Lane, lane_index: usize) {
    let lane_selected = app.board_cursor.lane == lane_index;
    let header_selected = lane_selected && app.board_cursor.card.is_none();
    let accent = lane_color(&lane.color);

    let mut title_style = Style::default().fg(accent).add_modifier(Modifier::BOLD);
    if header_selected {
        title_style = title_style.add_modifier(Modifier::REVERSED);
    }
    let border_style = if lane_selected {
        Style::default().fg(accent)
    } else {
        Style::default().fg(COLOR_BG_MUTED)
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(Span::styled(
            format!(" {} ({}) ", lane.name, lane.tasks.len()),
            title_style,
        ));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if lane.tasks.is_empty() {
        let hint = Paragraph::new(Line::from(Span::styled(
            "No tasks",
            Style::default().fg(COLOR_MUTED_DARK),
        )));
        frame.render_widget(hint, inner);
        return;
    }

    let visible_cards = (inner.height as usize / CARD_ROWS).max(1);
    let selected_card = if lane_selected {
        app.board_cursor.card
    } else {
        None
    };
    let (start, end) = list_window(lane.tasks.len(), selected_card, visible_cards);

    let width = inner.width as usize;
    let mut lines: Vec<Line<'static>> = Vec::new();
    for (offset, task) in lane.tasks[start..end].iter().enumerate() {
        let selected = selected_card == Some(start + offset);
        lines.push(card_title_line(task, width, selected));
        lines.push(card_meta_line(task, app.today));
    }
    frame.render_widget(Paragraph::new(lines), inner);
}

fn card_title_line(task: &Task, width: usize, selected: bool) -> Line<'static> {
    let mut style = Style::default().fg(COLOR_TEXT);
    if selected {
        style = style.add_modifier(Modifier::REVERSED);
    }
    Line::from(Span::styled(pad_text(&task.title, width), style))
}

fn card_meta_line(task: &Task, today: NaiveDate) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();

    let action = relative_label(&task.recommended_date, today);
    if !action.is_empty() {
        spans.push(Span::styled(
            format!("  action: {action}"),
            Style::default().fg(COLOR_INFO),
        ));
    }

    let deadline = relative_label(&task.deadline, today);
    if !deadline.is_empty() {
        let style = if is_overdue(&task.deadline, today) {
            Style::default().fg(COLOR_ERROR).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(COLOR_WARNING)
        };
        spans.push(Span::styled(format!("  deadline: {deadline}"), style));
    }

    if spans.is_empty() {
        return Line::from("");
    }
    Line::from(spans)
}

fn render_task_table(frame: &mut Frame, app: &AppState, area: Rect, completed: bool) {
    let all = app.board.tasks.all();
    let (tasks, title, empty_hint, cursor) = if completed {
        (
            views::completed_tasks(all),
            "Checked",
            "Nothing checked yet",
            app.checked_cursor,
        )
    } else {
        (
            views::active_tasks(all),
            "Active",
            "No active tasks",
            app.active_cursor,
        )
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(COLOR_BG_MUTED))
        .title(Span::styled(
            format!(" {} ({}) ", title, tasks.len()),
            Style::default().fg(COLOR_TEXT).add_modifier(Modifier::BOLD),
        ));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if tasks.is_empty() {
        let hint = Paragraph::new(Line::from(Span::styled(
            empty_hint,
            Style::default().fg(COLOR_MUTED_DARK),
        )));
        frame.render_widget(hint, inner);
        return;
    }

    let width = inner.width as usize;
    let mut lines: Vec<Line<'static>> = vec![table_header(width)];
    let height = (inner.height as usize).saturating_sub(1).max(1);
    let (start, end) = list_window(tasks.len(), Some(cursor), height);
    for (offset, task) in tasks[start..end].iter().enumerate() {
        lines.push(table_row(task, app, width, cursor == start + offset));
    }
    frame.render_widget(Paragraph::new(lines), inner);
}

fn title_column_width(width: usize) -> usize {
    width
        .saturating_sub(ID_WIDTH + CATEGORY_WIDTH + 2 * DATE_WIDTH + 8)
        .max(8)
}

fn table_header(width: usize) -> Line<'static> {
    let style = Style::default().fg(COLOR_MUTED_DARK);
    let text = format!(
        "{}  {}  {}  {}  {}",
        pad_text("ID", ID_WIDTH),
        pad_text("Title", title_column_width(width)),
        pad_text("Category", CATEGORY_WIDTH),
        pad_text("Action", DATE_WIDTH),
        pad_text("Deadline", DATE_WIDTH),
    );
    Line::from(Span::styled(text, style))
}

fn table_row(task: &Task, app: &AppState, width: usize, selected: bool) -> Line<'static> {
    let category = app.board.categories.get(&task.category_id);
    let category_name = category.map(|c| c.name.as_str()).unwrap_or("-");
    let category_color = category
        .map(|c| lane_color(&c.color))
        .unwrap_or(COLOR_MUTED_DARK);

    let deadline_style = if !task.deadline.is_empty() && is_overdue(&task.deadline, app.today) {
        Style::default().fg(COLOR_ERROR).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(COLOR_WARNING)
    };

    let mut spans = vec![
        Span::styled(
            format!("{}  ", pad_text(short_id(&task.id), ID_WIDTH)),
            Style::default().fg(COLOR_MUTED),
        ),
        Span::styled(
            format!("{}  ", pad_text(&task.title, title_column_width(width))),
            Style::default().fg(COLOR_TEXT),
        ),
        Span::styled(
            format!("{}  ", pad_text(category_name, CATEGORY_WIDTH)),
            Style::default().fg(category_color),
        ),
        Span::styled(
            format!(
                "{}  ",
                pad_text(&date_cell(&task.recommended_date, app.today), DATE_WIDTH)
            ),
            Style::default().fg(COLOR_INFO),
        ),
        Span::styled(
            pad_text(&date_cell(&task.deadline, app.today), DATE_WIDTH),
            deadline_style,
        ),
    ];

    if selected {
        for span in &mut spans {
            span.style = span.style.add_modifier(Modifier::REVERSED);
        }
    }
    Line::from(spans)
}

fn date_cell(value: &str, today: NaiveDate) -> String {
    let label = relative_label(value, today);
    if label.is_empty() {
        "-".to_string()
    } else {
        label
    }
}

fn render_footer(frame: &mut Frame, app: &AppState, area: Rect) {
    let hint_span = Span::styled(app.footer_hint(), Style::default().fg(COLOR_INFO));
    let line = if let Some((status, kind)) = app.status_line() {
        let status_style = match kind {
            StatusKind::Error => Style::default()
                .fg(COLOR_ERROR)
                .add_modifier(Modifier::BOLD),
            StatusKind::Info => Style::default().fg(COLOR_WARNING),
        };
        Line::from(vec![
            hint_span,
            Span::raw("  |  "),
            Span::styled(status, status_style),
        ])
    } else {
        Line::from(hint_span)
    };
    let totals_line = Line::from(Span::styled(
        app.totals_summary(),
        Style::default().fg(COLOR_ACCENT),
    ));
    let widget = Paragraph::new(vec![line, totals_line])
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::TOP)
                .border_style(Style::default().fg(COLOR_BG_MUTED)),
        );
    frame.render_widget(widget, area);
}

fn render_form_modal(frame: &mut Frame, area: Rect, form: &FormState) {
    let content_width = 46u16.min(area.width.saturating_sub(4)).max(20);
    let height = (form.fields().len() as u16 + 4).min(area.height.saturating_sub(2));
    let modal = centered_rect(content_width, height, area);
    frame.render_widget(Clear, modal);

    let value_width = (content_width as usize).saturating_sub(FORM_LABEL_WIDTH + 6);
    let mut lines: Vec<Line<'static>> = Vec::new();
    for (idx, field) in form.fields().iter().enumerate() {
        let active = idx == form.active_index();
        let marker = if active { "> " } else { "  " };
        let label = pad_text(field.label, FORM_LABEL_WIDTH);

        let mut value = truncate_text(field.display(), value_width);
        if field.kind == FieldKind::Choice {
            value = format!("< {value} >");
        }
        let mut value_style = if field.label == "Color" {
            Style::default().fg(lane_color(&field.value))
        } else {
            Style::default().fg(COLOR_TEXT)
        };
        if active {
            value_style = value_style.add_modifier(Modifier::REVERSED);
        }

        lines.push(Line::from(vec![
            Span::styled(marker.to_string(), Style::default().fg(COLOR_ACCENT)),
            Span::styled(label, Style::default().fg(COLOR_MUTED_DARK)),
            Span::styled(value, value_style),
        ]));
    }
    lines.push(Line::from(""));
    if let Some(error) = form.error() {
        lines.push(Line::from(Span::styled(
            error.to_string(),
            Style::default().fg(COLOR_ERROR).add_modifier(Modifier::BOLD),
        )));
    } else {
        lines.push(Line::from(Span::styled(
            "enter save  esc cancel",
            Style::default().fg(COLOR_MUTED_DARK),
        )));
    }

    let widget = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(COLOR_ACCENT))
            .title(form.title()),
    );
    frame.render_widget(widget, modal);
}

fn render_context_menu(frame: &mut Frame, area: Rect, app: &AppState, menu: &ContextMenu) {
    let items = app.menu_items();
    if items.is_empty() {
        return;
    }
    let label_width = items.iter().map(|item| item.label.len()).max().unwrap_or(0);
    let width = (label_width as u16 + 4).min(area.width);
    let height = (items.len() as u16 + 2).min(area.height);
    let x = menu.x.min(area.right().saturating_sub(width)).max(area.x);
    let y = menu.y.min(area.bottom().saturating_sub(height)).max(area.y);
    let popup = Rect::new(x, y, width, height);
    frame.render_widget(Clear, popup);

    let mut lines = Vec::new();
    for (idx, item) in items.iter().enumerate() {
        let mut style = Style::default().fg(COLOR_TEXT);
        if idx == app.menu_cursor {
            style = style.add_modifier(Modifier::REVERSED);
        }
        lines.push(Line::from(Span::styled(
            pad_text(item.label, (width as usize).saturating_sub(2)),
            style,
        )));
    }
    let widget = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(COLOR_ACCENT)),
    );
    frame.render_widget(widget, popup);
}

fn render_delete_confirm_modal(frame: &mut Frame, area: Rect, confirm: &DeleteConfirmState) {
    let content_width = area.width.saturating_sub(8).min(52).max(20);
    let height = 7u16.min(area.height.saturating_sub(2));
    let modal = centered_rect(content_width, height, area);
    frame.render_widget(Clear, modal);

    let (question, note) = match &confirm.target {
        MenuTarget::Task(_) => ("Delete task?", None),
        MenuTarget::Category(_) => (
            "Delete category?",
            Some("Its tasks are kept and go uncategorized."),
        ),
    };

    let label_width = (content_width as usize).saturating_sub(4);
    let mut lines: Vec<Line<'static>> = vec![
        Line::from(Span::styled(
            question,
            Style::default().fg(COLOR_ERROR).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            truncate_text(&confirm.label, label_width),
            Style::default().fg(COLOR_TEXT),
        )),
    ];
    if let Some(note) = note {
        lines.push(Line::from(Span::styled(
            note,
            Style::default().fg(COLOR_WARNING),
        )));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "y confirm  esc cancel",
        Style::default().fg(COLOR_MUTED_DARK),
    )));

    let widget = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(COLOR_ERROR)),
    );
    frame.render_widget(widget, modal);
}

/// Screen position of the current selection, mirroring the layout math the
/// renderer uses. The context menu opens one row below it.
pub(crate) fn selection_position(app: &AppState, area: Rect) -> Option<(u16, u16)> {
    if area.width == 0 || area.height == 0 {
        return None;
    }
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(1),
                Constraint::Min(0),
                Constraint::Length(3),
            ]
            .as_ref(),
        )
        .split(area);
    let main = chunks[1];
    if main.height == 0 {
        return None;
    }

    match app.session.tab() {
        Tab::Board => {
            let view = app.board.view();
            if view.lanes.is_empty() {
                return None;
            }
            let fit = lane_fit(main.width, view.lanes.len());
            let (start, end) = list_window(view.lanes.len(), Some(app.board_cursor.lane), fit);
            let lane_index = app.board_cursor.lane.clamp(start, end.saturating_sub(1));
            let visible = end - start;
            let columns = Layout::default()
                .direction(Direction::Horizontal)
                .constraints(vec![Constraint::Ratio(1, visible as u32); visible])
                .split(main);
            let column = columns[lane_index - start];

            match app.board_cursor.card {
                None => Some((column.x.saturating_add(2), column.y.saturating_add(1))),
                Some(card) => {
                    let lane = view.lanes.get(lane_index)?;
                    let visible_cards = (column.height.saturating_sub(2) as usize / CARD_ROWS).max(1);
                    let (card_start, _) = list_window(lane.tasks.len(), Some(card), visible_cards);
                    let row = card.checked_sub(card_start)?;
                    let y = column.y + 1 + (row * CARD_ROWS) as u16 + 1;
                    Some((
                        column.x.saturating_add(2),
                        y.min(area.bottom().saturating_sub(1)),
                    ))
                }
            }
        }
        Tab::Active | Tab::Checked => {
            let all = app.board.tasks.all();
            let (len, cursor) = match app.session.tab() {
                Tab::Active => (views::active_tasks(all).len(), app.active_cursor),
                _ => (views::completed_tasks(all).len(), app.checked_cursor),
            };
            if len == 0 {
                return None;
            }
            let height = (main.height as usize).saturating_sub(3).max(1);
            let (start, _) = list_window(len, Some(cursor), height);
            let row = cursor.checked_sub(start)?;
            let y = main.y + 2 + row as u16 + 1;
            Some((
                main.x.saturating_add(2),
                y.min(area.bottom().saturating_sub(1)),
            ))
        }
    }
}

fn lane_fit(width: u16, total: usize) -> usize {
    let fit = (width / LANE_MIN_WIDTH).max(1) as usize;
    fit.min(total.max(1))
}

fn lane_color(hex: &str) -> Color {
    match parse_hex_color(hex) {
        Some((r, g, b)) => Color::Rgb(r, g, b),
        None => COLOR_ACCENT,
    }
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width.saturating_sub(2));
    let height = height.min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

fn list_window(total: usize, selected: Option<usize>, height: usize) -> (usize, usize) {
    if total == 0 || height == 0 {
        return (0, 0);
    }
    if total <= height {
        return (0, total);
    }
    let selected = selected.unwrap_or(0);
    let mut start = selected.saturating_sub(height / 2);
    if start + height > total {
        start = total - height;
    }
    (start, start + height)
}

fn pad_text(value: &str, width: usize) -> String {
    let mut text = value.to_string();
    if text.chars().count() > width {
        text = truncate_text(&text, width);
    }
    let len = text.chars().count();
    if len < width {
        text.push_str(&" ".repeat(width - len));
    }
    text
}

fn truncate_text(value: &str, max: usize) -> String {
    if max == 0 {
        return String::new();
    }
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= max {
        return value.to_string();
    }
    if max <= 3 {
        return chars[..max].iter().collect();
    }
    let mut out: String = chars[..(max - 3)].iter().collect();
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use ratatui::layout::Rect;
    use tempfile::tempdir;

    use perch_core::datastore::DataStore;
    use perch_core::store::Board;
    use perch_core::task::TaskDraft;

    use super::{centered_rect, lane_fit, list_window, pad_text, selection_position, truncate_text};
    use crate::app::AppState;

    #[test]
    fn list_window_centers_the_selection() {
        assert_eq!(list_window(10, Some(5), 4), (3, 7));
        assert_eq!(list_window(10, Some(0), 4), (0, 4));
        assert_eq!(list_window(10, Some(9), 4), (6, 10));
        assert_eq!(list_window(3, Some(2), 10), (0, 3));
        assert_eq!(list_window(0, None, 4), (0, 0));
    }

    #[test]
    fn truncate_marks_cut_text() {
        assert_eq!(truncate_text("short", 10), "short");
        assert_eq!(truncate_text("a longer title", 10), "a longe...");
        assert_eq!(truncate_text("abc", 2), "ab");
    }

    #[test]
    fn pad_fills_to_width() {
        assert_eq!(pad_text("ab", 4), "ab  ");
        assert_eq!(pad_text("abcdef", 4), "abcd");
    }

    #[test]
    fn centered_rect_stays_inside_the_area() {
        let area = Rect::new(0, 0, 80, 24);
        let modal = centered_rect(40, 10, area);
        assert_eq!(modal.width, 40);
        assert_eq!(modal.height, 10);
        assert_eq!(modal.x, 20);
        assert_eq!(modal.y, 7);

        let tiny = centered_rect(100, 100, Rect::new(0, 0, 10, 6));
        assert!(tiny.width <= 10);
        assert!(tiny.height <= 6);
    }

    #[test]
    fn lane_fit_never_exceeds_the_lane_count() {
        assert_eq!(lane_fit(80, 2), 2);
        assert_eq!(lane_fit(80, 5), 3);
        assert_eq!(lane_fit(10, 5), 1);
        assert_eq!(lane_fit(80, 0), 1);
    }

    #[test]
    fn selection_position_lands_inside_the_viewport() {
        let dir = tempdir().expect("tempdir");
        let store = DataStore::open(dir.path()).expect("open datastore");
        let mut app = AppState::new(Board::open(store));
        app.board
            .tasks
            .create(TaskDraft {
                title: "card".to_string(),
                ..TaskDraft::default()
            })
            .expect("create")
            .expect("accepted");
        app.board_cursor.card = Some(0);

        let area = Rect::new(0, 0, 80, 24);
        let (x, y) = selection_position(&app, area).expect("position");
        assert!(x < area.width);
        assert!(y < area.height);
        assert!(y >= 2, "below the tab bar");
    }

    #[test]
    fn selection_position_is_none_on_an_empty_board() {
        let dir = tempdir().expect("tempdir");
        let store = DataStore::open(dir.path()).expect("open datastore");
        let app = AppState::new(Board::open(store));
        assert!(selection_position(&app, Rect::new(0, 0, 80, 24)).is_none());
    }
}
