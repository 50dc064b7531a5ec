use std::io::{self, IsTerminal, Write};

use anyhow::anyhow;
use chrono::NaiveDate;
use unicode_width::UnicodeWidthStr;

use crate::category::{self, Category};
use crate::config::Config;
use crate::datetime;
use crate::task::Task;
use crate::views::BoardView;

/// First eight characters of a record id, enough to stay readable while
/// remaining unambiguous for selector prefixes.
pub fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        let color_cfg = cfg.get("color").unwrap_or_else(|| "on".to_string());
        let color = match color_cfg.to_ascii_lowercase().as_str() {
            "on" | "yes" | "true" | "1" => true,
            "off" | "no" | "false" | "0" => false,
            other => return Err(anyhow!("invalid color setting: {other}")),
        };

        Ok(Self { color })
    }

    #[tracing::instrument(skip(self, view))]
    pub fn print_board(&mut self, view: &BoardView, today: NaiveDate) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();

        writeln!(
            out,
            "{} / {} complete",
            view.totals.completed, view.totals.all
        )?;

        for lane in &view.lanes {
            writeln!(out)?;
            let header = format!("{} ({})", lane.name, lane.tasks.len());
            writeln!(out, "{}", self.paint_hex(&header, &lane.color))?;

            if lane.tasks.is_empty() {
                writeln!(out, "  No tasks")?;
                continue;
            }

            for task in &lane.tasks {
                let mut line = format!(
                    "  {}  {}",
                    self.paint(short_id(&task.id), "33"),
                    task.title
                );

                let action = datetime::relative_label(&task.recommended_date, today);
                if !action.is_empty() {
                    line.push_str(&format!("  action: {action}"));
                }

                let deadline = datetime::relative_label(&task.deadline, today);
                if !deadline.is_empty() {
                    let deadline = if datetime::is_overdue(&task.deadline, today) {
                        self.paint(&deadline, "31")
                    } else {
                        deadline
                    };
                    line.push_str(&format!("  deadline: {deadline}"));
                }

                writeln!(out, "{line}")?;
            }
        }

        Ok(())
    }

    #[tracing::instrument(skip(self, tasks, categories))]
    pub fn print_task_table(
        &mut self,
        tasks: &[&Task],
        categories: &[Category],
        today: NaiveDate,
    ) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();

        let headers = ["ID", "Title", "Category", "Action", "Deadline"];
        let mut rows = Vec::with_capacity(tasks.len());

        for task in tasks {
            let id = self.paint(short_id(&task.id), "33");
            let lane = category_name(categories, &task.category_id);
            let action = datetime::relative_label(&task.recommended_date, today);

            let deadline = datetime::relative_label(&task.deadline, today);
            let deadline = if task.is_active() && datetime::is_overdue(&task.deadline, today) {
                self.paint(&deadline, "31")
            } else {
                deadline
            };

            rows.push(vec![id, task.title.clone(), lane, action, deadline]);
        }

        write_table(&mut out, &headers, rows)?;
        Ok(())
    }

    #[tracing::instrument(skip(self, task, categories))]
    pub fn print_task_info(
        &mut self,
        task: &Task,
        categories: &[Category],
        today: NaiveDate,
    ) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();

        let status = if task.completed { "done" } else { "active" };

        writeln!(out, "id        {}", task.id)?;
        writeln!(out, "title     {}", task.title)?;
        writeln!(out, "status    {status}")?;
        writeln!(
            out,
            "category  {}",
            category_name(categories, &task.category_id)
        )?;
        writeln!(
            out,
            "action    {}",
            date_cell(&task.recommended_date, today)
        )?;
        writeln!(out, "deadline  {}", date_cell(&task.deadline, today))?;
        writeln!(out, "notes     {}", task.notes)?;
        writeln!(out, "created   {}", task.created_at.format("%Y%m%dT%H%M%SZ"))?;

        Ok(())
    }

    #[tracing::instrument(skip(self, view))]
    pub fn print_categories(&mut self, view: &BoardView) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();

        let headers = ["ID", "Name", "Color", "Tasks"];
        let mut rows = Vec::with_capacity(view.lanes.len());

        for lane in &view.lanes {
            rows.push(vec![
                lane.id.clone(),
                self.paint_hex(&lane.name, &lane.color),
                lane.color.clone(),
                lane.tasks.len().to_string(),
            ]);
        }

        write_table(&mut out, &headers, rows)?;
        Ok(())
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color || !io::stdout().is_terminal() {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }

    fn paint_hex(&self, text: &str, hex: &str) -> String {
        if !self.color || !io::stdout().is_terminal() {
            return text.to_string();
        }
        match category::parse_hex_color(hex) {
            Some((r, g, b)) => format!("\x1b[38;2;{r};{g};{b}m{text}\x1b[0m"),
            None => text.to_string(),
        }
    }
}

fn category_name(categories: &[Category], id: &str) -> String {
    if id.is_empty() {
        return String::new();
    }
    categories
        .iter()
        .find(|c| c.id == id)
        .map(|c| c.name.clone())
        .unwrap_or_default()
}

/// Stored date plus its relative reading, `2026-03-20 (Due today)` style.
/// Empty stays empty and unparseable values print as stored.
fn date_cell(raw: &str, today: NaiveDate) -> String {
    if raw.is_empty() {
        return String::new();
    }
    let label = datetime::relative_label(raw, today);
    if label == raw {
        return raw.to_string();
    }
    format!("{raw} ({label})")
}

fn write_table<W: Write>(
    mut writer: W,
    headers: &[&str],
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(*header));
    }

    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    for idx in 0..column_count {
        write!(writer, "{:width$}  ", headers[idx], width = widths[idx])?;
    }
    writeln!(writer)?;

    for idx in 0..column_count {
        write!(writer, "{:-<width$}  ", "", width = widths[idx])?;
    }
    writeln!(writer)?;

    for row in rows {
        for idx in 0..column_count {
            let cell = &row[idx];
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = widths[idx].saturating_sub(visible_width);
            write!(writer, "{}{}  ", cell, " ".repeat(padding))?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}
