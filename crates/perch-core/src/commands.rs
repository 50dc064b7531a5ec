use std::io::{self, Read};

use anyhow::{Context, anyhow};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::category::{Category, parse_hex_color};
use crate::cli::Invocation;
use crate::config::Config;
use crate::datetime::{self, parse_date_arg};
use crate::render::{Renderer, short_id};
use crate::store::Board;
use crate::task::{Task, TaskDraft};
use crate::views;

pub fn known_command_names() -> Vec<&'static str> {
    vec![
        "add",
        "modify",
        "check",
        "delete",
        "info",
        "board",
        "list",
        "checked",
        "category",
        "categories",
        "export",
        "import",
        "config",
        "help",
        "version",
    ]
}

pub fn expand_command_abbrev<'a>(token: &'a str, known: &[&'a str]) -> Option<&'a str> {
    if known.contains(&token) {
        return Some(token);
    }

    let mut matches = known.iter().copied().filter(|name| name.starts_with(token));
    let first = matches.next()?;
    if matches.next().is_some() {
        None
    } else {
        Some(first)
    }
}

#[instrument(skip(board, cfg, renderer, inv))]
pub fn dispatch(
    board: &mut Board,
    cfg: &Config,
    renderer: &mut Renderer,
    inv: Invocation,
) -> anyhow::Result<()> {
    let today = datetime::board_today(board.now());
    let command = inv.command.as_str();

    debug!(
        command,
        selector = ?inv.selector,
        args = ?inv.args,
        "dispatching command"
    );

    match command {
        "add" => {
            reject_selector(&inv)?;
            cmd_add(board, &inv.args, today)
        }
        "modify" => cmd_modify(board, require_selector(&inv)?, &inv.args, today),
        "check" => cmd_check(board, selector_from(&inv)?),
        "delete" => cmd_delete(board, selector_from(&inv)?),
        "info" => cmd_info(board, renderer, selector_from(&inv)?, today),
        "board" => {
            reject_selector(&inv)?;
            cmd_board(board, renderer, today)
        }
        "list" => {
            reject_selector(&inv)?;
            cmd_list(board, renderer, today)
        }
        "checked" => {
            reject_selector(&inv)?;
            cmd_checked(board, renderer, today)
        }
        "category" => {
            reject_selector(&inv)?;
            cmd_category(board, &inv.args)
        }
        "categories" => {
            reject_selector(&inv)?;
            cmd_categories(board, renderer)
        }
        "export" => {
            reject_selector(&inv)?;
            cmd_export(board)
        }
        "import" => {
            reject_selector(&inv)?;
            cmd_import(board)
        }
        "config" => {
            reject_selector(&inv)?;
            cmd_config(cfg)
        }
        "help" => cmd_help(),
        "version" => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        other => Err(anyhow!("unknown command: {other}")),
    }
}

fn reject_selector(inv: &Invocation) -> anyhow::Result<()> {
    if let Some(sel) = &inv.selector {
        return Err(anyhow!(
            "command '{}' does not take a selector (got '{sel}')",
            inv.command
        ));
    }
    Ok(())
}

fn require_selector(inv: &Invocation) -> anyhow::Result<&str> {
    inv.selector.as_deref().ok_or_else(|| {
        anyhow!(
            "command '{}' needs a task selector in front (id or unique prefix)",
            inv.command
        )
    })
}

/// Selector either in front of the command or as its single argument, so
/// both `perch 3fa check` and `perch check 3fa` read naturally.
fn selector_from(inv: &Invocation) -> anyhow::Result<&str> {
    if let Some(sel) = inv.selector.as_deref() {
        return Ok(sel);
    }
    if let [single] = inv.args.as_slice() {
        return Ok(single.as_str());
    }
    Err(anyhow!(
        "command '{}' needs a task selector (id or unique prefix)",
        inv.command
    ))
}

#[instrument(skip(board, args, today))]
fn cmd_add(board: &mut Board, args: &[String], today: NaiveDate) -> anyhow::Result<()> {
    info!("command add");

    let (title, mods) = parse_title_and_mods(args, board.categories.all(), today)?;
    let mut draft = TaskDraft {
        title,
        ..TaskDraft::default()
    };
    apply_mods(&mut draft, &mods);

    if let Some(task) = board.tasks.create(draft)? {
        println!("Created task {}.", short_id(&task.id));
    } else {
        println!("No task created: a title is required.");
    }
    Ok(())
}

#[instrument(skip(board, selector, args, today))]
fn cmd_modify(
    board: &mut Board,
    selector: &str,
    args: &[String],
    today: NaiveDate,
) -> anyhow::Result<()> {
    info!("command modify");

    if args.is_empty() {
        return Err(anyhow!("modify requires at least one change"));
    }

    let id = resolve_task_id(board.tasks.all(), selector)?;
    let (title, mods) = parse_title_and_mods(args, board.categories.all(), today)?;

    let task = board
        .tasks
        .get(&id)
        .ok_or_else(|| anyhow!("no task matches selector '{selector}'"))?;
    let mut draft = task.draft();
    if !title.is_empty() {
        draft.title = title;
    }
    apply_mods(&mut draft, &mods);

    if board.tasks.update(&id, draft)? {
        println!("Modified task {}.", short_id(&id));
    } else {
        println!("Task {} was not changed.", short_id(&id));
    }
    Ok(())
}

#[instrument(skip(board, selector))]
fn cmd_check(board: &mut Board, selector: &str) -> anyhow::Result<()> {
    info!("command check");

    let id = resolve_task_id(board.tasks.all(), selector)?;
    match board.tasks.toggle_completed(&id)? {
        Some(true) => println!("Checked task {} (now done).", short_id(&id)),
        Some(false) => println!("Unchecked task {} (active again).", short_id(&id)),
        None => return Err(anyhow!("no task matches selector '{selector}'")),
    }
    Ok(())
}

#[instrument(skip(board, selector))]
fn cmd_delete(board: &mut Board, selector: &str) -> anyhow::Result<()> {
    info!("command delete");

    let id = resolve_task_id(board.tasks.all(), selector)?;
    if !board.tasks.remove(&id)? {
        return Err(anyhow!("no task matches selector '{selector}'"));
    }
    println!("Deleted task {}.", short_id(&id));
    Ok(())
}

#[instrument(skip(board, renderer, selector, today))]
fn cmd_info(
    board: &mut Board,
    renderer: &mut Renderer,
    selector: &str,
    today: NaiveDate,
) -> anyhow::Result<()> {
    info!("command info");

    let id = resolve_task_id(board.tasks.all(), selector)?;
    let task = board
        .tasks
        .get(&id)
        .ok_or_else(|| anyhow!("no task matches selector '{selector}'"))?;

    renderer.print_task_info(task, board.categories.all(), today)
}

#[instrument(skip(board, renderer, today))]
fn cmd_board(board: &Board, renderer: &mut Renderer, today: NaiveDate) -> anyhow::Result<()> {
    info!("command board");

    let view = board.view();
    renderer.print_board(&view, today)
}

#[instrument(skip(board, renderer, today))]
fn cmd_list(board: &Board, renderer: &mut Renderer, today: NaiveDate) -> anyhow::Result<()> {
    info!("command list");

    let rows = views::active_tasks(board.tasks.all());
    renderer.print_task_table(&rows, board.categories.all(), today)
}

#[instrument(skip(board, renderer, today))]
fn cmd_checked(board: &Board, renderer: &mut Renderer, today: NaiveDate) -> anyhow::Result<()> {
    info!("command checked");

    let rows = views::completed_tasks(board.tasks.all());
    renderer.print_task_table(&rows, board.categories.all(), today)
}

#[instrument(skip(board, args))]
fn cmd_category(board: &mut Board, args: &[String]) -> anyhow::Result<()> {
    let Some(sub) = args.first() else {
        return Err(anyhow!("category needs a subcommand: add, modify, or delete"));
    };

    match sub.as_str() {
        "add" => {
            info!("command category add");

            let (name, color) = parse_category_args(&args[1..])?;
            if let Some(id) = board.categories.create(&name, color)? {
                println!("Created category {id}.");
            } else {
                println!("No category created: a name is required.");
            }
            Ok(())
        }
        "modify" => {
            info!("command category modify");

            let Some(selector) = args.get(1) else {
                return Err(anyhow!("category modify needs a category selector"));
            };
            if args.len() < 3 {
                return Err(anyhow!("category modify requires a new name or color:"));
            }

            let id = resolve_category_id(board.categories.all(), selector)?;
            let (name, color) = parse_category_args(&args[2..])?;

            let current = board
                .categories
                .get(&id)
                .ok_or_else(|| anyhow!("no category matches '{selector}'"))?;
            let mut draft = current.draft();
            if !name.is_empty() {
                draft.name = name;
            }
            if let Some(color) = color {
                draft.color = color;
            }

            if board.categories.update(&id, draft)? {
                println!("Modified category {id}.");
            } else {
                println!("Category {id} was not changed.");
            }
            Ok(())
        }
        "delete" => {
            info!("command category delete");

            let Some(selector) = args.get(1) else {
                return Err(anyhow!("category delete needs a category selector"));
            };

            let id = resolve_category_id(board.categories.all(), selector)?;
            let Some(detached) = board.remove_category(&id)? else {
                return Err(anyhow!("no category matches '{selector}'"));
            };
            println!("Deleted category {id} ({detached} task(s) detached).");
            Ok(())
        }
        other => Err(anyhow!("unknown category subcommand: {other}")),
    }
}

#[instrument(skip(board, renderer))]
fn cmd_categories(board: &Board, renderer: &mut Renderer) -> anyhow::Result<()> {
    info!("command categories");

    let view = board.view();
    renderer.print_categories(&view)
}

/// Full board document, the same camelCase shape `import` accepts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BoardExport {
    #[serde(default)]
    tasks: Vec<Task>,
    #[serde(default)]
    categories: Vec<Category>,
}

#[instrument(skip(board))]
fn cmd_export(board: &Board) -> anyhow::Result<()> {
    info!("command export");

    let export = BoardExport {
        tasks: board.tasks.all().to_vec(),
        categories: board.categories.all().to_vec(),
    };

    let out = serde_json::to_string(&export)?;
    println!("{out}");
    Ok(())
}

#[instrument(skip(board))]
fn cmd_import(board: &mut Board) -> anyhow::Result<()> {
    info!("command import");

    let mut stdin = String::new();
    io::stdin()
        .read_to_string(&mut stdin)
        .context("failed reading stdin")?;

    let trimmed = stdin.trim();
    if trimmed.is_empty() {
        return Err(anyhow!("import: empty input"));
    }

    let incoming: BoardExport =
        serde_json::from_str(trimmed).context("failed parsing import document")?;

    let mut categories = board.categories.all().to_vec();
    let mut category_count = 0_u64;
    for mut category in incoming.categories {
        category.name = category.name.trim().to_string();
        if category.id.is_empty() || category.name.is_empty() {
            warn!(id = %category.id, "skipping category with blank id or name");
            continue;
        }
        if let Some(slot) = categories.iter_mut().find(|c| c.id == category.id) {
            *slot = category;
        } else {
            categories.push(category);
        }
        category_count += 1;
    }

    let mut tasks = board.tasks.all().to_vec();
    let mut task_count = 0_u64;
    for mut task in incoming.tasks {
        task.title = task.title.trim().to_string();
        if task.id.is_empty() || task.title.is_empty() {
            warn!(id = %task.id, "skipping task with blank id or title");
            continue;
        }
        if let Some(slot) = tasks.iter_mut().find(|t| t.id == task.id) {
            *slot = task;
        } else {
            tasks.push(task);
        }
        task_count += 1;
    }

    board.categories.replace_all(categories)?;
    board.tasks.replace_all(tasks)?;

    println!("Imported {task_count} task(s) and {category_count} category(ies).");
    Ok(())
}

fn cmd_config(cfg: &Config) -> anyhow::Result<()> {
    let mut entries: Vec<(&String, &String)> = cfg.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));

    for (key, value) in entries {
        println!("{key}={value}");
    }
    Ok(())
}

fn cmd_help() -> anyhow::Result<()> {
    println!("usage: perch [selector] <command> [args]");
    println!();
    println!("Task commands:     add, modify, check, delete, info, board, list, checked");
    println!("Category commands: category add|modify|delete, categories");
    println!("Data commands:     export, import, config");
    println!();
    println!("Modifiers for add/modify:");
    println!("  category:<id|name>   move the task (empty or 'none' clears)");
    println!("  action:<date>        recommended start date");
    println!("  deadline:<date>      hard due date");
    println!("  notes:<text>         free-form notes");
    println!();
    println!("Dates: YYYY-MM-DD, today, tomorrow, yesterday, weekday names, +Nd, -Nd");
    Ok(())
}

fn resolve_task_id(tasks: &[Task], selector: &str) -> anyhow::Result<String> {
    if selector.is_empty() {
        return Err(anyhow!("empty task selector"));
    }

    if let Some(task) = tasks.iter().find(|t| t.id == selector) {
        return Ok(task.id.clone());
    }

    let matches: Vec<&Task> = tasks
        .iter()
        .filter(|t| t.id.starts_with(selector))
        .collect();
    match matches.len() {
        0 => Err(anyhow!("no task matches selector '{selector}'")),
        1 => Ok(matches[0].id.clone()),
        _ => {
            let candidates: Vec<&str> = matches.iter().map(|t| short_id(&t.id)).collect();
            Err(anyhow!(
                "selector '{selector}' is ambiguous: {}",
                candidates.join(", ")
            ))
        }
    }
}

fn resolve_category_id(categories: &[Category], selector: &str) -> anyhow::Result<String> {
    if selector.is_empty() {
        return Err(anyhow!("empty category selector"));
    }

    if let Some(category) = categories.iter().find(|c| c.id == selector) {
        return Ok(category.id.clone());
    }

    let prefix: Vec<&Category> = categories
        .iter()
        .filter(|c| c.id.starts_with(selector))
        .collect();
    if prefix.len() == 1 {
        return Ok(prefix[0].id.clone());
    }
    if prefix.len() > 1 {
        let candidates: Vec<&str> = prefix.iter().map(|c| c.id.as_str()).collect();
        return Err(anyhow!(
            "selector '{selector}' is ambiguous: {}",
            candidates.join(", ")
        ));
    }

    let by_name: Vec<&Category> = categories
        .iter()
        .filter(|c| c.name.eq_ignore_ascii_case(selector))
        .collect();
    match by_name.len() {
        0 => Err(anyhow!("no category matches '{selector}'")),
        1 => Ok(by_name[0].id.clone()),
        _ => {
            let candidates: Vec<&str> = by_name.iter().map(|c| c.id.as_str()).collect();
            Err(anyhow!(
                "name '{selector}' is ambiguous: {}",
                candidates.join(", ")
            ))
        }
    }
}

fn resolve_category_value(categories: &[Category], value: &str) -> anyhow::Result<String> {
    if value.is_empty() || value.eq_ignore_ascii_case("none") {
        return Ok(String::new());
    }
    resolve_category_id(categories, value)
}

#[derive(Debug, Clone)]
enum Mod {
    Category(String),
    Action(String),
    Deadline(String),
    Notes(String),
}

/// Splits command arguments into bare title words and `key:value` modifiers.
/// A literal `--` turns everything after it into title words.
fn parse_title_and_mods(
    args: &[String],
    categories: &[Category],
    today: NaiveDate,
) -> anyhow::Result<(String, Vec<Mod>)> {
    let mut title_words = Vec::new();
    let mut mods = Vec::new();

    let mut literal = false;
    for arg in args {
        if arg == "--" {
            literal = true;
            continue;
        }

        if !literal && let Some(one_mod) = parse_one_mod(arg, categories, today)? {
            mods.push(one_mod);
            continue;
        }

        title_words.push(arg.as_str());
    }

    Ok((title_words.join(" "), mods))
}

fn parse_one_mod(
    tok: &str,
    categories: &[Category],
    today: NaiveDate,
) -> anyhow::Result<Option<Mod>> {
    let (key, value) = if let Some((k, v)) = tok.split_once(':') {
        (k, v)
    } else if let Some((k, v)) = tok.split_once('=') {
        (k, v)
    } else {
        return Ok(None);
    };

    match key.to_ascii_lowercase().as_str() {
        "category" | "cat" => Ok(Some(Mod::Category(resolve_category_value(
            categories, value,
        )?))),
        "action" | "recommended" => Ok(Some(Mod::Action(parse_date_arg(value, today)?))),
        "deadline" | "due" => Ok(Some(Mod::Deadline(parse_date_arg(value, today)?))),
        "notes" | "note" => Ok(Some(Mod::Notes(value.to_string()))),
        _ => Ok(None),
    }
}

fn apply_mods(draft: &mut TaskDraft, mods: &[Mod]) {
    for one_mod in mods {
        match one_mod {
            Mod::Category(id) => draft.category_id = id.clone(),
            Mod::Action(date) => draft.recommended_date = date.clone(),
            Mod::Deadline(date) => draft.deadline = date.clone(),
            Mod::Notes(notes) => draft.notes = notes.clone(),
        }
    }
}

/// Category arguments are name words plus an optional `color:#hex` token.
fn parse_category_args(tokens: &[String]) -> anyhow::Result<(String, Option<String>)> {
    let mut words = Vec::new();
    let mut color = None;

    for tok in tokens {
        let value = tok
            .strip_prefix("color:")
            .or_else(|| tok.strip_prefix("color="));
        if let Some(value) = value {
            if parse_hex_color(value).is_none() {
                return Err(anyhow!("invalid color: {value} (expected #rgb or #rrggbb)"));
            }
            color = Some(value.to_string());
            continue;
        }
        words.push(tok.as_str());
    }

    Ok((words.join(" "), color))
}
