use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use chrono::{Datelike, NaiveDate, Utc};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};
use serde::Serialize;

use crate::achievements::{self, CATALOG};
use crate::analytics::{summarize, summarize_month, today_summary};
use crate::config::Config;
use crate::error::{Result, TaskError};
use crate::export::{write_tasks, ExportFormat};
use crate::lifecycle::{self, NewTask, TaskUpdate};
use crate::models::{parse_date, parse_time, Priority, Task, User};
use crate::owner::resolve_owner;
use crate::stats::leaderboard;
use crate::storage::{load, Database, FileStore, Store, TaskFilter};

/// Runs `f` against a locked, writable store as the acting owner and commits
/// only if it succeeds.
fn with_owner_store<T>(cfg: &Config, f: impl FnOnce(&mut FileStore, &User) -> Result<T>) -> Result<T> {
    let mut store = FileStore::open(&cfg.db_path)?;
    let owner = resolve_owner(&store, cfg)?;
    let out = f(&mut store, &owner)?;
    store.commit()?;
    Ok(out)
}

/// Loads a read-only snapshot and resolves the acting owner.
fn snapshot(cfg: &Config) -> Result<(Database, User)> {
    let db = load(&cfg.db_path)?;
    let owner = resolve_owner(&db, cfg)?;
    Ok((db, owner))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn bold(text: &str) -> Cell {
    Cell::new(text).add_attribute(Attribute::Bold)
}

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Human description of how far away a scheduled date is.
pub fn time_left(date: NaiveDate, today: NaiveDate) -> String {
    let days_left = (date - today).num_days();
    if days_left < 0 {
        format!("{}d ago", days_left.abs())
    } else if days_left == 0 {
        "Today".to_string()
    } else {
        format!("in {}d", days_left)
    }
}

fn priority_color(priority: Priority) -> Color {
    match priority {
        Priority::High => Color::Red,
        Priority::Medium => Color::Yellow,
        Priority::Low => Color::Green,
    }
}

/// Adds a new task for the acting user.
///
/// The date defaults to today in the configured zone.
pub fn cmd_add(cfg: &Config, title: String, date: Option<String>, time: String, priority: Priority, silent: bool) -> Result<Task> {
    let date = match date {
        Some(raw) => parse_date(&raw)?,
        None => cfg.zone.today(),
    };
    let new = NewTask { title, date, time: parse_time(&time)?, priority };
    let task = with_owner_store(cfg, |store, owner| lifecycle::create_task(store, owner.id, new, Utc::now()))?;
    if !silent { println!("Task added (id = {})", task.id); }
    Ok(task)
}

/// Marks a task as complete, awarding points.
pub fn cmd_complete(cfg: &Config, id: u64, silent: bool) -> Result<Task> {
    let task = with_owner_store(cfg, |store, owner| {
        lifecycle::set_completed(store, owner.id, id, true, Utc::now(), cfg.zone)
    })?;
    if !silent {
        let when = if task.on_time() { "on time" } else { "late" };
        println!("Task {} completed {} (+{} points).", id, when, task.points_earned);
    }
    Ok(task)
}

/// Marks a completed task as pending again, removing its points.
pub fn cmd_reopen(cfg: &Config, id: u64, silent: bool) -> Result<Task> {
    let task = with_owner_store(cfg, |store, owner| {
        lifecycle::set_completed(store, owner.id, id, false, Utc::now(), cfg.zone)
    })?;
    if !silent { println!("Task {} reopened.", id); }
    Ok(task)
}

/// Removes a task from the database by ID.
pub fn cmd_remove(cfg: &Config, id: u64, silent: bool) -> Result<()> {
    with_owner_store(cfg, |store, owner| lifecycle::delete_task(store, owner.id, id))?;
    if !silent { println!("Task {} removed.", id); }
    Ok(())
}

/// Edits an existing task's details.
#[allow(clippy::too_many_arguments)]
pub fn cmd_edit(
    cfg: &Config,
    id: u64,
    title: Option<String>,
    date: Option<String>,
    time: Option<String>,
    priority: Option<Priority>,
    completed: Option<bool>,
    silent: bool,
) -> Result<Task> {
    let update = TaskUpdate {
        title,
        date: date.as_deref().map(parse_date).transpose()?,
        time: time.as_deref().map(parse_time).transpose()?,
        priority,
        completed,
    };
    let task = with_owner_store(cfg, |store, owner| {
        lifecycle::update_task(store, owner.id, id, update, Utc::now(), cfg.zone)
    })?;
    if !silent { println!("Task {} updated.", id); }
    Ok(task)
}

/// Lists the acting user's tasks, newest date first.
pub fn cmd_list(cfg: &Config, filter: TaskFilter, json: bool) -> Result<()> {
    let (db, owner) = snapshot(cfg)?;
    let tasks = lifecycle::list_tasks(&db, owner.id, &filter)?;
    render_tasks(cfg, &tasks, json)
}

/// Lists today's tasks by time.
pub fn cmd_today(cfg: &Config, json: bool) -> Result<()> {
    let (db, owner) = snapshot(cfg)?;
    let tasks = lifecycle::tasks_on(&db, owner.id, cfg.zone.today())?;
    render_tasks(cfg, &tasks, json)
}

/// Lists the tasks of one calendar month.
pub fn cmd_month(cfg: &Config, year: i32, month: u32, json: bool) -> Result<()> {
    let (db, owner) = snapshot(cfg)?;
    let tasks = lifecycle::tasks_in_month(&db, owner.id, year, month)?;
    render_tasks(cfg, &tasks, json)
}

fn render_tasks(cfg: &Config, tasks: &[Task], json: bool) -> Result<()> {
    if json {
        return print_json(tasks);
    }
    if tasks.is_empty() {
        println!("No tasks found.");
        return Ok(());
    }

    let mut table = new_table();
    table.set_header(vec![
        bold("ID"),
        bold("Title"),
        bold("Date"),
        bold("When"),
        bold("Time"),
        bold("Priority"),
        bold("Status"),
        bold("Points"),
    ]);

    let today = cfg.zone.today();
    for t in tasks {
        let (status, status_color) = match (t.completed, t.completed_on_time) {
            (true, Some(true)) => ("Done (on time)", Color::Green),
            (true, _) => ("Done (late)", Color::DarkYellow),
            (false, _) if t.date < today => ("Overdue", Color::Red),
            (false, _) => ("Pending", Color::Yellow),
        };
        table.add_row(vec![
            Cell::new(t.id),
            Cell::new(&t.title),
            Cell::new(t.date),
            Cell::new(time_left(t.date, today)),
            Cell::new(t.time.format("%H:%M")),
            Cell::new(t.priority).fg(priority_color(t.priority)),
            Cell::new(status).fg(status_color),
            Cell::new(t.points_earned),
        ]);
    }

    println!("{table}");
    Ok(())
}

/// Shows points, level, streak and unlocked badges.
pub fn cmd_rewards(cfg: &Config, json: bool) -> Result<()> {
    let (db, owner) = snapshot(cfg)?;
    let report = achievements::rewards(&db, owner.id)?;
    if json {
        return print_json(&report);
    }

    let mut table = new_table();
    table.set_header(vec![bold("Stat"), bold("Value")]);
    table.add_row(vec![Cell::new("Total points"), Cell::new(report.total_points)]);
    table.add_row(vec![Cell::new("Level"), Cell::new(report.level)]);
    table.add_row(vec![Cell::new("Current streak"), Cell::new(report.current_streak)]);
    table.add_row(vec![Cell::new("Tasks completed"), Cell::new(report.tasks_completed)]);
    table.add_row(vec![Cell::new("On time"), Cell::new(report.on_time_completed)]);
    table.add_row(vec![Cell::new("Badges earned"), Cell::new(report.badges_earned)]);
    println!("{table}");
    Ok(())
}

/// Lists the achievement catalog with the acting user's unlock status.
pub fn cmd_achievements(cfg: &Config, json: bool) -> Result<()> {
    let (db, owner) = snapshot(cfg)?;
    let tasks = db.find_tasks_by_owner(owner.id, &TaskFilter::default())?;
    let unlocked = achievements::evaluate(&owner, &tasks);

    if json {
        #[derive(Serialize)]
        struct Row<'a> {
            #[serde(flatten)]
            achievement: &'a achievements::Achievement,
            unlocked: bool,
        }
        let rows: Vec<Row> = CATALOG.iter()
            .map(|a| Row { achievement: a, unlocked: unlocked.contains(&a.id) })
            .collect();
        return print_json(&rows);
    }

    let mut table = new_table();
    table.set_header(vec![bold("ID"), bold("Achievement"), bold("Requirement"), bold("Category"), bold("Status")]);
    for a in CATALOG {
        let is_unlocked = unlocked.contains(&a.id);
        table.add_row(vec![
            Cell::new(a.id),
            Cell::new(a.name),
            Cell::new(a.requirement),
            Cell::new(format!("{:?}", a.category)),
            if is_unlocked {
                Cell::new("Unlocked").fg(Color::Green)
            } else {
                Cell::new("Locked").fg(Color::Grey)
            },
        ]);
    }
    println!("{table}");
    Ok(())
}

/// Shows the top users by points.
pub fn cmd_leaderboard(cfg: &Config, json: bool) -> Result<()> {
    let (db, owner) = snapshot(cfg)?;
    let entries = leaderboard(&db, owner.id)?;
    if json {
        return print_json(&entries);
    }

    let mut table = new_table();
    table.set_header(vec![bold("Rank"), bold("Name"), bold("Username"), bold("Points"), bold("Level")]);
    for e in entries {
        let name = if e.is_current_user {
            Cell::new(&e.name).add_attribute(Attribute::Bold).fg(Color::Cyan)
        } else {
            Cell::new(&e.name)
        };
        table.add_row(vec![Cell::new(e.rank), name, Cell::new(&e.username), Cell::new(e.points), Cell::new(e.level)]);
    }
    println!("{table}");
    Ok(())
}

/// Shows the trailing-window summary with per-day activity.
pub fn cmd_analytics(cfg: &Config, days: u32, json: bool) -> Result<()> {
    let (db, owner) = snapshot(cfg)?;
    let tasks = db.find_tasks_by_owner(owner.id, &TaskFilter::default())?;
    let summary = summarize(&tasks, days, Utc::now(), cfg.zone)?;
    if json {
        return print_json(&summary);
    }

    println!(
        "Last {} days: {} tasks, {} completed ({}%), {} on time ({}%), {:.1} per day",
        summary.window_days,
        summary.total,
        summary.completed,
        summary.completion_rate,
        summary.on_time_completed,
        summary.on_time_rate,
        summary.avg_per_day,
    );
    let mut table = new_table();
    table.set_header(vec![bold("Date"), bold("Total"), bold("Completed")]);
    for b in &summary.daily_buckets {
        table.add_row(vec![Cell::new(b.date), Cell::new(b.total), Cell::new(b.completed)]);
    }
    println!("{table}");
    Ok(())
}

/// Shows totals for a calendar month.
pub fn cmd_monthly(cfg: &Config, year: i32, month: u32, json: bool) -> Result<()> {
    let (db, owner) = snapshot(cfg)?;
    let tasks = db.find_tasks_by_owner(owner.id, &TaskFilter::default())?;
    let summary = summarize_month(&tasks, year, month)?;
    if json {
        return print_json(&summary);
    }
    println!(
        "{}-{:02}: {} tasks, {} completed ({}%)",
        summary.year, summary.month, summary.total, summary.completed, summary.completion_rate
    );
    Ok(())
}

/// Shows today's task counts and the user's points.
pub fn cmd_stats(cfg: &Config, json: bool) -> Result<()> {
    let (db, owner) = snapshot(cfg)?;
    let today = cfg.zone.today();
    let tasks = db.find_tasks_by_owner(owner.id, &TaskFilter::on(today))?;
    let summary = today_summary(&tasks, &owner, today);
    if json {
        return print_json(&summary);
    }
    println!(
        "Today ({}): {} tasks, {} completed, {} pending, {} on time. Total points: {}",
        today,
        summary.total_tasks,
        summary.completed_tasks,
        summary.pending_tasks,
        summary.on_time_completed,
        summary.total_points,
    );
    Ok(())
}

/// Exports the acting user's tasks, newest first, to a file or stdout.
pub fn cmd_export(cfg: &Config, format: ExportFormat, from: Option<String>, to: Option<String>, output: Option<PathBuf>) -> Result<()> {
    let filter = TaskFilter {
        from: from.as_deref().map(parse_date).transpose()?,
        to: to.as_deref().map(parse_date).transpose()?,
        ..Default::default()
    };
    let (db, owner) = snapshot(cfg)?;
    let mut tasks = db.find_tasks_by_owner(owner.id, &filter)?;
    tasks.sort_by(|a, b| b.date.cmp(&a.date));

    match output {
        Some(path) => {
            let mut out = BufWriter::new(File::create(&path)?);
            write_tasks(&mut out, &tasks, format)?;
            out.flush()?;
            eprintln!("Exported {} tasks to {}", tasks.len(), path.display());
        }
        None => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            write_tasks(&mut out, &tasks, format)?;
        }
    }
    Ok(())
}

/// Registers a user.
pub fn cmd_user_add(cfg: &Config, name: String, username: String, silent: bool) -> Result<User> {
    let mut store = FileStore::open(&cfg.db_path)?;
    let user = lifecycle::register_user(&mut store, &name, &username, Utc::now())?;
    store.commit()?;
    if !silent { println!("User '{}' registered (id = {})", user.username, user.id); }
    Ok(user)
}

/// Lists registered users.
pub fn cmd_user_list(cfg: &Config, json: bool) -> Result<()> {
    let users = load(&cfg.db_path)?.list_users()?;
    if json {
        return print_json(&users);
    }
    if users.is_empty() {
        println!("No users found.");
        return Ok(());
    }
    let mut table = new_table();
    table.set_header(vec![bold("ID"), bold("Name"), bold("Username"), bold("Points"), bold("Level"), bold("Streak")]);
    for u in users {
        table.add_row(vec![
            Cell::new(u.id),
            Cell::new(u.name),
            Cell::new(u.username),
            Cell::new(u.total_points),
            Cell::new(u.level),
            Cell::new(u.current_streak),
        ]);
    }
    println!("{table}");
    Ok(())
}

/// Records the acting user's current streak as reported by an outside tracker.
pub fn cmd_user_streak(cfg: &Config, streak: u32, silent: bool) -> Result<User> {
    let user = with_owner_store(cfg, |store, owner| lifecycle::set_streak(store, owner.id, streak))?;
    if !silent { println!("Streak for '{}' set to {}.", user.username, user.current_streak); }
    Ok(user)
}

/// Parses a `YYYY-MM` month argument.
pub fn parse_month(raw: &str) -> Result<(i32, u32)> {
    let invalid = || TaskError::invalid(format!("invalid month '{}'. Use YYYY-MM.", raw));
    let date = NaiveDate::parse_from_str(&format!("{}-01", raw.trim()), "%Y-%m-%d").map_err(|_| invalid())?;
    Ok((date.year(), date.month()))
}
