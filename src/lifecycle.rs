use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use crate::analytics::month_bounds;
use crate::config::Zone;
use crate::error::{Result, TaskError};
use crate::models::{parse_title, Priority, Task, User};
use crate::scoring::level_for;
use crate::stats::recompute_user_stats;
use crate::storage::{Store, TaskFilter};

/// Fields for a new task.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub priority: Priority,
}

/// A partial edit. `completed` is only acted on when it differs from the
/// task's current state.
#[derive(Debug, Clone, Default)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub priority: Option<Priority>,
    pub completed: Option<bool>,
}

impl TaskUpdate {
    pub fn completion(completed: bool) -> Self {
        TaskUpdate { completed: Some(completed), ..Default::default() }
    }
}

/// Creates a task owned by `owner_id`.
pub fn create_task(store: &mut impl Store, owner_id: u64, new: NewTask, now: DateTime<Utc>) -> Result<Task> {
    store.find_user(owner_id)?;
    let task = store.insert_task(Task {
        id: 0,
        owner_id,
        title: parse_title(&new.title)?,
        date: new.date,
        time: new.time,
        priority: new.priority,
        completed: false,
        completed_at: None,
        completed_on_time: None,
        points_earned: 0,
        created_at: now,
    })?;
    tracing::info!(task = task.id, owner = owner_id, "created task");
    Ok(task)
}

/// Applies an edit to one of the owner's tasks.
///
/// A change of completion state scores (or clears) the task and then
/// recomputes the owner's totals before returning. Edits to the schedule or
/// priority of an already-completed task leave its points as they were.
pub fn update_task(
    store: &mut impl Store,
    owner_id: u64,
    id: u64,
    update: TaskUpdate,
    now: DateTime<Utc>,
    zone: Zone,
) -> Result<Task> {
    let mut task = store.find_task(owner_id, id)?;

    if let Some(title) = update.title {
        task.title = parse_title(&title)?;
    }
    if let Some(date) = update.date {
        task.date = date;
    }
    if let Some(time) = update.time {
        task.time = time;
    }
    if let Some(priority) = update.priority {
        task.priority = priority;
    }

    let toggled = match update.completed {
        Some(completed) if completed != task.completed => {
            if completed {
                task.complete(now, zone);
                tracing::info!(task = id, points = task.points_earned, on_time = task.on_time(), "task completed");
            } else {
                task.reopen();
                tracing::info!(task = id, "task reopened");
            }
            true
        }
        _ => false,
    };

    store.save_task(&task)?;
    if toggled {
        recompute_user_stats(store, owner_id)?;
    }
    Ok(task)
}

/// Marks a task complete or incomplete.
pub fn set_completed(
    store: &mut impl Store,
    owner_id: u64,
    id: u64,
    completed: bool,
    now: DateTime<Utc>,
    zone: Zone,
) -> Result<Task> {
    update_task(store, owner_id, id, TaskUpdate::completion(completed), now, zone)
}

/// Deletes one of the owner's tasks, dropping its points from their totals.
pub fn delete_task(store: &mut impl Store, owner_id: u64, id: u64) -> Result<Task> {
    let task = store.delete_task(owner_id, id)?;
    if task.completed {
        recompute_user_stats(store, owner_id)?;
    }
    tracing::info!(task = id, owner = owner_id, "deleted task");
    Ok(task)
}

/// Lists the owner's tasks, newest date first and earliest time first within a day.
pub fn list_tasks(store: &impl Store, owner_id: u64, filter: &TaskFilter) -> Result<Vec<Task>> {
    let mut tasks = store.find_tasks_by_owner(owner_id, filter)?;
    tasks.sort_by(|a, b| b.date.cmp(&a.date).then(a.time.cmp(&b.time)));
    Ok(tasks)
}

/// The owner's tasks scheduled on `date`, by time.
pub fn tasks_on(store: &impl Store, owner_id: u64, date: NaiveDate) -> Result<Vec<Task>> {
    let mut tasks = store.find_tasks_by_owner(owner_id, &TaskFilter::on(date))?;
    tasks.sort_by_key(|t| t.time);
    Ok(tasks)
}

/// The owner's tasks in a calendar month, oldest first.
pub fn tasks_in_month(store: &impl Store, owner_id: u64, year: i32, month: u32) -> Result<Vec<Task>> {
    let (first, last) = month_bounds(year, month)?;
    let mut tasks = store.find_tasks_by_owner(owner_id, &TaskFilter::between(first, last))?;
    tasks.sort_by(|a, b| a.date.cmp(&b.date).then(a.time.cmp(&b.time)));
    Ok(tasks)
}

/// Registers a new user at level 1 with no points.
pub fn register_user(store: &mut impl Store, name: &str, username: &str, now: DateTime<Utc>) -> Result<User> {
    let name = name.trim();
    let username = username.trim();
    if name.is_empty() {
        return Err(TaskError::invalid("name must not be empty"));
    }
    if username.is_empty() || username.chars().any(char::is_whitespace) {
        return Err(TaskError::invalid("username must be non-empty and contain no whitespace"));
    }
    let user = store.insert_user(User {
        id: 0,
        name: name.to_string(),
        username: username.to_string(),
        total_points: 0,
        level: level_for(0),
        current_streak: 0,
        created_at: now,
    })?;
    tracing::info!(user = user.id, username = %user.username, "registered user");
    Ok(user)
}

/// Records the streak reported for a user.
pub fn set_streak(store: &mut impl Store, user_id: u64, streak: u32) -> Result<User> {
    let mut user = store.find_user(user_id)?;
    user.current_streak = streak;
    store.save_user(&user)?;
    Ok(user)
}
