use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use fs2::FileExt;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TaskError};
use crate::models::{Priority, Task, User};

/// Returns the default path of the data file (`db.json`).
///
/// The path is determined in the following order:
/// 1. `TASKMASTER_DB` environment variable.
/// 2. `~/.local/share/taskmaster/db.json` (on Linux).
/// 3. `./db.json` (fallback).
pub fn default_db_path() -> PathBuf {
    std::env::var("TASKMASTER_DB").map(PathBuf::from).unwrap_or_else(|_| {
        let mut p = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
        p.push("taskmaster");
        p.push("db.json");
        p
    })
}

/// Returns the path of the lock file guarding `db_path`.
fn lock_path(db_path: &Path) -> PathBuf {
    let mut p = db_path.as_os_str().to_owned();
    p.push(".lock");
    PathBuf::from(p)
}

/// Filters applied when listing an owner's tasks. Unset fields match everything.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TaskFilter {
    /// Only tasks scheduled on this day.
    pub date: Option<NaiveDate>,
    /// Inclusive lower bound on the scheduled date.
    pub from: Option<NaiveDate>,
    /// Inclusive upper bound on the scheduled date.
    pub to: Option<NaiveDate>,
    pub completed: Option<bool>,
    pub priority: Option<Priority>,
}

impl TaskFilter {
    pub fn between(from: NaiveDate, to: NaiveDate) -> Self {
        TaskFilter { from: Some(from), to: Some(to), ..Default::default() }
    }

    pub fn on(date: NaiveDate) -> Self {
        TaskFilter { date: Some(date), ..Default::default() }
    }

    pub fn matches(&self, task: &Task) -> bool {
        self.date.map_or(true, |d| task.date == d)
            && self.from.map_or(true, |d| task.date >= d)
            && self.to.map_or(true, |d| task.date <= d)
            && self.completed.map_or(true, |c| task.completed == c)
            && self.priority.map_or(true, |p| task.priority == p)
    }
}

/// The task/user store.
///
/// Lookups scoped by owner treat a task owned by someone else exactly like a
/// missing one.
pub trait Store {
    fn find_tasks_by_owner(&self, owner_id: u64, filter: &TaskFilter) -> Result<Vec<Task>>;
    fn find_task(&self, owner_id: u64, id: u64) -> Result<Task>;
    fn find_user(&self, id: u64) -> Result<User>;
    fn find_user_by_username(&self, username: &str) -> Result<User>;
    fn list_users(&self) -> Result<Vec<User>>;
    /// Stores a new task, assigning its id.
    fn insert_task(&mut self, task: Task) -> Result<Task>;
    /// Overwrites an existing task.
    fn save_task(&mut self, task: &Task) -> Result<()>;
    /// Stores a new user, assigning its id. Usernames are unique.
    fn insert_user(&mut self, user: User) -> Result<User>;
    /// Overwrites an existing user.
    fn save_user(&mut self, user: &User) -> Result<()>;
    /// Removes an owner's task and returns it.
    fn delete_task(&mut self, owner_id: u64, id: u64) -> Result<Task>;
}

/// The full contents of the data file, held in memory.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Database {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl Store for Database {
    fn find_tasks_by_owner(&self, owner_id: u64, filter: &TaskFilter) -> Result<Vec<Task>> {
        Ok(self.tasks.iter()
            .filter(|t| t.owner_id == owner_id && filter.matches(t))
            .cloned()
            .collect())
    }

    fn find_task(&self, owner_id: u64, id: u64) -> Result<Task> {
        self.tasks.iter()
            .find(|t| t.id == id && t.owner_id == owner_id)
            .cloned()
            .ok_or(TaskError::TaskNotFound(id))
    }

    fn find_user(&self, id: u64) -> Result<User> {
        self.users.iter()
            .find(|u| u.id == id)
            .cloned()
            .ok_or_else(|| TaskError::UserNotFound(format!("#{}", id)))
    }

    fn find_user_by_username(&self, username: &str) -> Result<User> {
        self.users.iter()
            .find(|u| u.username == username)
            .cloned()
            .ok_or_else(|| TaskError::UserNotFound(username.to_string()))
    }

    fn list_users(&self) -> Result<Vec<User>> {
        Ok(self.users.clone())
    }

    fn insert_task(&mut self, mut task: Task) -> Result<Task> {
        task.id = self.tasks.iter().map(|t| t.id).max().unwrap_or(0) + 1;
        self.tasks.push(task.clone());
        Ok(task)
    }

    fn save_task(&mut self, task: &Task) -> Result<()> {
        match self.tasks.iter_mut().find(|t| t.id == task.id && t.owner_id == task.owner_id) {
            Some(t) => {
                *t = task.clone();
                Ok(())
            }
            None => Err(TaskError::TaskNotFound(task.id)),
        }
    }

    fn insert_user(&mut self, mut user: User) -> Result<User> {
        if self.users.iter().any(|u| u.username == user.username) {
            return Err(TaskError::DuplicateUser(user.username));
        }
        user.id = self.users.iter().map(|u| u.id).max().unwrap_or(0) + 1;
        self.users.push(user.clone());
        Ok(user)
    }

    fn save_user(&mut self, user: &User) -> Result<()> {
        match self.users.iter_mut().find(|u| u.id == user.id) {
            Some(u) => {
                *u = user.clone();
                Ok(())
            }
            None => Err(TaskError::UserNotFound(user.username.clone())),
        }
    }

    fn delete_task(&mut self, owner_id: u64, id: u64) -> Result<Task> {
        let idx = self.tasks.iter()
            .position(|t| t.id == id && t.owner_id == owner_id)
            .ok_or(TaskError::TaskNotFound(id))?;
        Ok(self.tasks.remove(idx))
    }
}

/// Loads the data file under a shared lock for read-only use.
///
/// Returns an empty database if the file does not exist yet.
pub fn load(db_path: &Path) -> Result<Database> {
    if !db_path.exists() {
        return Ok(Database::default());
    }
    let lock = open_lock(db_path)?;
    lock.try_lock_shared()
        .map_err(|_| TaskError::Locked(db_path.display().to_string()))?;
    read_database(db_path)
}

/// A writable handle on the data file.
///
/// Holds an exclusive lock for its whole lifetime, so every read-modify-write
/// (including the stats recompute that follows a completion) is serialized
/// across processes. Changes only reach disk through [`FileStore::commit`],
/// which replaces the file atomically.
pub struct FileStore {
    path: PathBuf,
    db: Database,
    _lock: File,
}

impl FileStore {
    /// Opens (or prepares to create) the data file at `db_path`.
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(dir) = db_path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir)?;
            }
        }
        let lock = open_lock(db_path)?;
        lock.try_lock_exclusive()
            .map_err(|_| TaskError::Locked(db_path.display().to_string()))?;
        tracing::debug!(path = %db_path.display(), "acquired store lock");

        let db = if db_path.exists() { read_database(db_path)? } else { Database::default() };
        Ok(FileStore { path: db_path.to_path_buf(), db, _lock: lock })
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Writes the database to a temporary file and renames it over the data file.
    pub fn commit(self) -> Result<()> {
        let s = serde_json::to_string_pretty(&self.db)?;
        let mut tmp = self.path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        let mut f = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&tmp)?;
        f.write_all(s.as_bytes())?;
        f.sync_all()?;
        fs::rename(&tmp, &self.path)?;
        tracing::debug!(path = %self.path.display(), tasks = self.db.tasks.len(), "committed store");
        Ok(())
    }
}

impl Store for FileStore {
    fn find_tasks_by_owner(&self, owner_id: u64, filter: &TaskFilter) -> Result<Vec<Task>> {
        self.db.find_tasks_by_owner(owner_id, filter)
    }

    fn find_task(&self, owner_id: u64, id: u64) -> Result<Task> {
        self.db.find_task(owner_id, id)
    }

    fn find_user(&self, id: u64) -> Result<User> {
        self.db.find_user(id)
    }

    fn find_user_by_username(&self, username: &str) -> Result<User> {
        self.db.find_user_by_username(username)
    }

    fn list_users(&self) -> Result<Vec<User>> {
        self.db.list_users()
    }

    fn insert_task(&mut self, task: Task) -> Result<Task> {
        self.db.insert_task(task)
    }

    fn save_task(&mut self, task: &Task) -> Result<()> {
        self.db.save_task(task)
    }

    fn insert_user(&mut self, user: User) -> Result<User> {
        self.db.insert_user(user)
    }

    fn save_user(&mut self, user: &User) -> Result<()> {
        self.db.save_user(user)
    }

    fn delete_task(&mut self, owner_id: u64, id: u64) -> Result<Task> {
        self.db.delete_task(owner_id, id)
    }
}

fn open_lock(db_path: &Path) -> Result<File> {
    Ok(OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(lock_path(db_path))?)
}

fn read_database(db_path: &Path) -> Result<Database> {
    let mut f = OpenOptions::new().read(true).open(db_path)?;
    let mut s = String::new();
    f.read_to_string(&mut s)?;
    if s.trim().is_empty() {
        return Ok(Database::default());
    }
    Ok(serde_json::from_str(&s)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn writer_lock_excludes_second_writer() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("db.json");

        let first = FileStore::open(&path).unwrap();
        assert!(matches!(FileStore::open(&path), Err(TaskError::Locked(_))));
        first.commit().unwrap();
        assert!(FileStore::open(&path).is_ok());
    }

    #[test]
    fn uncommitted_changes_are_discarded() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("db.json");

        let mut store = FileStore::open(&path).unwrap();
        store.db.users.push(User {
            id: 1,
            name: "Ada".into(),
            username: "ada".into(),
            total_points: 0,
            level: 1,
            current_streak: 0,
            created_at: chrono::Utc::now(),
        });
        drop(store);

        assert!(load(&path).unwrap().users.is_empty());
    }
}
