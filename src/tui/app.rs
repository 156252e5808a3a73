use std::collections::BTreeSet;

use ratatui::widgets::TableState;

use crate::achievements::{evaluate, rewards_for, RewardsReport, CATALOG};
use crate::commands::{cmd_add, cmd_edit, cmd_remove, cmd_complete, cmd_reopen};
use crate::config::Config;
use crate::error::Result;
use crate::lifecycle::list_tasks;
use crate::models::{Priority, Task};
use crate::owner::resolve_owner;
use crate::storage::{load, Store, TaskFilter};

#[derive(PartialEq)]
pub enum InputMode {
    Normal,
    Editing,
    Adding,
}

pub enum ViewMode {
    Tasks,
    Rewards,
}

pub enum InputField {
    None,
    Title,
    Date,
    Time,
    Priority,
}

/// State for the multi-step "Add Task" wizard.
#[derive(Default)]
pub struct AddState {
    pub title: String,
    pub date: Option<String>,
    pub time: String,
    pub step: usize, // 0: Title, 1: Date, 2: Time, 3: Priority
}

pub struct App {
    pub config: Config,
    pub username: String,
    pub tasks: Vec<Task>,
    pub rewards: RewardsReport,
    pub unlocked: BTreeSet<u32>,
    pub state: TableState,
    pub achievement_state: TableState,
    pub view_mode: ViewMode,
    pub input_mode: InputMode,
    pub input_field: InputField,
    pub input_buffer: String,
    pub target_id: Option<u64>,
    pub add_state: AddState,
    pub show_completed: bool,
    /// Result of the last action, shown in the footer.
    pub message: Option<String>,
}

impl App {
    /// Creates a new App for the configured user and loads initial data.
    pub fn new(config: Config) -> Result<App> {
        let db = load(&config.db_path)?;
        let owner = resolve_owner(&db, &config)?;
        let mut app = App {
            config,
            username: owner.username,
            tasks: Vec::new(),
            rewards: RewardsReport {
                total_points: 0,
                level: 1,
                current_streak: 0,
                tasks_completed: 0,
                on_time_completed: 0,
                badges_earned: 0,
                unlocked_achievements: Vec::new(),
            },
            unlocked: BTreeSet::new(),
            state: TableState::default(),
            achievement_state: TableState::default(),
            view_mode: ViewMode::Tasks,
            input_mode: InputMode::Normal,
            input_field: InputField::None,
            input_buffer: String::new(),
            target_id: None,
            add_state: AddState::default(),
            show_completed: false,
            message: None,
        };
        app.reload();
        Ok(app)
    }

    /// Selects the next item in the current list.
    pub fn next(&mut self) {
        let (state, len) = self.current_list();
        if len == 0 { return; }
        let i = match state.selected() {
            Some(i) if i >= len - 1 => 0,
            Some(i) => i + 1,
            None => 0,
        };
        state.select(Some(i));
    }

    /// Selects the previous item in the current list.
    pub fn previous(&mut self) {
        let (state, len) = self.current_list();
        if len == 0 { return; }
        let i = match state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        state.select(Some(i));
    }

    fn current_list(&mut self) -> (&mut TableState, usize) {
        match self.view_mode {
            ViewMode::Tasks => (&mut self.state, self.tasks.len()),
            ViewMode::Rewards => (&mut self.achievement_state, CATALOG.len()),
        }
    }

    fn selected_task(&self) -> Option<&Task> {
        if let ViewMode::Rewards = self.view_mode { return None; }
        self.state.selected().and_then(|i| self.tasks.get(i))
    }

    /// Completes the selected task, or reopens it if it is already done.
    pub fn toggle_selected(&mut self) {
        let Some(task) = self.selected_task() else { return };
        let (id, completed) = (task.id, task.completed);
        let result = if completed {
            cmd_reopen(&self.config, id, true).map(|_| format!("Task {} reopened.", id))
        } else {
            cmd_complete(&self.config, id, true).map(|t| {
                let when = if t.on_time() { "on time" } else { "late" };
                format!("Task {} completed {} (+{} points).", id, when, t.points_earned)
            })
        };
        self.report(result);
        self.reload();
    }

    /// Deletes the currently selected task.
    pub fn delete_selected(&mut self) {
        let Some(id) = self.selected_task().map(|t| t.id) else { return };
        let result = cmd_remove(&self.config, id, true).map(|_| format!("Task {} removed.", id));
        self.report(result);
        self.reload();
    }

    fn report(&mut self, result: Result<String>) {
        self.message = Some(match result {
            Ok(msg) => msg,
            Err(e) => format!("Error: {}", e),
        });
    }

    /// Reloads tasks and rewards from storage.
    pub fn reload(&mut self) {
        let loaded = load(&self.config.db_path).and_then(|db| {
            let owner = db.find_user_by_username(&self.username)?;
            let all = list_tasks(&db, owner.id, &TaskFilter::default())?;
            Ok((owner, all))
        });
        let (owner, all) = match loaded {
            Ok(v) => v,
            Err(e) => {
                self.message = Some(format!("Error: {}", e));
                return;
            }
        };

        self.rewards = rewards_for(&owner, &all);
        self.unlocked = evaluate(&owner, &all);
        self.tasks = all;
        if !self.show_completed {
            self.tasks.retain(|t| !t.completed);
        }

        if self.tasks.is_empty() {
            self.state.select(None);
        } else if let Some(i) = self.state.selected() {
            if i >= self.tasks.len() {
                self.state.select(Some(self.tasks.len() - 1));
            }
        } else {
            self.state.select(Some(0));
        }
        if self.achievement_state.selected().is_none() {
            self.achievement_state.select(Some(0));
        }
    }

    /// Toggles the visibility of completed tasks.
    pub fn toggle_completed(&mut self) {
        self.show_completed = !self.show_completed;
        self.reload();
    }

    /// Toggles between the task list and the rewards view.
    pub fn toggle_view(&mut self) {
        self.view_mode = match self.view_mode {
            ViewMode::Tasks => ViewMode::Rewards,
            ViewMode::Rewards => ViewMode::Tasks,
        };
    }

    /// Initiates the "Add Task" wizard.
    pub fn start_add(&mut self) {
        if let ViewMode::Rewards = self.view_mode { return; }
        self.input_mode = InputMode::Adding;
        self.add_state = AddState::default();
        self.input_buffer.clear();
    }

    /// Initiates editing of a specific field for the selected task.
    pub fn start_edit(&mut self, field: InputField) {
        let Some(t) = self.selected_task().cloned() else { return };
        self.input_buffer = match field {
            InputField::Title => t.title.clone(),
            InputField::Date => t.date.to_string(),
            InputField::Time => t.time.format("%H:%M").to_string(),
            InputField::Priority => t.priority.to_string(),
            InputField::None => String::new(),
        };
        self.target_id = Some(t.id);
        self.input_mode = InputMode::Editing;
        self.input_field = field;
    }

    /// Handles text input based on the current mode.
    pub fn handle_input(&mut self) {
        match self.input_mode {
            InputMode::Adding => self.handle_adding_input(),
            InputMode::Editing => self.handle_editing_input(),
            _ => {}
        }
    }

    /// Handles input for the "Add Task" wizard.
    fn handle_adding_input(&mut self) {
        let value = self.input_buffer.trim().to_string();
        match self.add_state.step {
            0 => { // Title
                if value.is_empty() { return; }
                self.add_state.title = value;
            }
            1 => { // Date, empty for today
                self.add_state.date = (!value.is_empty()).then_some(value);
            }
            2 => { // Time
                if value.is_empty() { return; }
                self.add_state.time = value;
            }
            3 => { // Priority, empty for medium
                let priority = if value.is_empty() {
                    Ok(Priority::default())
                } else {
                    value.parse::<Priority>()
                };
                let result = priority.and_then(|p| {
                    cmd_add(
                        &self.config,
                        self.add_state.title.clone(),
                        self.add_state.date.clone(),
                        self.add_state.time.clone(),
                        p,
                        true,
                    )
                });
                let result = result.map(|t| format!("Task added (id = {}).", t.id));
                self.report(result);
                self.input_mode = InputMode::Normal;
                self.input_buffer.clear();
                self.reload();
                return;
            }
            _ => {}
        }
        self.add_state.step += 1;
        self.input_buffer.clear();
    }

    /// Handles input for the "Edit Task" mode.
    fn handle_editing_input(&mut self) {
        if let Some(id) = self.target_id {
            let value = self.input_buffer.clone();
            let cfg = &self.config;
            let result = match self.input_field {
                InputField::Title => cmd_edit(cfg, id, Some(value), None, None, None, None, true),
                InputField::Date => cmd_edit(cfg, id, None, Some(value), None, None, None, true),
                InputField::Time => cmd_edit(cfg, id, None, None, Some(value), None, None, true),
                InputField::Priority => value
                    .parse::<Priority>()
                    .and_then(|p| cmd_edit(cfg, id, None, None, None, Some(p), None, true)),
                InputField::None => {
                    self.input_mode = InputMode::Normal;
                    return;
                }
            };
            let result = result.map(|_| format!("Task {} updated.", id));
            self.report(result);
            self.input_mode = InputMode::Normal;
            self.input_buffer.clear();
            self.reload();
        }
    }
}
