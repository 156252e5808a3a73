use std::collections::BTreeSet;

use serde::Serialize;

use crate::error::Result;
use crate::models::{Task, User};
use crate::storage::{Store, TaskFilter};

/// Scheduled hour before which a completed task counts as early.
pub const EARLY_HOUR: u32 = 8;
/// Scheduled hour from which a completed task counts as late.
pub const LATE_HOUR: u32 = 22;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    TasksCompleted,
    OnTimeCompleted,
    Streak,
    EarlyTask,
    LateTask,
    /// Catalogued, but without a defined rule. Never unlocks.
    PerfectWeek,
    TotalPoints,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Achievement {
    pub id: u32,
    pub name: &'static str,
    pub requirement: u32,
    pub category: Category,
}

const fn entry(id: u32, name: &'static str, requirement: u32, category: Category) -> Achievement {
    Achievement { id, name, requirement, category }
}

/// The fixed achievement catalog. Ids are stable.
pub static CATALOG: &[Achievement] = &[
    entry(1, "First Step", 1, Category::TasksCompleted),
    entry(2, "Getting Started", 10, Category::TasksCompleted),
    entry(3, "Task Master", 50, Category::TasksCompleted),
    entry(4, "Century Club", 100, Category::TasksCompleted),
    entry(5, "Punctual", 5, Category::OnTimeCompleted),
    entry(6, "Time Lord", 25, Category::OnTimeCompleted),
    entry(7, "Hot Streak", 7, Category::Streak),
    entry(8, "Unstoppable", 30, Category::Streak),
    entry(9, "Early Bird", 1, Category::EarlyTask),
    entry(10, "Night Owl", 1, Category::LateTask),
    entry(11, "Perfectionist", 7, Category::PerfectWeek),
    entry(12, "Legend", 1000, Category::TotalPoints),
];

/// Counters the unlock rules are evaluated against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Facts {
    tasks_completed: u32,
    on_time_completed: u32,
    early: bool,
    late: bool,
}

impl Facts {
    fn gather(tasks: &[Task]) -> Self {
        let mut facts = Facts::default();
        for t in tasks {
            if t.on_time() {
                facts.on_time_completed += 1;
            }
            if !t.completed {
                continue;
            }
            facts.tasks_completed += 1;
            facts.early |= t.scheduled_hour() < EARLY_HOUR;
            facts.late |= t.scheduled_hour() >= LATE_HOUR;
        }
        facts
    }
}

fn unlocked(achievement: &Achievement, user: &User, facts: &Facts) -> bool {
    match achievement.category {
        Category::TasksCompleted => facts.tasks_completed >= achievement.requirement,
        Category::OnTimeCompleted => facts.on_time_completed >= achievement.requirement,
        Category::Streak => user.current_streak >= achievement.requirement,
        Category::TotalPoints => user.total_points >= achievement.requirement,
        Category::EarlyTask => facts.early,
        Category::LateTask => facts.late,
        Category::PerfectWeek => false,
    }
}

/// Computes which catalog entries a user has unlocked.
///
/// Nothing is stored: the result is derived fresh from `user` and the full
/// task history every time.
pub fn evaluate(user: &User, tasks: &[Task]) -> BTreeSet<u32> {
    let facts = Facts::gather(tasks);
    CATALOG.iter()
        .filter(|a| unlocked(a, user, &facts))
        .map(|a| a.id)
        .collect()
}

/// A user's progression together with their unlocked achievements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RewardsReport {
    pub total_points: u32,
    pub level: u32,
    pub current_streak: u32,
    pub tasks_completed: u32,
    pub on_time_completed: u32,
    pub badges_earned: usize,
    pub unlocked_achievements: Vec<u32>,
}

/// Builds the rewards report for a user from the store.
pub fn rewards(store: &impl Store, user_id: u64) -> Result<RewardsReport> {
    let user = store.find_user(user_id)?;
    let tasks = store.find_tasks_by_owner(user_id, &TaskFilter::default())?;
    Ok(rewards_for(&user, &tasks))
}

pub fn rewards_for(user: &User, tasks: &[Task]) -> RewardsReport {
    let facts = Facts::gather(tasks);
    let unlocked: Vec<u32> = evaluate(user, tasks).into_iter().collect();
    RewardsReport {
        total_points: user.total_points,
        level: user.level,
        current_streak: user.current_streak,
        tasks_completed: facts.tasks_completed,
        on_time_completed: facts.on_time_completed,
        badges_earned: unlocked.len(),
        unlocked_achievements: unlocked,
    }
}
