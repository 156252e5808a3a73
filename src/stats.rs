use serde::Serialize;

use crate::error::Result;
use crate::models::Task;
use crate::scoring::level_for;
use crate::storage::{Store, TaskFilter};

/// A user's derived progression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UserStats {
    pub total_points: u32,
    pub level: u32,
}

/// Sums the points of completed tasks and derives the level.
///
/// Incomplete tasks never contribute, whatever their stored points.
pub fn aggregate(tasks: &[Task]) -> UserStats {
    let total_points = tasks.iter()
        .filter(|t| t.completed)
        .map(|t| t.points_earned)
        .sum();
    UserStats { total_points, level: level_for(total_points) }
}

/// Recomputes a user's totals from every task they own and saves them.
///
/// Always rebuilt from scratch rather than patched, so repeated calls agree
/// and no stale increment can survive. Costs one pass over the user's tasks.
pub fn recompute_user_stats(store: &mut impl Store, user_id: u64) -> Result<UserStats> {
    let mut user = store.find_user(user_id)?;
    let tasks = store.find_tasks_by_owner(user_id, &TaskFilter::default())?;
    let stats = aggregate(&tasks);

    user.total_points = stats.total_points;
    user.level = stats.level;
    store.save_user(&user)?;

    tracing::debug!(user = user_id, total_points = stats.total_points, level = stats.level, "recomputed user stats");
    Ok(stats)
}

/// Number of users shown on the leaderboard.
pub const LEADERBOARD_SIZE: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeaderboardEntry {
    pub rank: usize,
    /// Display name, or "You" for the requesting user.
    pub name: String,
    pub username: String,
    pub points: u32,
    pub level: u32,
    pub is_current_user: bool,
}

/// Top users by total points, highest first. Ties keep registration order.
pub fn leaderboard(store: &impl Store, current_user_id: u64) -> Result<Vec<LeaderboardEntry>> {
    let mut users = store.list_users()?;
    users.sort_by(|a, b| b.total_points.cmp(&a.total_points).then(a.id.cmp(&b.id)));
    Ok(users.into_iter()
        .take(LEADERBOARD_SIZE)
        .enumerate()
        .map(|(i, u)| {
            let is_current_user = u.id == current_user_id;
            LeaderboardEntry {
                rank: i + 1,
                name: if is_current_user { "You".to_string() } else { u.name },
                username: u.username,
                points: u.total_points,
                level: u.level,
                is_current_user,
            }
        })
        .collect())
}
