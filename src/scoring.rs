use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use crate::config::Zone;
use crate::models::Priority;

/// Points awarded for any completion.
pub const BASE_POINTS: u32 = 5;
/// Bonus for finishing at or before the scheduled time.
pub const ON_TIME_BONUS: u32 = 10;
/// Points needed to advance one level.
pub const POINTS_PER_LEVEL: u32 = 100;

/// Calculates the points earned by a single completion.
///
/// The score is built from:
/// - **Base**: every completion earns 5.
/// - **Punctuality**: +10 when completed on time.
/// - **Priority**: +5 for high, +3 for medium, nothing for low.
///
/// # Returns
/// One of 5, 8, 10, 13, 15, 18 or 20. Only call this for a task that is being
/// marked complete; incomplete tasks always hold 0.
pub fn points(priority: Priority, on_time: bool) -> u32 {
    let mut total = BASE_POINTS;
    if on_time {
        total += ON_TIME_BONUS;
    }
    total + match priority {
        Priority::High => 5,
        Priority::Medium => 3,
        Priority::Low => 0,
    }
}

/// Whether `completed_at` is at or before the scheduled date and time, read in `zone`.
pub fn is_on_time(date: NaiveDate, time: NaiveTime, completed_at: DateTime<Utc>, zone: Zone) -> bool {
    completed_at <= zone.resolve(date.and_time(time))
}

/// Level for a point total: starts at 1 and advances every 100 points.
pub fn level_for(total_points: u32) -> u32 {
    total_points / POINTS_PER_LEVEL + 1
}
