use std::collections::BTreeMap;

use chrono::{DateTime, Days, Duration, NaiveDate, Utc};
use serde::Serialize;

use crate::config::Zone;
use crate::error::{Result, TaskError};
use crate::models::{Task, User};

/// Volume and completions for one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DailyBucket {
    pub date: NaiveDate,
    pub total: usize,
    pub completed: usize,
}

/// Trailing-window summary ending at "now".
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowSummary {
    pub window_days: u32,
    pub total: usize,
    pub completed: usize,
    pub on_time_completed: usize,
    /// Percent of tasks completed, rounded.
    pub completion_rate: u32,
    /// Percent of completed tasks finished on time, rounded.
    pub on_time_rate: u32,
    /// Tasks per day over the window, one decimal place.
    pub avg_per_day: f64,
    /// One entry per day, oldest first.
    pub daily_buckets: Vec<DailyBucket>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonthSummary {
    pub year: i32,
    pub month: u32,
    pub total: usize,
    pub completed: usize,
    pub completion_rate: u32,
}

/// Snapshot of the tasks scheduled for a single day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TodaySummary {
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub pending_tasks: usize,
    pub total_points: u32,
    pub on_time_completed: usize,
}

/// Longest accepted analytics window, roughly a century.
pub const MAX_WINDOW_DAYS: u32 = 36_500;

/// Summarizes tasks scheduled in the trailing `window_days` ending at `now`.
///
/// A task is in the window when the start of its scheduled day (in `zone`)
/// lies in `[now - window_days, now]`, so future days are excluded. Buckets
/// cover the `window_days` calendar days ending today.
///
/// The start is inclusive: when `now` is exactly midnight in `zone`, the day
/// `today - window_days` counts toward `total` but has no bucket.
pub fn summarize(tasks: &[Task], window_days: u32, now: DateTime<Utc>, zone: Zone) -> Result<WindowSummary> {
    if window_days == 0 {
        return Err(TaskError::invalid("window must be at least one day"));
    }
    if window_days > MAX_WINDOW_DAYS {
        return Err(TaskError::invalid(format!("window must be at most {} days", MAX_WINDOW_DAYS)));
    }
    let start = now
        .checked_sub_signed(Duration::days(i64::from(window_days)))
        .ok_or_else(|| TaskError::invalid("window reaches before the earliest supported date"))?;
    let in_window: Vec<&Task> = tasks.iter()
        .filter(|t| {
            let day_start = zone.midnight(t.date);
            day_start >= start && day_start <= now
        })
        .collect();

    let total = in_window.len();
    let completed = in_window.iter().filter(|t| t.completed).count();
    let on_time_completed = in_window.iter().filter(|t| t.on_time()).count();

    let mut per_day: BTreeMap<NaiveDate, (usize, usize)> = BTreeMap::new();
    for t in &in_window {
        let entry = per_day.entry(t.date).or_default();
        entry.0 += 1;
        if t.completed {
            entry.1 += 1;
        }
    }

    let today = zone.date_of(now);
    let daily_buckets = (0..window_days)
        .rev()
        .map(|back| {
            let date = today
                .checked_sub_days(Days::new(u64::from(back)))
                .ok_or_else(|| TaskError::invalid("window reaches before the earliest supported date"))?;
            let (total, completed) = per_day.get(&date).copied().unwrap_or_default();
            Ok(DailyBucket { date, total, completed })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(WindowSummary {
        window_days,
        total,
        completed,
        on_time_completed,
        completion_rate: percent(completed, total),
        on_time_rate: percent(on_time_completed, completed),
        avg_per_day: one_decimal(total as f64 / f64::from(window_days)),
        daily_buckets,
    })
}

/// Summarizes tasks scheduled anywhere in the given calendar month.
pub fn summarize_month(tasks: &[Task], year: i32, month: u32) -> Result<MonthSummary> {
    let (first, last) = month_bounds(year, month)?;
    let in_month: Vec<&Task> = tasks.iter()
        .filter(|t| t.date >= first && t.date <= last)
        .collect();
    let total = in_month.len();
    let completed = in_month.iter().filter(|t| t.completed).count();
    Ok(MonthSummary {
        year,
        month,
        total,
        completed,
        completion_rate: percent(completed, total),
    })
}

/// First and last day of a calendar month.
///
/// The last day is the day before the first of the following month.
pub fn month_bounds(year: i32, month: u32) -> Result<(NaiveDate, NaiveDate)> {
    let invalid = || TaskError::invalid(format!("invalid month {}-{:02}", year, month));
    let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    let next_first = NaiveDate::from_ymd_opt(next_year, next_month, 1).ok_or_else(invalid)?;
    Ok((first, next_first - Duration::days(1)))
}

/// Summarizes the tasks scheduled on `today` alongside the user's points.
pub fn today_summary(tasks: &[Task], user: &User, today: NaiveDate) -> TodaySummary {
    let todays: Vec<&Task> = tasks.iter().filter(|t| t.date == today).collect();
    let completed_tasks = todays.iter().filter(|t| t.completed).count();
    TodaySummary {
        total_tasks: todays.len(),
        completed_tasks,
        pending_tasks: todays.len() - completed_tasks,
        total_points: user.total_points,
        on_time_completed: todays.iter().filter(|t| t.on_time()).count(),
    }
}

/// Rounded percentage; 0 when there is nothing to divide by.
fn percent(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 0;
    }
    (part as f64 * 100.0 / whole as f64).round() as u32
}

fn one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::{FixedOffset, NaiveTime};

    use crate::models::Priority;

    fn date(value: &str) -> NaiveDate {
        NaiveDate::parse_from_str(value, "%Y-%m-%d").unwrap()
    }

    fn dt(value: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(value)
            .unwrap()
            .with_timezone(&Utc)
    }

    fn task(day: &str, completed: bool) -> Task {
        Task {
            id: 0,
            owner_id: 1,
            title: "t".into(),
            date: date(day),
            time: NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
            priority: Priority::Medium,
            completed,
            completed_at: None,
            completed_on_time: completed.then_some(true),
            points_earned: 0,
            created_at: dt("2024-01-01T00:00:00Z"),
        }
    }

    #[test]
    fn percent_handles_empty_denominator() {
        assert_eq!(percent(0, 0), 0);
        assert_eq!(percent(1, 3), 33);
        assert_eq!(percent(2, 3), 67);
        assert_eq!(percent(1, 2), 50);
    }

    #[test]
    fn month_bounds_use_day_before_next_month() {
        assert_eq!(month_bounds(2024, 2).unwrap(), (date("2024-02-01"), date("2024-02-29")));
        assert_eq!(month_bounds(2023, 12).unwrap(), (date("2023-12-01"), date("2023-12-31")));
        assert!(month_bounds(2024, 13).is_err());
        assert!(month_bounds(2024, 0).is_err());
    }

    #[test]
    fn future_days_are_outside_the_window() {
        let now = dt("2024-03-10T15:00:00Z");
        let tasks = vec![task("2024-03-10", false), task("2024-03-11", false)];

        let summary = summarize(&tasks, 7, now, Zone::Utc).unwrap();
        assert_eq!(summary.total, 1);
        assert_eq!(summary.daily_buckets.last().unwrap().date, date("2024-03-10"));
        assert_eq!(summary.daily_buckets.last().unwrap().total, 1);
    }

    #[test]
    fn buckets_follow_the_configured_zone() {
        // 23:30 UTC is already the next day at +02:00.
        let now = dt("2024-03-10T23:30:00Z");
        let plus_two = Zone::Fixed(FixedOffset::east_opt(2 * 3600).unwrap());
        let tasks = vec![task("2024-03-11", true)];

        let utc = summarize(&tasks, 3, now, Zone::Utc).unwrap();
        assert_eq!(utc.total, 0);
        assert_eq!(utc.daily_buckets.last().unwrap().date, date("2024-03-10"));

        let shifted = summarize(&tasks, 3, now, plus_two).unwrap();
        assert_eq!(shifted.total, 1);
        assert_eq!(shifted.daily_buckets.last().unwrap().date, date("2024-03-11"));
        assert_eq!(shifted.daily_buckets.last().unwrap().completed, 1);
    }

    #[test]
    fn zero_day_window_is_rejected() {
        let err = summarize(&[], 0, dt("2024-03-10T00:00:00Z"), Zone::Utc).unwrap_err();
        assert!(matches!(err, TaskError::InvalidInput(_)));
    }

    #[test]
    fn oversized_window_is_rejected() {
        let now = Utc::now();
        let err = summarize(&[], 100_000_000, now, Zone::Utc).unwrap_err();
        assert!(matches!(err, TaskError::InvalidInput(_)));
        let err = summarize(&[], MAX_WINDOW_DAYS + 1, now, Zone::Utc).unwrap_err();
        assert!(matches!(err, TaskError::InvalidInput(_)));

        let widest = summarize(&[], MAX_WINDOW_DAYS, now, Zone::Utc).unwrap();
        assert_eq!(widest.daily_buckets.len(), MAX_WINDOW_DAYS as usize);
    }

    #[test]
    fn window_start_is_inclusive_at_midnight() {
        let now = dt("2024-03-10T00:00:00Z");
        let tasks = vec![task("2024-03-03", false), task("2024-03-02", false)];

        let summary = summarize(&tasks, 7, now, Zone::Utc).unwrap();
        assert_eq!(summary.total, 1);
        assert_eq!(summary.daily_buckets[0].date, date("2024-03-04"));
        let bucketed: usize = summary.daily_buckets.iter().map(|b| b.total).sum();
        assert_eq!(bucketed, 0);
    }
}
