use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, Utc};
use taskmaster::config::Zone;
use taskmaster::models::{Priority, Task};
use taskmaster::scoring::{is_on_time, level_for, points};

fn dt(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .unwrap()
        .with_timezone(&Utc)
}

fn scheduled(priority: Priority) -> Task {
    Task {
        id: 1,
        owner_id: 1,
        title: "Standup".into(),
        date: NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
        time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        priority,
        completed: false,
        completed_at: None,
        completed_on_time: None,
        points_earned: 0,
        created_at: dt("2024-01-01T00:00:00Z"),
    }
}

#[test]
fn test_points_stay_in_the_known_set() {
    let allowed = [5, 8, 10, 13, 15, 18, 20];
    for priority in [Priority::Low, Priority::Medium, Priority::High] {
        for on_time in [false, true] {
            let p = points(priority, on_time);
            assert!(allowed.contains(&p), "{} not allowed", p);
            assert_eq!(p == 20, priority == Priority::High && on_time);
        }
    }
    assert_eq!(points(Priority::Low, false), 5);
    assert_eq!(points(Priority::Medium, true), 18);
}

#[test]
fn test_early_completion_is_on_time() {
    let mut task = scheduled(Priority::High);
    task.complete(dt("2024-01-10T08:30:00Z"), Zone::Utc);

    assert!(task.completed);
    assert_eq!(task.completed_on_time, Some(true));
    assert_eq!(task.points_earned, 20);
}

#[test]
fn test_late_completion_loses_bonus() {
    let mut task = scheduled(Priority::High);
    task.complete(dt("2024-01-10T09:15:00Z"), Zone::Utc);

    assert_eq!(task.completed_on_time, Some(false));
    assert_eq!(task.points_earned, 10);
}

#[test]
fn test_exact_deadline_counts_as_on_time() {
    let date = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
    let time = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
    assert!(is_on_time(date, time, dt("2024-01-10T09:00:00Z"), Zone::Utc));
    assert!(!is_on_time(date, time, dt("2024-01-10T09:00:01Z"), Zone::Utc));
}

#[test]
fn test_schedule_is_read_in_the_configured_zone() {
    // 09:00 at +02:00 is 07:00 UTC.
    let zone = Zone::Fixed(FixedOffset::east_opt(2 * 3600).unwrap());
    let mut task = scheduled(Priority::Low);
    task.complete(dt("2024-01-10T08:30:00Z"), zone);

    assert_eq!(task.completed_on_time, Some(false));
    assert_eq!(task.points_earned, 5);
}

#[test]
fn test_reopen_restores_defaults() {
    let mut task = scheduled(Priority::Medium);
    task.complete(dt("2024-01-09T12:00:00Z"), Zone::Utc);
    assert_eq!(task.points_earned, 18);

    task.reopen();
    assert!(!task.completed);
    assert_eq!(task.completed_at, None);
    assert_eq!(task.completed_on_time, None);
    assert_eq!(task.points_earned, 0);
}

#[test]
fn test_level_thresholds() {
    assert_eq!(level_for(0), 1);
    assert_eq!(level_for(99), 1);
    assert_eq!(level_for(100), 2);
    assert_eq!(level_for(250), 3);

    let mut previous = level_for(0);
    for p in 1..=2_000 {
        let level = level_for(p);
        assert!(level >= previous);
        previous = level;
    }
}
