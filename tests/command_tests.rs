use taskmaster::commands::*;
use taskmaster::config::{Config, Zone};
use taskmaster::error::{ErrorKind, TaskError};
use taskmaster::export::ExportFormat;
use taskmaster::models::Priority;
use taskmaster::storage::{load, Database, Store};
use std::fs;
use tempfile::tempdir;

// Far enough ahead that completing now is always on time.
const FUTURE: &str = "2999-01-01";
const PAST: &str = "2000-01-01";

fn with_test_db<F>(f: F)
where
    F: FnOnce(Config),
{
    let dir = tempdir().unwrap();
    let mut cfg = Config::at(dir.path().join("db.json"), Zone::Utc);
    cmd_user_add(&cfg, "Test User".into(), "tester".into(), true).unwrap();
    cfg.user = Some("tester".into());

    f(cfg);
}

fn db(cfg: &Config) -> Database {
    load(&cfg.db_path).unwrap()
}

fn tester(cfg: &Config) -> taskmaster::models::User {
    db(cfg).find_user_by_username("tester").unwrap()
}

#[test]
fn test_add_and_list() {
    with_test_db(|cfg| {
        cmd_add(&cfg, "Test Task".into(), Some(FUTURE.into()), "09:00".into(), Priority::default(), true).unwrap();

        let tasks = db(&cfg).tasks;
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].title, "Test Task");
        assert_eq!(tasks[0].priority, Priority::Medium);
        assert!(!tasks[0].completed);
        assert_eq!(tasks[0].points_earned, 0);
        assert_eq!(tasks[0].completed_on_time, None);
    });
}

#[test]
fn test_complete_on_time_awards_points() {
    with_test_db(|cfg| {
        let task = cmd_add(&cfg, "Ship it".into(), Some(FUTURE.into()), "09:00".into(), Priority::High, true).unwrap();

        let done = cmd_complete(&cfg, task.id, true).unwrap();
        assert!(done.completed);
        assert!(done.completed_at.is_some());
        assert_eq!(done.completed_on_time, Some(true));
        assert_eq!(done.points_earned, 20);

        let user = tester(&cfg);
        assert_eq!(user.total_points, 20);
        assert_eq!(user.level, 1);
    });
}

#[test]
fn test_late_completion_earns_less() {
    with_test_db(|cfg| {
        let task = cmd_add(&cfg, "Old chore".into(), Some(PAST.into()), "09:00".into(), Priority::Medium, true).unwrap();

        let done = cmd_complete(&cfg, task.id, true).unwrap();
        assert_eq!(done.completed_on_time, Some(false));
        assert_eq!(done.points_earned, 8);
        assert_eq!(tester(&cfg).total_points, 8);
    });
}

#[test]
fn test_completing_twice_does_not_double_count() {
    with_test_db(|cfg| {
        let task = cmd_add(&cfg, "Once".into(), Some(FUTURE.into()), "09:00".into(), Priority::Low, true).unwrap();

        cmd_complete(&cfg, task.id, true).unwrap();
        cmd_complete(&cfg, task.id, true).unwrap();
        assert_eq!(tester(&cfg).total_points, 15);
    });
}

#[test]
fn test_reopen_clears_completion() {
    with_test_db(|cfg| {
        let task = cmd_add(&cfg, "Undo me".into(), Some(FUTURE.into()), "09:00".into(), Priority::High, true).unwrap();
        cmd_complete(&cfg, task.id, true).unwrap();

        let reopened = cmd_reopen(&cfg, task.id, true).unwrap();
        assert!(!reopened.completed);
        assert_eq!(reopened.completed_at, None);
        assert_eq!(reopened.completed_on_time, None);
        assert_eq!(reopened.points_earned, 0);

        let user = tester(&cfg);
        assert_eq!(user.total_points, 0);
        assert_eq!(user.level, 1);
    });
}

#[test]
fn test_remove_completed_task_drops_points() {
    with_test_db(|cfg| {
        let a = cmd_add(&cfg, "A".into(), Some(FUTURE.into()), "09:00".into(), Priority::High, true).unwrap();
        let b = cmd_add(&cfg, "B".into(), Some(PAST.into()), "09:00".into(), Priority::Low, true).unwrap();
        cmd_complete(&cfg, a.id, true).unwrap();
        cmd_complete(&cfg, b.id, true).unwrap();
        assert_eq!(tester(&cfg).total_points, 25);

        cmd_remove(&cfg, a.id, true).unwrap();

        assert_eq!(db(&cfg).tasks.len(), 1);
        assert_eq!(tester(&cfg).total_points, 5);
    });
}

#[test]
fn test_other_users_tasks_are_not_found() {
    with_test_db(|cfg| {
        let task = cmd_add(&cfg, "Mine".into(), Some(FUTURE.into()), "09:00".into(), Priority::High, true).unwrap();

        let mut other = cfg.clone();
        cmd_user_add(&other, "Intruder".into(), "mallory".into(), true).unwrap();
        other.user = Some("mallory".into());

        let err = cmd_complete(&other, task.id, true).unwrap_err();
        assert!(matches!(err, TaskError::TaskNotFound(id) if id == task.id));
        let err = cmd_remove(&other, task.id, true).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        assert_eq!(db(&cfg).tasks.len(), 1);
        assert!(!db(&cfg).tasks[0].completed);
    });
}

#[test]
fn test_edit_without_toggle_keeps_points() {
    with_test_db(|cfg| {
        let task = cmd_add(&cfg, "Draft".into(), Some(FUTURE.into()), "09:00".into(), Priority::High, true).unwrap();
        cmd_complete(&cfg, task.id, true).unwrap();

        let edited = cmd_edit(&cfg, task.id, Some("Final".into()), None, None, Some(Priority::Low), None, true).unwrap();
        assert_eq!(edited.title, "Final");
        assert_eq!(edited.priority, Priority::Low);
        assert_eq!(edited.points_earned, 20);
        assert_eq!(tester(&cfg).total_points, 20);

        let reopened = cmd_edit(&cfg, task.id, None, None, None, None, Some(false), true).unwrap();
        assert!(!reopened.completed);
        assert_eq!(tester(&cfg).total_points, 0);
    });
}

#[test]
fn test_invalid_input_is_rejected() {
    with_test_db(|cfg| {
        let err = cmd_add(&cfg, "Bad time".into(), Some(FUTURE.into()), "25:00".into(), Priority::Low, true).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        let err = cmd_add(&cfg, "Bad date".into(), Some("2024-13-01".into()), "09:00".into(), Priority::Low, true).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        let err = cmd_add(&cfg, "   ".into(), Some(FUTURE.into()), "09:00".into(), Priority::Low, true).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        assert!(db(&cfg).tasks.is_empty());
    });
}

#[test]
fn test_missing_user_selection() {
    with_test_db(|mut cfg| {
        cfg.user = None;
        let err = cmd_add(&cfg, "Orphan".into(), None, "09:00".into(), Priority::Low, true).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        cfg.user = Some("ghost".into());
        let err = cmd_add(&cfg, "Orphan".into(), None, "09:00".into(), Priority::Low, true).unwrap_err();
        assert!(matches!(err, TaskError::UserNotFound(_)));
    });
}

#[test]
fn test_duplicate_username() {
    with_test_db(|cfg| {
        let err = cmd_user_add(&cfg, "Again".into(), "tester".into(), true).unwrap_err();
        assert!(matches!(err, TaskError::DuplicateUser(_)));
        assert_eq!(db(&cfg).users.len(), 1);
    });
}

#[test]
fn test_streak_unlocks_achievement() {
    with_test_db(|cfg| {
        let user = cmd_user_streak(&cfg, 7, true).unwrap();
        assert_eq!(user.current_streak, 7);

        let db = db(&cfg);
        let report = taskmaster::achievements::rewards(&db, user.id).unwrap();
        assert_eq!(report.unlocked_achievements, vec![7]);
        assert_eq!(report.badges_earned, 1);
    });
}

#[test]
fn test_export_csv() {
    with_test_db(|cfg| {
        let a = cmd_add(&cfg, "Call mom, dad".into(), Some("2024-01-10".into()), "09:00".into(), Priority::High, true).unwrap();
        cmd_add(&cfg, "Later".into(), Some("2024-02-01".into()), "18:30".into(), Priority::Low, true).unwrap();
        cmd_complete(&cfg, a.id, true).unwrap();

        let out = cfg.db_path.with_file_name("export.csv");
        cmd_export(&cfg, ExportFormat::Csv, None, None, Some(out.clone())).unwrap();

        let csv = fs::read_to_string(&out).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "Date,Task,Time,Priority,Completed,On Time,Points");
        assert_eq!(lines[1], "2024-02-01,Later,18:30,low,No,No,0");
        assert_eq!(lines[2], "2024-01-10,\"Call mom, dad\",09:00,high,Yes,No,10");
    });
}

#[test]
fn test_export_date_range() {
    with_test_db(|cfg| {
        cmd_add(&cfg, "Jan".into(), Some("2024-01-10".into()), "09:00".into(), Priority::High, true).unwrap();
        cmd_add(&cfg, "Feb".into(), Some("2024-02-01".into()), "09:00".into(), Priority::High, true).unwrap();

        let out = cfg.db_path.with_file_name("export.json");
        cmd_export(&cfg, ExportFormat::Json, Some("2024-02-01".into()), Some("2024-02-29".into()), Some(out.clone())).unwrap();

        let exported: serde_json::Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
        let rows = exported.as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["title"], "Feb");
        assert_eq!(rows[0]["time"], "09:00");
    });
}

#[test]
fn test_parse_month() {
    assert_eq!(parse_month("2024-02").unwrap(), (2024, 2));
    assert!(parse_month("2024-13").is_err());
    assert!(parse_month("February").is_err());
}
