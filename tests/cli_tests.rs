use std::path::Path;
use std::process::{Command, Output};

use predicates::prelude::*;
use serde_json::Value;
use tempfile::tempdir;

fn taskmaster(db: &Path) -> Command {
    let binary = assert_cmd::cargo::cargo_bin!("taskmaster");
    let mut cmd = Command::new(binary);
    cmd.env("TASKMASTER_DB", db)
        .env("TASKMASTER_USER", "ada")
        .env("TASKMASTER_TZ", "utc")
        .env_remove("RUST_LOG");
    cmd
}

fn run_ok(db: &Path, args: &[&str]) -> Output {
    let output = taskmaster(db).args(args).output().expect("taskmaster executes");
    assert!(
        output.status.success(),
        "taskmaster {:?} failed:\nstdout:\n{}\nstderr:\n{}",
        args,
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    output
}

fn run_json(db: &Path, args: &[&str]) -> Value {
    let output = run_ok(db, args);
    serde_json::from_slice(&output.stdout).expect("valid json stdout")
}

#[test]
fn complete_then_report_rewards() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("db.json");

    run_ok(&db, &["user", "add", "Ada Lovelace", "ada"]);
    run_ok(&db, &["add", "Write report", "--date", "2999-01-01", "--time", "09:00", "--priority", "high"]);
    run_ok(&db, &["complete", "1"]);

    let rewards = run_json(&db, &["--json", "rewards"]);
    assert_eq!(rewards["total_points"], 20);
    assert_eq!(rewards["level"], 1);
    assert_eq!(rewards["tasks_completed"], 1);
    assert_eq!(rewards["on_time_completed"], 1);
    assert_eq!(rewards["unlocked_achievements"], serde_json::json!([1]));

    let tasks = run_json(&db, &["--json", "list", "--completed"]);
    assert_eq!(tasks.as_array().unwrap().len(), 1);
    assert_eq!(tasks[0]["points_earned"], 20);
    assert_eq!(tasks[0]["completed_on_time"], true);
}

#[test]
fn failures_map_to_exit_codes() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("db.json");
    run_ok(&db, &["user", "add", "Ada Lovelace", "ada"]);

    assert_cmd::Command::from_std(taskmaster(&db))
        .args(["complete", "42"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("task 42"));

    assert_cmd::Command::from_std(taskmaster(&db))
        .args(["add", "Bad", "--time", "25:00"])
        .assert()
        .failure()
        .code(3);

    assert_cmd::Command::from_std(taskmaster(&db))
        .args(["analytics", "--days", "0"])
        .assert()
        .failure()
        .code(3);

    assert_cmd::Command::from_std(taskmaster(&db))
        .env("TASKMASTER_USER", "nobody")
        .arg("rewards")
        .assert()
        .failure()
        .code(2);
}

#[test]
fn analytics_json_has_one_bucket_per_day() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("db.json");
    run_ok(&db, &["user", "add", "Ada Lovelace", "ada"]);
    run_ok(&db, &["add", "Today", "--time", "23:59"]);

    let summary = run_json(&db, &["--json", "analytics", "--days", "7"]);
    assert_eq!(summary["window_days"], 7);
    assert_eq!(summary["total"], 1);
    assert_eq!(summary["daily_buckets"].as_array().unwrap().len(), 7);
    assert_eq!(summary["daily_buckets"][6]["total"], 1);
}

#[test]
fn ui_reports_unknown_user_with_exit_code() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("db.json");

    assert_cmd::Command::from_std(taskmaster(&db))
        .env("TASKMASTER_USER", "nobody")
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("user 'nobody' not found"));
}

#[test]
fn completions_reject_unknown_shell() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("db.json");

    assert_cmd::Command::from_std(taskmaster(&db))
        .args(["completions", "nosuchshell"])
        .assert()
        .failure();

    assert_cmd::Command::from_std(taskmaster(&db))
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("taskmaster"));
}

#[test]
fn oversized_analytics_window_is_invalid_input() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("db.json");
    run_ok(&db, &["user", "add", "Ada Lovelace", "ada"]);

    assert_cmd::Command::from_std(taskmaster(&db))
        .args(["analytics", "--days", "100000000"])
        .assert()
        .failure()
        .code(3);
}
