//! End-to-end CLI tests: task lifecycle, ownership, comments, preferences,
//! rate limiting, and error reporting.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::path::Path;
use tempfile::TempDir;

fn tl_cmd(dir: &Path, user: &str) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("tl"));
    cmd.current_dir(dir);
    cmd.env("TASKLANE_USER", user);
    cmd.env("TASKLANE_LOG", "error");
    cmd.env_remove("TASKLANE_FORMAT");
    cmd
}

fn init_project() -> TempDir {
    let dir = TempDir::new().expect("tempdir");
    tl_cmd(dir.path(), "ada").args(["init"]).assert().success();
    dir
}

fn run_json(dir: &Path, user: &str, args: &[&str]) -> Value {
    let output = tl_cmd(dir, user)
        .args(args)
        .arg("--json")
        .output()
        .expect("run tl");
    assert!(
        output.status.success(),
        "tl {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout is JSON")
}

fn run_json_err(dir: &Path, user: &str, args: &[&str]) -> Value {
    let output = tl_cmd(dir, user)
        .args(args)
        .arg("--json")
        .output()
        .expect("run tl");
    assert!(!output.status.success(), "tl {args:?} unexpectedly succeeded");
    let stderr = String::from_utf8_lossy(&output.stderr);
    let start = stderr.find('{').expect("JSON error on stderr");
    let mut stream = serde_json::Deserializer::from_str(&stderr[start..]).into_iter::<Value>();
    stream
        .next()
        .expect("one JSON value")
        .expect("valid JSON")
}

fn create_task(dir: &Path, user: &str, title: &str) -> i64 {
    run_json(dir, user, &["task", "create", title])["taskId"]
        .as_i64()
        .expect("taskId")
}

#[test]
fn init_creates_store_and_config() {
    let dir = init_project();
    assert!(dir.path().join(".tasklane/config.toml").exists());
    assert!(dir.path().join(".tasklane/tasklane.sqlite3").exists());

    let second = run_json(dir.path(), "ada", &["init"]);
    assert_eq!(second["ok"], true);
    assert_eq!(second["config_written"], false);
    assert_eq!(second["schema_version"], 2);
}

#[test]
fn buy_milk_lifecycle() {
    let dir = init_project();
    let id = create_task(dir.path(), "ada", "Buy milk");
    let id_arg = id.to_string();

    let task = run_json(dir.path(), "ada", &["task", "show", &id_arg]);
    assert_eq!(task["title"], "Buy milk");
    assert_eq!(task["status"], "pending");
    assert_eq!(task["priority"], "medium");

    run_json(dir.path(), "ada", &["task", "done", &id_arg]);
    let task = run_json(dir.path(), "ada", &["task", "show", &id_arg]);
    assert_eq!(task["status"], "completed");
    assert!(task["completedAt"].is_i64());

    let history = run_json(dir.path(), "ada", &["activity", &id_arg]);
    let actions: Vec<&str> = history
        .as_array()
        .expect("array")
        .iter()
        .map(|e| e["action"].as_str().expect("action"))
        .collect();
    assert_eq!(actions, vec!["created", "completed"]);

    run_json(dir.path(), "ada", &["task", "delete", &id_arg]);
    let history = run_json(dir.path(), "ada", &["activity", &id_arg]);
    assert_eq!(history, Value::Array(vec![]));

    let err = run_json_err(dir.path(), "ada", &["task", "show", &id_arg]);
    assert_eq!(err["error"]["error_code"], "E2001");
}

#[test]
fn other_users_cannot_touch_a_task() {
    let dir = init_project();
    let id = create_task(dir.path(), "ada", "private").to_string();

    let err = run_json_err(dir.path(), "grace", &["task", "show", &id]);
    assert_eq!(err["error"]["error_code"], "E1002");

    let err = run_json_err(dir.path(), "grace", &["task", "update", &id, "--title", "mine"]);
    assert_eq!(err["error"]["error_code"], "E1002");

    let listed = run_json(dir.path(), "grace", &["task", "list"]);
    assert_eq!(listed, Value::Array(vec![]));
}

#[test]
fn missing_identity_is_rejected() {
    let dir = init_project();
    let err = run_json_err(dir.path(), "", &["task", "list"]);
    assert_eq!(err["error"]["error_code"], "E1001");
}

#[test]
fn validation_errors_name_the_rule() {
    let dir = init_project();
    let long = "x".repeat(201);
    let err = run_json_err(dir.path(), "ada", &["task", "create", &long]);
    assert_eq!(err["error"]["error_code"], "E3001");
    assert_eq!(
        err["error"]["message"],
        "Task title must be between 1 and 200 characters"
    );
    assert_eq!(err["error"]["field"], "title");

    let err = run_json_err(
        dir.path(),
        "ada",
        &["task", "create", "past", "--due", "2000-01-01"],
    );
    assert_eq!(err["error"]["error_code"], "E3001");
    assert_eq!(err["error"]["field"], "dueDate");
}

#[test]
fn comments_round_trip_through_the_cli() {
    let dir = init_project();
    let task = create_task(dir.path(), "ada", "t").to_string();

    let added = run_json(dir.path(), "ada", &["comment", "add", &task, "first"]);
    let comment = added["commentId"].as_i64().expect("commentId").to_string();
    run_json(dir.path(), "ada", &["comment", "add", &task, "second"]);

    let count = run_json(dir.path(), "ada", &["comment", "count", &task]);
    assert_eq!(count["count"], 2);

    let recent = run_json(dir.path(), "ada", &["comment", "list", &task, "--recent", "1"]);
    assert_eq!(recent[0]["content"], "second");

    run_json(dir.path(), "ada", &["comment", "edit", &comment, "first, revised"]);
    let shown = run_json(dir.path(), "ada", &["comment", "show", &comment]);
    assert_eq!(shown["content"], "first, revised");

    run_json(dir.path(), "ada", &["comment", "rm", &comment]);
    let err = run_json_err(dir.path(), "ada", &["comment", "show", &comment]);
    assert_eq!(err["error"]["error_code"], "E2002");
}

#[test]
fn preferences_default_then_update() {
    let dir = init_project();
    let prefs = run_json(dir.path(), "ada", &["prefs", "show"]);
    assert_eq!(prefs["theme"], "system");
    assert_eq!(prefs["defaultView"], "list");
    assert_eq!(prefs["notificationsEnabled"], true);

    run_json(
        dir.path(),
        "ada",
        &["prefs", "set", "--theme", "dark", "--notifications", "false"],
    );
    let prefs = run_json(dir.path(), "ada", &["prefs", "show"]);
    assert_eq!(prefs["theme"], "dark");
    assert_eq!(prefs["notificationsEnabled"], false);
}

#[test]
fn dashboard_reflects_task_state() {
    let dir = init_project();
    let id = create_task(dir.path(), "ada", "a").to_string();
    create_task(dir.path(), "ada", "b");
    run_json(dir.path(), "ada", &["task", "done", &id]);

    let summary = run_json(dir.path(), "ada", &["dashboard"]);
    assert_eq!(summary["totalTasks"], 2);
    assert_eq!(summary["completedTasks"], 1);

    let stats = run_json(dir.path(), "ada", &["dashboard", "completion"]);
    assert_eq!(stats["completionRate"], 50);
    assert_eq!(stats["recentCompletions"], 1);
}

#[test]
fn quota_is_shared_across_processes() {
    let dir = init_project();
    let mut limited = None;
    for n in 0..10 {
        let output = tl_cmd(dir.path(), "ada")
            .args(["task", "create", &format!("t{n}"), "--json"])
            .output()
            .expect("run tl");
        if !output.status.success() {
            limited = Some((n, String::from_utf8_lossy(&output.stderr).into_owned()));
            break;
        }
    }
    let (n, stderr) = limited.expect("a burst of creates is rate limited");
    assert!(n >= 5, "limited too early at request {n}");
    assert!(stderr.contains("E4001"), "stderr: {stderr}");
    assert!(stderr.contains("retry_after_ms"), "stderr: {stderr}");
}

#[test]
fn commands_before_init_point_at_init() {
    let dir = TempDir::new().expect("tempdir");
    tl_cmd(dir.path(), "ada")
        .args(["task", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("E5002").and(predicate::str::contains("tl init")));
}

#[test]
fn malformed_config_is_reported() {
    let dir = init_project();
    std::fs::write(dir.path().join(".tasklane/config.toml"), "[store\n").expect("write config");
    tl_cmd(dir.path(), "ada")
        .args(["task", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("E5001"));
}

#[test]
fn text_output_is_one_line_per_task() {
    let dir = init_project();
    create_task(dir.path(), "ada", "alpha");
    create_task(dir.path(), "ada", "beta");
    tl_cmd(dir.path(), "ada")
        .args(["task", "list", "--format", "text"])
        .assert()
        .success()
        .stdout(predicate::str::contains("beta").and(predicate::str::contains("alpha")));
}
