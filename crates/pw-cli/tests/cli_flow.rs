//! End-to-end tests driving the `pw` binary.
//!
//! Each test writes exported events to a temp directory and runs the binary
//! with an isolated HOME so no user configuration leaks in.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

fn pw_binary() -> String {
    env!("CARGO_BIN_EXE_pw").to_string()
}

fn write_json(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

fn run_pw(home: &Path, args: &[&str]) -> Output {
    Command::new(pw_binary())
        .env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env("TZ", "UTC")
        .env_remove("PW_DEFAULT_CONTEXT")
        .env_remove("PW_OVERLAP_MODE")
        .env_remove("PW_WINDOW_DAYS")
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .expect("failed to run pw")
}

fn stdout_of(output: &Output) -> String {
    assert!(
        output.status.success(),
        "pw should succeed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout.clone()).unwrap()
}

const EVENTS: &str = r#"[
    {"id": "c", "title": "School run", "start": "2025-03-03T09:00:00Z", "end": "2025-03-03T09:45:00Z", "context": "family", "duration": 45},
    {"id": "a", "title": "Standup", "start": "2025-03-03T09:00:00Z", "end": "2025-03-03T09:30:00Z", "context": "personal", "category": "work", "duration": 30},
    {"id": "b", "title": "Gym", "start": "2025-03-03T09:15:00Z", "end": "2025-03-03T10:15:00Z", "context": "personal", "category": "exercise", "duration": 60},
    {"id": "d", "title": "Old plan", "start": "2025-03-03T09:00:00Z", "end": "2025-03-03T11:00:00Z", "context": "personal", "deleted": true}
]"#;

#[test]
fn test_check_reports_overlap_in_default_context() {
    let temp = TempDir::new().unwrap();
    let events = write_json(temp.path(), "events.json", EVENTS);

    let output = run_pw(temp.path(), &["check", events.to_str().unwrap()]);
    let stdout = stdout_of(&output);

    assert!(stdout.starts_with("CONFLICT CHECK: personal (4 events)"));
    assert!(stdout.contains("Standup [a]"));
    assert!(stdout.contains("overlaps Gym [b]"));
    assert!(!stdout.contains("School run [c]"));
    assert!(!stdout.contains("Old plan [d]"));
}

#[test]
fn test_check_other_context_is_clean() {
    let temp = TempDir::new().unwrap();
    let events = write_json(temp.path(), "events.json", EVENTS);

    let output = run_pw(
        temp.path(),
        &["check", events.to_str().unwrap(), "--context", "family"],
    );
    let stdout = stdout_of(&output);

    assert!(stdout.contains("OVERLAPS\n────────\nnone"));
}

#[test]
fn test_check_with_previous_reports_jumps_and_skips_as_json() {
    let temp = TempDir::new().unwrap();
    let previous = write_json(
        temp.path(),
        "before.json",
        r#"[
            {"id": "a", "title": "Standup", "start": "2025-03-03T08:00:00Z", "end": "2025-03-03T08:30:00Z", "context": "personal"},
            {"id": "z", "title": "Lunch", "start": "2025-03-03T12:00:00Z", "end": "2025-03-03T13:00:00Z", "context": "personal"}
        ]"#,
    );
    let events = write_json(temp.path(), "events.json", EVENTS);

    let output = run_pw(
        temp.path(),
        &[
            "check",
            events.to_str().unwrap(),
            "--previous",
            previous.to_str().unwrap(),
            "--json",
        ],
    );
    let json: serde_json::Value = serde_json::from_str(&stdout_of(&output)).unwrap();

    assert_eq!(json["context"], "personal");
    assert_eq!(json["event_count"], 4);
    assert_eq!(json["report"]["overlaps"].as_array().unwrap().len(), 1);
    assert_eq!(json["report"]["ordering_issue"], false);
    assert_eq!(json["report"]["jumps"][0]["id"], "a");
    assert_eq!(json["report"]["skipped"][0]["id"], "z");
    assert_eq!(json["anomalies"].as_array().unwrap().len(), 3);
}

#[test]
fn test_check_rejects_invalid_record() {
    let temp = TempDir::new().unwrap();
    let events = write_json(
        temp.path(),
        "events.json",
        r#"[{"id": "x", "start": "2025-03-03T10:00:00Z", "end": "2025-03-03T09:00:00Z"}]"#,
    );

    let output = run_pw(temp.path(), &["check", events.to_str().unwrap()]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid event at index 0"), "stderr: {stderr}");
}

#[test]
fn test_check_flags_context_less_export() {
    let temp = TempDir::new().unwrap();
    let events = write_json(
        temp.path(),
        "events.json",
        r#"[
            {"id": "a", "start": "2025-03-03T09:00:00Z", "end": "2025-03-03T10:00:00Z"},
            {"id": "b", "start": "2025-03-03T09:30:00Z", "end": "2025-03-03T10:30:00Z"}
        ]"#,
    );

    let output = run_pw(temp.path(), &["check", events.to_str().unwrap()]);
    let stdout = stdout_of(&output);
    assert!(stdout.contains("no events in context \"personal\""));

    let output = run_pw(
        temp.path(),
        &["check", events.to_str().unwrap(), "--context", "", "--json"],
    );
    let json: serde_json::Value = serde_json::from_str(&stdout_of(&output)).unwrap();
    assert_eq!(json["context_event_count"], 2);
    assert_eq!(json["report"]["overlaps"].as_array().unwrap().len(), 1);
}

#[test]
fn test_check_tolerates_loose_fields() {
    let temp = TempDir::new().unwrap();
    let events = write_json(
        temp.path(),
        "events.json",
        r#"[
            {"id": 1, "start": 1741000000000, "end": "2025-03-03T10:00:00Z", "context": "personal", "duration": 30.5},
            {"id": 2, "start": "2025-03-03T09:30:00Z", "end": "2025-03-03T10:30:00Z", "context": "personal"}
        ]"#,
    );

    let output = run_pw(temp.path(), &["check", events.to_str().unwrap(), "--json"]);
    let json: serde_json::Value = serde_json::from_str(&stdout_of(&output)).unwrap();
    assert_eq!(json["event_count"], 2);
    assert!(json["report"]["overlaps"].as_array().unwrap().is_empty());
}

#[test]
fn test_config_file_sets_default_context() {
    let temp = TempDir::new().unwrap();
    let events = write_json(temp.path(), "events.json", EVENTS);
    let config = temp.path().join("pw.toml");
    std::fs::write(&config, "default_context = \"family\"\n").unwrap();

    let output = run_pw(
        temp.path(),
        &[
            "--config",
            config.to_str().unwrap(),
            "check",
            events.to_str().unwrap(),
        ],
    );
    let stdout = stdout_of(&output);
    assert!(stdout.starts_with("CONFLICT CHECK: family"));
}

#[test]
fn test_metrics_json_for_window() {
    let temp = TempDir::new().unwrap();
    let events = write_json(
        temp.path(),
        "events.json",
        r#"[
            {"id": "1", "start": "2025-03-08T12:00:00Z", "end": "2025-03-08T14:00:00Z", "category": "work", "duration": 120},
            {"id": "2", "start": "2025-03-09T12:00:00Z", "end": "2025-03-09T13:00:00Z", "category": "meeting", "duration": 60},
            {"id": "3", "start": "2025-03-10T12:00:00Z", "end": "2025-03-10T14:00:00Z", "category": "Coding", "duration": 120}
        ]"#,
    );
    let goals = write_json(
        temp.path(),
        "goals.json",
        r#"[{"completed": true}, {"completed": true}, {"completed": true}, {"completed": false}]"#,
    );

    let output = run_pw(
        temp.path(),
        &[
            "metrics",
            events.to_str().unwrap(),
            "--goals",
            goals.to_str().unwrap(),
            "--today",
            "2025-03-10",
            "--json",
        ],
    );
    let json: serde_json::Value = serde_json::from_str(&stdout_of(&output)).unwrap();

    assert_eq!(json["today"], "2025-03-10");
    assert_eq!(json["window_days"], 7);
    assert_eq!(json["focus_minutes"], 240);
    assert_eq!(json["total_tracked_minutes"], 300);
    assert_eq!(json["context_switches"], 2);
    assert_eq!(json["goal_completion_rate"], 75);
    assert_eq!(json["streak_days"], 3);
    // 80% focus -> 32, 75% goals -> 30, 2 switches -> 16
    assert_eq!(json["productivity_score"], 78);
}

#[test]
fn test_score_command() {
    let temp = TempDir::new().unwrap();
    let output = run_pw(
        temp.path(),
        &["score", "--focus", "480", "--tracked", "480", "--goal-rate", "100"],
    );
    assert_eq!(stdout_of(&output), "100\n");
}
