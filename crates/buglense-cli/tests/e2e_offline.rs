//! E2E CLI tests that need no server:
//! - UI preferences (`bl ui`) persist between runs
//! - Session guard on tracker commands
//! - Logout and failed login against an unreachable API
//! - Shell completions
//!
//! Each test runs `bl` as a subprocess with its state in a temp directory and
//! the API pointed at a closed local port.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{Value, json};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const DEAD_API: &str = "http://127.0.0.1:9/api";
const LOGIN: [&str; 5] = ["login", "--email", "ada@x.io", "--password", "secret"];

// ---------------------------------------------------------------------------
// Test Harness
// ---------------------------------------------------------------------------

/// Build a Command targeting the `bl` binary, isolated under `dir`.
fn bl_cmd(dir: &Path) -> Command {
    bl_cmd_with_state(dir, &dir.join("state"))
}

/// Like [`bl_cmd`], with persisted state under `state_dir`.
fn bl_cmd_with_state(dir: &Path, state_dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("bl"));
    cmd.current_dir(dir);
    cmd.env("HOME", dir);
    cmd.env("XDG_CONFIG_HOME", dir.join("config"));
    cmd.env("XDG_DATA_HOME", dir.join("data"));
    cmd.env("BUGLENSE_LOG", "error");
    cmd.env_remove("BUGLENSE_FORMAT");
    cmd.env_remove("BUGLENSE_API_URL");
    cmd.args(["--api-url", DEAD_API, "--state-dir"]);
    cmd.arg(state_dir);
    cmd
}

fn read_state(dir: &Path, key: &str) -> Value {
    let path = dir.join("state").join(format!("{key}.json"));
    let raw = fs::read_to_string(&path).expect("state file should exist");
    serde_json::from_str(&raw).expect("state file should be JSON")
}

fn write_state(dir: &Path, key: &str, state: &Value) {
    let state_dir = dir.join("state");
    fs::create_dir_all(&state_dir).expect("create state dir");
    let body = json!({ "state": state, "version": 0 });
    let path = state_dir.join(format!("{key}.json"));
    fs::write(path, body.to_string()).expect("write state");
}

fn signed_in_state() -> Value {
    json!({
        "user": {
            "id": "U1",
            "name": "Ada",
            "email": "ada@example.com",
            "role": "developer",
            "createdAt": "2024-01-01T00:00:00Z"
        },
        "token": "t-123",
        "isAuthenticated": true
    })
}

// ---------------------------------------------------------------------------
// UI preferences
// ---------------------------------------------------------------------------

#[test]
fn theme_change_persists_between_runs() {
    let dir = TempDir::new().unwrap();

    bl_cmd(dir.path())
        .args(["ui", "theme", "dark", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"theme\": \"dark\""));

    let saved = read_state(dir.path(), "buglense-ui");
    assert_eq!(saved["version"], 0);
    assert_eq!(saved["state"]["theme"], "dark");
    assert_eq!(saved["state"]["sidebarOpen"], true);
    assert!(saved["state"].get("toasts").is_none());

    bl_cmd(dir.path())
        .args(["ui", "show", "--format", "text"])
        .assert()
        .success()
        .stdout(predicate::str::contains("dark"));
}

#[test]
fn sidebar_toggle_flips_saved_state() {
    let dir = TempDir::new().unwrap();

    bl_cmd(dir.path())
        .args(["ui", "sidebar", "toggle"])
        .assert()
        .success();
    let saved = read_state(dir.path(), "buglense-ui");
    assert_eq!(saved["state"]["sidebarOpen"], false);

    bl_cmd(dir.path())
        .args(["ui", "sidebar", "toggle"])
        .assert()
        .success();
    let saved = read_state(dir.path(), "buglense-ui");
    assert_eq!(saved["state"]["sidebarOpen"], true);
}

#[test]
fn unknown_theme_is_rejected_by_parser() {
    let dir = TempDir::new().unwrap();
    bl_cmd(dir.path())
        .args(["ui", "theme", "sepia"])
        .assert()
        .failure();
}

#[test]
fn quiet_suppresses_toasts() {
    let dir = TempDir::new().unwrap();
    bl_cmd(dir.path())
        .args(["--quiet", "ui", "theme", "light"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Theme").not());
}

// ---------------------------------------------------------------------------
// Session guard
// ---------------------------------------------------------------------------

#[test]
fn tracker_commands_require_sign_in() {
    let dir = TempDir::new().unwrap();

    let guarded: [&[&str]; 4] = [
        &["bug", "list"],
        &["whoami"],
        &["project", "list"],
        &["team", "list"],
    ];
    for args in guarded {
        bl_cmd(dir.path())
            .args(args)
            .assert()
            .failure()
            .stderr(predicate::str::contains("Sign in required"));
    }
}

#[test]
fn guard_failure_is_structured_in_json_mode() {
    let dir = TempDir::new().unwrap();

    let output = bl_cmd(dir.path())
        .args(["bug", "list", "--json"])
        .output()
        .expect("bl should not crash");
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    let lines: Vec<Value> = stderr
        .lines()
        .filter_map(|line| serde_json::from_str(line).ok())
        .collect();
    assert!(
        lines.iter().any(|line| line["toast"]["type"] == "error"),
        "expected an error toast in: {stderr}"
    );
}

#[test]
fn unreachable_server_keeps_persisted_session() {
    let dir = TempDir::new().unwrap();
    write_state(dir.path(), "buglense-auth", &signed_in_state());

    bl_cmd(dir.path())
        .args(["bug", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Could not load bugs"));

    let saved = read_state(dir.path(), "buglense-auth");
    assert_eq!(saved["state"]["token"], "t-123");
    assert_eq!(saved["state"]["isAuthenticated"], true);
}

// ---------------------------------------------------------------------------
// Login / logout
// ---------------------------------------------------------------------------

#[test]
fn logout_clears_session_even_when_offline() {
    let dir = TempDir::new().unwrap();
    write_state(dir.path(), "buglense-auth", &signed_in_state());

    bl_cmd(dir.path())
        .arg("logout")
        .assert()
        .success()
        .stderr(predicate::str::contains("Signed out"));

    let saved = read_state(dir.path(), "buglense-auth");
    assert_eq!(saved["state"]["token"], Value::Null);
    assert_eq!(saved["state"]["user"], Value::Null);
    assert_eq!(saved["state"]["isAuthenticated"], false);
}

#[test]
fn logout_without_session_is_harmless() {
    let dir = TempDir::new().unwrap();
    bl_cmd(dir.path())
        .arg("logout")
        .assert()
        .success()
        .stderr(predicate::str::contains("Already signed out"));
}

#[test]
fn failed_login_leaves_no_session() {
    let dir = TempDir::new().unwrap();

    bl_cmd(dir.path())
        .args(LOGIN)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Sign in failed"));

    let saved = read_state(dir.path(), "buglense-auth");
    assert_eq!(saved["state"]["token"], Value::Null);
    assert_eq!(saved["state"]["isAuthenticated"], false);
}

#[test]
fn corrupt_state_file_falls_back_to_defaults() {
    let dir = TempDir::new().unwrap();
    let state_dir = dir.path().join("state");
    fs::create_dir_all(&state_dir).unwrap();
    let path = state_dir.join("buglense-ui.json");
    fs::write(path, "{ not json").unwrap();

    bl_cmd(dir.path())
        .args(["ui", "show", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"theme\": \"system\""));
}

#[test]
fn unwritable_state_dir_is_reported_after_the_command_output() {
    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("not-a-dir");
    fs::write(&blocker, "x").unwrap();

    bl_cmd_with_state(dir.path(), &blocker.join("sub"))
        .args(["ui", "theme", "dark", "--format", "text"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("dark"))
        .stderr(predicate::str::contains("Theme"))
        .stderr(predicate::str::contains("error[E1004]"));
}

#[test]
fn unwritable_state_dir_keeps_the_command_failure_visible() {
    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("not-a-dir");
    fs::write(&blocker, "x").unwrap();

    bl_cmd_with_state(dir.path(), &blocker.join("sub"))
        .args(LOGIN)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Sign in failed"))
        .stderr(predicate::str::contains("error[E1004]"));
}

#[test]
fn unwritable_state_dir_in_json_mode_reports_both_errors() {
    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("not-a-dir");
    fs::write(&blocker, "x").unwrap();

    bl_cmd_with_state(dir.path(), &blocker.join("sub"))
        .args(LOGIN)
        .arg("--json")
        .assert()
        .failure()
        .stderr(predicate::str::contains("\"E5002\""))
        .stderr(predicate::str::contains("\"E1004\""));
}

// ---------------------------------------------------------------------------
// Completions
// ---------------------------------------------------------------------------

#[test]
fn completions_mention_binary_name() {
    let dir = TempDir::new().unwrap();
    bl_cmd(dir.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("bl"));
}
