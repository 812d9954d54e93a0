//! Basic CLI E2E tests.
//!
//! Tests invoke the built binary with `HOME` pointed at a scratch directory,
//! so every test gets its own config file and database.

use std::path::Path;
use std::process::Command;

/// Run a CLI command and return (exit code, stdout, stderr).
fn run_cli(home: &Path, args: &[&str]) -> (i32, String, String) {
    let output = Command::new(env!("CARGO_BIN_EXE_lazycat"))
        .args(args)
        .env("HOME", home)
        .env_remove("LAZYCAT_ENV")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (code, stdout, stderr)
}

fn run_json(home: &Path, args: &[&str]) -> serde_json::Value {
    let (code, stdout, stderr) = run_cli(home, args);
    assert_eq!(code, 0, "{args:?} failed: {stderr}");
    serde_json::from_str(&stdout).expect("Failed to parse JSON output")
}

#[test]
fn test_onboard_prints_recommendation() {
    let home = tempfile::tempdir().unwrap();
    let out = run_json(
        home.path(),
        &[
            "onboard",
            "--work-type",
            "software_development",
            "--sitting-hours",
            "7",
        ],
    );
    assert_eq!(out["recommendation"]["work_minutes"], 50);
    assert_eq!(out["recommendation"]["rest_minutes"], 8);
    assert_eq!(out["accepted"], false);

    // Nothing saved without --accept.
    let prefs = run_json(home.path(), &["prefs", "show"]);
    assert_eq!(prefs["work_minutes"], 45);
}

#[test]
fn test_onboard_accept_saves_durations() {
    let home = tempfile::tempdir().unwrap();
    run_json(
        home.path(),
        &["onboard", "--work-type", "physical_labor", "--accept"],
    );
    let prefs = run_json(home.path(), &["prefs", "show"]);
    assert_eq!(prefs["work_minutes"], 60);
    assert_eq!(prefs["rest_minutes"], 15);
}

#[test]
fn test_onboard_rejects_bad_answers() {
    let home = tempfile::tempdir().unwrap();
    let (code, _, _) = run_cli(home.path(), &["onboard", "--rest-frequency", "weekly"]);
    assert_ne!(code, 0);
    let (code, _, stderr) = run_cli(home.path(), &["onboard", "--sitting-hours", "20"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("sitting_hours"));
}

#[test]
fn test_prefs_set_and_reset() {
    let home = tempfile::tempdir().unwrap();
    let prefs = run_json(home.path(), &["prefs", "set", "music_volume", "0.25"]);
    assert_eq!(prefs["music_volume"], 0.25);
    run_json(home.path(), &["prefs", "set", "work_minutes", "90"]);
    run_json(home.path(), &["prefs", "set", "dark_mode", "on"]);

    let prefs = run_json(home.path(), &["prefs", "show"]);
    assert_eq!(prefs["work_minutes"], 90);
    assert_eq!(prefs["dark_mode"], "on");

    let prefs = run_json(home.path(), &["prefs", "reset"]);
    assert_eq!(prefs["work_minutes"], 45);
    assert_eq!(prefs["dark_mode"], "system");
    assert_eq!(prefs["music_volume"], 0.25);
}

#[test]
fn test_prefs_set_rejects_invalid() {
    let home = tempfile::tempdir().unwrap();
    let (code, _, _) = run_cli(home.path(), &["prefs", "set", "work_minutes", "0"]);
    assert_ne!(code, 0);
    let (code, _, _) = run_cli(home.path(), &["prefs", "set", "theme", "dark"]);
    assert_ne!(code, 0);
    let (code, _, stderr) = run_cli(home.path(), &["prefs", "set", "music_volume", "1.5"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("music_volume"));

    // Rejected values never reach the store.
    let prefs = run_json(home.path(), &["prefs", "show"]);
    assert_eq!(prefs["work_minutes"], 45);
    assert_eq!(prefs["music_volume"], 0.5);
}

#[test]
fn test_stats_show_and_reset() {
    let home = tempfile::tempdir().unwrap();
    let stats = run_json(home.path(), &["stats", "show"]);
    assert_eq!(stats["today_secs"], 0.0);
    assert_eq!(stats["today"], "0.0h");
    assert_eq!(stats["week_detail"], "0m");

    let stats = run_json(home.path(), &["stats", "reset-week"]);
    assert_eq!(stats["week_secs"], 0.0);
}

#[test]
fn test_config_get_set() {
    let home = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(home.path(), &["config", "get", "timer.tick_interval_ms"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "100");

    let (code, _, _) = run_cli(home.path(), &["config", "set", "timer.near_expiry_secs", "45"]);
    assert_eq!(code, 0);
    let (_, stdout, _) = run_cli(home.path(), &["config", "get", "timer.near_expiry_secs"]);
    assert_eq!(stdout.trim(), "45");

    let (code, _, _) = run_cli(home.path(), &["config", "get", "timer.nope"]);
    assert_ne!(code, 0);

    let list = run_json(home.path(), &["config", "list"]);
    assert_eq!(list["audio"]["player"], "paplay");
}
