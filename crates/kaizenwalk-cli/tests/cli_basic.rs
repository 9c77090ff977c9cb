//! Basic CLI E2E tests.
//!
//! Tests invoke CLI commands via cargo run and verify outputs. Each test
//! points HOME at its own temp directory so config and database state
//! never leak between tests or into a real user profile.

use std::path::Path;
use std::process::Command;

/// Run a CLI command against an isolated home and return output.
fn run_cli(home: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new("cargo")
        .args(["run", "-p", "kaizenwalk-cli", "--"])
        .args(args)
        .env("HOME", home)
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

#[test]
fn test_timer_status_idle() {
    let home = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(home.path(), &["timer", "status"]);
    assert_eq!(code, 0, "Timer status failed");
    let report: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(report["frame"]["status"], "Ready to start");
    assert_eq!(report["frame"]["clock"], "30:00");
    assert_eq!(report["state"]["isRunning"], false);
}

#[test]
fn test_timer_start_status_stop() {
    let home = tempfile::tempdir().unwrap();

    let (stdout, _, code) = run_cli(home.path(), &["timer", "start"]);
    assert_eq!(code, 0, "Timer start failed");
    let event: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(event["type"], "WorkoutStarted");

    let (stdout, _, code) = run_cli(home.path(), &["timer", "status"]);
    assert_eq!(code, 0, "Timer status failed");
    let report: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(report["state"]["isRunning"], true);
    assert_eq!(report["frame"]["status"], "Fast Walk");

    let (stdout, _, code) = run_cli(home.path(), &["timer", "stop"]);
    assert_eq!(code, 0, "Timer stop failed");
    let event: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(event["type"], "WorkoutStopped");

    let (stdout, _, code) = run_cli(home.path(), &["timer", "status"]);
    assert_eq!(code, 0, "Timer status after stop failed");
    let report: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(report["state"]["isRunning"], false);
}

#[test]
fn test_timer_stop_when_idle_prints_nothing() {
    let home = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(home.path(), &["timer", "stop"]);
    assert_eq!(code, 0, "Idle stop failed");
    assert!(stdout.trim().is_empty(), "idle stop printed: {stdout}");

    // After a real session, only the first stop reports an event.
    let _ = run_cli(home.path(), &["timer", "start"]);
    let (stdout, _, _) = run_cli(home.path(), &["timer", "stop"]);
    assert!(stdout.contains("WorkoutStopped"));
    let (stdout, _, code) = run_cli(home.path(), &["timer", "stop"]);
    assert_eq!(code, 0, "Second stop failed");
    assert!(stdout.trim().is_empty(), "second stop printed: {stdout}");
}

#[test]
fn test_config_list() {
    let home = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(home.path(), &["config", "list"]);
    assert_eq!(code, 0, "Config list failed");
    let config: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(config["timer"]["clock_source"], "wall");
    assert_eq!(config["cache"]["audio_asset"], "kaizenwalk_30min.mp3");
}

#[test]
fn test_config_get_set_round_trip() {
    let home = tempfile::tempdir().unwrap();

    let (stdout, _, code) = run_cli(home.path(), &["config", "get", "timer.tick_interval_ms"]);
    assert_eq!(code, 0, "Config get failed");
    assert_eq!(stdout.trim(), "1000");

    let (_, _, code) = run_cli(home.path(), &["config", "set", "timer.tick_interval_ms", "500"]);
    assert_eq!(code, 0, "Config set failed");

    let (stdout, _, code) = run_cli(home.path(), &["config", "get", "timer.tick_interval_ms"]);
    assert_eq!(code, 0, "Config get after set failed");
    assert_eq!(stdout.trim(), "500");
}

#[test]
fn test_config_get_unknown_key_fails() {
    let home = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(home.path(), &["config", "get", "timer.no_such_key"]);
    assert_ne!(code, 0, "Unknown key should fail");
    assert!(stderr.contains("unknown key"));
}

#[test]
fn test_config_path() {
    let home = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(home.path(), &["config", "path"]);
    assert_eq!(code, 0, "Config path failed");
    assert!(stdout.trim().ends_with("config.toml"));
}

#[test]
fn test_cache_status_empty() {
    let home = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(home.path(), &["cache", "status"]);
    assert_eq!(code, 0, "Cache status failed");
    let status: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(status["audioCached"], false);
    assert!(status["caches"].as_array().unwrap().is_empty());
}

#[test]
fn test_cache_clear_without_cache() {
    let home = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(home.path(), &["cache", "clear"]);
    assert_eq!(code, 0, "Cache clear failed");
    assert_eq!(stdout.trim(), "nothing to clear");
}

#[test]
fn test_completions_generate() {
    let home = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(home.path(), &["completions", "bash"]);
    assert_eq!(code, 0, "Completions failed");
    assert!(stdout.contains("kaizenwalk-cli"));
}
