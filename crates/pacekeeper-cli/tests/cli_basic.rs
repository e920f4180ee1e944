//! Basic CLI E2E tests.
//!
//! Tests invoke the built `pacekeeper` binary with an isolated config
//! directory and verify its outputs.

use std::io::Write;
use std::path::Path;
use std::process::Command;

use tempfile::TempDir;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(config_dir: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_pacekeeper"))
        .args(args)
        .env("PACEKEEPER_CONFIG_DIR", config_dir)
        .env_remove("PACEKEEPER_LOG")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn run_cli_success(config_dir: &Path, args: &[&str]) -> String {
    let (stdout, stderr, code) = run_cli(config_dir, args);
    assert_eq!(code, 0, "CLI command {args:?} failed: {stderr}");
    stdout
}

fn json_lines(stdout: &str) -> Vec<serde_json::Value> {
    stdout
        .lines()
        .map(|line| serde_json::from_str(line).expect("Failed to parse JSON line"))
        .collect()
}

fn write_track(dir: &Path, lines: &[&str]) -> String {
    let path = dir.join("track.jsonl");
    let mut file = std::fs::File::create(&path).unwrap();
    for line in lines {
        writeln!(file, "{line}").unwrap();
    }
    path.display().to_string()
}

#[test]
fn test_check_below_target() {
    let dir = TempDir::new().unwrap();
    let stdout = run_cli_success(dir.path(), &["check", "--speed-mps", "2.0", "--target", "10"]);
    let report: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(report["status_text"], "Below target");
    assert_eq!(report["color"], "red");
    assert_eq!(report["would_alert"], true);
}

#[test]
fn test_check_without_speed_is_standing_still() {
    let dir = TempDir::new().unwrap();
    let stdout = run_cli_success(dir.path(), &["check"]);
    let report: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(report["status_text"], "Standing still");
    assert_eq!(report["would_alert"], false);
}

#[test]
fn test_check_rejects_out_of_range_target() {
    let dir = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["check", "--speed-mps", "2", "--target", "80"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("Invalid target speed"));
}

#[test]
fn test_config_set_and_get() {
    let dir = TempDir::new().unwrap();
    run_cli_success(dir.path(), &["config", "set", "pace.target_speed_kmh", "12.5"]);
    let value = run_cli_success(dir.path(), &["config", "get", "pace.target_speed_kmh"]);
    assert_eq!(value.trim(), "12.5");
    assert!(dir.path().join("config.toml").exists());
}

#[test]
fn test_config_set_rejects_invalid_target() {
    let dir = TempDir::new().unwrap();
    let (_, _, code) = run_cli(dir.path(), &["config", "set", "pace.target_speed_kmh", "0"]);
    assert_ne!(code, 0);
    let value = run_cli_success(dir.path(), &["config", "get", "pace.target_speed_kmh"]);
    assert_eq!(value.trim(), "10.0");
}

#[test]
fn test_config_unknown_key_fails() {
    let dir = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["config", "get", "pace.nope"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("unknown key"));
}

#[test]
fn test_run_replay_json_events() {
    let dir = TempDir::new().unwrap();
    run_cli_success(dir.path(), &["config", "set", "alerts.enabled", "false"]);
    let track = write_track(
        dir.path(),
        &[
            r#"{"speed_mps": 2.2, "accuracy_m": 5, "timestamp_ms": 0}"#,
            r#"{"speed_mps": 2.2, "accuracy_m": 5, "timestamp_ms": 1000}"#,
            r#"{"speed_mps": 2.2, "accuracy_m": 5, "timestamp_ms": 3100}"#,
            r#"{"error": "GPS signal lost"}"#,
            r#"{"speed_mps": 3.5, "accuracy_m": 5, "timestamp_ms": 4000}"#,
        ],
    );

    let stdout = run_cli_success(dir.path(), &["run", "--file", &track, "--json"]);
    let events = json_lines(&stdout);

    assert_eq!(events.first().unwrap()["type"], "TrackingStarted");
    assert_eq!(events.last().unwrap()["type"], "TrackingStopped");
    assert_eq!(events.last().unwrap()["alerts_fired"], 2);
    let alerts = events.iter().filter(|e| e["type"] == "AlertFired").count();
    assert_eq!(alerts, 2);
    let errors = events.iter().filter(|e| e["type"] == "SourceError").count();
    assert_eq!(errors, 1);
}

#[test]
fn test_run_human_output() {
    let dir = TempDir::new().unwrap();
    let track = write_track(
        dir.path(),
        &[r#"{"speed_mps": 3.5, "accuracy_m": 4, "timestamp_ms": 0}"#],
    );
    let stdout = run_cli_success(dir.path(), &["run", "--file", &track]);
    assert!(stdout.contains("12.6 km/h  On pace  ±4m"));
    assert!(stdout.contains("1 readings processed, 0 alert(s) fired"));
}

#[test]
fn test_run_missing_file_fails() {
    let dir = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["run", "--file", "/nonexistent/track.jsonl"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("unavailable"));
}

#[test]
fn test_run_simulated_with_limit() {
    let dir = TempDir::new().unwrap();
    run_cli_success(dir.path(), &["config", "set", "alerts.enabled", "false"]);
    let stdout = run_cli_success(
        dir.path(),
        &["run", "--simulate", "--seed", "3", "--limit", "5", "--json"],
    );
    let events = json_lines(&stdout);
    let readings = events
        .iter()
        .filter(|e| e["type"] == "SampleProcessed" || e["type"] == "SourceError")
        .count();
    assert_eq!(readings, 5);
}

#[test]
fn test_invalid_config_file_fails_commands() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("config.toml"),
        "[pace]\ntarget_speed_kmh = 0.2\n",
    )
    .unwrap();

    let (_, stderr, code) = run_cli(dir.path(), &["check", "--speed-mps", "2"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("pace.target_speed_kmh"), "stderr: {stderr}");

    let (stdout, _, code) = run_cli(dir.path(), &["run", "--simulate", "--limit", "3", "--json"]);
    assert_ne!(code, 0);
    assert!(stdout.is_empty());

    let (_, _, code) = run_cli(dir.path(), &["beep"]);
    assert_ne!(code, 0);

    run_cli_success(dir.path(), &["config", "reset"]);
    run_cli_success(dir.path(), &["check", "--speed-mps", "2"]);
}

#[test]
fn test_broken_alerts_section_is_not_ignored() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("config.toml"), "[alerts]\nenabled = \"nope\"\n").unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["run", "--simulate", "--limit", "1"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("Failed to load configuration"), "stderr: {stderr}");
}

#[test]
fn test_beep() {
    let dir = TempDir::new().unwrap();
    let (stdout, stderr, code) = run_cli(dir.path(), &["beep"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "ok");
    assert!(stderr.contains("below target"));
}
