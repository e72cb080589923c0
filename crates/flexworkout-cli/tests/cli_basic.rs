//! Basic CLI E2E tests.
//!
//! Tests run the compiled binary against a throwaway data directory and
//! verify outputs.

use std::path::Path;
use std::process::Command;

use tempfile::TempDir;

/// Run a CLI command in `data_dir` and return (exit code, stdout, stderr).
fn run_cli(data_dir: &Path, args: &[&str]) -> (i32, String, String) {
    let output = Command::new(env!("CARGO_BIN_EXE_flexworkout"))
        .env("FLEXWORKOUT_DATA_DIR", data_dir)
        .env_remove("FLEXWORKOUT_LOG")
        .args(args)
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (code, stdout, stderr)
}

fn json_lines(stdout: &str) -> Vec<serde_json::Value> {
    stdout
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| serde_json::from_str(l).expect("event line is JSON"))
        .collect()
}

const TINY_PLAN: &str = r#"[
  {"name": "Main", "tips": "", "allowRounds": true, "defaultRounds": 1, "maxRounds": 2,
   "steps": [{"name": "Squat", "desc": "Slow", "duration": 2},
             {"name": "Plank", "desc": "", "duration": 1}]}
]"#;

fn write_plan(dir: &TempDir, contents: &str) -> String {
    let path = dir.path().join("plan.json");
    std::fs::write(&path, contents).unwrap();
    path.to_string_lossy().into_owned()
}

#[test]
fn test_config_get_default() {
    let dir = TempDir::new().unwrap();
    let (code, stdout, _) = run_cli(dir.path(), &["config", "get", "reminder.interval_minutes"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "15");
    assert!(dir.path().join("config.toml").exists());
}

#[test]
fn test_config_set_and_list() {
    let dir = TempDir::new().unwrap();
    let (code, _, _) = run_cli(dir.path(), &["config", "set", "cues.gap_ms", "450"]);
    assert_eq!(code, 0);
    let (_, stdout, _) = run_cli(dir.path(), &["config", "get", "cues.gap_ms"]);
    assert_eq!(stdout.trim(), "450");

    let (code, stdout, _) = run_cli(dir.path(), &["config", "list"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("cues.gap_ms = 450"));
    assert!(stdout.contains("narration.enabled = true"));
}

#[test]
fn test_config_unknown_key_fails() {
    let dir = TempDir::new().unwrap();
    let (code, _, stderr) = run_cli(dir.path(), &["config", "set", "cues.volume", "3"]);
    assert_eq!(code, 1);
    assert!(stderr.starts_with("error:"));

    let (code, _, _) = run_cli(dir.path(), &["config", "get", "nope"]);
    assert_eq!(code, 1);
}

#[test]
fn test_plan_show_defaults_to_builtin() {
    let dir = TempDir::new().unwrap();
    let (code, stdout, _) = run_cli(dir.path(), &["plan", "show"]);
    assert_eq!(code, 0);
    let record: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert!(record["id"].is_null());
    assert_eq!(record["plan"].as_array().unwrap().len(), 4);
}

#[test]
fn test_plan_save_use_delete() {
    let dir = TempDir::new().unwrap();
    let file = write_plan(&dir, TINY_PLAN);

    let (code, stdout, _) = run_cli(dir.path(), &["plan", "save", "--title", "Tiny", "--file", &file]);
    assert_eq!(code, 0);
    let saved: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let id = saved["id"].as_str().unwrap().to_string();
    assert_eq!(saved["title"], "Tiny");

    let (_, stdout, _) = run_cli(dir.path(), &["plan", "list"]);
    let list: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(list[0]["id"], id.as_str());

    let (code, _, _) = run_cli(dir.path(), &["plan", "use", &id]);
    assert_eq!(code, 0);
    let (_, stdout, _) = run_cli(dir.path(), &["plan", "show"]);
    let record: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(record["id"], id.as_str());

    // Deleting the saved plan leaves the active plan with a dangling id.
    let (code, _, _) = run_cli(dir.path(), &["plan", "delete", &id]);
    assert_eq!(code, 0);
    let (_, stdout, _) = run_cli(dir.path(), &["plan", "show"]);
    let record: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert!(record["id"].is_null());
    assert_eq!(record["plan"][0]["name"], "Main");

    let (code, _, stderr) = run_cli(dir.path(), &["plan", "delete", &id]);
    assert_eq!(code, 1);
    assert!(stderr.contains("No saved plan"));
}

#[test]
fn test_plan_import_rejects_invalid_plan() {
    let dir = TempDir::new().unwrap();
    let file = write_plan(
        &dir,
        r#"[{"name": "Main", "steps": [{"name": "Squat", "duration": 0}]}]"#,
    );
    let (code, _, stderr) = run_cli(dir.path(), &["plan", "import", &file]);
    assert_eq!(code, 1);
    assert!(stderr.contains("Validation error"));
}

#[test]
fn test_plan_import_and_clear() {
    let dir = TempDir::new().unwrap();
    let file = write_plan(&dir, TINY_PLAN);
    let (code, _, _) = run_cli(dir.path(), &["plan", "import", &file]);
    assert_eq!(code, 0);

    let (_, stdout, _) = run_cli(dir.path(), &["plan", "show", "--steps"]);
    let steps: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(steps.as_array().unwrap().len(), 2);

    let (code, _, _) = run_cli(dir.path(), &["plan", "clear"]);
    assert_eq!(code, 0);
    let (_, stdout, _) = run_cli(dir.path(), &["plan", "show"]);
    let record: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(record["plan"].as_array().unwrap().len(), 4);
}

#[test]
fn test_run_plays_plan_to_the_end() {
    let dir = TempDir::new().unwrap();
    let file = write_plan(&dir, TINY_PLAN);
    let (code, stdout, stderr) = run_cli(
        dir.path(),
        &["run", "--file", &file, "--no-narration", "--speed", "1000", "--rounds", "Main=2"],
    );
    assert_eq!(code, 0, "run failed: {stderr}");

    let events = json_lines(&stdout);
    let types: Vec<&str> = events.iter().filter_map(|e| e["type"].as_str()).collect();
    assert_eq!(types.first(), Some(&"narration_toggled"));
    assert!(types.contains(&"rounds_changed"));
    assert!(types.contains(&"playback_started"));
    assert_eq!(types.iter().filter(|t| **t == "step_advanced").count(), 3);
    assert_eq!(types.iter().filter(|t| **t == "workout_finished").count(), 1);

    let last = events.last().unwrap();
    assert_eq!(last["type"], "state_snapshot");
    assert_eq!(last["status"], "finished");
    assert_eq!(last["step_index"], 3);
}

#[test]
fn test_run_rejects_bad_rounds_flag() {
    let dir = TempDir::new().unwrap();
    let (code, _, _) = run_cli(dir.path(), &["run", "--rounds", "Strength"]);
    assert_ne!(code, 0);
}

#[test]
fn test_run_rejects_step_out_of_range() {
    let dir = TempDir::new().unwrap();
    let file = write_plan(&dir, TINY_PLAN);
    let (code, stdout, stderr) = run_cli(dir.path(), &["run", "--file", &file, "--from", "5"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("Index 5 out of bounds for plan steps (length: 2)"));
    assert!(!stdout.contains("playback_started"));
}

#[test]
fn test_remind_runs_one_break() {
    let dir = TempDir::new().unwrap();
    let (code, stdout, stderr) = run_cli(
        dir.path(),
        &["remind", "--interval", "1", "--breaks", "1", "--no-narration", "--speed", "1000"],
    );
    assert_eq!(code, 0, "remind failed: {stderr}");

    let events = json_lines(&stdout);
    let types: Vec<&str> = events.iter().filter_map(|e| e["type"].as_str()).collect();
    assert!(types.contains(&"mode_changed"));
    assert!(types.contains(&"reminder_started"));
    let started = events.iter().find(|e| e["type"] == "break_started").unwrap();
    assert_eq!(started["suggestions"].as_array().unwrap().len(), 3);
    assert_eq!(types.iter().filter(|t| **t == "break_step_advanced").count(), 2);
    assert!(types.contains(&"break_ended"));
    assert_eq!(types.last(), Some(&"reminder_stopped"));
}

#[test]
fn test_completions_bash() {
    let dir = TempDir::new().unwrap();
    let (code, stdout, _) = run_cli(dir.path(), &["completions", "bash"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("flexworkout"));
}
