use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn eventcut(cwd: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("eventcut").unwrap();
    cmd.current_dir(cwd.path()).env_remove("RUST_LOG");
    for var in ["EVENTCUT_EVENT", "EVENTCUT_MODE", "EVENTCUT_CONFIG", "EVENTCUT_CORPUS"] {
        cmd.env_remove(var);
    }
    cmd
}

fn write_match(root: &TempDir) -> std::path::PathBuf {
    let dir = root.path().join("Dataset/england_epl/2015-2016/2015-08-08 - Chelsea 2 - 2 Swansea");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(
        dir.join("Labels-v2.json"),
        r#"{"annotations": [
            {"gameTime": "1 - 00:30", "label": "Corner", "position": "30000", "team": "home", "visibility": "visible"},
            {"gameTime": "2 - 01:00", "label": "Corner", "position": "60000", "team": "away", "visibility": "visible"},
            {"gameTime": "2 - 03:00", "label": "Goal", "position": "180000", "team": "away", "visibility": "visible"}
        ]}"#,
    )
    .unwrap();
    dir
}

#[test]
fn test_help_lists_commands() {
    let cwd = TempDir::new().unwrap();
    eventcut(&cwd)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("extract"))
        .stdout(predicate::str::contains("plan"))
        .stdout(predicate::str::contains("inspect"));
}

#[test]
fn test_missing_config_file_fails() {
    let cwd = TempDir::new().unwrap();
    eventcut(&cwd)
        .args(["--config", "nope.toml", "extract", "--event", "Corner"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load configuration"));
}

#[test]
fn test_extract_requires_event() {
    let cwd = TempDir::new().unwrap();
    eventcut(&cwd)
        .arg("extract")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No event category selected"));
}

#[test]
fn test_crf_out_of_range_rejected() {
    let cwd = TempDir::new().unwrap();
    eventcut(&cwd)
        .args(["extract", "--event", "Corner", "--crf", "60"])
        .assert()
        .failure();
}

#[test]
fn test_plan_clip_mode_without_video() {
    let cwd = TempDir::new().unwrap();
    let match_dir = write_match(&cwd);

    eventcut(&cwd)
        .args(["plan", "--event", "Corner", "--mode", "clip", "--match"])
        .arg(&match_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("2 of 3 annotations selected"))
        .stdout(predicate::str::contains("clip_28-34.mp4"))
        .stdout(predicate::str::contains("clip_58-64.mp4"));
}

#[test]
fn test_plan_json_uses_config_file_window() {
    let cwd = TempDir::new().unwrap();
    let match_dir = write_match(&cwd);
    std::fs::write(
        cwd.path().join("eventcut.toml"),
        "event = \"Corner\"\nmode = \"clip\"\n\n[windows]\ncorner = { before = 5.0, after = 10.0 }\n",
    )
    .unwrap();

    let output = eventcut(&cwd)
        .args(["plan", "--json", "--match"])
        .arg(&match_dir)
        .output()
        .unwrap();
    assert!(output.status.success());

    let plan: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(plan["event"], "Corner");
    assert_eq!(plan["items"].as_array().unwrap().len(), 2);
    assert_eq!(plan["items"][0]["file_name"], "clip_25-40.mp4");
}

#[test]
fn test_extract_reports_unopenable_match() {
    let cwd = TempDir::new().unwrap();
    write_match(&cwd);

    eventcut(&cwd)
        .args(["extract", "--event", "Corner", "--mode", "frame", "--corpus", "Dataset"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("FAILED"))
        .stderr(predicate::str::contains("1 of 1 matches failed"));
}
