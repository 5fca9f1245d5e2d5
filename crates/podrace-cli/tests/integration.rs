#![allow(deprecated)]
use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;
use tempfile::TempDir;

const TRACKS: &str = r#"[
  {"id": 1, "name": "Track 1", "img": "track1"},
  {"id": 3, "name": "Track 3", "img": "track3"}
]"#;

const RACERS: &str = r#"[
  {"id": 5, "driver_name": "Racer 5", "top_speed": 500, "acceleration": 10, "handling": 10, "img": "car5"},
  {"id": 7, "driver_name": "Racer 7", "top_speed": 600, "acceleration": 8, "handling": 7, "img": "car7"}
]"#;

fn config_file(dir: &TempDir) -> PathBuf {
    dir.path().join(".podrace/config.yaml")
}

fn podrace(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("podrace").unwrap();
    cmd.current_dir(dir.path())
        .env("PODRACE_CONFIG", config_file(dir))
        .env_remove("PODRACE_SERVER")
        .env_remove("RUST_LOG");
    cmd
}

/// Config pointing reference data at local files so no service is needed.
fn with_reference_files(dir: &TempDir, extra: &str) {
    let tracks = dir.path().join("tracks.json");
    let racers = dir.path().join("cars.json");
    std::fs::write(&tracks, TRACKS).unwrap();
    std::fs::write(&racers, RACERS).unwrap();
    std::fs::create_dir_all(dir.path().join(".podrace")).unwrap();
    std::fs::write(
        config_file(dir),
        format!(
            "reference:\n  tracks_path: {}\n  racers_path: {}\n{extra}",
            tracks.display(),
            racers.display()
        ),
    )
    .unwrap();
}

// ---------------------------------------------------------------------------
// podrace tracks / racers
// ---------------------------------------------------------------------------

#[test]
fn tracks_json_lists_reference_file() {
    let dir = TempDir::new().unwrap();
    with_reference_files(&dir, "");

    let out = podrace(&dir)
        .args(["tracks", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let tracks: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(tracks.as_array().unwrap().len(), 2);
    assert_eq!(tracks[1]["name"], "Track 3");
    assert_eq!(tracks[1]["img"], "track3");
}

#[test]
fn racers_table_shows_stats() {
    let dir = TempDir::new().unwrap();
    with_reference_files(&dir, "");

    podrace(&dir)
        .arg("racers")
        .assert()
        .success()
        .stdout(predicate::str::contains("DRIVER"))
        .stdout(predicate::str::contains("Racer 7"))
        .stdout(predicate::str::contains("600"));
}

#[test]
fn tracks_html_renders_cards() {
    let dir = TempDir::new().unwrap();
    with_reference_files(&dir, "");

    podrace(&dir)
        .args(["tracks", "--html"])
        .assert()
        .success()
        .stdout(predicate::str::contains("<ul id=\"tracks\">"))
        .stdout(predicate::str::contains("assets/images/track3.png"));
}

#[test]
fn missing_reference_file_degrades_to_empty() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join(".podrace")).unwrap();
    std::fs::write(
        config_file(&dir),
        "reference:\n  tracks_path: /nonexistent/tracks.json\n",
    )
    .unwrap();

    podrace(&dir)
        .arg("tracks")
        .assert()
        .success()
        .stdout(predicate::str::contains("No tracks available."));
}

// ---------------------------------------------------------------------------
// podrace config
// ---------------------------------------------------------------------------

#[test]
fn config_init_writes_defaults_once() {
    let dir = TempDir::new().unwrap();
    podrace(&dir).args(["config", "init"]).assert().success();

    let content = std::fs::read_to_string(config_file(&dir)).unwrap();
    assert!(content.contains("poll_interval_ms: 500"));
    assert!(content.contains("race_path_offset: 0"));

    podrace(&dir)
        .args(["config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    podrace(&dir)
        .args(["config", "init", "--force"])
        .assert()
        .success();
}

#[test]
fn config_validate_accepts_defaults() {
    let dir = TempDir::new().unwrap();
    podrace(&dir)
        .args(["config", "validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Config is valid"));
}

#[test]
fn config_validate_rejects_zero_poll_interval() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join(".podrace")).unwrap();
    std::fs::write(config_file(&dir), "timing:\n  poll_interval_ms: 0\n").unwrap();

    podrace(&dir)
        .args(["config", "validate"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("[error] timing.poll_interval_ms"))
        .stderr(predicate::str::contains("config validation found errors"));
}

#[test]
fn config_show_applies_server_override() {
    let dir = TempDir::new().unwrap();
    let out = podrace(&dir)
        .args(["config", "show", "--json", "--server", "http://race.local:9000"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let config: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(config["server"]["base_url"], "http://race.local:9000");
    assert_eq!(config["timing"]["countdown_from"], 3);
}

// ---------------------------------------------------------------------------
// podrace race
// ---------------------------------------------------------------------------

#[test]
fn race_without_racer_is_invalid_selection() {
    let dir = TempDir::new().unwrap();
    podrace(&dir)
        .args(["race", "--track", "3"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid selection"));
}

#[test]
fn race_reports_create_failure() {
    let dir = TempDir::new().unwrap();
    with_reference_files(&dir, "server:\n  request_timeout_ms: 2000\n");

    podrace(&dir)
        .args(["race", "--track", "3", "--racer", "7"])
        .args(["--server", "http://127.0.0.1:1"])
        .write_stdin("")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to create race"));
}

#[test]
fn race_with_zero_poll_interval_fails_before_racing() {
    let dir = TempDir::new().unwrap();
    with_reference_files(&dir, "timing:\n  poll_interval_ms: 0\n");

    podrace(&dir)
        .args(["race", "--track", "3", "--racer", "7"])
        .args(["--server", "http://127.0.0.1:1"])
        .write_stdin("")
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid config"))
        .stderr(predicate::str::contains("timing.poll_interval_ms"))
        .stderr(predicate::str::contains("failed to create race").not())
        .stderr(predicate::str::contains("panicked").not());
}
