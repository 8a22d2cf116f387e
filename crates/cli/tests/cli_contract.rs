use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("fixture should be written");
    path
}

fn replay_json(scenario: &Path, extra: &[&str]) -> Value {
    let output = cargo_bin_cmd!("viewer-sync")
        .arg("replay")
        .arg(scenario)
        .args(extra)
        .env("VIEWER_SYNC_SOURCE_ID", "cli-test")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    serde_json::from_slice(&output).expect("stdout should contain valid json")
}

const TWO_DOCUMENTS: &str = r#"{
    "documents": [
        { "key": "a.pdf", "pages": 3 },
        { "key": "b.pdf", "pages": 5 }
    ],
    "steps": [
        { "at_ms": 0, "action": "scroll", "document": "b.pdf", "page": 2, "offset": 250 }
    ]
}"#;

#[test]
fn window_emits_stable_json_contract() {
    let output = cargo_bin_cmd!("viewer-sync")
        .args(["window", "--center", "5", "--pages", "10", "--prior", "1,2,3"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let value: Value = serde_json::from_slice(&output).expect("stdout should contain valid json");

    insta::assert_json_snapshot!(value, @r#"
    {
      "center": 5,
      "page_count": 10,
      "radius": 2,
      "rendered": [
        2,
        3,
        4,
        5,
        6,
        7
      ],
      "visible": [
        3,
        4,
        5,
        6,
        7
      ]
    }
    "#);
}

#[test]
fn replay_switches_to_dominant_document() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let scenario = write_file(temp.path(), "scenario.json", TWO_DOCUMENTS);

    let report = replay_json(&scenario, &[]);

    assert_eq!(report["current_document"], "b.pdf");
    assert_eq!(report["workspace"]["current_page"], 2);
    assert_eq!(report["workspace"]["num_pages"], 5);

    let a = &report["documents"][0];
    assert_eq!(a["key"], "a.pdf");
    assert_eq!(a["current_page"], 1);

    let kinds: Vec<_> = report["events"]
        .as_array()
        .expect("events should be an array")
        .iter()
        .map(|event| event["kind"].as_str().unwrap_or_default().to_owned())
        .collect();
    assert_eq!(kinds, vec!["page-visibility-changed", "page-changed"]);
    assert_eq!(report["events"][1]["source_id"], "cli-test");
}

#[test]
fn replay_applies_config_file() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let scenario = write_file(
        temp.path(),
        "scenario.json",
        r#"{
            "documents": [{ "key": "report.pdf", "pages": 10 }],
            "steps": [{ "action": "jump", "document": "report.pdf", "page": 7 }]
        }"#,
    );
    let config = write_file(temp.path(), "config.json", r#"{ "window_radius": 1 }"#);

    let report = replay_json(&scenario, &["--config", config.to_str().unwrap()]);

    let doc = &report["documents"][0];
    assert_eq!(doc["current_page"], 7);
    assert_eq!(doc["visible_pages"], serde_json::json!([6, 7, 8]));
    assert_eq!(doc["phase"]["programmatic_navigating"], 1);
}

#[test]
fn replay_end_key_is_idempotent() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let scenario = write_file(
        temp.path(),
        "scenario.json",
        r#"{
            "documents": [{ "key": "long.pdf", "pages": 12 }],
            "steps": [
                { "action": "jump", "document": "long.pdf", "page": 4 },
                { "at_ms": 20, "action": "settle" },
                { "at_ms": 40, "action": "key", "key": "end" },
                { "at_ms": 60, "action": "key", "key": "end" }
            ]
        }"#,
    );

    let report = replay_json(&scenario, &[]);

    assert_eq!(report["workspace"]["current_page"], 12);
    let page_changes = report["events"]
        .as_array()
        .expect("events should be an array")
        .iter()
        .filter(|event| event["kind"] == "page-changed")
        .count();
    assert_eq!(page_changes, 2);
}

#[test]
fn replay_drops_own_echo() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let scenario = write_file(
        temp.path(),
        "scenario.json",
        r#"{
            "documents": [{ "key": "report.pdf", "pages": 10 }],
            "steps": [
                { "action": "jump", "document": "report.pdf", "page": 3 },
                {
                    "at_ms": 20,
                    "action": "external",
                    "document": "report.pdf",
                    "page": 9,
                    "source_id": "cli-test"
                }
            ]
        }"#,
    );

    let report = replay_json(&scenario, &[]);

    assert_eq!(report["workspace"]["current_page"], 3);
}

#[test]
fn replay_fails_for_missing_scenario() {
    cargo_bin_cmd!("viewer-sync")
        .arg("replay")
        .arg("does-not-exist.json")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read scenario"));
}

#[test]
fn replay_fails_for_invalid_config() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let scenario = write_file(temp.path(), "scenario.json", TWO_DOCUMENTS);
    let config = write_file(temp.path(), "config.json", r#"{ "file_switch_threshold": 1.5 }"#);

    cargo_bin_cmd!("viewer-sync")
        .arg("replay")
        .arg(&scenario)
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load config"))
        .stderr(predicate::str::contains("file_switch_threshold"));
}

#[test]
fn replay_fails_for_malformed_scenario() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let scenario = write_file(temp.path(), "scenario.json", r#"{ "documents": "nope" }"#);

    cargo_bin_cmd!("viewer-sync")
        .arg("replay")
        .arg(&scenario)
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid scenario"));
}

#[test]
fn version_prints_package_version() {
    cargo_bin_cmd!("viewer-sync")
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}
