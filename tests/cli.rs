use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;

fn project_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("README.md"), "A rust CLI for docker workflows").unwrap();
    std::fs::write(dir.path().join("main.rs"), "fn main() {}").unwrap();
    dir
}

#[test]
fn keywords_command_prints_vocabulary() {
    let dir = project_dir();
    let mut cmd = Command::cargo_bin("recall").unwrap();
    cmd.args(["keywords", "--project"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("rust"));
}

#[test]
fn keywords_command_json_output_parses() {
    let dir = project_dir();
    let output = Command::cargo_bin("recall")
        .unwrap()
        .args(["--json", "keywords", "--project"])
        .arg(dir.path())
        .output()
        .unwrap();
    assert!(output.status.success());
    let parsed: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(parsed.as_array().is_some());
}

#[test]
fn context_command_ranks_records_file() {
    let dir = project_dir();
    let records = dir.path().join("claude-sessions.jsonl");
    std::fs::write(
        &records,
        concat!(
            r#"{"id": "one", "messages": [{"role": "user", "content": "debug the rust error"}]}"#,
            "\n",
            r#"{"id": "two", "messages": [{"role": "user", "content": "lunch plans"}]}"#,
            "\n",
        ),
    )
    .unwrap();

    let output = Command::cargo_bin("recall")
        .unwrap()
        .args(["--json", "context", "--project"])
        .arg(dir.path())
        .arg("--records")
        .arg(&records)
        .output()
        .unwrap();
    assert!(output.status.success());
    let parsed: Value = serde_json::from_slice(&output.stdout).unwrap();
    let items = parsed["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["id"], "one");
    assert_eq!(parsed["total_scored"], 2);
}

#[test]
fn files_command_reports_tiers() {
    let dir = project_dir();
    std::fs::create_dir(dir.path().join("src")).unwrap();
    std::fs::write(dir.path().join("src/lib.rs"), "pub fn x() {}").unwrap();

    let output = Command::cargo_bin("recall")
        .unwrap()
        .args(["--json", "files", "--project"])
        .arg(dir.path())
        .output()
        .unwrap();
    assert!(output.status.success());
    let parsed: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(parsed.get("high_priority_files").is_some());
    assert!(parsed.get("params").is_some());
}

#[test]
fn missing_records_flag_is_an_error() {
    let dir = project_dir();
    Command::cargo_bin("recall")
        .unwrap()
        .args(["context", "--project"])
        .arg(dir.path())
        .assert()
        .failure();
}
