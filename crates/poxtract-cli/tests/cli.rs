use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn poxtract() -> Command {
    Command::cargo_bin("poxtract").unwrap()
}

#[test]
fn test_help_lists_commands() {
    poxtract()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("process"))
        .stdout(predicate::str::contains("email"))
        .stdout(predicate::str::contains("batch"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_process_missing_input_fails() {
    let dir = TempDir::new().unwrap();
    let response = dir.path().join("response.json");
    fs::write(&response, "{}").unwrap();

    poxtract()
        .args(["--mock-response", response.to_str().unwrap()])
        .args(["process", "does-not-exist.pdf"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input file not found"));
}

#[test]
fn test_process_rejects_non_pdf() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("order.txt");
    fs::write(&input, "PO-1001").unwrap();

    poxtract()
        .args(["process", input.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported file format"));
}

#[test]
fn test_config_init_get_set() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("config.json");
    let config = config.to_str().unwrap();

    poxtract()
        .args(["--config", config, "config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created configuration file"));

    poxtract()
        .args(["--config", config, "config", "get", "extraction.token_limit"])
        .assert()
        .success()
        .stdout(predicate::str::contains("3600"));

    poxtract()
        .args(["--config", config, "config", "set", "address.dedup_threshold", "90"])
        .assert()
        .success();

    poxtract()
        .args(["--config", config, "config", "get", "address.dedup_threshold"])
        .assert()
        .success()
        .stdout(predicate::str::contains("90"));

    poxtract()
        .args(["--config", config, "config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn test_config_set_rejects_bad_values() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("config.json");
    let config = config.to_str().unwrap();

    poxtract()
        .args(["--config", config, "config", "set", "extraction.no_such_key", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration key not found"));

    poxtract()
        .args(["--config", config, "config", "set", "extraction.token_limit", "many"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid value"));
}

#[test]
fn test_config_path_reports_missing_file() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("config.json");

    poxtract()
        .args(["--config", config.to_str().unwrap(), "config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("not created"));
}

#[test]
fn test_email_with_unreadable_pdf() {
    let dir = TempDir::new().unwrap();
    let response = dir.path().join("response.json");
    fs::write(&response, "{}").unwrap();

    let message = dir.path().join("msg.json");
    fs::write(
        &message,
        r#"{
            "subject": "PO",
            "attachments": [
                {"name": "notes.txt", "contentBytes": "aGk="},
                {"name": "bad.pdf", "contentBytes": "bm90IGEgcGRm"}
            ]
        }"#,
    )
    .unwrap();
    let root = dir.path().join("out");

    poxtract()
        .args(["--mock-response", response.to_str().unwrap()])
        .args(["email", message.to_str().unwrap()])
        .args(["--output-root", root.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("emails/msg.json: 2 attachments, 1 PDF"))
        .stdout(predicate::str::contains("Subject: PO"))
        .stdout(predicate::str::contains("0 records, 0 skipped, 1 failed"));

    assert!(!root.join("emails").exists());
}

#[test]
fn test_email_rejects_bad_blob_name() {
    let dir = TempDir::new().unwrap();
    let response = dir.path().join("response.json");
    fs::write(&response, "{}").unwrap();
    let message = dir.path().join("msg.json");
    fs::write(&message, r#"{"attachments": []}"#).unwrap();

    poxtract()
        .args(["--mock-response", response.to_str().unwrap()])
        .args(["email", message.to_str().unwrap(), "--blob-name", "no-slash"])
        .assert()
        .failure();
}

#[test]
fn test_batch_without_matches_fails() {
    let dir = TempDir::new().unwrap();
    let response = dir.path().join("response.json");
    fs::write(&response, "{}").unwrap();
    let pattern = dir.path().join("*.pdf");

    poxtract()
        .args(["--mock-response", response.to_str().unwrap()])
        .args(["batch", pattern.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No matching files"));
}
