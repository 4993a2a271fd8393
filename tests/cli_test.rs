/// CLI binary integration tests using assert_cmd
///
/// These tests invoke the actual binary with an empty config file so the
/// user's own configuration never leaks in
mod common;

use std::process::Command;

use assert_cmd::prelude::*;
use common::Workspace;
use predicates::prelude::*;

fn command(ws: &Workspace) -> Command {
    let config = ws.path().join("config.toml");
    std::fs::write(&config, "").unwrap();

    let mut cmd = Command::new(env!("CARGO_BIN_EXE_claude-chat-export"));
    cmd.env_remove("RUST_LOG")
        .arg("--config")
        .arg(config)
        .arg("--curl-file")
        .arg(ws.capture_path())
        .arg("--output")
        .arg(ws.output_dir());
    cmd
}

#[test]
fn test_cli_missing_capture_creates_sample() {
    let ws = Workspace::new();

    command(&ws)
        .assert()
        .success()
        .stdout(predicate::str::contains("Created sample"))
        .stdout(predicate::str::contains("Copy as cURL"));

    let sample = std::fs::read_to_string(ws.capture_path()).unwrap();
    assert!(sample.contains("YOUR_COOKIES_HERE"));
}

#[test]
fn test_cli_unconfigured_capture_asks_for_edit() {
    let ws = Workspace::new();
    command(&ws).assert().success();

    command(&ws)
        .assert()
        .success()
        .stdout(predicate::str::contains("Please edit"));
    assert!(!ws.output_dir().exists());
}

#[test]
fn test_cli_foreign_capture_fails_with_instructions() {
    let ws = Workspace::new()
        .with_capture("curl 'https://example.com/api/organizations/abc-123/chat_conversations'");

    command(&ws)
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "does not appear to be a claude.ai API endpoint",
        ))
        .stderr(predicate::str::contains("Copy as cURL"));
}

#[test]
fn test_cli_reports_failure_with_logging_disabled() {
    let ws = Workspace::new()
        .with_capture("curl 'https://example.com/api/organizations/abc-123/chat_conversations'");

    command(&ws)
        .env("RUST_LOG", "off")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error: invalid captured request"));
}

#[test]
fn test_cli_missing_explicit_config_fails() {
    let ws = Workspace::new();

    Command::new(env!("CARGO_BIN_EXE_claude-chat-export"))
        .env_remove("RUST_LOG")
        .arg("--config")
        .arg(ws.path().join("nope.toml"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Config file not found"));
}

#[test]
fn test_cli_help_lists_options() {
    Command::new(env!("CARGO_BIN_EXE_claude-chat-export"))
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--check"))
        .stdout(predicate::str::contains("--curl-file"))
        .stdout(predicate::str::contains("--join-content-parts"));
}
