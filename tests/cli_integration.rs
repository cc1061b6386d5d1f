//! Integration tests for the decisio CLI
//!
//! These tests exercise the full CLI workflow using a temporary database.
//! They verify that commands work end-to-end without mocking.

use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// Helper to run decisio CLI with a specific database path
fn run_decisio(args: &[&str], db_path: &PathBuf) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_decisio"))
        .args(args)
        .env("DECISIO_DB_PATH", db_path)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute decisio")
}

/// Helper to get stdout as string
fn stdout(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

/// Helper to get stderr as string
fn stderr(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

fn temp_db() -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = dir.path().join("decisio.db");
    (dir, db_path)
}

/// Add a decision and return its id, parsed from "Created decision <id>"
fn add_decision(db_path: &PathBuf, title: &str) -> String {
    let output = run_decisio(
        &["add", title, "-d", "Because it fits today", "-t", "technology", "-c", "high"],
        db_path,
    );
    assert!(output.status.success(), "add failed: {}", stderr(&output));
    let out = stdout(&output);
    out.lines()
        .find_map(|line| line.strip_prefix("Created decision "))
        .map(|id| id.trim().to_string())
        .expect("add should print the new id")
}

// =============================================================================
// Basic Command Tests
// =============================================================================

#[test]
fn test_help_command() {
    let output = Command::new(env!("CARGO_BIN_EXE_decisio"))
        .arg("--help")
        .output()
        .expect("Failed to execute");

    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.contains("decisio"));
    assert!(out.contains("drift evaluation"));
}

#[test]
fn test_version_command() {
    let output = Command::new(env!("CARGO_BIN_EXE_decisio"))
        .arg("--version")
        .output()
        .expect("Failed to execute");

    assert!(output.status.success());
    assert!(stdout(&output).contains("decisio"));
}

// =============================================================================
// Shell Completion Tests
// =============================================================================

#[test]
fn test_completion_zsh() {
    let output = Command::new(env!("CARGO_BIN_EXE_decisio"))
        .args(["completion", "zsh"])
        .output()
        .expect("Failed to execute");

    assert!(
        output.status.success(),
        "completion zsh failed: {}",
        stderr(&output)
    );
    assert!(
        stdout(&output).contains("#compdef decisio"),
        "zsh completion should contain #compdef"
    );
}

#[test]
fn test_completion_bash() {
    let output = Command::new(env!("CARGO_BIN_EXE_decisio"))
        .args(["completion", "bash"])
        .output()
        .expect("Failed to execute");

    assert!(output.status.success());
    assert!(stdout(&output).contains("_decisio"));
}

// =============================================================================
// Decision Workflow Tests
// =============================================================================

#[test]
fn test_add_and_list_decisions() {
    let (_dir, db_path) = temp_db();

    let id = add_decision(&db_path, "Adopt Rust for the ingest service");
    assert_eq!(id.len(), 36, "id should be a uuid: {}", id);

    let output = run_decisio(&["decisions"], &db_path);
    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.contains("Adopt Rust for the ingest service"));
    assert!(out.contains(&id));
}

#[test]
fn test_list_empty() {
    let (_dir, db_path) = temp_db();
    let output = run_decisio(&["decisions"], &db_path);
    assert!(output.status.success());
    assert!(stdout(&output).contains("No decisions recorded."));
}

#[test]
fn test_add_rejects_blank_title() {
    let (_dir, db_path) = temp_db();
    let output = run_decisio(&["add", "   ", "-d", "x"], &db_path);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Title must not be empty"));
}

#[test]
fn test_add_rejects_unknown_type() {
    let (_dir, db_path) = temp_db();
    let output = run_decisio(&["add", "t", "-d", "x", "-t", "vibes"], &db_path);
    assert!(!output.status.success());
}

#[test]
fn test_show_unknown_decision() {
    let (_dir, db_path) = temp_db();
    let output = run_decisio(&["show", "00000000-0000-4000-8000-000000000000"], &db_path);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("not found"));
}

// =============================================================================
// Context, Snapshot and Evaluation Tests
// =============================================================================

#[test]
fn test_context_requires_all_fields_first() {
    let (_dir, db_path) = temp_db();

    let output = run_decisio(&["context", "show"], &db_path);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("No project context found"));

    let output = run_decisio(&["context", "set", "--team", "4"], &db_path);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("First context creation"));
}

#[test]
fn test_full_drift_workflow() {
    let (_dir, db_path) = temp_db();

    let output = run_decisio(
        &["context", "set", "--team", "3", "--users", "1000", "--timeline", "6"],
        &db_path,
    );
    assert!(output.status.success(), "context set failed: {}", stderr(&output));

    let id = add_decision(&db_path, "Monolith first");

    let output = run_decisio(&["snapshot", &id, "-a", "Small team"], &db_path);
    assert!(output.status.success(), "snapshot failed: {}", stderr(&output));
    assert!(stdout(&output).contains("team=3 users=1000 timeline=6mo"));

    let output = run_decisio(&["evaluate", &id], &db_path);
    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.contains("drift   0/100"), "unexpected: {}", out);
    assert!(out.contains("No significant drift detected"));

    let output = run_decisio(&["context", "set", "--users", "5000"], &db_path);
    assert!(output.status.success());

    let output = run_decisio(&["evaluate", &id], &db_path);
    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.contains("drift  35/100"), "unexpected: {}", out);
    assert!(out.contains("medium"));

    let output = run_decisio(&["evaluations", &id], &db_path);
    assert!(output.status.success());
    let out = stdout(&output);
    let newest = out.find("drift  35/100").expect("newest evaluation listed");
    let oldest = out.find("drift   0/100").expect("oldest evaluation listed");
    assert!(newest < oldest, "newest evaluation should come first");
}

#[test]
fn test_evaluate_without_context_fails() {
    let (_dir, db_path) = temp_db();
    let id = add_decision(&db_path, "Pick a queue");
    let output = run_decisio(&["evaluate", &id], &db_path);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Please set project context first"));
}

#[test]
fn test_snapshot_needs_all_values_or_none() {
    let (_dir, db_path) = temp_db();
    let id = add_decision(&db_path, "Cache layer");
    let output = run_decisio(&["snapshot", &id, "--team", "5"], &db_path);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("together"));
}

#[test]
fn test_explicit_snapshot_values() {
    let (_dir, db_path) = temp_db();
    let id = add_decision(&db_path, "Cache layer");
    let output = run_decisio(
        &["snapshot", &id, "--team", "5", "--users", "200", "--timeline", "12"],
        &db_path,
    );
    assert!(output.status.success(), "snapshot failed: {}", stderr(&output));

    let output = run_decisio(&["show", &id], &db_path);
    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.contains("Snapshots (1)"));
    assert!(out.contains("Evaluations (0)"));
}

#[test]
fn test_status_reports_counts() {
    let (_dir, db_path) = temp_db();
    add_decision(&db_path, "One");
    add_decision(&db_path, "Two");

    let output = run_decisio(&["status"], &db_path);
    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.contains("decisions:       2"));
    assert!(out.contains("project context: not set"));
    assert!(Path::new(&db_path).exists());
}
