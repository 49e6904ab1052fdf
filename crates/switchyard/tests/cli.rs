//! CLI regression tests for the `switchyard` binary.
//!
//! These tests invoke the binary as a subprocess to catch regressions in flag
//! names, exit codes, and output formats.
//!
//! Run with: `cargo test -p switchyard`

use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::contains;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Returns an assert_cmd Command wrapping the `switchyard` binary.
fn switchyard() -> Command {
    #[allow(deprecated)]
    Command::cargo_bin("switchyard").expect("switchyard binary not found")
}

/// Write a route table into a fresh temp dir.
fn table(yaml: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("routes.yaml");
    std::fs::write(&path, yaml).expect("write route table");
    (dir, path)
}

const API: &str = r#"
routes:
  - method: ALL
    path: "*"
    handler: logger
  - method: GET
    path: /users/:id
    handler: show_user
  - method: GET
    path: /book
    handler: book
  - method: GET
    path: /api/animals/:type?
    handler: animals
"#;

const AMBIGUOUS: &str = r#"
routes:
  - method: GET
    path: /:user/entries
    handler: entries
  - method: GET
    path: /entry/:name
    handler: entry
"#;

// ---------------------------------------------------------------------------
// switchyard match
// ---------------------------------------------------------------------------

#[test]
fn match_prints_handlers_and_params() {
    let (_dir, routes) = table(API);
    switchyard()
        .args(["match", "--method", "GET", "--path", "/users/42", "--routes"])
        .arg(&routes)
        .assert()
        .success()
        .stdout(contains("handlers: logger, show_user"))
        .stdout(contains("param id = 42"));
}

#[test]
fn match_json_output() {
    let (_dir, routes) = table(API);
    switchyard()
        .args(["match", "--format", "json", "--path", "/users/42", "--routes"])
        .arg(&routes)
        .assert()
        .success()
        .stdout(contains("\"matched\": true"))
        .stdout(contains("\"id\": \"42\""))
        .stdout(contains("\"strategy\": \"regexp\""));
}

#[test]
fn match_ignores_trailing_slash() {
    let (_dir, routes) = table(API);
    switchyard()
        .args(["match", "--path", "/book/", "--routes"])
        .arg(&routes)
        .assert()
        .success()
        .stdout(contains("handlers: logger, book"));
}

#[test]
fn match_optional_param_without_value() {
    let (_dir, routes) = table(API);
    switchyard()
        .args(["match", "--path", "/api/animals", "--routes"])
        .arg(&routes)
        .assert()
        .success()
        .stdout(contains("animals"))
        .stdout(contains("param").not());
}

#[test]
fn match_miss_exits_two() {
    let (_dir, routes) = table("routes:\n  - {method: GET, path: /a, handler: a}\n");
    switchyard()
        .args(["match", "--path", "/b", "--routes"])
        .arg(&routes)
        .assert()
        .failure()
        .code(2)
        .stderr(contains("no route matches GET /b"));
}

#[test]
fn match_falls_back_on_ambiguous_table() {
    let (_dir, routes) = table(AMBIGUOUS);
    switchyard()
        .args(["match", "--format", "json", "--path", "/entry/x", "--routes"])
        .arg(&routes)
        .assert()
        .success()
        .stdout(contains("\"strategy\": \"trie\""))
        .stdout(contains("\"name\": \"x\""));
}

#[test]
fn match_missing_file_exits_one() {
    switchyard()
        .args(["match", "--path", "/", "--routes", "this-file-does-not-exist.yaml"])
        .assert()
        .failure()
        .code(1)
        .stderr(contains("failed to read"));
}

#[test]
fn match_duplicate_param_exits_one() {
    let (_dir, routes) = table("routes:\n  - {method: GET, path: '/:id/:id', handler: dup}\n");
    switchyard()
        .args(["match", "--path", "/1/2", "--routes"])
        .arg(&routes)
        .assert()
        .failure()
        .code(1)
        .stderr(contains("duplicate param name 'id'"));
}

// ---------------------------------------------------------------------------
// switchyard check
// ---------------------------------------------------------------------------

#[test]
fn check_reports_compiled_strategy() {
    let (_dir, routes) = table(API);
    switchyard()
        .args(["check", "--routes"])
        .arg(&routes)
        .assert()
        .success()
        .stdout(contains("4 route(s), strategy regexp"));
}

#[test]
fn check_reports_fallback_strategy() {
    let (_dir, routes) = table(AMBIGUOUS);
    switchyard()
        .args(["check", "--routes"])
        .arg(&routes)
        .assert()
        .success()
        .stdout(contains("strategy trie"));
}

#[test]
fn check_unservable_table_exits_one() {
    let yaml = format!("router:\n  strategies: [regexp]\n{AMBIGUOUS}");
    let (_dir, routes) = table(&yaml);
    switchyard()
        .args(["check", "--routes"])
        .arg(&routes)
        .assert()
        .failure()
        .code(1)
        .stderr(contains("unsupported path"));
}

#[test]
fn check_malformed_yaml_exits_one() {
    let (_dir, routes) = table("routes: [unclosed\n");
    switchyard()
        .args(["check", "--routes"])
        .arg(&routes)
        .assert()
        .failure()
        .code(1)
        .stderr(contains("failed to parse"));
}

#[test]
fn check_unknown_strategy_exits_one() {
    let (_dir, routes) = table("router:\n  strategies: [radix]\nroutes: []\n");
    switchyard()
        .args(["check", "--routes"])
        .arg(&routes)
        .assert()
        .failure()
        .code(1);
}

// ---------------------------------------------------------------------------
// switchyard routes
// ---------------------------------------------------------------------------

#[test]
fn routes_lists_registrations_in_order() {
    let (_dir, routes) = table(API);
    switchyard()
        .args(["routes", "--routes"])
        .arg(&routes)
        .assert()
        .success()
        .stdout(contains("ALL     * -> logger"))
        .stdout(contains("GET     /users/:id -> show_user"));
}

// ---------------------------------------------------------------------------
// Global flags
// ---------------------------------------------------------------------------

#[test]
fn invalid_log_format_exits_one() {
    let (_dir, routes) = table(API);
    switchyard()
        .args(["--log-format", "xml", "routes", "--routes"])
        .arg(&routes)
        .assert()
        .failure()
        .code(1)
        .stderr(contains("invalid log format"));
}

#[test]
fn help_lists_subcommands() {
    switchyard()
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("match"))
        .stdout(contains("check"))
        .stdout(contains("routes"));
}
