// Shared test helpers for integration tests
#![allow(dead_code)]

use chrono::Utc;
use matrix_harness::{FailureReason, Row, TestResult};
use serde_json::{Value, json};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;

/// Turns a `json!({...})` object into a row.
pub fn row(value: Value) -> Row {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}

/// The three user rows used across the data-driven tests.
pub fn user_rows() -> Vec<Row> {
    vec![
        row(json!({ "name": "alice", "age": 30, "active": true })),
        row(json!({ "name": "bob", "age": 17, "active": false })),
        row(json!({ "name": "carol", "age": 45, "active": true })),
    ]
}

/// Builds a finished result without running anything.
pub fn make_result(test_name: &str, case_id: &str, success: bool, secs: f64) -> TestResult {
    let now = Utc::now();
    TestResult {
        test_name: test_name.to_string(),
        test_case_id: case_id.to_string(),
        data_source_label: "inline".to_string(),
        start_time: now,
        end_time: now,
        execution_time: Duration::from_secs_f64(secs),
        success,
        error_message: if success {
            String::new()
        } else {
            "assertion failed".to_string()
        },
        failure_reason: if success {
            None
        } else {
            Some(FailureReason::Execution)
        },
        attempts: 1,
        input_data: row(json!({ "case": case_id })),
        output_data: if success { Some(json!(true)) } else { None },
    }
}

/// Writes `content` to `name` inside `dir` and returns the path.
pub fn write_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).expect("Failed to write test file");
    path
}

/// A suite where every case passes.
pub fn create_passing_suite(dir: &TempDir) -> PathBuf {
    write_file(
        dir,
        "passing.toml",
        r#"
name = "passing"
language = "en"

[[tests]]
name = "echo"
command = "echo {name}"

[tests.source]
kind = "inline"
rows = [{ name = "alice" }, { name = "bob" }]

[matrix]
name = "platforms"
command = "true"

[[matrix.dimensions]]
name = "os"
values = ["linux", "macos"]

[[matrix.dimensions]]
name = "arch"
values = ["x86_64", "aarch64"]
"#,
    )
}

/// A suite where one case exits non-zero.
pub fn create_failing_suite(dir: &TempDir) -> PathBuf {
    write_file(
        dir,
        "failing.toml",
        r#"
name = "failing"
language = "en"

[[tests]]
name = "exit_code"
command = "sh -c 'exit {code}'"

[tests.source]
kind = "inline"
rows = [{ code = 0 }, { code = 3 }]
"#,
    )
}

/// A suite file that is not valid TOML.
pub fn create_invalid_toml(dir: &TempDir) -> PathBuf {
    write_file(
        dir,
        "invalid.toml",
        r#"
name = "broken"
[[tests]
name = "missing bracket"
"#,
    )
}
