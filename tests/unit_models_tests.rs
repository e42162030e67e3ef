//! # Models Module Unit Tests / Models 模块单元测试
//!
//! Tests for `TestResult` helpers and duration formatting.
//!
//! 测试 `TestResult` 辅助方法和时长格式化。

use matrix_harness::FailureReason;
use matrix_harness::core::models::{format_seconds, timeout_message};
use serde_json::json;
use std::time::Duration;

mod common;
use common::make_result;

#[test]
fn test_format_seconds_trims_trailing_zeros() {
    assert_eq!(format_seconds(Duration::from_secs(1)), "1");
    assert_eq!(format_seconds(Duration::from_millis(250)), "0.25");
    assert_eq!(format_seconds(Duration::from_millis(2500)), "2.5");
    assert_eq!(format_seconds(Duration::from_micros(1234)), "0.001");
    assert_eq!(format_seconds(Duration::ZERO), "0");
}

#[test]
fn test_timeout_message_mentions_timeout() {
    assert_eq!(timeout_message(Duration::from_secs(30)), "Test timeout after 30s");
}

#[test]
fn test_failure_helpers() {
    let passed = make_result("t", "t_0", true, 0.1);
    let mut timed_out = make_result("t", "t_1", false, 1.0);
    timed_out.failure_reason = Some(FailureReason::Timeout);

    assert!(!passed.is_failure());
    assert!(timed_out.is_failure());
    assert!(timed_out.is_timeout());
    assert_eq!(passed.to_string(), "t [t_0] passed");
}

#[test]
fn test_result_serializes_seconds_and_snake_case_reason() {
    let mut result = make_result("t", "t_0", false, 1.5);
    result.failure_reason = Some(FailureReason::ReturnedFalse);
    let value = serde_json::to_value(&result).unwrap();

    assert_eq!(value["execution_time"], json!(1.5));
    assert_eq!(value["failure_reason"], json!("returned_false"));
}

#[test]
fn test_result_deserializes_with_defaults() {
    let value = json!({
        "test_name": "t",
        "test_case_id": "t_0",
        "data_source_label": "inline",
        "start_time": "2024-01-01T00:00:00Z",
        "end_time": "2024-01-01T00:00:01Z",
        "execution_time": 1.0,
        "success": true
    });
    let result: matrix_harness::TestResult = serde_json::from_value(value).unwrap();

    assert_eq!(result.attempts, 1);
    assert!(result.error_message.is_empty());
    assert!(result.input_data.is_empty());
    assert_eq!(result.output_data, None);
}
