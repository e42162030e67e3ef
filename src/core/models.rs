//! # Data Models Module / 数据模型模块
//!
//! This module defines the core data structures shared by the executor and the
//! reporters: the per-case `TestResult`, the `FailureReason` classification and
//! the `Row` payload type that carries case data.
//!
//! 此模块定义了执行器和报告器共享的核心数据结构：
//! 单个用例的 `TestResult`、`FailureReason` 分类以及承载用例数据的 `Row` 类型。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::time::Duration;

use crate::infra::t;

/// One row of test data, or one generated case.
/// Values are a tagged union (`serde_json::Value`) so arbitrary user data can be carried.
///
/// 一行测试数据或一个生成的用例。
/// 值使用带标签的联合类型 (`serde_json::Value`)，以便承载任意用户数据。
pub type Row = Map<String, Value>;

/// Label used for results that originate from the test matrix.
pub const MATRIX_SOURCE_LABEL: &str = "matrix";
/// Label used for results of tests that have no bound data source.
pub const INLINE_SOURCE_LABEL: &str = "inline";

/// Enumerates the possible reasons for a test case failure.
/// This helps in categorizing errors for reporting and handling.
/// 枚举测试用例失败的可能原因。
/// 这有助于对错误进行分类，以便报告和处理。
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// The test body returned an error, or a command exited with a non-zero status.
    /// 测试体返回了错误，或命令以非零状态退出。
    Execution,
    /// The test body returned `false` as its success flag.
    /// 测试体返回 `false` 作为成功标志。
    ReturnedFalse,
    /// The test body panicked.
    /// 测试体发生了 panic。
    Panicked,
    /// The test case exceeded its configured timeout.
    /// 测试用例超出了其配置的超时时间。
    Timeout,
    /// The run was cancelled before the case got to start.
    /// 运行在用例开始之前被取消。
    Cancelled,
    /// A command-backed case could not be spawned.
    /// 无法启动基于命令的用例。
    Spawn,
}

/// Represents the final result of a single test case execution.
///
/// A result is built exactly once per executed case, from the final attempt,
/// and is not mutated afterwards.
///
/// 表示单个测试用例执行的最终结果。
/// 每个执行的用例只根据最后一次尝试构建一次结果，之后不再修改。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    /// Name of the parameterized test or matrix that produced the case.
    pub test_name: String,
    /// Identifier of the case within its test.
    pub test_case_id: String,
    /// Data source name, `"matrix"` or `"inline"`.
    pub data_source_label: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Wall-clock time of the final attempt, serialized as seconds.
    #[serde(with = "duration_secs")]
    pub execution_time: Duration,
    pub success: bool,
    /// Empty on success.
    #[serde(default)]
    pub error_message: String,
    #[serde(default)]
    pub failure_reason: Option<FailureReason>,
    /// Number of attempts that ran (1 unless retries kicked in).
    /// 实际运行的尝试次数（除非触发重试，否则为 1）。
    #[serde(default = "default_attempts")]
    pub attempts: u32,
    /// Independent snapshot of the case data.
    #[serde(default)]
    pub input_data: Row,
    #[serde(default)]
    pub output_data: Option<Value>,
}

fn default_attempts() -> u32 {
    1
}

impl TestResult {
    /// Checks if the test result is any kind of failure.
    pub fn is_failure(&self) -> bool {
        !self.success
    }

    pub fn is_timeout(&self) -> bool {
        self.failure_reason == Some(FailureReason::Timeout)
    }

    /// Gets the status of the test result as a localized string for display.
    /// 以本地化字符串形式获取测试结果的状态以供显示。
    pub fn get_status_str(&self) -> String {
        match self.failure_reason {
            _ if self.success => t!("report.status_passed").to_string(),
            Some(FailureReason::Timeout) => t!("report.status_timeout").to_string(),
            Some(FailureReason::Cancelled) => t!("report.status_cancelled").to_string(),
            _ => t!("report.status_failed").to_string(),
        }
    }

    /// Execution time in seconds, as used by both exports.
    pub fn execution_secs(&self) -> f64 {
        self.execution_time.as_secs_f64()
    }
}

impl fmt::Display for TestResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] {}",
            self.test_name,
            self.test_case_id,
            if self.success { "passed" } else { "failed" }
        )
    }
}

/// Formats a duration as seconds with at most three decimals and no trailing zeros,
/// e.g. `1`, `0.25`, `2.5`.
///
/// 将持续时间格式化为秒，最多三位小数且不带尾随零，例如 `1`、`0.25`、`2.5`。
pub fn format_seconds(duration: Duration) -> String {
    let formatted = format!("{:.3}", duration.as_secs_f64());
    formatted
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

/// The error message recorded for a case that exceeded its timeout.
pub fn timeout_message(timeout: Duration) -> String {
    format!("Test timeout after {}s", format_seconds(timeout))
}

/// Serde adapter storing a `Duration` as fractional seconds.
/// 将 `Duration` 存储为小数秒的 Serde 适配器。
pub mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(duration.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}
