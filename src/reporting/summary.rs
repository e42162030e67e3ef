//! # Report Summary Module / 报告摘要模块
//!
//! Aggregate statistics over a set of results.
//!
//! 对一组结果进行汇总统计。

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::core::models::{FailureReason, TestResult, duration_secs};

/// Aggregate view of a run.
/// 一次运行的汇总视图。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestReport {
    pub suite_name: String,
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    /// Failures caused by a timeout (also counted in `failed`).
    pub timed_out: usize,
    /// `100 * successful / total`, or `0.0` for an empty run.
    pub success_rate: f64,
    #[serde(with = "duration_secs")]
    pub total_execution_time: Duration,
    #[serde(with = "duration_secs")]
    pub average_execution_time: Duration,
    /// Case count per data source label, in label order.
    /// 按数据源标签统计的用例数量，按标签排序。
    pub by_data_source: BTreeMap<String, usize>,
}

/// Computes the report for `results`. Pure: the same input always gives the same report.
/// 计算 `results` 的报告。纯函数：相同输入总是得到相同报告。
pub fn generate_report(suite_name: &str, results: &[TestResult]) -> TestReport {
    let total = results.len();
    let successful = results.iter().filter(|r| r.success).count();
    let timed_out = results
        .iter()
        .filter(|r| r.failure_reason == Some(FailureReason::Timeout))
        .count();
    let total_execution_time: Duration = results.iter().map(|r| r.execution_time).sum();

    let (success_rate, average_execution_time) = if total == 0 {
        (0.0, Duration::ZERO)
    } else {
        (
            100.0 * successful as f64 / total as f64,
            Duration::from_secs_f64(total_execution_time.as_secs_f64() / total as f64),
        )
    };

    let mut by_data_source = BTreeMap::new();
    for result in results {
        *by_data_source
            .entry(result.data_source_label.clone())
            .or_insert(0usize) += 1;
    }

    TestReport {
        suite_name: suite_name.to_string(),
        total,
        successful,
        failed: total - successful,
        timed_out,
        success_rate,
        total_execution_time,
        average_execution_time,
        by_data_source,
    }
}
