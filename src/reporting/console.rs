//! # Console Reporting Module / 控制台报告模块
//!
//! This module handles the display of test reports in the console.
//! It provides functionality for printing colorful, formatted summaries with
//! internationalization support.
//!
//! 此模块处理控制台中测试报告的显示。
//! 它提供打印彩色格式化摘要的功能，支持国际化。

use colored::*;

use crate::core::models::{FailureReason, TestResult, format_seconds};
use crate::infra::t;
use crate::reporting::summary::TestReport;

/// Prints a formatted summary table of test results to the console.
/// Displays status, test name, case id, duration and attempts, using color
/// coding to highlight different statuses.
///
/// 在控制台打印格式化的测试结果摘要表。
/// 显示状态、测试名称、用例标识、持续时间和尝试次数，并使用颜色区分不同状态。
///
/// # Output Format / 输出格式
/// ```text
/// --- Test Summary ---
///   - Passed     | login                    | login_0                          |    0.01s
///   - Failed     | login                    | login_1                          |    0.02s  (2 attempts)
///   - Timeout    | browsers                 | safari_linux                     |    1.00s
/// ```
pub fn print_summary(results: &[TestResult]) {
    println!("\n{}", t!("report.summary_banner").bold());

    for result in results {
        let status_str = result.get_status_str();
        let status_colored = match result.failure_reason {
            _ if result.success => status_str.green(),
            Some(FailureReason::Cancelled) => status_str.dimmed(),
            Some(FailureReason::Timeout) => status_str.yellow(),
            _ => status_str.red(),
        };
        println!(
            "  - {:<10} | {:<24} | {:<32} | {:>8}{}",
            status_colored,
            result.test_name,
            result.test_case_id,
            format!("{:.2}s", result.execution_secs()),
            attempts_suffix(result)
        );
    }
}

/// Localized attempt count shown after a retried result; empty for a single attempt.
/// 重试过的结果后显示的本地化尝试次数；只尝试一次时为空。
pub fn attempts_suffix(result: &TestResult) -> String {
    if result.attempts > 1 {
        t!("report.attempts", count = result.attempts).to_string()
    } else {
        String::new()
    }
}

/// Prints the aggregate numbers of a report.
/// 打印报告的汇总数据。
pub fn print_report(report: &TestReport) {
    println!();
    println!(
        "{}",
        t!(
            "report.totals",
            total = report.total,
            passed = report.successful,
            failed = report.failed,
            rate = format!("{:.2}", report.success_rate)
        )
        .bold()
    );
    println!(
        "{}",
        t!(
            "report.timing",
            total = format_seconds(report.total_execution_time),
            average = format_seconds(report.average_execution_time)
        )
    );
    if !report.by_data_source.is_empty() {
        println!("{}", t!("report.by_source"));
        for (label, count) in &report.by_data_source {
            println!("  - {:<24} {}", label.cyan(), count);
        }
    }
}

/// Prints the error message and input data of every failed result.
///
/// 打印每个失败结果的错误消息和输入数据。
pub fn print_failure_details(failures: &[&TestResult]) {
    if failures.is_empty() {
        return;
    }

    println!("\n{}", t!("report.failure_banner").red().bold());
    println!("{}", "-".repeat(80));

    for (i, result) in failures.iter().enumerate() {
        println!(
            "[{}/{}] {} '{}' [{}]",
            i + 1,
            failures.len(),
            t!("report.failure_header").red(),
            result.test_name.cyan(),
            result.test_case_id
        );
        if result.error_message.is_empty() {
            println!("{}", t!("report.no_error_output").dimmed());
        } else {
            println!("{}", result.error_message);
        }
        if let Ok(input) = serde_json::to_string(&result.input_data) {
            println!("{}", input.dimmed());
        }
        println!("{}", "-".repeat(80));
    }
}
