//! # Export Module / 导出模块
//!
//! The two generic export contracts: a flat CSV table and a JSON document
//! wrapping every result. The JSON export can be read back into `TestResult`s.
//!
//! 两种通用导出约定：扁平的 CSV 表格和包含全部结果的 JSON 文档。
//! JSON 导出可以重新读取为 `TestResult`。

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::core::models::TestResult;
use crate::infra::fs::write_atomic;

/// Header row of the CSV export.
pub const CSV_HEADER: &str =
    "test_name,test_case_id,data_source,success,execution_time,error_message";

/// Top-level shape of the JSON export.
/// JSON 导出的顶层结构。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportDocument {
    pub export_timestamp: DateTime<Utc>,
    pub result_count: usize,
    pub results: Vec<TestResult>,
}

impl ExportDocument {
    pub fn new(results: &[TestResult]) -> Self {
        Self {
            export_timestamp: Utc::now(),
            result_count: results.len(),
            results: results.to_vec(),
        }
    }
}

/// Renders results as CSV: one line per result, execution time in seconds with
/// three decimals. Fields containing a comma, quote or line break are quoted,
/// with embedded quotes doubled.
///
/// 将结果渲染为 CSV：每个结果一行，执行时间以秒为单位保留三位小数。
/// 包含逗号、引号或换行的字段会加引号，内部引号加倍。
pub fn results_to_csv(results: &[TestResult]) -> String {
    let mut csv = String::from(CSV_HEADER);
    csv.push('\n');
    for result in results {
        let line = [
            escape_csv_field(&result.test_name),
            escape_csv_field(&result.test_case_id),
            escape_csv_field(&result.data_source_label),
            result.success.to_string(),
            format!("{:.3}", result.execution_secs()),
            escape_csv_field(&result.error_message),
        ]
        .join(",");
        csv.push_str(&line);
        csv.push('\n');
    }
    csv
}

fn escape_csv_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Writes the CSV export to `path`.
pub fn export_csv(results: &[TestResult], path: &Path) -> Result<()> {
    write_atomic(path, results_to_csv(results).as_bytes())
}

/// Renders the JSON export document.
pub fn results_to_json(results: &[TestResult]) -> Result<String> {
    serde_json::to_string_pretty(&ExportDocument::new(results))
        .context("Failed to serialize results to JSON")
}

/// Writes the JSON export to `path`.
pub fn export_json(results: &[TestResult], path: &Path) -> Result<()> {
    write_atomic(path, results_to_json(results)?.as_bytes())
}

/// Parses a JSON export produced by [`export_json`].
pub fn parse_json_export(content: &str) -> Result<ExportDocument> {
    serde_json::from_str(content).context("Failed to parse JSON export")
}

/// Reads the results back from a JSON export file.
/// 从 JSON 导出文件中读回结果。
pub fn read_json(path: &Path) -> Result<Vec<TestResult>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read JSON export: {}", path.display()))?;
    Ok(parse_json_export(&content)?.results)
}
