//! # Reporting Module / 报告模块
//!
//! This module turns collected results into an aggregate report, exports them
//! as CSV or JSON, and prints colorful, formatted summaries to the console with
//! internationalization support.
//!
//! 此模块将收集的结果转换为汇总报告，以 CSV 或 JSON 格式导出，
//! 并在控制台打印彩色格式化摘要，支持国际化。

pub mod console;
pub mod export;
pub mod summary;

// Re-export common reporting functions
pub use console::{print_failure_details, print_report, print_summary};
pub use export::{export_csv, export_json, read_json};
pub use summary::{TestReport, generate_report};
