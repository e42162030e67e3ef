//! # Matrix Harness Library / Matrix Harness 库
//!
//! This library provides a data-driven and matrix-based test execution engine.
//! Test cases come either from tabular data bound to a test body, or from the
//! cartesian product of independent dimensions. Every case runs under a
//! wall-clock timeout, sequentially or with bounded concurrency, and the
//! outcomes are aggregated into a structured report.
//!
//! 此库提供数据驱动和基于矩阵的测试执行引擎。
//! 测试用例要么来自绑定到测试体的表格数据，要么来自多个独立维度的笛卡尔积。
//! 每个用例都在挂钟超时保护下运行（顺序或有界并发），结果汇总为结构化报告。
//!
//! ## Modules / 模块
//!
//! - `core` - Data sources, matrices, parameterized tests and the executor
//! - `infra` - Command execution and file system helpers
//! - `reporting` - Aggregate reports, CSV/JSON export and console output
//! - `cli` - Command-line interface and commands
//!
//! - `core` - 数据源、矩阵、参数化测试和执行器
//! - `infra` - 命令执行和文件系统辅助功能
//! - `reporting` - 汇总报告、CSV/JSON 导出和控制台输出
//! - `cli` - 命令行接口和命令

pub mod cli;
pub mod core;
pub mod infra;
pub mod reporting;

// Re-export commonly used items
pub use crate::core::config;
pub use crate::core::data_source::{DataSource, DataSourceError, SourceKind};
pub use crate::core::executor::Executor;
pub use crate::core::matrix::{TestDimension, TestMatrix};
pub use crate::core::models::{FailureReason, Row, TestResult};
pub use crate::core::parameterized::{CaseContext, MatrixTest, ParameterizedTest, TestBody};
pub use reporting::summary::TestReport;

/// Initializes the application's internationalization (i18n) based on the system locale.
///
/// It attempts to match the full locale (e.g., "zh-CN"), then just the language
/// code (e.g., "en"), and finally falls back to the default language ("en").
pub fn init() {
    let locale = sys_locale::get_locale().unwrap_or_else(|| "en".to_string());
    set_language(&locale);
}

/// Sets the output language, falling back to the bare language code and then "en".
/// 设置输出语言，依次回退到语言代码和 "en"。
pub fn set_language(locale: &str) {
    let available_locales = rust_i18n::available_locales!();

    let is_available = |code: &str| available_locales.iter().any(|l| *l == code);

    let lang = if is_available(locale) {
        locale
    } else {
        locale
            .split('-')
            .next()
            .filter(|lang_code| is_available(lang_code))
            .unwrap_or("en")
    };

    rust_i18n::set_locale(lang);
}

// Initialize i18n
rust_i18n::i18n!("locales", fallback = "en");
