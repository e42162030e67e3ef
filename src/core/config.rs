//! # Suite Configuration Module / 套件配置模块
//!
//! TOML description of a suite: global run settings, command-backed
//! parameterized tests with their data sources, and an optional matrix.
//! Loading turns the description into a ready-to-run `Executor`.
//!
//! 套件的 TOML 描述：全局运行设置、基于命令的参数化测试及其数据源，以及可选的矩阵。
//! 加载时会将描述转换为可直接运行的 `Executor`。

use anyhow::{Context, Result, bail};
use colored::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::core::data_source::DataSource;
use crate::core::executor::{Executor, default_concurrency};
use crate::core::matrix::{TestDimension, TestMatrix};
use crate::core::models::{INLINE_SOURCE_LABEL, Row};
use crate::core::parameterized::{DEFAULT_TIMEOUT, MatrixTest, ParameterizedTest, TestBody};
use crate::infra::fs::resolve_path;
use crate::infra::t;

/// Default file name of a suite description.
pub const DEFAULT_CONFIG_FILE: &str = "TestSuite.toml";

/// Represents the entire suite configuration, loaded from a TOML file.
/// 代表从 TOML 文件加载的整个套件配置。
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SuiteConfig {
    /// Suite name used in reports.
    /// 报告中使用的套件名称。
    #[serde(default = "default_suite_name")]
    pub name: String,

    /// The language for console output (e.g., "en", "zh-CN").
    /// 控制台输出的语言（例如 "en", "zh-CN"）。
    #[serde(default = "default_language")]
    pub language: String,

    #[serde(default)]
    pub parallel: bool,

    /// Worker limit in parallel mode. Defaults to half the CPUs plus one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_concurrency: Option<usize>,

    /// Default per-case timeout in seconds.
    /// 默认的单用例超时时间（秒）。
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<f64>,

    /// Seconds to wait for a timed-out worker to stop.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancel_grace_secs: Option<f64>,

    #[serde(default)]
    pub tests: Vec<TestConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matrix: Option<MatrixConfig>,
}

/// A command-backed parameterized test.
/// 基于命令的参数化测试。
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TestConfig {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Command template; `{column}` placeholders take case values.
    /// 命令模板；`{column}` 占位符使用用例的值。
    pub command: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<f64>,
    #[serde(default)]
    pub retries: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceConfig>,
    /// Keeps only rows whose columns equal every listed value.
    /// 仅保留各列值与所列值全部相等的行。
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Row>,
}

/// Where a test's rows come from.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceConfig {
    Csv {
        path: String,
        #[serde(default = "default_delimiter")]
        delimiter: char,
    },
    Json {
        path: String,
        #[serde(default = "default_array_key")]
        array_key: String,
    },
    Inline {
        rows: Vec<Row>,
    },
}

/// The suite's matrix section.
/// 套件的矩阵部分。
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MatrixConfig {
    pub name: String,
    pub command: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<f64>,
    #[serde(default)]
    pub retries: u32,
    pub dimensions: Vec<DimensionConfig>,
    #[serde(default)]
    pub exclusions: Vec<Vec<Value>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DimensionConfig {
    pub name: String,
    pub values: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
}

fn default_suite_name() -> String {
    "suite".to_string()
}

fn default_language() -> String {
    "en".to_string()
}

fn default_delimiter() -> char {
    ','
}

fn default_array_key() -> String {
    "data".to_string()
}

/// Reads and parses a suite file.
pub fn load_suite_config(path: &Path) -> Result<SuiteConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| t!("run.config_read_failed", path = path.display()).to_string())?;
    parse_suite_config(&content)
        .with_context(|| t!("run.config_parse_failed", path = path.display()).to_string())
}

pub fn parse_suite_config(content: &str) -> Result<SuiteConfig> {
    let config: SuiteConfig = toml::from_str(content)?;
    Ok(config)
}

fn secs(value: Option<f64>, fallback: Duration) -> Result<Duration> {
    match value {
        None => Ok(fallback),
        Some(secs) => Duration::try_from_secs_f64(secs)
            .with_context(|| format!("invalid duration: {secs} seconds")),
    }
}

impl SuiteConfig {
    /// Builds a runnable executor. Relative data-source paths and command working
    /// directories resolve against `base_dir` (normally the suite file's directory).
    ///
    /// 构建可运行的执行器。相对的数据源路径和命令工作目录相对于 `base_dir`
    /// （通常是套件文件所在目录）解析。
    ///
    /// # Errors
    /// Fails when a data source cannot be loaded or the matrix is inconsistent.
    pub fn build_executor(&self, base_dir: &Path) -> Result<Executor> {
        let default_timeout = secs(self.timeout_secs, DEFAULT_TIMEOUT)?;

        let mut executor = Executor::new(&self.name);
        executor.set_parallel(
            self.parallel,
            self.max_concurrency.unwrap_or_else(default_concurrency),
        );
        if let Some(grace) = self.cancel_grace_secs {
            executor.set_cancel_grace(secs(Some(grace), Duration::ZERO)?);
        }

        for test in &self.tests {
            executor.add_test(test.build(base_dir, default_timeout)?);
        }

        if let Some(matrix) = &self.matrix {
            executor.set_matrix(matrix.build(base_dir, default_timeout)?);
        }

        Ok(executor)
    }
}

impl TestConfig {
    fn build(&self, base_dir: &Path, default_timeout: Duration) -> Result<ParameterizedTest> {
        let mut test = ParameterizedTest::new(
            &self.name,
            TestBody::command_in(&self.command, base_dir),
        )
        .with_description(&self.description)
        .with_timeout(secs(self.timeout_secs, default_timeout)?)
        .with_retries(self.retries);

        if let Some(source) = &self.source {
            let data_source = source
                .load(base_dir)
                .with_context(|| format!("Failed to load data source for test '{}'", self.name))?;
            test = test.with_data_source(data_source);
        }

        if let Some(filter) = self.filter.clone() {
            test = test.with_filter(move |row| {
                filter.iter().all(|(key, expected)| row.get(key) == Some(expected))
            });
        }

        Ok(test)
    }
}

impl SourceConfig {
    /// Loads the data source, printing a warning when it cannot be built.
    /// 加载数据源，无法构建时打印警告。
    pub fn load(&self, base_dir: &Path) -> Result<DataSource> {
        let loaded = match self {
            SourceConfig::Csv { path, delimiter } => {
                DataSource::from_csv(resolve_path(path, base_dir)?, *delimiter)
            }
            SourceConfig::Json { path, array_key } => {
                DataSource::from_json(resolve_path(path, base_dir)?, array_key)
            }
            SourceConfig::Inline { rows } => Ok(DataSource::from_array(rows, INLINE_SOURCE_LABEL)),
        };

        loaded.map_err(|e| {
            eprintln!("{}", t!("data_source.load_failed", error = &e).yellow());
            anyhow::Error::new(e)
        })
    }
}

impl MatrixConfig {
    fn build(&self, base_dir: &Path, default_timeout: Duration) -> Result<MatrixTest> {
        let mut matrix = TestMatrix::new(&self.name);
        for dimension in &self.dimensions {
            let dimension = match &dimension.labels {
                Some(labels) => {
                    TestDimension::with_labels(&dimension.name, dimension.values.clone(), labels.clone())?
                }
                None => TestDimension::new(&dimension.name, dimension.values.clone()),
            };
            matrix.add_dimension(dimension);
        }
        for exclusion in &self.exclusions {
            matrix.add_exclusion(exclusion.clone())?;
        }
        if matrix.dimensions().is_empty() {
            bail!("matrix '{}' declares no dimensions", self.name);
        }

        Ok(MatrixTest::new(matrix, TestBody::command_in(&self.command, base_dir))
            .with_timeout(secs(self.timeout_secs, default_timeout)?)
            .with_retries(self.retries))
    }
}
