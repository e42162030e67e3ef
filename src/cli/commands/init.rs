//! # Suite Initialization Module / 套件初始化模块
//!
//! Creates a starter suite file, either through a short interactive wizard or
//! straight from the default template with `--non-interactive`. The template
//! contains one parameterized test with inline rows and a small matrix.
//!
//! 通过简短的交互式向导或使用 `--non-interactive` 直接从默认模板创建初始套件文件。
//! 模板包含一个使用内联数据行的参数化测试和一个小型矩阵。

use anyhow::{Context, Result};
use colored::*;
use dialoguer::{Confirm, Input, theme::ColorfulTheme};
use serde_json::{Map, Value, json};
use std::path::Path;

use crate::core::config::{DimensionConfig, MatrixConfig, SourceConfig, SuiteConfig, TestConfig};
use crate::core::executor::default_concurrency;
use crate::infra::{fs::write_atomic, t};

/// Runs the wizard and writes the suite file to `output`.
///
/// 运行向导并将套件文件写入 `output`。
pub fn run_init_wizard(output: &Path, non_interactive: bool) -> Result<()> {
    let theme = ColorfulTheme::default();
    let mut suite = generate_default_suite();

    if non_interactive {
        return write_config(output, &suite);
    }

    println!("\n{}", t!("init.welcome").cyan().bold());
    println!("{}", t!("init.description"));

    if output.exists() {
        let confirmation = Confirm::with_theme(&theme)
            .with_prompt(t!("init.overwrite_prompt", path = output.display()))
            .default(false)
            .interact()
            .context(t!("init.user_input_failed").to_string())?;
        if !confirmation {
            println!("{}", t!("init.aborted"));
            return Ok(());
        }
    }

    suite.name = Input::with_theme(&theme)
        .with_prompt(t!("init.suite_name_prompt"))
        .default(suite.name)
        .interact_text()
        .context(t!("init.user_input_failed").to_string())?;

    suite.parallel = Confirm::with_theme(&theme)
        .with_prompt(t!("init.parallel_prompt"))
        .default(false)
        .interact()
        .context(t!("init.user_input_failed").to_string())?;

    if suite.parallel {
        let jobs: usize = Input::with_theme(&theme)
            .with_prompt(t!("init.jobs_prompt"))
            .default(default_concurrency())
            .interact_text()
            .context(t!("init.user_input_failed").to_string())?;
        suite.max_concurrency = Some(jobs.max(1));
    }

    write_config(output, &suite)
}

fn row(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// The starter suite written by `init`.
pub fn generate_default_suite() -> SuiteConfig {
    SuiteConfig {
        name: "my-suite".to_string(),
        language: "en".to_string(),
        parallel: false,
        max_concurrency: None,
        timeout_secs: Some(10.0),
        cancel_grace_secs: None,
        tests: vec![TestConfig {
            name: "greeting".to_string(),
            description: "Echoes each row's name".to_string(),
            command: "echo hello {name}".to_string(),
            timeout_secs: None,
            retries: 0,
            source: Some(SourceConfig::Inline {
                rows: vec![
                    row(json!({ "name": "alice", "age": 30 })),
                    row(json!({ "name": "bob", "age": 25 })),
                ],
            }),
            filter: None,
        }],
        matrix: Some(MatrixConfig {
            name: "platforms".to_string(),
            command: "echo {browser} on {os}".to_string(),
            timeout_secs: None,
            retries: 0,
            dimensions: vec![
                DimensionConfig {
                    name: "browser".to_string(),
                    values: vec![json!("chrome"), json!("firefox")],
                    labels: None,
                },
                DimensionConfig {
                    name: "os".to_string(),
                    values: vec![json!("linux"), json!("windows")],
                    labels: None,
                },
            ],
            exclusions: vec![],
        }),
    }
}

fn write_config(path: &Path, suite: &SuiteConfig) -> Result<()> {
    let toml_string =
        toml::to_string_pretty(suite).context("Failed to serialize the suite file")?;

    write_atomic(path, toml_string.as_bytes())
        .with_context(|| t!("init.write_failed", path = path.display()).to_string())?;

    println!(
        "\n{} {}",
        "✔".green(),
        t!("init.success", path = path.display()).bold()
    );
    println!("{}", t!("init.next_steps"));

    Ok(())
}
