// src/cli/commands/run.rs

use anyhow::{Context, Result};
use colored::*;
use std::{fs, path::PathBuf};
use tokio::signal;
use tokio_util::sync::CancellationToken;

use crate::{
    core::config::{SuiteConfig, load_suite_config},
    infra::{fs::parent_dir, t},
    reporting::{
        export::{export_csv, export_json},
        print_failure_details, print_report, print_summary,
    },
};

/// Options of the `run` subcommand, already extracted from the command line.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub config: PathBuf,
    pub jobs: Option<usize>,
    /// `Some(true)` for `--parallel`, `Some(false)` for `--sequential`.
    pub parallel: Option<bool>,
    pub csv: Option<PathBuf>,
    pub json: Option<PathBuf>,
    /// Set when `--lang` was given; the suite's `language` is then ignored.
    pub language_override: bool,
}

pub async fn execute(options: RunOptions) -> Result<()> {
    let (suite, config_path) = setup_and_parse_config(&options.config)?;
    if !options.language_override {
        crate::set_language(&suite.language);
    }

    println!(
        "{}",
        t!("run.loading_suite", path = config_path.display())
    );

    let mut executor = suite.build_executor(&parent_dir(&config_path))?;

    let parallel = options.parallel.unwrap_or(suite.parallel);
    let jobs = options.jobs.unwrap_or_else(|| executor.max_concurrency());
    executor.set_parallel(parallel, jobs);
    executor.set_verbose(true);
    executor.set_stop_token(setup_signal_handler());

    let results = executor.execute_all().await.to_vec();

    if results.is_empty() {
        println!("{}", t!("run.no_cases").green());
        return write_exports(&options, &results);
    }

    print_summary(&results);
    print_report(&executor.generate_report());

    write_exports(&options, &results)?;

    let failures: Vec<_> = results.iter().filter(|r| r.is_failure()).collect();
    if failures.is_empty() {
        println!("\n{}", t!("run.all_passed").green().bold());
        Ok(())
    } else {
        print_failure_details(&failures);
        anyhow::bail!(t!("run.failures_detected", count = failures.len()).to_string());
    }
}

fn setup_and_parse_config(config_path_arg: &PathBuf) -> Result<(SuiteConfig, PathBuf)> {
    let config_path = fs::canonicalize(config_path_arg)
        .with_context(|| t!("run.config_read_failed", path = config_path_arg.display()).to_string())?;
    let suite = load_suite_config(&config_path)?;
    Ok((suite, config_path))
}

/// Cancels the returned token on Ctrl-C. Cases not yet started are then
/// recorded as cancelled and running ones are stopped.
fn setup_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            println!("\n{}", t!("run.shutdown_signal").yellow());
            token_clone.cancel();
        }
    });

    token
}

fn write_exports(options: &RunOptions, results: &[crate::TestResult]) -> Result<()> {
    if let Some(path) = &options.csv {
        export_csv(results, path)
            .with_context(|| t!("run.export_failed", format = "CSV").to_string())?;
        println!("{}", t!("run.exported", format = "CSV", path = path.display()));
    }
    if let Some(path) = &options.json {
        export_json(results, path)
            .with_context(|| t!("run.export_failed", format = "JSON").to_string())?;
        println!("{}", t!("run.exported", format = "JSON", path = path.display()));
    }
    Ok(())
}
