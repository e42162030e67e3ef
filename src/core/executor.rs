//! # Executor Module / 执行器模块
//!
//! Orchestrates a suite: plans the cases of every parameterized test and the
//! matrix, runs them through the guarded execution protocol, collects one
//! `TestResult` per case and produces the aggregate report.
//!
//! Sequential mode runs the plan in order and keeps that order in `results`.
//! Parallel mode feeds a single work queue to at most `max_concurrency` workers;
//! a worker picks up the next case as soon as it finishes its current one, and
//! results are appended in completion order through a mutex-guarded sink.
//!
//! 编排一个测试套件：为所有参数化测试和矩阵规划用例，通过受保护的执行协议运行它们，
//! 为每个用例收集一个 `TestResult`，并生成汇总报告。
//! 顺序模式按计划顺序运行并在 `results` 中保持该顺序。
//! 并行模式将单一工作队列交给最多 `max_concurrency` 个工作者；
//! 工作者完成当前用例后立即领取下一个，结果按完成顺序通过互斥锁保护的收集器追加。

use colored::*;
use futures::{StreamExt, stream};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::{
    core::{
        execution::{GuardOptions, run_case},
        models::TestResult,
        parameterized::{MatrixTest, ParameterizedTest},
        planner::{self, ExecutionPlan},
    },
    infra::t,
    reporting::summary::{TestReport, generate_report},
};

/// Collects results from concurrent workers behind a single mutex.
/// 通过单个互斥锁收集来自并发工作者的结果。
#[derive(Debug, Clone, Default)]
pub struct ResultSink {
    inner: Arc<Mutex<Vec<TestResult>>>,
}

impl ResultSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, result: TestResult) {
        // A poisoned lock still holds every result pushed so far.
        let mut results = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        results.push(result);
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Takes every collected result, leaving the sink empty.
    pub fn drain(&self) -> Vec<TestResult> {
        std::mem::take(&mut *self.inner.lock().unwrap_or_else(|e| e.into_inner()))
    }
}

/// Runs a suite of parameterized tests and an optional matrix.
/// 运行一组参数化测试和一个可选矩阵。
#[derive(Debug)]
pub struct Executor {
    suite_name: String,
    tests: Vec<ParameterizedTest>,
    matrix: Option<MatrixTest>,
    parallel: bool,
    max_concurrency: usize,
    options: GuardOptions,
    stop_token: CancellationToken,
    results: Vec<TestResult>,
}

impl Executor {
    pub fn new(suite_name: impl Into<String>) -> Self {
        Self {
            suite_name: suite_name.into(),
            tests: Vec::new(),
            matrix: None,
            parallel: false,
            max_concurrency: default_concurrency(),
            options: GuardOptions::default(),
            stop_token: CancellationToken::new(),
            results: Vec::new(),
        }
    }

    pub fn add_test(&mut self, test: ParameterizedTest) -> &mut Self {
        self.tests.push(test);
        self
    }

    pub fn set_matrix(&mut self, matrix: MatrixTest) -> &mut Self {
        self.matrix = Some(matrix);
        self
    }

    /// Switches to parallel mode with at most `max_concurrency` cases in flight.
    /// A limit of zero is treated as one.
    pub fn set_parallel(&mut self, parallel: bool, max_concurrency: usize) -> &mut Self {
        self.parallel = parallel;
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    pub fn set_cancel_grace(&mut self, grace: Duration) -> &mut Self {
        self.options.cancel_grace = grace;
        self
    }

    pub fn set_verbose(&mut self, verbose: bool) -> &mut Self {
        self.options.verbose = verbose;
        self
    }

    /// Uses an externally owned stop token, e.g. one cancelled on Ctrl-C.
    pub fn set_stop_token(&mut self, token: CancellationToken) -> &mut Self {
        self.stop_token = token;
        self
    }

    pub fn stop_token(&self) -> &CancellationToken {
        &self.stop_token
    }

    pub fn suite_name(&self) -> &str {
        &self.suite_name
    }

    pub fn tests(&self) -> &[ParameterizedTest] {
        &self.tests
    }

    pub fn matrix(&self) -> Option<&MatrixTest> {
        self.matrix.as_ref()
    }

    pub fn is_parallel(&self) -> bool {
        self.parallel
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Results of the last run. Only ordered in sequential mode.
    pub fn results(&self) -> &[TestResult] {
        &self.results
    }

    /// Expands every test and the matrix into the ordered case list.
    pub fn plan(&mut self) -> ExecutionPlan {
        planner::plan_execution(&self.tests, self.matrix.as_mut())
    }

    /// Runs every case exactly once (plus retries) and returns the results.
    ///
    /// Per-case failures, panics and timeouts never escape: they are recorded as
    /// `success = false` results. Previous results are discarded.
    ///
    /// 运行每个用例恰好一次（加上重试）并返回结果。
    /// 单个用例的失败、panic 和超时不会向外传播：它们被记录为 `success = false` 的结果。
    /// 之前的结果会被丢弃。
    pub async fn execute_all(&mut self) -> &[TestResult] {
        let plan = self.plan();

        if self.options.verbose {
            println!(
                "{}",
                t!(
                    "run.planned",
                    count = plan.cases.len(),
                    tests = plan.parameterized_count,
                    matrix = plan.matrix_count
                )
                .cyan()
            );
            if self.parallel {
                println!("{}", t!("run.mode_parallel", jobs = self.max_concurrency).cyan());
            } else {
                println!("{}", t!("run.mode_sequential").cyan());
            }
        }

        self.results = if self.parallel {
            self.run_parallel(plan).await
        } else {
            self.run_sequential(plan).await
        };
        &self.results
    }

    async fn run_sequential(&self, plan: ExecutionPlan) -> Vec<TestResult> {
        let mut results = Vec::with_capacity(plan.cases.len());
        for case in &plan.cases {
            results.push(run_case(case, &self.options, &self.stop_token).await);
        }
        results
    }

    async fn run_parallel(&self, plan: ExecutionPlan) -> Vec<TestResult> {
        let sink = ResultSink::new();
        let options = &self.options;
        let stop_token = &self.stop_token;

        stream::iter(plan.cases)
            .for_each_concurrent(self.max_concurrency, |case| {
                let sink = sink.clone();
                async move {
                    sink.push(run_case(&case, options, stop_token).await);
                }
            })
            .await;

        sink.drain()
    }

    /// Aggregates the current results. Pure and repeatable.
    pub fn generate_report(&self) -> TestReport {
        generate_report(&self.suite_name, &self.results)
    }
}

/// Default worker limit for parallel mode: half the CPUs plus one.
pub fn default_concurrency() -> usize {
    num_cpus::get() / 2 + 1
}
