//! # Test Execution Engine Module / 测试执行引擎模块
//!
//! Guarded execution of a single planned case. Each attempt runs the test body
//! on an isolated worker so the orchestrator can enforce a wall-clock timeout:
//! closures run on the blocking pool and are asked to stop through a
//! cancellation token, command bodies run as child processes that are killed
//! when the timeout fires. Failed attempts are retried according to the case's
//! retry count, and only the final attempt is recorded. Stopping the run
//! interrupts running attempts of either kind and records them as cancelled.
//!
//! 单个计划用例的受保护执行。每次尝试都在独立的工作者上运行测试体，
//! 以便编排器强制执行挂钟超时：闭包在阻塞线程池中运行并通过取消令牌被要求停止，
//! 命令测试体作为子进程运行，超时时会被终止。失败的尝试按用例的重试次数重试，
//! 只记录最后一次尝试。停止运行会中断两类正在进行的尝试，并将其记录为已取消。

use chrono::{DateTime, Utc};
use colored::*;
use serde_json::Value;
use std::any::Any;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;

use crate::{
    core::{
        models::{FailureReason, TestResult, format_seconds, timeout_message},
        parameterized::{CaseContext, CommandBody, TestBody, TestFn},
        planner::PlannedCase,
    },
    infra::{command, t},
};

/// How long to wait for a timed-out closure to notice its cancellation.
pub const DEFAULT_CANCEL_GRACE: Duration = Duration::from_secs(2);

/// Settings shared by every guarded execution in a run.
/// 一次运行中所有受保护执行共享的设置。
#[derive(Debug, Clone)]
pub struct GuardOptions {
    /// After a timeout, how long to wait for a closure worker to return before
    /// releasing its slot and leaving the thread behind.
    /// 超时后等待闭包工作线程返回的时长，超过后释放其槽位并放弃该线程。
    pub cancel_grace: Duration,
    /// Print per-case progress lines.
    pub verbose: bool,
}

impl Default for GuardOptions {
    fn default() -> Self {
        Self {
            cancel_grace: DEFAULT_CANCEL_GRACE,
            verbose: false,
        }
    }
}

/// How one attempt ended, before it is turned into a `TestResult`.
#[derive(Debug)]
enum BodyOutcome {
    Returned(Value),
    Failed(FailureReason, String),
}

impl BodyOutcome {
    fn is_success(&self) -> bool {
        matches!(self, BodyOutcome::Returned(_))
    }
}

#[derive(Debug)]
struct Attempt {
    outcome: BodyOutcome,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    elapsed: Duration,
}

/// The main entry point for running a single case.
/// It wraps the body with timeout and retry handling and never fails: every
/// problem is folded into the returned `TestResult`.
///
/// # Arguments
/// * `planned` - The case to execute
/// * `options` - Cancellation grace and verbosity
/// * `stop_token` - Run-level stop; once cancelled, cases record `Cancelled` instead of running
///
/// 运行单个用例的主入口。它为测试体添加超时和重试处理，且从不失败：
/// 所有问题都会折叠进返回的 `TestResult` 中。
pub async fn run_case(
    planned: &PlannedCase,
    options: &GuardOptions,
    stop_token: &CancellationToken,
) -> TestResult {
    let max_attempts = 1 + planned.retry_count;
    let mut attempt_no = 0;

    let attempt = loop {
        attempt_no += 1;

        if stop_token.is_cancelled() {
            let now = Utc::now();
            break Attempt {
                outcome: BodyOutcome::Failed(
                    FailureReason::Cancelled,
                    t!("run.case_cancelled").to_string(),
                ),
                start_time: now,
                end_time: now,
                elapsed: Duration::ZERO,
            };
        }

        if options.verbose {
            println!(
                "{}",
                t!("run.running_case", name = &planned.test_name, case = &planned.case_id).blue()
            );
        }

        let attempt = run_attempt(planned, attempt_no, options, stop_token).await;
        if attempt.outcome.is_success() || attempt_no >= max_attempts || stop_token.is_cancelled()
        {
            break attempt;
        }

        if options.verbose {
            println!(
                "{}",
                t!(
                    "run.case_retrying",
                    name = &planned.test_name,
                    case = &planned.case_id,
                    attempt = attempt_no + 1,
                    max = max_attempts
                )
                .yellow()
            );
        }
    };

    if options.verbose {
        report_outcome(planned, &attempt);
    }

    let (success, error_message, failure_reason, output_data) = match attempt.outcome {
        BodyOutcome::Returned(value) => (true, String::new(), None, Some(value)),
        BodyOutcome::Failed(reason, message) => (false, message, Some(reason), None),
    };

    TestResult {
        test_name: planned.test_name.clone(),
        test_case_id: planned.case_id.clone(),
        data_source_label: planned.source_label.clone(),
        start_time: attempt.start_time,
        end_time: attempt.end_time,
        execution_time: attempt.elapsed,
        success,
        error_message,
        failure_reason,
        attempts: attempt_no,
        input_data: planned.case.clone(),
        output_data,
    }
}

/// Runs one attempt under the case's timeout.
async fn run_attempt(
    planned: &PlannedCase,
    attempt_no: u32,
    options: &GuardOptions,
    stop_token: &CancellationToken,
) -> Attempt {
    let start_time = Utc::now();
    let started = Instant::now();

    let outcome = match &planned.body {
        TestBody::Function(function) => {
            run_function(Arc::clone(function), planned, attempt_no, options, stop_token).await
        }
        TestBody::Command(body) => run_command(body, planned, stop_token).await,
    };

    Attempt {
        outcome,
        start_time,
        end_time: Utc::now(),
        elapsed: started.elapsed(),
    }
}

/// Runs a closure on the blocking pool and races it against the timeout and
/// the run-level stop.
/// 在阻塞线程池中运行闭包，并与超时及运行级停止信号进行竞争。
async fn run_function(
    function: TestFn,
    planned: &PlannedCase,
    attempt_no: u32,
    options: &GuardOptions,
    stop_token: &CancellationToken,
) -> BodyOutcome {
    // A child token also fires when the whole run is stopped.
    let token = stop_token.child_token();
    let context = CaseContext::new(
        planned.case.clone(),
        token.clone(),
        Instant::now() + planned.timeout,
        attempt_no,
    );

    let mut handle = tokio::task::spawn_blocking(move || function(&context));

    tokio::select! {
        joined = &mut handle => classify_join(joined),
        _ = tokio::time::sleep(planned.timeout) => {
            token.cancel();
            wait_for_worker(&mut handle, planned, options).await;
            BodyOutcome::Failed(FailureReason::Timeout, timeout_message(planned.timeout))
        }
        _ = stop_token.cancelled() => {
            wait_for_worker(&mut handle, planned, options).await;
            BodyOutcome::Failed(FailureReason::Cancelled, t!("run.case_stopped").to_string())
        }
    }
}

/// Gives a cancelled closure `cancel_grace` to return, then leaves it behind.
async fn wait_for_worker<T>(
    handle: &mut tokio::task::JoinHandle<T>,
    planned: &PlannedCase,
    options: &GuardOptions,
) {
    if tokio::time::timeout(options.cancel_grace, handle).await.is_err() {
        eprintln!(
            "{}",
            t!("run.worker_leaked", name = &planned.test_name, case = &planned.case_id).yellow()
        );
    }
}

fn classify_join(joined: Result<anyhow::Result<Value>, JoinError>) -> BodyOutcome {
    match joined {
        Ok(Ok(Value::Bool(false))) => BodyOutcome::Failed(
            FailureReason::ReturnedFalse,
            t!("run.test_returned_false").to_string(),
        ),
        Ok(Ok(value)) => BodyOutcome::Returned(value),
        Ok(Err(e)) => BodyOutcome::Failed(FailureReason::Execution, format!("{:#}", e)),
        Err(e) if e.is_panic() => {
            BodyOutcome::Failed(FailureReason::Panicked, panic_message(e.into_panic()))
        }
        Err(e) => BodyOutcome::Failed(FailureReason::Execution, e.to_string()),
    }
}

fn panic_message(payload: Box<dyn Any + Send + 'static>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("panicked: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("panicked: {message}")
    } else {
        "panicked".to_string()
    }
}

/// Runs a command body. On timeout or when the run is stopped the capture
/// future is dropped, which kills the child through `kill_on_drop`.
///
/// 运行命令测试体。超时或运行被停止时会丢弃捕获 future，借助 `kill_on_drop` 终止子进程。
async fn run_command(
    body: &CommandBody,
    planned: &PlannedCase,
    stop_token: &CancellationToken,
) -> BodyOutcome {
    let cmd = match command::build_case_command(
        &body.template,
        &planned.case,
        body.working_dir.as_deref(),
    ) {
        Ok(cmd) => cmd,
        Err(e) => return BodyOutcome::Failed(FailureReason::Spawn, format!("{:#}", e)),
    };

    let guarded = tokio::time::timeout(planned.timeout, command::spawn_and_capture(cmd));
    let finished = tokio::select! {
        finished = guarded => finished,
        _ = stop_token.cancelled() => {
            return BodyOutcome::Failed(FailureReason::Cancelled, t!("run.case_stopped").to_string());
        }
    };

    match finished {
        Err(_) => BodyOutcome::Failed(FailureReason::Timeout, timeout_message(planned.timeout)),
        Ok((Err(e), _)) => BodyOutcome::Failed(
            FailureReason::Spawn,
            format!("failed to start '{}': {}", body.template, e),
        ),
        Ok((Ok(status), output)) if status.success() => {
            BodyOutcome::Returned(command::output_value(&output))
        }
        Ok((Ok(status), output)) => {
            BodyOutcome::Failed(FailureReason::Execution, command::describe_exit(&status, &output))
        }
    }
}

fn report_outcome(planned: &PlannedCase, attempt: &Attempt) {
    let duration = format_seconds(attempt.elapsed);
    match &attempt.outcome {
        BodyOutcome::Returned(_) => println!(
            "{}",
            t!(
                "run.case_passed",
                name = &planned.test_name,
                case = &planned.case_id,
                duration = &duration
            )
            .green()
        ),
        BodyOutcome::Failed(FailureReason::Timeout, _) => println!(
            "{}",
            t!(
                "run.case_timeout",
                name = &planned.test_name,
                case = &planned.case_id,
                timeout = format_seconds(planned.timeout)
            )
            .red()
        ),
        BodyOutcome::Failed(_, message) => println!(
            "{}",
            t!(
                "run.case_failed",
                name = &planned.test_name,
                case = &planned.case_id,
                duration = &duration,
                error = message
            )
            .red()
        ),
    }
}
