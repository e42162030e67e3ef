//! # Command Execution Module / 命令执行模块
//!
//! Turns command templates into argv for a case and runs them as child processes,
//! capturing stdout and stderr together.
//!
//! 将命令模板转换为用例的 argv 并作为子进程运行，同时捕获 stdout 和 stderr。

use anyhow::{Context, Result, anyhow};
use serde_json::Value;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::core::matrix::display_label;
use crate::core::models::Row;

/// Replaces `{column}` placeholders with the case's values.
/// Strings are inserted verbatim, other values as compact JSON. Placeholders
/// naming unknown columns are left untouched.
///
/// 将 `{column}` 占位符替换为用例的值。字符串原样插入，其他值以紧凑 JSON 插入。
/// 指向未知列的占位符保持不变。
pub fn render_template(template: &str, case: &Row) -> String {
    let mut rendered = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        rendered.push_str(&rest[..open]);
        let after_open = &rest[open + 1..];
        match after_open.find('}') {
            Some(close) => {
                let key = &after_open[..close];
                match case.get(key) {
                    Some(value) => rendered.push_str(&display_label(value)),
                    None => {
                        rendered.push('{');
                        rendered.push_str(key);
                        rendered.push('}');
                    }
                }
                rest = &after_open[close + 1..];
            }
            None => {
                rendered.push_str(&rest[open..]);
                rest = "";
            }
        }
    }
    rendered.push_str(rest);
    rendered
}

/// Expands environment variables and `~`, then splits the command into argv.
///
/// # Errors
/// Fails if expansion fails, quoting is unbalanced, or the command is empty.
pub fn parse_command(command: &str) -> Result<Vec<String>> {
    let expanded = shellexpand::full(command)
        .with_context(|| format!("Failed to expand command: {command}"))?
        .to_string();

    let parts = shlex::split(&expanded)
        .ok_or_else(|| anyhow!("Failed to parse command: {}", expanded))?;

    if parts.is_empty() {
        return Err(anyhow!("Empty command after parsing."));
    }
    Ok(parts)
}

/// Builds a kill-on-drop `tokio` command for a case.
///
/// The template is expanded and split into argv first; placeholders are then
/// filled in each argument. Case values therefore always stay inside the
/// argument they appear in and are never parsed as shell syntax.
///
/// 为用例构建一个在丢弃时终止进程的 `tokio` 命令。
/// 先展开模板并拆分为 argv，再在每个参数中填充占位符。
/// 因此用例的值始终留在其所在的参数内，不会被解析为 shell 语法。
pub fn build_case_command(
    template: &str,
    case: &Row,
    working_dir: Option<&std::path::Path>,
) -> Result<tokio::process::Command> {
    let parts: Vec<String> = parse_command(template)?
        .iter()
        .map(|arg| render_template(arg, case))
        .collect();

    let mut cmd = tokio::process::Command::new(&parts[0]);
    cmd.args(&parts[1..]).kill_on_drop(true);
    if let Some(dir) = working_dir {
        cmd.current_dir(dir);
    }
    Ok(cmd)
}

/// Spawns a command, captures its stdout and stderr.
/// The output streams are read concurrently and combined into a single string.
///
/// Dropping the returned future drops the child; with `kill_on_drop(true)` set
/// on the command this kills the process.
///
/// 派生一个命令，捕获其 stdout 和 stderr。
/// 输出流被并发读取并合并到一个字符串中。
/// 丢弃返回的 future 会丢弃子进程；若命令设置了 `kill_on_drop(true)`，进程将被终止。
pub async fn spawn_and_capture(
    mut cmd: tokio::process::Command,
) -> (std::io::Result<std::process::ExitStatus>, String) {
    let mut child = match cmd
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::piped())
        .stderr(std::process::Stdio::piped())
        .spawn()
    {
        Ok(child) => child,
        Err(e) => return (Err(e), String::new()),
    };

    let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
        return (
            Err(std::io::Error::other("failed to capture child output")),
            String::new(),
        );
    };

    // Both reader tasks append to the same buffer.
    let output = Arc::new(tokio::sync::Mutex::new(String::new()));

    let stdout_output = Arc::clone(&output);
    let stdout_handle = tokio::spawn(async move {
        let mut lines = BufReader::new(stdout).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            let mut output = stdout_output.lock().await;
            output.push_str(&line);
            output.push('\n');
        }
    });

    let stderr_output = Arc::clone(&output);
    let stderr_handle = tokio::spawn(async move {
        let mut lines = BufReader::new(stderr).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            let mut output = stderr_output.lock().await;
            output.push_str(&line);
            output.push('\n');
        }
    });

    let status = child.wait().await;

    // Drain the readers so no trailing output is lost.
    if let Err(e) = stdout_handle.await {
        eprintln!("Failed to join stdout task: {}", e);
    }
    if let Err(e) = stderr_handle.await {
        eprintln!("Failed to join stderr task: {}", e);
    }

    let captured = output.lock().await.clone();
    (status, captured)
}

/// Describes a non-zero exit for the error message of a failed case.
pub fn describe_exit(status: &std::process::ExitStatus, output: &str) -> String {
    let code = status
        .code()
        .map(|c| c.to_string())
        .unwrap_or_else(|| "signal".to_string());
    let output = output.trim();
    if output.is_empty() {
        format!("command exited with status {code}")
    } else {
        format!("command exited with status {code}: {output}")
    }
}

/// Output of a successful command as the case's `output_data`.
pub fn output_value(output: &str) -> Value {
    Value::String(output.trim().to_string())
}
