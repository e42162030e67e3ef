//! # Command Module Unit Tests / Command 模块单元测试
//!
//! Tests for template rendering, command parsing and `spawn_and_capture`.
//!
//! 测试模板渲染、命令解析和 `spawn_and_capture`。

use matrix_harness::infra::command::{
    build_case_command, describe_exit, output_value, parse_command, render_template,
    spawn_and_capture,
};
use serde_json::json;

mod common;
use common::row;

#[cfg(test)]
mod render_template_tests {
    use super::*;

    #[test]
    fn test_placeholders_take_case_values() {
        let case = row(json!({ "user": "alice", "age": 30, "ok": true }));
        assert_eq!(
            render_template("login {user} --age {age} --ok={ok}", &case),
            "login alice --age 30 --ok=true"
        );
    }

    #[test]
    fn test_unknown_and_unclosed_placeholders_are_kept() {
        let case = row(json!({ "user": "bob" }));
        assert_eq!(render_template("{user} {missing} {open", &case), "bob {missing} {open");
    }

    #[test]
    fn test_template_without_placeholders_is_unchanged() {
        assert_eq!(render_template("cargo test", &row(json!({}))), "cargo test");
    }
}

#[cfg(test)]
mod parse_command_tests {
    use super::*;

    #[test]
    fn test_quoted_arguments_stay_together() {
        let parts = parse_command(r#"sh -c "echo 'a b'""#).unwrap();
        assert_eq!(parts, vec!["sh", "-c", "echo 'a b'"]);
    }

    #[test]
    fn test_empty_command_is_rejected() {
        assert!(parse_command("   ").is_err());
    }

    #[test]
    fn test_unbalanced_quotes_are_rejected() {
        assert!(parse_command("echo 'oops").is_err());
    }
}

#[cfg(test)]
mod build_case_command_tests {
    use super::*;

    fn argv(cmd: &tokio::process::Command) -> Vec<String> {
        let std_cmd = cmd.as_std();
        std::iter::once(std_cmd.get_program())
            .chain(std_cmd.get_args())
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_case_values_stay_single_arguments() {
        for user in ["a b", "it's", "$NOT_A_DEFINED_VAR_1234", "\"quoted\" {name}"] {
            let case = row(json!({ "user": user }));
            let cmd = build_case_command("test {user} != blocked", &case, None).unwrap();

            assert_eq!(argv(&cmd), vec!["test", user, "!=", "blocked"]);
        }
    }

    #[test]
    fn test_placeholder_inside_quoted_argument() {
        let case = row(json!({ "code": 3, "msg": "it's done" }));
        let cmd = build_case_command("sh -c 'exit {code}' {msg}", &case, None).unwrap();

        assert_eq!(argv(&cmd), vec!["sh", "-c", "exit 3", "it's done"]);
    }

    #[test]
    fn test_template_syntax_errors_still_fail() {
        assert!(build_case_command("echo 'unbalanced", &row(json!({})), None).is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_awkward_values_run_successfully() {
        for user in ["a b", "it's", "$NOT_A_DEFINED_VAR_1234"] {
            let case = row(json!({ "user": user }));
            let cmd = build_case_command("test {user} != blocked", &case, None).unwrap();

            let (status, output) = spawn_and_capture(cmd).await;
            assert!(status.unwrap().success(), "{user}: {output}");
        }
    }
}

#[test]
fn test_output_value_is_trimmed_string() {
    assert_eq!(output_value("  hello\n"), json!("hello"));
}

#[cfg(unix)]
#[cfg(test)]
mod spawn_and_capture_tests {
    use super::*;
    use std::os::unix::process::ExitStatusExt;

    #[tokio::test]
    async fn test_captures_stdout_and_stderr() {
        let case = row(json!({ "word": "ping" }));
        let cmd = build_case_command("sh -c 'echo {word}; echo warn >&2'", &case, None).unwrap();

        let (status, output) = spawn_and_capture(cmd).await;

        assert!(status.unwrap().success());
        assert!(output.contains("ping"));
        assert!(output.contains("warn"));
    }

    #[tokio::test]
    async fn test_runs_in_working_dir() {
        let dir = tempfile::tempdir().unwrap();
        let cmd = build_case_command("pwd", &row(json!({})), Some(dir.path())).unwrap();

        let (status, output) = spawn_and_capture(cmd).await;

        assert!(status.unwrap().success());
        let reported = std::fs::canonicalize(output.trim()).unwrap();
        assert_eq!(reported, std::fs::canonicalize(dir.path()).unwrap());
    }

    #[tokio::test]
    async fn test_spawn_error_is_returned() {
        let cmd = build_case_command("no-such-binary-9731", &row(json!({})), None).unwrap();
        let (status, output) = spawn_and_capture(cmd).await;

        assert!(status.is_err());
        assert!(output.is_empty());
    }

    #[test]
    fn test_describe_exit_includes_code_and_output() {
        let status = std::process::ExitStatus::from_raw(2 << 8);
        assert_eq!(describe_exit(&status, "  bad input \n"), "command exited with status 2: bad input");
        assert_eq!(describe_exit(&status, ""), "command exited with status 2");
    }
}
