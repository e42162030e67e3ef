//! # Parameterized Test Module / 参数化测试模块
//!
//! Binds a test body to its inputs. A `ParameterizedTest` draws its cases from a
//! `DataSource` (optionally filtered); a `MatrixTest` draws them from a `TestMatrix`.
//! Both carry the timeout and retry policy applied by the executor.
//!
//! 将测试体与其输入绑定。`ParameterizedTest` 从 `DataSource`（可选过滤）获取用例；
//! `MatrixTest` 从 `TestMatrix` 获取用例。两者都携带执行器使用的超时和重试策略。

use anyhow::{Result, bail};
use serde_json::Value;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

use crate::core::data_source::DataSource;
use crate::core::matrix::TestMatrix;
use crate::core::models::{INLINE_SOURCE_LABEL, Row};

/// Timeout applied when a test does not configure one.
/// 测试未配置超时时间时使用的默认值。
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Granularity of cooperative waits inside a test body.
pub const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// A test function: receives the case context, returns a value or an error.
/// `Value::Bool` returns are the authoritative success flag.
pub type TestFn = Arc<dyn Fn(&CaseContext) -> Result<Value> + Send + Sync>;

/// A row predicate used to narrow a data source.
pub type CaseFilter = Arc<dyn Fn(&Row) -> bool + Send + Sync>;

/// A shell command run once per case.
/// `{column}` placeholders in the template are replaced with case values.
///
/// 每个用例运行一次的 shell 命令。
/// 模板中的 `{column}` 占位符会被替换为用例的值。
#[derive(Debug, Clone, PartialEq)]
pub struct CommandBody {
    pub template: String,
    /// Directory the command runs in; the current directory when `None`.
    pub working_dir: Option<PathBuf>,
}

/// What runs for each case.
/// 每个用例运行的内容。
#[derive(Clone)]
pub enum TestBody {
    /// An in-process closure, run on a blocking worker thread.
    /// 进程内闭包，在阻塞工作线程上运行。
    Function(TestFn),
    /// A child process, killed when the case times out.
    /// 子进程，用例超时时会被终止。
    Command(CommandBody),
}

impl TestBody {
    pub fn function<F>(f: F) -> Self
    where
        F: Fn(&CaseContext) -> Result<Value> + Send + Sync + 'static,
    {
        TestBody::Function(Arc::new(f))
    }

    pub fn command(template: impl Into<String>) -> Self {
        TestBody::Command(CommandBody {
            template: template.into(),
            working_dir: None,
        })
    }

    pub fn command_in(template: impl Into<String>, working_dir: impl Into<PathBuf>) -> Self {
        TestBody::Command(CommandBody {
            template: template.into(),
            working_dir: Some(working_dir.into()),
        })
    }
}

impl fmt::Debug for TestBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestBody::Function(_) => f.write_str("TestBody::Function(..)"),
            TestBody::Command(command) => f.debug_tuple("TestBody::Command").field(command).finish(),
        }
    }
}

/// Everything a test function sees while running one attempt of a case.
///
/// The cancellation token fires when the case exceeds its timeout or the run is
/// stopped. Long-running bodies should check it (or use [`CaseContext::sleep`])
/// so a timeout actually frees the worker.
///
/// 测试函数在运行某个用例的一次尝试时可见的全部信息。
/// 当用例超时或运行停止时，取消令牌会被触发。长时间运行的测试体应检查它
/// （或使用 [`CaseContext::sleep`]），以便超时后真正释放工作线程。
#[derive(Debug, Clone)]
pub struct CaseContext {
    case: Row,
    token: CancellationToken,
    deadline: Instant,
    attempt: u32,
}

impl CaseContext {
    pub fn new(case: Row, token: CancellationToken, deadline: Instant, attempt: u32) -> Self {
        Self {
            case,
            token,
            deadline,
            attempt,
        }
    }

    pub fn case(&self) -> &Row {
        &self.case
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.case.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.case.get(key).and_then(Value::as_str)
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.case.get(key).and_then(Value::as_i64)
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.case.get(key).and_then(Value::as_f64)
    }

    /// 1-based attempt number.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.token
    }

    /// Blocks for `duration`, waking early with an error once the case is cancelled.
    /// 阻塞 `duration`，一旦用例被取消则提前以错误返回。
    pub fn sleep(&self, duration: Duration) -> Result<()> {
        let until = Instant::now() + duration;
        loop {
            if self.token.is_cancelled() {
                bail!("cancelled while sleeping");
            }
            let now = Instant::now();
            if now >= until {
                return Ok(());
            }
            std::thread::sleep(POLL_INTERVAL.min(until - now));
        }
    }
}

/// A test body bound to a data source.
/// 绑定到数据源的测试体。
#[derive(Clone)]
pub struct ParameterizedTest {
    pub test_name: String,
    pub description: String,
    body: TestBody,
    data_source: Option<DataSource>,
    filter: Option<CaseFilter>,
    timeout: Duration,
    retry_count: u32,
}

impl ParameterizedTest {
    pub fn new(test_name: impl Into<String>, body: TestBody) -> Self {
        Self {
            test_name: test_name.into(),
            description: String::new(),
            body,
            data_source: None,
            filter: None,
            timeout: DEFAULT_TIMEOUT,
            retry_count: 0,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_data_source(mut self, data_source: DataSource) -> Self {
        self.data_source = Some(data_source);
        self
    }

    pub fn with_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&Row) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Arc::new(filter));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Number of additional attempts after a failure.
    pub fn with_retries(mut self, retry_count: u32) -> Self {
        self.retry_count = retry_count;
        self
    }

    pub fn body(&self) -> &TestBody {
        &self.body
    }

    pub fn data_source(&self) -> Option<&DataSource> {
        self.data_source.as_ref()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    /// Label recorded on this test's results: the data source name, or `"inline"`.
    pub fn data_source_label(&self) -> String {
        self.data_source
            .as_ref()
            .map(|source| source.name().to_string())
            .unwrap_or_else(|| INLINE_SOURCE_LABEL.to_string())
    }

    /// Rows of the bound data source that pass the filter, in source order.
    /// Empty when no data source is bound.
    ///
    /// 绑定数据源中通过过滤器的行（按源顺序）。未绑定数据源时为空。
    pub fn get_test_cases(&self) -> Vec<Row> {
        let Some(source) = &self.data_source else {
            return Vec::new();
        };
        match &self.filter {
            Some(filter) => source.filter_rows(|row| filter(row)),
            None => source.rows().to_vec(),
        }
    }
}

impl fmt::Debug for ParameterizedTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParameterizedTest")
            .field("test_name", &self.test_name)
            .field("body", &self.body)
            .field("data_source", &self.data_source.as_ref().map(DataSource::name))
            .field("filtered", &self.filter.is_some())
            .field("timeout", &self.timeout)
            .field("retry_count", &self.retry_count)
            .finish()
    }
}

/// A test body bound to a matrix of dimensions.
/// 绑定到维度矩阵的测试体。
#[derive(Debug, Clone)]
pub struct MatrixTest {
    pub matrix: TestMatrix,
    pub body: TestBody,
    pub timeout: Duration,
    pub retry_count: u32,
}

impl MatrixTest {
    pub fn new(matrix: TestMatrix, body: TestBody) -> Self {
        Self {
            matrix,
            body,
            timeout: DEFAULT_TIMEOUT,
            retry_count: 0,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retries(mut self, retry_count: u32) -> Self {
        self.retry_count = retry_count;
        self
    }
}
