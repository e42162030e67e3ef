//! # Test Execution Planner Module / 测试执行计划模块
//!
//! Expands parameterized tests and the matrix into a flat, ordered list of
//! concrete cases. The order of the plan is the order sequential execution uses:
//! every parameterized test's cases in declaration order, then the matrix cases.
//!
//! 将参数化测试和矩阵展开为扁平、有序的具体用例列表。
//! 计划的顺序即顺序执行时使用的顺序：先按声明顺序排列各参数化测试的用例，再排列矩阵用例。

use serde_json::Value;
use std::time::Duration;

use crate::core::matrix::CASE_ID_KEY;
use crate::core::models::{MATRIX_SOURCE_LABEL, Row};
use crate::core::parameterized::{MatrixTest, ParameterizedTest, TestBody};

/// One concrete case, ready for guarded execution.
/// 一个具体用例，可直接进行受保护的执行。
#[derive(Debug, Clone)]
pub struct PlannedCase {
    pub test_name: String,
    pub case_id: String,
    pub source_label: String,
    pub case: Row,
    pub body: TestBody,
    pub timeout: Duration,
    pub retry_count: u32,
}

/// Represents a complete execution plan.
/// 表示完整的执行计划。
#[derive(Debug, Default)]
pub struct ExecutionPlan {
    /// Cases in sequential execution order.
    /// 按顺序执行顺序排列的用例。
    pub cases: Vec<PlannedCase>,
    /// How many cases came from parameterized tests.
    pub parameterized_count: usize,
    /// How many cases came from the matrix.
    pub matrix_count: usize,
}

/// Creates an execution plan for the given tests and optional matrix.
///
/// Parameterized cases are identified as `<test_name>_<index>`, where `index` is the
/// position among the test's filtered cases. Matrix cases keep the `case_id`
/// generated by the matrix.
///
/// 为给定的测试和可选矩阵创建执行计划。
/// 参数化用例的标识为 `<test_name>_<index>`，其中 `index` 是其在过滤后用例中的位置。
/// 矩阵用例保留矩阵生成的 `case_id`。
pub fn plan_execution(tests: &[ParameterizedTest], matrix: Option<&mut MatrixTest>) -> ExecutionPlan {
    let mut plan = ExecutionPlan::default();

    for test in tests {
        let source_label = test.data_source_label();
        for (index, case) in test.get_test_cases().into_iter().enumerate() {
            plan.cases.push(PlannedCase {
                test_name: test.test_name.clone(),
                case_id: format!("{}_{}", test.test_name, index),
                source_label: source_label.clone(),
                case,
                body: test.body().clone(),
                timeout: test.timeout(),
                retry_count: test.retry_count(),
            });
        }
    }
    plan.parameterized_count = plan.cases.len();

    if let Some(matrix_test) = matrix {
        let matrix_name = matrix_test.matrix.name().to_string();
        let cases = matrix_test.matrix.generate_test_cases().to_vec();
        for case in cases {
            let case_id = case
                .get(CASE_ID_KEY)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            plan.cases.push(PlannedCase {
                test_name: matrix_name.clone(),
                case_id,
                source_label: MATRIX_SOURCE_LABEL.to_string(),
                case,
                body: matrix_test.body.clone(),
                timeout: matrix_test.timeout,
                retry_count: matrix_test.retry_count,
            });
        }
    }
    plan.matrix_count = plan.cases.len() - plan.parameterized_count;

    plan
}
