//! # Test Matrix Module / 测试矩阵模块
//!
//! Combinatorial case generation over independently-sized dimensions.
//! A `TestMatrix` walks every combination of its dimensions with a mixed-radix
//! counter (rightmost dimension fastest), drops combinations that exactly match
//! an exclusion tuple, and tags each remaining case with a deterministic `case_id`.
//!
//! 基于多个独立维度的组合用例生成。
//! `TestMatrix` 使用混合进制计数器（最右侧维度变化最快）遍历所有组合，
//! 去除与排除元组完全匹配的组合，并为剩余的每个用例生成确定性的 `case_id`。

use anyhow::{Result, bail};
use colored::*;
use serde_json::Value;
use std::collections::HashSet;

use crate::core::models::Row;
use crate::infra::t;

/// Key holding the generated case identifier.
pub const CASE_ID_KEY: &str = "case_id";
/// Key holding the owning matrix name.
pub const MATRIX_NAME_KEY: &str = "matrix_name";

/// One named, ordered axis of variation.
/// 一个命名的、有序的变化轴。
#[derive(Debug, Clone, PartialEq)]
pub struct TestDimension {
    name: String,
    values: Vec<Value>,
    value_labels: Vec<String>,
}

impl TestDimension {
    /// Creates a dimension whose labels are the display form of each value.
    pub fn new(name: impl Into<String>, values: Vec<Value>) -> Self {
        let value_labels = values.iter().map(display_label).collect();
        Self {
            name: name.into(),
            values,
            value_labels,
        }
    }

    /// Creates a dimension with explicit display labels.
    ///
    /// # Errors
    /// Fails when `labels` and `values` differ in length.
    pub fn with_labels(
        name: impl Into<String>,
        values: Vec<Value>,
        labels: Vec<String>,
    ) -> Result<Self> {
        let name = name.into();
        if values.len() != labels.len() {
            bail!(
                "dimension '{}' has {} value(s) but {} label(s)",
                name,
                values.len(),
                labels.len()
            );
        }
        Ok(Self {
            name,
            values,
            value_labels: labels,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn value_labels(&self) -> &[String] {
        &self.value_labels
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Display form of a value: strings verbatim, anything else as compact JSON.
/// 值的显示形式：字符串原样输出，其他值输出为紧凑 JSON。
pub fn display_label(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn exclusion_label(exclusion: &[Value]) -> String {
    let labels: Vec<String> = exclusion.iter().map(display_label).collect();
    format!("[{}]", labels.join(", "))
}

/// A set of dimensions plus exclusion tuples, expanded into concrete cases.
/// 一组维度加上排除元组，展开为具体的用例。
#[derive(Debug, Clone, PartialEq)]
pub struct TestMatrix {
    name: String,
    dimensions: Vec<TestDimension>,
    exclusions: Vec<Vec<Value>>,
    cases: Vec<Row>,
}

impl TestMatrix {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dimensions: Vec::new(),
            exclusions: Vec::new(),
            cases: Vec::new(),
        }
    }

    /// Appends a dimension. Dimension order defines `case_id` order and iteration order.
    pub fn add_dimension(&mut self, dimension: TestDimension) -> &mut Self {
        self.dimensions.push(dimension);
        self
    }

    /// Builder-style variant of [`TestMatrix::add_dimension`].
    pub fn with_dimension(mut self, dimension: TestDimension) -> Self {
        self.dimensions.push(dimension);
        self
    }

    /// Registers a combination that must not be generated. Values are matched
    /// positionally and literally against the dimensions; there are no wildcards.
    /// Adding a dimension afterwards makes the tuple too short to match anything;
    /// [`TestMatrix::validate`] reports such tuples.
    ///
    /// 注册一个不应生成的组合。值按位置与维度逐一字面匹配，不支持通配符。
    /// 之后再添加维度会使该元组无法匹配任何组合；[`TestMatrix::validate`] 会报告此类元组。
    ///
    /// # Errors
    /// Fails when the tuple length differs from the number of dimensions.
    pub fn add_exclusion(&mut self, exclusion: Vec<Value>) -> Result<&mut Self> {
        if exclusion.len() != self.dimensions.len() {
            bail!(
                "exclusion for matrix '{}' has {} value(s), expected one per dimension ({})",
                self.name,
                exclusion.len(),
                self.dimensions.len()
            );
        }
        self.exclusions.push(exclusion);
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dimensions(&self) -> &[TestDimension] {
        &self.dimensions
    }

    pub fn exclusions(&self) -> &[Vec<Value>] {
        &self.exclusions
    }

    /// Checks every exclusion tuple against the current number of dimensions.
    ///
    /// # Errors
    /// Fails on the first tuple whose length no longer matches.
    pub fn validate(&self) -> Result<()> {
        if let Some(exclusion) = self.stale_exclusions().next() {
            bail!(
                "exclusion {} for matrix '{}' has {} value(s), expected one per dimension ({})",
                exclusion_label(exclusion),
                self.name,
                exclusion.len(),
                self.dimensions.len()
            );
        }
        Ok(())
    }

    fn stale_exclusions(&self) -> impl Iterator<Item = &Vec<Value>> {
        let arity = self.dimensions.len();
        self.exclusions.iter().filter(move |exclusion| exclusion.len() != arity)
    }

    /// Cases produced by the last call to [`TestMatrix::generate_test_cases`].
    pub fn cases(&self) -> &[Row] {
        &self.cases
    }

    /// Number of combinations before exclusions: the product of dimension sizes,
    /// or zero when there are no dimensions.
    pub fn combination_count(&self) -> usize {
        if self.dimensions.is_empty() {
            return 0;
        }
        self.dimensions.iter().map(TestDimension::len).product()
    }

    /// Regenerates the case list from scratch and returns it.
    ///
    /// Every combination is visited exactly once with a mixed-radix counter,
    /// rightmost dimension fastest. A combination equal to any exclusion tuple is
    /// skipped; exclusions whose length no longer matches the dimensions are
    /// reported with a warning and ignored. `case_id` joins the labels at the
    /// current indices with `_`. When that text is already taken, the case gets
    /// `#<ordinal>` (its position in the full iteration), and the number is
    /// bumped until the id is unused.
    ///
    /// 从头重新生成用例列表并返回。
    /// 使用混合进制计数器恰好访问每个组合一次，最右侧维度变化最快。
    /// 与任一排除元组相等的组合会被跳过；长度与维度数不符的排除元组会发出警告并被忽略。
    /// `case_id` 使用 `_` 连接当前索引处的标签；若该文本已被占用，则追加 `#<序号>`，
    /// 并递增序号直到 id 未被使用。
    pub fn generate_test_cases(&mut self) -> &[Row] {
        for exclusion in self.stale_exclusions() {
            eprintln!(
                "{}",
                t!(
                    "matrix.stale_exclusion",
                    name = &self.name,
                    exclusion = exclusion_label(exclusion),
                    found = exclusion.len(),
                    expected = self.dimensions.len()
                )
                .yellow()
            );
        }
        self.cases = self.expand();
        &self.cases
    }

    fn expand(&self) -> Vec<Row> {
        let mut cases = Vec::new();
        if self.combination_count() == 0 {
            return cases;
        }

        let mut indices = vec![0usize; self.dimensions.len()];
        let mut seen_ids = HashSet::new();
        let mut ordinal = 0usize;

        'odometer: loop {
            let values: Vec<&Value> = self
                .dimensions
                .iter()
                .zip(&indices)
                .map(|(dim, &i)| &dim.values[i])
                .collect();

            if !self.is_excluded(&values) {
                let base_id = self
                    .dimensions
                    .iter()
                    .zip(&indices)
                    .map(|(dim, &i)| dim.value_labels[i].as_str())
                    .collect::<Vec<_>>()
                    .join("_");
                let mut case_id = base_id.clone();
                let mut suffix = ordinal;
                while seen_ids.contains(&case_id) {
                    case_id = format!("{base_id}#{suffix}");
                    suffix += 1;
                }
                seen_ids.insert(case_id.clone());
                cases.push(self.build_case(&indices, case_id));
            }

            ordinal += 1;

            // Increment with carry, rightmost position first.
            let mut position = indices.len();
            loop {
                if position == 0 {
                    break 'odometer;
                }
                position -= 1;
                indices[position] += 1;
                if indices[position] < self.dimensions[position].len() {
                    break;
                }
                indices[position] = 0;
            }
        }

        cases
    }

    fn is_excluded(&self, values: &[&Value]) -> bool {
        self.exclusions.iter().any(|exclusion| {
            exclusion.len() == values.len()
                && exclusion.iter().zip(values).all(|(excluded, value)| excluded == *value)
        })
    }

    fn build_case(&self, indices: &[usize], case_id: String) -> Row {
        let mut case = Row::new();
        for (dim, &i) in self.dimensions.iter().zip(indices) {
            case.insert(dim.name.clone(), dim.values[i].clone());
            case.insert(
                format!("{}_name", dim.name),
                Value::String(dim.value_labels[i].clone()),
            );
        }
        case.insert(CASE_ID_KEY.to_string(), Value::String(case_id));
        case.insert(MATRIX_NAME_KEY.to_string(), Value::String(self.name.clone()));
        case
    }
}
