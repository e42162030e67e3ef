//! # Data Source Module / 数据源模块
//!
//! An in-memory table of named rows feeding parameterized tests. Sources are
//! built once from an array of rows, a CSV file or a JSON file, and are read-only
//! afterwards. Headers track the union of row keys in first-seen order.
//!
//! 为参数化测试提供数据的内存表。数据源通过行数组、CSV 文件或 JSON 文件一次性构建，
//! 之后只读。表头按首次出现的顺序记录所有行键的并集。

use colored::*;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::models::Row;
use crate::infra::t;

/// Maximum number of rows a data source keeps. Extra rows are dropped with a warning.
/// 数据源保留的最大行数。超出的行会被丢弃并给出警告。
pub const MAX_ROWS: usize = 10_000;

/// Where the rows of a data source came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Csv,
    Json,
    InMemory,
}

/// Errors raised while constructing a data source from a file.
/// 从文件构建数据源时产生的错误。
#[derive(Debug)]
pub enum DataSourceError {
    /// The file could not be opened or read.
    /// 文件无法打开或读取。
    Io { path: PathBuf, source: std::io::Error },
    /// The content is not valid JSON, or its top-level shape is not supported.
    /// 内容不是有效的 JSON，或其顶层结构不受支持。
    Format { origin: String, message: String },
}

impl fmt::Display for DataSourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSourceError::Io { path, source } => {
                write!(f, "cannot read data file '{}': {}", path.display(), source)
            }
            DataSourceError::Format { origin, message } => {
                write!(f, "malformed data in '{}': {}", origin, message)
            }
        }
    }
}

impl std::error::Error for DataSourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DataSourceError::Io { source, .. } => Some(source),
            DataSourceError::Format { .. } => None,
        }
    }
}

/// A named, ordered table of rows.
/// 一个命名的有序行表。
#[derive(Debug, Clone, PartialEq)]
pub struct DataSource {
    name: String,
    headers: Vec<String>,
    rows: Vec<Row>,
    source_kind: SourceKind,
    dropped_rows: usize,
}

impl DataSource {
    fn empty(name: impl Into<String>, source_kind: SourceKind) -> Self {
        Self {
            name: name.into(),
            headers: Vec::new(),
            rows: Vec::new(),
            source_kind,
            dropped_rows: 0,
        }
    }

    /// Appends a row during construction, tracking headers and the row cap.
    fn push_row(&mut self, row: Row) {
        if self.rows.len() >= MAX_ROWS {
            self.dropped_rows += 1;
            return;
        }
        for key in row.keys() {
            if !self.headers.iter().any(|h| h == key) {
                self.headers.push(key.clone());
            }
        }
        self.rows.push(row);
    }

    /// Emits the end-of-construction warning if rows were dropped.
    fn finish(self) -> Self {
        if self.dropped_rows > 0 {
            eprintln!(
                "{}",
                t!(
                    "data_source.rows_dropped",
                    name = &self.name,
                    max = MAX_ROWS,
                    dropped = self.dropped_rows
                )
                .yellow()
            );
        }
        self
    }

    /// Builds a source from caller-owned rows. Each row is copied, so later changes
    /// to the caller's data do not leak into the source.
    ///
    /// 从调用方拥有的行构建数据源。每一行都会被复制，调用方之后的修改不会影响数据源。
    pub fn from_array<'a, I>(rows: I, name: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = &'a Row>,
    {
        let mut source = Self::empty(name, SourceKind::InMemory);
        for row in rows {
            source.push_row(row.clone());
        }
        source.finish()
    }

    /// Loads a CSV file. The source is named after the file stem.
    ///
    /// # Errors
    /// Returns `DataSourceError::Io` if the file cannot be read.
    pub fn from_csv(path: impl AsRef<Path>, delimiter: char) -> Result<Self, DataSourceError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| DataSourceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::parse_csv(source_name(path), &content, delimiter))
    }

    /// Parses CSV text. The first non-empty line is the header row; data lines whose
    /// field count differs from the header are skipped with a warning.
    ///
    /// 解析 CSV 文本。第一个非空行为表头；字段数与表头不一致的数据行会被跳过并给出警告。
    pub fn parse_csv(name: impl Into<String>, content: &str, delimiter: char) -> Self {
        let mut source = Self::empty(name, SourceKind::Csv);
        let mut lines = content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty());

        let Some((_, header_line)) = lines.next() else {
            return source;
        };
        let header: Vec<String> = header_line
            .split(delimiter)
            .map(|field| field.trim().to_string())
            .collect();

        for (index, line) in lines {
            let fields: Vec<&str> = line.split(delimiter).map(str::trim).collect();
            if fields.len() != header.len() {
                eprintln!(
                    "{}",
                    t!(
                        "data_source.csv_row_skipped",
                        name = &source.name,
                        line = index + 1,
                        expected = header.len(),
                        found = fields.len()
                    )
                    .yellow()
                );
                continue;
            }
            let row: Row = header
                .iter()
                .zip(fields)
                .map(|(key, field)| (key.clone(), coerce_field(field)))
                .collect();
            source.push_row(row);
        }
        source.finish()
    }

    /// Loads a JSON file. The source is named after the file stem.
    ///
    /// # Errors
    /// `DataSourceError::Io` if the file cannot be read, `DataSourceError::Format`
    /// on a parse failure or an unsupported top-level shape.
    pub fn from_json(path: impl AsRef<Path>, array_key: &str) -> Result<Self, DataSourceError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| DataSourceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse_json(source_name(path), &content, array_key)
    }

    /// Parses JSON text into rows.
    ///
    /// - a top-level array: each object element becomes a row
    /// - an object containing `array_key` holding an array: that array becomes the rows
    /// - any other object: the object itself is a single row
    ///
    /// 将 JSON 文本解析为行：顶层数组的每个对象元素为一行；包含 `array_key` 数组的对象
    /// 使用该数组；其他对象本身作为单独一行。
    pub fn parse_json(
        name: impl Into<String>,
        content: &str,
        array_key: &str,
    ) -> Result<Self, DataSourceError> {
        let mut source = Self::empty(name, SourceKind::Json);
        let parsed: Value = serde_json::from_str(content).map_err(|e| DataSourceError::Format {
            origin: source.name.clone(),
            message: e.to_string(),
        })?;

        let elements = match parsed {
            Value::Array(items) => items,
            Value::Object(mut object) => match object.remove(array_key) {
                Some(Value::Array(items)) => items,
                Some(other) => {
                    return Err(DataSourceError::Format {
                        origin: source.name,
                        message: format!(
                            "key '{}' holds {} instead of an array",
                            array_key,
                            json_kind(&other)
                        ),
                    });
                }
                None => vec![Value::Object(object)],
            },
            other => {
                return Err(DataSourceError::Format {
                    origin: source.name,
                    message: format!(
                        "top-level value is {}, expected an array or an object",
                        json_kind(&other)
                    ),
                });
            }
        };

        for (index, element) in elements.into_iter().enumerate() {
            match element {
                Value::Object(row) => source.push_row(row),
                _ => eprintln!(
                    "{}",
                    t!("data_source.json_element_skipped", name = &source.name, index = index)
                        .yellow()
                ),
            }
        }
        Ok(source.finish())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn source_kind(&self) -> SourceKind {
        self.source_kind
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of rows discarded because of the row cap.
    pub fn dropped_rows(&self) -> usize {
        self.dropped_rows
    }

    /// Returns a copy of the row at `index`, or `None` when out of range.
    pub fn get_row(&self, index: usize) -> Option<Row> {
        self.rows.get(index).cloned()
    }

    /// Returns the values of one column in row order. Rows lacking the column yield `Null`.
    /// 按行顺序返回某一列的值。缺少该列的行返回 `Null`。
    pub fn get_column_values(&self, column: &str) -> Vec<Value> {
        self.rows
            .iter()
            .map(|row| row.get(column).cloned().unwrap_or(Value::Null))
            .collect()
    }

    /// Returns copies of the rows matching `predicate`, in row order.
    pub fn filter_rows<F>(&self, predicate: F) -> Vec<Row>
    where
        F: Fn(&Row) -> bool,
    {
        self.rows.iter().filter(|row| predicate(row)).cloned().collect()
    }
}

/// Coerces a CSV field: integer, then float, then string.
/// 转换 CSV 字段：依次尝试整数、浮点数，否则为字符串。
fn coerce_field(field: &str) -> Value {
    if let Ok(int) = field.parse::<i64>() {
        return Value::Number(int.into());
    }
    // `f64::from_str` accepts "inf" and "NaN"; those stay strings.
    if let Some(number) = field.parse::<f64>().ok().and_then(Number::from_f64) {
        return Value::Number(number);
    }
    Value::String(field.to_string())
}

fn source_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
