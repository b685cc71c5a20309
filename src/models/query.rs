//! Query-related data models.
//!
//! This module defines the driver-independent result shapes produced by the
//! executor and consumed by the formatter.

use serde::Serialize;
use std::fmt;

/// Default query timeout in seconds.
pub const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 120;

/// How a statement is run against the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionMode {
    /// Statement returns a row stream.
    #[default]
    ReadFetch,
    /// Statement only reports an affected-row count.
    EffectOnly,
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadFetch => write!(f, "read_fetch"),
            Self::EffectOnly => write!(f, "effect_only"),
        }
    }
}

/// Numeric cell value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Number {
    Integer(i64),
    Float(f64),
    /// DECIMAL/NUMERIC kept in the exact database representation
    Decimal(String),
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{}", v),
            Self::Decimal(v) => f.write_str(v),
        }
    }
}

/// A single decoded cell. Byte sequences never reach this type; they are
/// decoded to `Text` at the driver boundary.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Text(String),
    Number(Number),
    Boolean(bool),
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn integer(value: impl Into<i64>) -> Self {
        Self::Number(Number::Integer(value.into()))
    }

    pub fn float(value: impl Into<f64>) -> Self {
        Self::Number(Number::Float(value.into()))
    }
}

/// Null renders as an empty string; everything else uses its natural form.
impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Text(s) => f.write_str(s),
            Self::Number(n) => write!(f, "{}", n),
            Self::Boolean(b) => write!(f, "{}", b),
        }
    }
}

/// One row: values in the same order as the owning result's columns.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Row(pub Vec<CellValue>);

impl Row {
    pub fn new(values: Vec<CellValue>) -> Self {
        Self(values)
    }

    pub fn values(&self) -> &[CellValue] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&CellValue> {
        self.0.get(idx)
    }
}

impl From<Vec<CellValue>> for Row {
    fn from(values: Vec<CellValue>) -> Self {
        Self(values)
    }
}

/// Column names plus rows, as returned by a row-producing statement.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct TabularResult {
    /// Column names in driver-reported order
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl TabularResult {
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        Self { columns, rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Index of a column by name, ignoring ASCII case.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(name))
    }

    /// Cell lookup by row and column name.
    pub fn value(&self, row: usize, column: &str) -> Option<&CellValue> {
        let idx = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(idx))
    }
}

/// Affected-row count from a statement that returns no rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct EffectResult {
    pub rows_affected: u64,
}

/// Normalized outcome of one statement.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QueryOutcome {
    Table(TabularResult),
    Effect(EffectResult),
}

impl From<TabularResult> for QueryOutcome {
    fn from(result: TabularResult) -> Self {
        Self::Table(result)
    }
}

impl From<EffectResult> for QueryOutcome {
    fn from(result: EffectResult) -> Self {
        Self::Effect(result)
    }
}
