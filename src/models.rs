use serde::{Deserialize, Serialize};
use std::fmt;

/// One raw cell as handed over by a table source.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Number(f64),
    Text(String),
    Bool(bool),
    /// Dates, times and durations, kept in their display form.
    Temporal(String),
}

impl CellValue {
    /// Null, empty text and NaN all count as missing.
    pub fn is_missing(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Number(n) => n.is_nan(),
            CellValue::Text(s) => s.is_empty(),
            CellValue::Bool(_) | CellValue::Temporal(_) => false,
        }
    }

    /// Numeric reading of the cell: finite numbers as-is, text when it parses as a finite real.
    /// Infinities are not numbers here, so they can never reach the statistics.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) if n.is_finite() => Some(*n),
            CellValue::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            CellValue::Text(s) | CellValue::Temporal(s) => f.write_str(s),
            CellValue::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<serde_json::Value> for CellValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => CellValue::Empty,
            serde_json::Value::Bool(b) => CellValue::Bool(b),
            serde_json::Value::Number(n) => n.as_f64().map_or(CellValue::Empty, CellValue::Number),
            serde_json::Value::String(s) => CellValue::Text(s),
            other => CellValue::Text(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Numeric,
    Text,
    Other,
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnKind::Numeric => write!(f, "numeric"),
            ColumnKind::Text => write!(f, "text"),
            ColumnKind::Other => write!(f, "other"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<CellValue>,
    /// Kind requested by the caller; `None` means infer it from the values.
    pub declared_kind: Option<ColumnKind>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<CellValue>) -> Self {
        Self {
            name: name.into(),
            values,
            declared_kind: None,
        }
    }

    pub fn with_kind(mut self, kind: ColumnKind) -> Self {
        self.declared_kind = Some(kind);
        self
    }

    pub fn numbers(name: impl Into<String>, values: &[f64]) -> Self {
        Self::new(name, values.iter().map(|v| CellValue::Number(*v)).collect())
    }

    pub fn texts(name: impl Into<String>, values: &[&str]) -> Self {
        Self::new(name, values.iter().map(|v| CellValue::Text(v.to_string())).collect())
    }
}

/// One sheet as yielded by a table source.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetData {
    pub name: String,
    pub columns: Vec<Column>,
}
