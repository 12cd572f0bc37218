use indexmap::IndexMap;
use serde::Serialize;
use smallvec::SmallVec;
use std::fmt;

use crate::models::ColumnKind;

pub const TOP_VALUES: usize = 3;

/// Descriptive statistics for a numeric column, computed over non-missing values only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericStats {
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation; absent when `count <= 1`.
    pub std: Option<f64>,
    pub min: f64,
    #[serde(rename = "25%")]
    pub p25: f64,
    #[serde(rename = "50%")]
    pub p50: f64,
    #[serde(rename = "75%")]
    pub p75: f64,
    pub max: f64,
}

impl NumericStats {
    /// Coefficient of variation in percent. `None` for a zero mean or a missing std.
    pub fn coefficient_of_variation(&self) -> Option<f64> {
        let std = self.std?;
        if self.mean == 0.0 {
            return None;
        }
        Some(std / self.mean.abs() * 100.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextStats {
    pub unique_count: usize,
    /// Most frequent values, descending by count, ties in first-seen order.
    pub top_values: SmallVec<[(String, usize); TOP_VALUES]>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileWarning {
    /// The sheet has no rows or no columns.
    EmptyInput,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SheetProfile {
    pub name: String,
    pub row_count: usize,
    pub column_count: usize,
    pub column_names: Vec<String>,
    pub column_kinds: IndexMap<String, ColumnKind>,
    pub missing_counts: IndexMap<String, usize>,
    pub missing_percentage: IndexMap<String, f64>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub numeric_stats: IndexMap<String, NumericStats>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub text_stats: IndexMap<String, TextStats>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<ProfileWarning>,
}

impl SheetProfile {
    pub fn new(name: impl Into<String>, row_count: usize, column_count: usize) -> Self {
        Self {
            name: name.into(),
            row_count,
            column_count,
            column_names: Vec::with_capacity(column_count),
            column_kinds: IndexMap::with_capacity(column_count),
            missing_counts: IndexMap::with_capacity(column_count),
            missing_percentage: IndexMap::with_capacity(column_count),
            numeric_stats: IndexMap::new(),
            text_stats: IndexMap::new(),
            warnings: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.row_count == 0 || self.column_count == 0
    }

    pub fn total_missing(&self) -> usize {
        self.missing_counts.values().sum()
    }

    pub fn columns_with_missing(&self) -> Vec<&str> {
        self.column_names
            .iter()
            .filter(|name| self.missing_counts.get(*name).copied().unwrap_or(0) > 0)
            .map(String::as_str)
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Structural facts: shape, completeness, field lists.
    Fact,
    /// Heuristic findings about a single column.
    Flag,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InsightKind {
    Shape { rows: usize, columns: usize },
    MissingData { columns: Vec<String> },
    Complete,
    NumericFields { columns: Vec<String> },
    HighVariation { cv: f64 },
    UniqueIdentifier,
    LowCardinality { distinct: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insight {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    pub severity: Severity,
    pub kind: InsightKind,
    pub message: String,
}

impl Insight {
    pub fn fact(kind: InsightKind) -> Self {
        let message = describe(None, &kind);
        Self {
            column: None,
            severity: Severity::Fact,
            kind,
            message,
        }
    }

    pub fn flag(column: &str, kind: InsightKind) -> Self {
        let message = describe(Some(column), &kind);
        Self {
            column: Some(column.to_string()),
            severity: Severity::Flag,
            kind,
            message,
        }
    }
}

impl fmt::Display for Insight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

fn describe(column: Option<&str>, kind: &InsightKind) -> String {
    let column = column.unwrap_or_default();
    match kind {
        InsightKind::Shape { rows, columns } => format!("{} records, {} fields.", rows, columns),
        InsightKind::MissingData { columns } => {
            format!("Missing data found in: {}", columns.join(", "))
        }
        InsightKind::Complete => "Data is complete, no missing values".to_string(),
        InsightKind::NumericFields { columns } => {
            format!("Numeric fields: {}", columns.join(", "))
        }
        InsightKind::HighVariation { cv } => format!(
            "{} fluctuates strongly (coefficient of variation: {:.1}%)",
            column, cv
        ),
        InsightKind::UniqueIdentifier => format!("{} is likely a unique identifier", column),
        InsightKind::LowCardinality { distinct } => format!(
            "{} is a low-cardinality categorical field ({} distinct values)",
            column, distinct
        ),
    }
}
