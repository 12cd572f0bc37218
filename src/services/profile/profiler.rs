use std::collections::{HashMap, HashSet};

use smallvec::SmallVec;
use tracing::{debug, warn};

use super::stats::{describe, round_to};
use super::types::*;
use crate::error::SheetError;
use crate::models::{CellValue, Column, ColumnKind};
use crate::services::excel::utils::unique_column_name;

/// Builds a [`SheetProfile`] from one sheet's columns. Stateless; the same input
/// always yields the same profile.
#[derive(Debug, Default, Clone, Copy)]
pub struct SheetProfiler;

/// Non-missing values of a column, converted for the kind it was classified as.
enum Classified {
    Numeric(Vec<f64>),
    Text(Vec<String>),
    Other,
}

impl SheetProfiler {
    pub fn profile(&self, sheet_name: &str, columns: &[Column]) -> Result<SheetProfile, SheetError> {
        let start = std::time::Instant::now();
        let row_count = columns.iter().map(|c| c.values.len()).max().unwrap_or(0);
        let column_count = columns.len();

        let mut profile = SheetProfile::new(sheet_name, row_count, column_count);
        if profile.is_empty() {
            warn!(
                "Sheet {} is empty ({} rows, {} columns)",
                sheet_name, row_count, column_count
            );
            profile.warnings.push(ProfileWarning::EmptyInput);
        }

        let mut existing_names = HashSet::new();
        for (idx, column) in columns.iter().enumerate() {
            let name = unique_column_name(&column.name, idx, &mut existing_names);
            let present = column.values.iter().filter(|v| !v.is_missing()).count();
            let missing = row_count - present;
            let percentage = if row_count == 0 {
                0.0
            } else {
                round_to(missing as f64 / row_count as f64 * 100.0, 2)
            };

            let (kind, classified) = self.classify(column)?;
            debug!("Column {} classified as {}, {} missing", name, kind, missing);

            match classified {
                Classified::Numeric(values) => {
                    if let Some(stats) = describe(&values) {
                        profile.numeric_stats.insert(name.clone(), stats);
                    }
                }
                Classified::Text(values) => {
                    profile.text_stats.insert(name.clone(), summarize_text(&values));
                }
                Classified::Other => {}
            }

            profile.column_kinds.insert(name.clone(), kind);
            profile.missing_counts.insert(name.clone(), missing);
            profile.missing_percentage.insert(name.clone(), percentage);
            profile.column_names.push(name);
        }

        debug!("Profiled sheet {} in {:?}", sheet_name, start.elapsed());
        Ok(profile)
    }

    fn classify(&self, column: &Column) -> Result<(ColumnKind, Classified), SheetError> {
        let present: Vec<(usize, &CellValue)> = column
            .values
            .iter()
            .enumerate()
            .filter(|(_, v)| !v.is_missing())
            .collect();

        if present.is_empty() {
            return Ok((ColumnKind::Other, Classified::Other));
        }

        match column.declared_kind {
            Some(ColumnKind::Numeric) => {
                let mut numbers = Vec::with_capacity(present.len());
                for (row, value) in &present {
                    let number = value.as_number().ok_or_else(|| SheetError::MalformedColumn {
                        column: column.name.clone(),
                        reason: format!("value '{}' in row {} is not a finite number", value, row + 1),
                    })?;
                    numbers.push(number);
                }
                Ok((ColumnKind::Numeric, Classified::Numeric(numbers)))
            }
            Some(ColumnKind::Text) => {
                let texts = present.iter().map(|(_, v)| v.to_string()).collect();
                Ok((ColumnKind::Text, Classified::Text(texts)))
            }
            Some(ColumnKind::Other) => Ok((ColumnKind::Other, Classified::Other)),
            None => Ok(infer(&present)),
        }
    }
}

fn infer(present: &[(usize, &CellValue)]) -> (ColumnKind, Classified) {
    let numbers: Option<Vec<f64>> = present.iter().map(|(_, v)| v.as_number()).collect();
    if let Some(numbers) = numbers {
        return (ColumnKind::Numeric, Classified::Numeric(numbers));
    }

    let texts: Option<Vec<String>> = present
        .iter()
        .map(|(_, v)| match v {
            CellValue::Text(s) => Some(s.clone()),
            _ => None,
        })
        .collect();
    match texts {
        Some(texts) => (ColumnKind::Text, Classified::Text(texts)),
        None => (ColumnKind::Other, Classified::Other),
    }
}

fn summarize_text(values: &[String]) -> TextStats {
    // value -> (first position, occurrences)
    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
    for (idx, value) in values.iter().enumerate() {
        counts.entry(value.as_str()).or_insert((idx, 0)).1 += 1;
    }

    let unique_count = counts.len();
    let mut ranked: Vec<(&str, usize, usize)> = counts
        .into_iter()
        .map(|(value, (first, count))| (value, first, count))
        .collect();
    ranked.sort_by(|a, b| b.2.cmp(&a.2).then(a.1.cmp(&b.1)));

    let top_values: SmallVec<[(String, usize); TOP_VALUES]> = ranked
        .into_iter()
        .take(TOP_VALUES)
        .map(|(value, _, count)| (value.to_string(), count))
        .collect();

    TextStats {
        unique_count,
        top_values,
    }
}
