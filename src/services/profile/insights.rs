use indexmap::IndexMap;
use serde::Serialize;

use super::stats::round_to;
use super::types::{Insight, InsightKind, SheetProfile};

/// Policy constants for the heuristic flags. These are rules of thumb, not
/// statistically validated anomaly thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct InsightThresholds {
    /// Coefficient of variation (%) above which a numeric column is flagged. Default: 50.0.
    pub cv_threshold: f64,
    /// Distinct/row ratio below which a text column is low-cardinality. Default: 0.1.
    pub cardinality_ratio: f64,
}

impl Default for InsightThresholds {
    fn default() -> Self {
        Self {
            cv_threshold: 50.0,
            cardinality_ratio: 0.1,
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct InsightGenerator {
    thresholds: InsightThresholds,
}

impl InsightGenerator {
    pub fn new(thresholds: InsightThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &InsightThresholds {
        &self.thresholds
    }

    /// Insights per sheet, in the order the profiles were given.
    pub fn generate(&self, profiles: &[SheetProfile]) -> IndexMap<String, Vec<Insight>> {
        let mut insights: IndexMap<String, Vec<Insight>> = IndexMap::with_capacity(profiles.len());
        for profile in profiles {
            insights
                .entry(profile.name.clone())
                .or_default()
                .extend(self.sheet_insights(profile));
        }
        insights
    }

    pub fn sheet_insights(&self, profile: &SheetProfile) -> Vec<Insight> {
        let mut insights = vec![Insight::fact(InsightKind::Shape {
            rows: profile.row_count,
            columns: profile.column_count,
        })];

        if profile.row_count == 0 {
            return insights;
        }

        let missing = profile.columns_with_missing();
        if missing.is_empty() {
            insights.push(Insight::fact(InsightKind::Complete));
        } else {
            insights.push(Insight::fact(InsightKind::MissingData {
                columns: missing.into_iter().map(str::to_string).collect(),
            }));
        }

        let numeric_columns: Vec<&String> = profile
            .column_names
            .iter()
            .filter(|name| profile.numeric_stats.contains_key(*name))
            .collect();
        if !numeric_columns.is_empty() {
            insights.push(Insight::fact(InsightKind::NumericFields {
                columns: numeric_columns.iter().map(|name| name.to_string()).collect(),
            }));
        }

        for name in &numeric_columns {
            let cv = profile.numeric_stats[*name].coefficient_of_variation();
            if let Some(cv) = cv.filter(|cv| *cv > self.thresholds.cv_threshold) {
                insights.push(Insight::flag(
                    name,
                    InsightKind::HighVariation { cv: round_to(cv, 1) },
                ));
            }
        }

        let rows = profile.row_count;
        for name in &profile.column_names {
            let Some(stats) = profile.text_stats.get(name) else {
                continue;
            };
            if stats.unique_count == rows {
                insights.push(Insight::flag(name, InsightKind::UniqueIdentifier));
            } else if (stats.unique_count as f64) < rows as f64 * self.thresholds.cardinality_ratio {
                insights.push(Insight::flag(
                    name,
                    InsightKind::LowCardinality {
                        distinct: stats.unique_count,
                    },
                ));
            }
        }

        insights
    }
}
