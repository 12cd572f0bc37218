use chrono::{Local, NaiveDateTime};
use indexmap::IndexMap;

use super::TextRenderer;
use crate::services::profile::{Insight, Severity, SheetProfile};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Renders the analysis report as Markdown.
#[derive(Debug, Default, Clone)]
pub struct MarkdownRenderer {
    generated_at: Option<NaiveDateTime>,
}

impl MarkdownRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pins the report timestamp instead of using the local clock.
    pub fn with_timestamp(mut self, generated_at: NaiveDateTime) -> Self {
        self.generated_at = Some(generated_at);
        self
    }

    fn timestamp(&self) -> String {
        self.generated_at
            .unwrap_or_else(|| Local::now().naive_local())
            .format(TIMESTAMP_FORMAT)
            .to_string()
    }
}

impl TextRenderer for MarkdownRenderer {
    fn render(
        &self,
        profiles: &[SheetProfile],
        insights: &IndexMap<String, Vec<Insight>>,
        source_description: &str,
    ) -> String {
        let mut out = String::from("# Spreadsheet Analysis Report\n\n");

        out.push_str("## File Information\n");
        out.push_str(&format!("- **Source**: {}\n", source_description));
        out.push_str(&format!("- **Generated**: {}\n", self.timestamp()));
        out.push_str(&format!("- **Sheets**: {}\n\n", profiles.len()));

        out.push_str("## Data Insights\n\n");
        for (sheet, sheet_insights) in insights {
            out.push_str(&format!("### {} insights\n", sheet));
            for insight in sheet_insights {
                match insight.severity {
                    Severity::Fact => out.push_str(&format!("- {}\n", insight)),
                    Severity::Flag => out.push_str(&format!("  - {}\n", insight)),
                }
            }
            out.push('\n');
        }
        out.push_str(
            "> Flags are heuristic (coefficient of variation and cardinality rules of thumb), \
             not statistically validated anomaly detection.\n\n",
        );

        out.push_str("## Detailed Statistics\n\n");
        for profile in profiles {
            render_sheet(&mut out, profile);
        }

        out
    }
}

fn render_sheet(out: &mut String, profile: &SheetProfile) {
    out.push_str(&format!("### {}\n", profile.name));
    out.push_str(&format!(
        "- **Shape**: {} rows × {} columns\n",
        profile.row_count, profile.column_count
    ));
    if !profile.column_names.is_empty() {
        out.push_str(&format!("- **Columns**: {}\n", profile.column_names.join(", ")));
    }
    out.push('\n');

    let missing = profile.columns_with_missing();
    if !missing.is_empty() {
        out.push_str("**Missing values**:\n\n");
        out.push_str("| Column | Missing | Percentage |\n|---|---:|---:|\n");
        for name in missing {
            out.push_str(&format!(
                "| {} | {} | {:.2}% |\n",
                name, profile.missing_counts[name], profile.missing_percentage[name]
            ));
        }
        out.push('\n');
    }

    if !profile.numeric_stats.is_empty() {
        out.push_str("**Numeric columns**:\n\n");
        out.push_str("| Column | Count | Mean | Median | Std | Min | Max |\n");
        out.push_str("|---|---:|---:|---:|---:|---:|---:|\n");
        for (name, stats) in &profile.numeric_stats {
            let std = stats.std.map_or_else(|| "n/a".to_string(), |s| format!("{:.2}", s));
            out.push_str(&format!(
                "| {} | {} | {:.2} | {:.2} | {} | {:.2} | {:.2} |\n",
                name, stats.count, stats.mean, stats.p50, std, stats.min, stats.max
            ));
        }
        out.push('\n');
    }

    if !profile.text_stats.is_empty() {
        out.push_str("**Text columns**:\n\n");
        for (name, stats) in &profile.text_stats {
            let top = stats
                .top_values
                .iter()
                .map(|(value, count)| {
                    let share = if profile.row_count == 0 {
                        0.0
                    } else {
                        *count as f64 / profile.row_count as f64 * 100.0
                    };
                    format!("'{}' {} ({:.1}%)", value, count, share)
                })
                .collect::<Vec<_>>()
                .join(", ");
            out.push_str(&format!(
                "- {}: {} unique values; most common: {}\n",
                name, stats.unique_count, top
            ));
        }
        out.push('\n');
    }
}
