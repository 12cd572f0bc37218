use anyhow::Result;
use clap::{Parser, Subcommand};
use moka::sync::Cache;
use std::path::{Path, PathBuf};
use std::sync::Arc;

mod config;
mod error;
mod logging;
mod routes;
mod services;
pub mod models;

use bytes::Bytes;
use error::SheetError;
use models::SheetData;
use services::excel::{CalamineSource, TableSource, WorkbookFormat};
use services::file_processor::{self, WorkbookAnalysis, WorkbookKey, WorkbookProfile};
use services::profile::InsightGenerator;
use services::report::MarkdownRenderer;

#[derive(Parser, Debug)]
#[command(name = "sheet_profiler")]
#[command(about = "Profiles spreadsheet workbooks and reports heuristic insights")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the HTTP API (default)
    Serve,
    /// Profile a workbook on disk and print the Markdown report
    Report {
        path: PathBuf,
        /// Source description shown in the report; defaults to the path
        #[arg(long)]
        source: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    logging::init_logging()?;

    // Load configuration
    let config = config::Config::new()?;
    let addr = config.addr;
    tracing::info!(
        "Insight thresholds: cv > {}%, cardinality < {} x rows",
        config.cv_threshold,
        config.cardinality_ratio
    );

    // Build our application state
    let state = Arc::new(AppState::new(config));

    if let Some(Commands::Report { path, source }) = cli.command {
        let source = source.unwrap_or_else(|| path.display().to_string());
        let analysis = tokio::task::spawn_blocking(move || {
            state.analyze_path(&CalamineSource, &path, &source)
        })
        .await??;
        println!("{}", analysis.report);
        return Ok(());
    }

    let app = routes::app(state);

    // Run it
    tracing::info!("listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// Application state
#[derive(Clone)]
pub struct AppState {
    config: config::Config,
    generator: InsightGenerator,
    renderer: MarkdownRenderer,
    cache: Cache<WorkbookKey, WorkbookProfile>,
}

impl AppState {
    fn new(config: config::Config) -> Self {
        Self {
            generator: InsightGenerator::new(config.thresholds()),
            renderer: MarkdownRenderer::new(),
            cache: Cache::new(config.cache_capacity),
            config,
        }
    }

    fn analyze(&self, sheets: &[SheetData], source: &str) -> Result<WorkbookAnalysis, SheetError> {
        file_processor::analyze_sheets(sheets, &self.generator, &self.renderer, source)
    }

    /// Loads a document from disk through `source` and analyzes every sheet in it.
    fn analyze_path(
        &self,
        source: &dyn TableSource,
        path: &Path,
        description: &str,
    ) -> Result<WorkbookAnalysis, SheetError> {
        let sheets = source.load(path)?;
        self.analyze(&sheets, description)
    }

    /// Reads and profiles a downloaded workbook, reusing cached profiles for identical content.
    /// The report is always rendered for `source`.
    fn analyze_workbook(
        &self,
        data: Bytes,
        format: WorkbookFormat,
        source: &str,
    ) -> Result<WorkbookAnalysis, SheetError> {
        let key = WorkbookKey::new(&data, format);
        let profile = match self.cache.get(&key) {
            Some(cached) => {
                tracing::info!("Reusing cached profiles for {}", source);
                cached
            }
            None => {
                let sheets = CalamineSource.load_bytes(data, format)?;
                let profile = file_processor::profile_workbook(&sheets, &self.generator)?;
                self.cache.insert(key, profile.clone());
                profile
            }
        };
        Ok(profile.render(&self.renderer, source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Column;

    struct FixedSource(Vec<SheetData>);

    impl TableSource for FixedSource {
        fn load(&self, _path: &Path) -> Result<Vec<SheetData>, SheetError> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn cli_defaults_to_serving() {
        let cli = Cli::try_parse_from(["sheet_profiler"]).unwrap();
        assert!(cli.command.is_none());

        let cli = Cli::try_parse_from(["sheet_profiler", "report", "book.xlsx", "--source", "Q1"]).unwrap();
        match cli.command {
            Some(Commands::Report { path, source }) => {
                assert_eq!(path, PathBuf::from("book.xlsx"));
                assert_eq!(source.as_deref(), Some("Q1"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn analyze_path_reads_through_the_table_source() {
        let state = AppState::new(config::Config::default());
        let source = FixedSource(vec![SheetData {
            name: "Orders".to_string(),
            columns: vec![Column::numbers("qty", &[1.0, 2.0, 3.0])],
        }]);

        let analysis = state
            .analyze_path(&source, Path::new("/nonexistent/orders.xlsx"), "orders.xlsx")
            .unwrap();
        assert_eq!(analysis.sheet_names, vec!["Orders"]);
        assert!(analysis.report.contains("- **Source**: orders.xlsx"));
    }

    #[test]
    fn analyze_path_surfaces_source_failures() {
        let state = AppState::new(config::Config::default());
        let err = state
            .analyze_path(&CalamineSource, Path::new("/nonexistent/orders.xlsx"), "orders.xlsx")
            .unwrap_err();
        assert!(matches!(err, SheetError::SourceUnavailable(_)));
    }
}
