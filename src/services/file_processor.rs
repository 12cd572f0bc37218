use bytes::Bytes;
use indexmap::IndexMap;
use rayon::prelude::*;
use reqwest::Client;
use serde::Serialize;
use tracing::{error, info};

use crate::error::SheetError;
use crate::models::SheetData;
use crate::services::excel::WorkbookFormat;
use crate::services::profile::{Insight, InsightGenerator, SheetProfile, SheetProfiler};
use crate::services::report::TextRenderer;

/// Profiles and insights for one workbook, independent of how it is described in the report.
#[derive(Debug, Clone)]
pub struct WorkbookProfile {
    pub sheet_names: Vec<String>,
    pub profiles: Vec<SheetProfile>,
    pub insights: IndexMap<String, Vec<Insight>>,
}

/// Everything produced for one workbook: profiles, insights and the rendered report.
#[derive(Debug, Clone, Serialize)]
pub struct WorkbookAnalysis {
    pub sheet_names: Vec<String>,
    pub profiles: Vec<SheetProfile>,
    pub insights: IndexMap<String, Vec<Insight>>,
    pub report: String,
}

/// Profiles every sheet (in parallel, order preserved) and derives insights.
pub fn profile_workbook(
    sheets: &[SheetData],
    generator: &InsightGenerator,
) -> Result<WorkbookProfile, SheetError> {
    let start = std::time::Instant::now();
    info!("Profiling {} sheets", sheets.len());

    let profiler = SheetProfiler;
    let profiles = sheets
        .par_iter()
        .map(|sheet| profiler.profile(&sheet.name, &sheet.columns))
        .collect::<Result<Vec<_>, _>>()?;
    let insights = generator.generate(&profiles);

    info!("Profiling completed in {:?}", start.elapsed());
    Ok(WorkbookProfile {
        sheet_names: sheets.iter().map(|s| s.name.clone()).collect(),
        profiles,
        insights,
    })
}

impl WorkbookProfile {
    pub fn render(self, renderer: &dyn TextRenderer, source_description: &str) -> WorkbookAnalysis {
        let report = renderer.render(&self.profiles, &self.insights, source_description);
        WorkbookAnalysis {
            sheet_names: self.sheet_names,
            profiles: self.profiles,
            insights: self.insights,
            report,
        }
    }
}

/// Profiles every sheet, derives insights and renders the report.
pub fn analyze_sheets(
    sheets: &[SheetData],
    generator: &InsightGenerator,
    renderer: &dyn TextRenderer,
    source_description: &str,
) -> Result<WorkbookAnalysis, SheetError> {
    info!("Analyzing {}", source_description);
    Ok(profile_workbook(sheets, generator)?.render(renderer, source_description))
}

pub fn ensure_within_limit(size: usize, max_file_size: usize) -> Result<(), SheetError> {
    if size > max_file_size {
        return Err(SheetError::InvalidInput(format!(
            "File is {} bytes, the limit is {} bytes",
            size, max_file_size
        )));
    }
    Ok(())
}

pub async fn load_file_from_url(url: &str, max_file_size: usize) -> Result<Bytes, SheetError> {
    let client = Client::new();
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| SheetError::Fetch(format!("Failed to fetch file: {}", e)))?;

    if !response.status().is_success() {
        error!("Failed to fetch file, status {}", response.status());
        return Err(SheetError::Fetch(
            format!("Failed to fetch file. Status: {}", response.status())
        ));
    }

    if let Some(length) = response.content_length() {
        ensure_within_limit(length as usize, max_file_size)?;
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| SheetError::Fetch(format!("Failed to read response bytes: {}", e)))?;
    ensure_within_limit(bytes.len(), max_file_size)?;
    Ok(bytes)
}

/// Cache key for a downloaded workbook: BLAKE3 digest of its bytes plus the format it was read as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WorkbookKey {
    digest: [u8; 32],
    format: WorkbookFormat,
}

impl WorkbookKey {
    pub fn new(data: &[u8], format: WorkbookFormat) -> Self {
        Self {
            digest: *blake3::hash(data).as_bytes(),
            format,
        }
    }
}
