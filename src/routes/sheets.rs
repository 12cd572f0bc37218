use axum::{
    extract::State,
    routing::post,
    Router,
    Json,
    http::Method,
};
use serde::Deserialize;
use std::sync::Arc;
use crate::{
    AppState,
    error::SheetError,
    models::{Column, ColumnKind, SheetData},
    services::{
        excel::WorkbookFormat,
        file_processor::{self, WorkbookAnalysis},
    },
};
use tower_http::cors::{CorsLayer, Any};

pub fn routes() -> Router<Arc<AppState>> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
        .max_age(std::time::Duration::from_secs(3600));

    Router::new()
        .route("/sheets/analyze", post(analyze_sheet))
        .route("/sheets/profile", post(profile_sheets))
        .layer(cors)
}

#[derive(Debug, Deserialize)]
pub struct FileInfo {
    #[serde(rename = "type")]
    file_type: String,
    signed_url: String,
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    files: Vec<FileInfo>,
    #[serde(default)]
    source: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ColumnPayload {
    name: String,
    #[serde(default)]
    kind: Option<ColumnKind>,
    #[serde(default)]
    values: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct SheetPayload {
    name: String,
    #[serde(default)]
    columns: Vec<ColumnPayload>,
}

#[derive(Debug, Deserialize)]
pub struct ProfileRequest {
    sheets: Vec<SheetPayload>,
    #[serde(default)]
    source: Option<String>,
}

impl From<ColumnPayload> for Column {
    fn from(payload: ColumnPayload) -> Self {
        Column {
            name: payload.name,
            values: payload.values.into_iter().map(Into::into).collect(),
            declared_kind: payload.kind,
        }
    }
}

impl From<SheetPayload> for SheetData {
    fn from(payload: SheetPayload) -> Self {
        SheetData {
            name: payload.name,
            columns: payload.columns.into_iter().map(Into::into).collect(),
        }
    }
}

async fn analyze_sheet(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<WorkbookAnalysis>, SheetError> {
    let start = std::time::Instant::now();

    // 1. Validate file type and get URL
    let file_info = request.files.first()
        .ok_or_else(|| SheetError::InvalidInput("No file provided".to_string()))?;

    let format = WorkbookFormat::from_hint(&file_info.file_type).ok_or_else(|| {
        tracing::error!("Unsupported file type: {}", file_info.file_type);
        SheetError::InvalidInput(format!("Unsupported file type: {}", file_info.file_type))
    })?;

    // 2. Download file from URL
    tracing::info!("Downloading {} file, URL length: {}", file_info.file_type, file_info.signed_url.len());
    let download_start = std::time::Instant::now();
    let file_data = file_processor::load_file_from_url(&file_info.signed_url, state.config.max_file_size).await?;
    tracing::info!("File downloaded, size: {}KB, took: {:?}", file_data.len() / 1024, download_start.elapsed());

    // 3. Read and profile every sheet off the async runtime
    let source = request.source
        .unwrap_or_else(|| format!("uploaded {} workbook", file_info.file_type));
    let worker = Arc::clone(&state);
    let analysis = tokio::task::spawn_blocking(move || {
        worker.analyze_workbook(file_data, format, &source)
    })
    .await??;

    tracing::info!("Total processing completed in {:?}", start.elapsed());
    Ok(Json(analysis))
}

async fn profile_sheets(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ProfileRequest>,
) -> Result<Json<WorkbookAnalysis>, SheetError> {
    tracing::info!("Profiling {} sheets from request body", request.sheets.len());
    let source = request.source.unwrap_or_else(|| "request payload".to_string());
    let sheets: Vec<SheetData> = request.sheets.into_iter().map(Into::into).collect();

    let worker = Arc::clone(&state);
    let analysis = tokio::task::spawn_blocking(move || worker.analyze(&sheets, &source)).await??;
    Ok(Json(analysis))
}
