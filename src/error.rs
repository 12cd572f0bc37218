use axum::{
    response::{IntoResponse, Response},
    http::StatusCode,
};
use serde_json::json;
use axum::Json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SheetError {
    /// A declared column kind is contradicted by the column's own values.
    #[error("Malformed column '{column}': {reason}")]
    MalformedColumn { column: String, reason: String },
    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Fetch error: {0}")]
    Fetch(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<std::io::Error> for SheetError {
    fn from(err: std::io::Error) -> Self {
        SheetError::SourceUnavailable(err.to_string())
    }
}

impl From<tokio::task::JoinError> for SheetError {
    fn from(err: tokio::task::JoinError) -> Self {
        SheetError::Internal(err.to_string())
    }
}

impl SheetError {
    pub fn status(&self) -> StatusCode {
        match self {
            SheetError::MalformedColumn { .. } => StatusCode::BAD_REQUEST,
            SheetError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            SheetError::SourceUnavailable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            SheetError::Fetch(_) => StatusCode::BAD_GATEWAY,
            SheetError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for SheetError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}
