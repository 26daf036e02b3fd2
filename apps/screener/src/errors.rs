use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("No files uploaded")]
    EmptyBatch,

    #[error("No files to process")]
    NothingToProcess,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Scorer failed: {detail}")]
    ScriptExecutionFailed { detail: String },

    /// The scorer succeeded but housekeeping did not. `output` is the scorer's stdout.
    #[error("Cleanup failed: {detail}")]
    CleanupFailed { detail: String, output: String },

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::EmptyBatch | AppError::NothingToProcess | AppError::Validation(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::ScriptExecutionFailed { .. }
            | AppError::CleanupFailed { .. }
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            AppError::EmptyBatch => json!({
                "message": "No files uploaded",
                "error": { "code": "EMPTY_BATCH", "detail": self.to_string() }
            }),
            AppError::NothingToProcess => json!({
                "message": "No files to process",
                "error": { "code": "NOTHING_TO_PROCESS", "detail": self.to_string() }
            }),
            AppError::Validation(msg) => json!({
                "message": msg,
                "error": { "code": "VALIDATION_ERROR", "detail": msg }
            }),
            AppError::ScriptExecutionFailed { detail } => {
                tracing::error!("Scorer failed: {detail}");
                json!({
                    "message": "Failed to run script",
                    "error": { "code": "SCRIPT_EXECUTION_FAILED", "detail": detail }
                })
            }
            AppError::CleanupFailed { detail, output } => {
                tracing::error!("Cleanup failed after successful scoring: {detail}");
                json!({
                    "message": "Error cleaning up",
                    "output": output,
                    "error": { "code": "CLEANUP_FAILED", "detail": detail }
                })
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                json!({
                    "message": "An internal server error occurred",
                    "error": { "code": "INTERNAL_ERROR", "detail": e.to_string() }
                })
            }
        };

        (status, Json(body)).into_response()
    }
}
