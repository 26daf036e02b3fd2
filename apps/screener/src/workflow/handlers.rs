use axum::{
    extract::{rejection::JsonRejection, Multipart, State},
    Json,
};

use crate::errors::AppError;
use crate::intake::UploadedFile;
use crate::state::AppState;
use crate::workflow::{ProcessRequest, ProcessResponse, SubmitResponse};

/// POST /api/upload
///
/// Multipart fields: `files` (repeatable) and an optional `jobDescription`.
/// Unknown fields are ignored.
pub async fn handle_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<SubmitResponse>, AppError> {
    let mut files = Vec::new();
    let mut job_description = String::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed upload: {e}")))?
    {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("files") => {
                let original_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read '{original_name}': {e}")))?;
                files.push(UploadedFile::new(original_name, bytes));
            }
            Some("jobDescription") => {
                job_description = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Invalid job description: {e}")))?;
            }
            _ => {}
        }
    }

    let response = state.workflow.submit(files, job_description).await?;
    Ok(Json(response))
}

/// POST /api/run-script
///
/// A body that is not a valid `ProcessRequest` is reported through the same
/// JSON error envelope as every other 400.
pub async fn handle_run_script(
    State(state): State<AppState>,
    payload: Result<Json<ProcessRequest>, JsonRejection>,
) -> Result<Json<ProcessResponse>, AppError> {
    let Json(req) = payload.map_err(|rejection| {
        AppError::Validation(format!("Invalid request body: {}", rejection.body_text()))
    })?;
    let response = state.workflow.process(req).await?;
    Ok(Json(response))
}
