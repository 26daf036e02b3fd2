//! Post-scoring housekeeping. Every removal tolerates a file that is already gone.

use std::io::ErrorKind;
use std::path::Path;

use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;

/// Removes a batch's job-description directory (document + manifest) and every
/// entry inside its upload directory, then the directories themselves.
pub async fn cleanup(batch_id: Uuid, upload_dir: &Path, jobdesc_dir: &Path) -> Result<(), AppError> {
    clear_dir(jobdesc_dir).await?;
    clear_dir(upload_dir).await?;
    info!(%batch_id, "Batch cleaned up");
    Ok(())
}

async fn clear_dir(dir: &Path) -> Result<(), AppError> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(cleanup_error(dir, e)),
    };

    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| cleanup_error(dir, e))?
    {
        let path = entry.path();
        let is_dir = entry
            .file_type()
            .await
            .map(|t| t.is_dir())
            .unwrap_or(false);
        let removed = if is_dir {
            tokio::fs::remove_dir_all(&path).await
        } else {
            tokio::fs::remove_file(&path).await
        };
        ignore_missing(removed).map_err(|e| cleanup_error(&path, e))?;
    }

    ignore_missing(tokio::fs::remove_dir(dir).await).map_err(|e| cleanup_error(dir, e))
}

fn ignore_missing(result: std::io::Result<()>) -> std::io::Result<()> {
    match result {
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

fn cleanup_error(path: &Path, e: std::io::Error) -> AppError {
    AppError::CleanupFailed {
        detail: format!("{}: {e}", path.display()),
        output: String::new(),
    }
}
