//! File Intake Store — persists uploaded resumes under their original names.

use std::path::{Path, PathBuf};

use anyhow::Context;
use bytes::Bytes;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;

/// One file from a multipart upload.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub original_name: String,
    pub bytes: Bytes,
}

impl UploadedFile {
    pub fn new(original_name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            original_name: original_name.into(),
            bytes: bytes.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct IntakeStore {
    root: PathBuf,
}

impl IntakeStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn batch_dir(&self, batch_id: Uuid) -> PathBuf {
        self.root.join(batch_id.to_string())
    }

    /// Creates the upload root (and parents) and pins it to an absolute path,
    /// so stored paths stay valid for processes with another working directory.
    /// Called once at startup.
    pub fn ensure_root(&mut self) -> anyhow::Result<()> {
        std::fs::create_dir_all(&self.root)
            .with_context(|| format!("failed to create upload directory {}", self.root.display()))?;
        self.root = std::fs::canonicalize(&self.root)
            .with_context(|| format!("failed to resolve upload directory {}", self.root.display()))?;
        Ok(())
    }

    /// Writes every file verbatim into the batch directory, in order.
    /// Duplicate names overwrite earlier files of the same batch.
    pub async fn store(
        &self,
        batch_id: Uuid,
        files: &[UploadedFile],
    ) -> Result<Vec<PathBuf>, AppError> {
        if files.is_empty() {
            return Err(AppError::EmptyBatch);
        }
        let names = files
            .iter()
            .map(|f| file_name_of(&f.original_name))
            .collect::<Result<Vec<_>, _>>()?;

        let dir = self.batch_dir(batch_id);
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("failed to create {}", dir.display()))?;

        let mut paths = Vec::with_capacity(files.len());
        for (file, name) in files.iter().zip(names) {
            let path = dir.join(name);
            tokio::fs::write(&path, &file.bytes)
                .await
                .with_context(|| format!("failed to write {}", path.display()))?;
            paths.push(path);
        }

        info!(%batch_id, files = paths.len(), "Batch stored");
        Ok(paths)
    }
}

/// Keeps the client-supplied name but only its last path component, so a
/// name like `../../etc/passwd` or `C:\cv\resume.pdf` stays inside the batch.
fn file_name_of(original: &str) -> Result<&str, AppError> {
    let name = original.rsplit(['/', '\\']).next().unwrap_or_default();
    match name.trim() {
        "" | "." | ".." => Err(AppError::Validation(format!(
            "Invalid file name '{original}'"
        ))),
        _ => Ok(name),
    }
}
