//! External Scorer — the seam to the out-of-process resume ranking program.
//!
//! `AppState` holds an `Arc<dyn Scorer>`. Production uses `ProcessScorer`;
//! tests swap in stubs without touching the workflow or handlers.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::ScorerConfig;
use crate::errors::AppError;

// ────────────────────────────────────────────────────────────────────────────
// Manifest handed to the scorer
// ────────────────────────────────────────────────────────────────────────────

/// Describes one batch to the scorer. Serialized as JSON next to the
/// batch's job-description document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScoringManifest {
    pub batch_id: Uuid,
    pub resume_dir: PathBuf,
    pub resumes: Vec<PathBuf>,
    /// Absent when the batch was submitted without a job description.
    pub job_description_path: Option<PathBuf>,
    pub created_at: DateTime<Utc>,
}

/// A single scorer run.
#[derive(Debug, Clone)]
pub struct ScorerInvocation {
    pub batch_id: Uuid,
    pub manifest_path: PathBuf,
}

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

#[async_trait]
pub trait Scorer: Send + Sync {
    /// Runs the scorer to completion and returns its captured stdout.
    /// Any failure (launch, nonzero exit, timeout) is `ScriptExecutionFailed`.
    async fn run(&self, invocation: &ScorerInvocation) -> Result<String, AppError>;
}

// ────────────────────────────────────────────────────────────────────────────
// ProcessScorer
// ────────────────────────────────────────────────────────────────────────────

/// Launches the configured program with the manifest path as its last
/// argument, waiting at most `config.timeout`.
pub struct ProcessScorer {
    config: ScorerConfig,
}

impl ProcessScorer {
    pub fn new(config: ScorerConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Scorer for ProcessScorer {
    async fn run(&self, invocation: &ScorerInvocation) -> Result<String, AppError> {
        let cfg = &self.config;
        info!(
            batch_id = %invocation.batch_id,
            program = %cfg.program,
            "Starting scorer"
        );

        let child = Command::new(&cfg.program)
            .args(&cfg.args)
            .arg(&invocation.manifest_path)
            .current_dir(&cfg.workdir)
            .env("SCORER_MANIFEST", &invocation.manifest_path)
            .env("SCORER_BATCH_ID", invocation.batch_id.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| AppError::ScriptExecutionFailed {
                detail: format!("failed to launch '{}': {e}", cfg.program),
            })?;

        // On timeout the child is dropped, and kill_on_drop terminates it.
        let output = match tokio::time::timeout(cfg.timeout, child.wait_with_output()).await {
            Ok(result) => result.map_err(|e| AppError::ScriptExecutionFailed {
                detail: format!("failed to wait for scorer: {e}"),
            })?,
            Err(_) => {
                warn!(batch_id = %invocation.batch_id, "Scorer timed out");
                return Err(AppError::ScriptExecutionFailed {
                    detail: format!("scorer timed out after {}s", cfg.timeout.as_secs_f32()),
                });
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(
                batch_id = %invocation.batch_id,
                status = %output.status,
                "Scorer exited unsuccessfully"
            );
            return Err(AppError::ScriptExecutionFailed {
                detail: format!("scorer {}: {}", output.status, stderr.trim()),
            });
        }

        info!(batch_id = %invocation.batch_id, "Scorer finished");
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
