//! Workflow Orchestrator — the two-phase submit/process protocol.
//!
//! `submit` stores a batch and renders its job description; `process` runs the
//! scorer over a previously submitted batch and cleans it up on success. No
//! session state is kept between the two calls: the filesystem is the state,
//! and the client echoes back the paths (and batch id) it received from `submit`.

pub mod cleanup;
pub mod handlers;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::document::{self, PageLayout, JOB_DESCRIPTION_FILE};
use crate::errors::AppError;
use crate::intake::{IntakeStore, UploadedFile};
use crate::scorer::{Scorer, ScorerInvocation, ScoringManifest};

pub const MANIFEST_FILE: &str = "manifest.json";

// ────────────────────────────────────────────────────────────────────────────
// Wire types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub message: String,
    pub batch_id: Uuid,
    pub file_paths: Vec<String>,
    pub job_description: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessRequest {
    #[serde(default)]
    pub file_paths: Vec<String>,
    /// Optional; when absent the batch is read off the file paths.
    #[serde(default)]
    pub batch_id: Option<Uuid>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProcessResponse {
    pub message: String,
    pub output: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Orchestrator
// ────────────────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct Workflow {
    pub intake: IntakeStore,
    pub jobdesc_root: PathBuf,
    pub page_layout: PageLayout,
    pub scorer: Arc<dyn Scorer>,
}

impl Workflow {
    /// Creates the upload and job-description roots and makes both absolute,
    /// since the scorer runs in its own working directory. Called once at startup.
    pub fn ensure_dirs(&mut self) -> anyhow::Result<()> {
        self.intake.ensure_root()?;
        std::fs::create_dir_all(&self.jobdesc_root).with_context(|| {
            format!(
                "failed to create job description directory {}",
                self.jobdesc_root.display()
            )
        })?;
        self.jobdesc_root = std::fs::canonicalize(&self.jobdesc_root).with_context(|| {
            format!(
                "failed to resolve job description directory {}",
                self.jobdesc_root.display()
            )
        })?;
        Ok(())
    }

    pub fn jobdesc_dir(&self, batch_id: Uuid) -> PathBuf {
        self.jobdesc_root.join(batch_id.to_string())
    }

    pub fn document_path(&self, batch_id: Uuid) -> PathBuf {
        self.jobdesc_dir(batch_id).join(JOB_DESCRIPTION_FILE)
    }

    pub async fn submit(
        &self,
        files: Vec<UploadedFile>,
        job_description: String,
    ) -> Result<SubmitResponse, AppError> {
        if files.is_empty() {
            return Err(AppError::EmptyBatch);
        }

        let batch_id = Uuid::new_v4();
        let paths = self.intake.store(batch_id, &files).await?;

        if !job_description.is_empty() {
            document::render(
                job_description.clone(),
                self.document_path(batch_id),
                self.page_layout.clone(),
            )
            .await?;
        }

        Ok(SubmitResponse {
            message: "Files uploaded successfully".to_string(),
            batch_id,
            file_paths: paths.iter().map(|p| p.display().to_string()).collect(),
            job_description,
        })
    }

    pub async fn process(&self, request: ProcessRequest) -> Result<ProcessResponse, AppError> {
        if request.file_paths.is_empty() {
            return Err(AppError::NothingToProcess);
        }
        let batch_id = resolve_batch(&request)?;

        let batch_dir = self.intake.batch_dir(batch_id);
        if !tokio::fs::try_exists(&batch_dir).await.unwrap_or(false) {
            return Err(AppError::Validation(format!("Unknown batch {batch_id}")));
        }

        let manifest_path = self.write_manifest(batch_id, &request.file_paths).await?;

        // Failure here leaves every file in place so the client can retry.
        let output = self
            .scorer
            .run(&ScorerInvocation {
                batch_id,
                manifest_path,
            })
            .await?;

        cleanup::cleanup(batch_id, &batch_dir, &self.jobdesc_dir(batch_id))
        .await
        .map_err(|e| match e {
            AppError::CleanupFailed { detail, .. } => AppError::CleanupFailed {
                detail,
                output: output.clone(),
            },
            other => other,
        })?;

        info!(%batch_id, "Batch processed");
        Ok(ProcessResponse {
            message: "Script executed successfully".to_string(),
            output,
        })
    }

    async fn write_manifest(&self, batch_id: Uuid, file_paths: &[String]) -> Result<PathBuf, AppError> {
        let dir = self.jobdesc_dir(batch_id);
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("failed to create {}", dir.display()))?;

        let document = self.document_path(batch_id);
        let has_document = tokio::fs::try_exists(&document).await.unwrap_or(false);

        let cwd = std::env::current_dir().context("failed to read working directory")?;
        let manifest = ScoringManifest {
            batch_id,
            resume_dir: self.intake.batch_dir(batch_id),
            resumes: file_paths.iter().map(|p| cwd.join(p)).collect(),
            job_description_path: has_document.then_some(document),
            created_at: chrono::Utc::now(),
        };
        let body = serde_json::to_vec_pretty(&manifest).context("failed to serialize manifest")?;

        let path = dir.join(MANIFEST_FILE);
        tokio::fs::write(&path, body)
            .await
            .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(path)
    }
}

/// Explicit batch id, or the UUID-named directory holding the first file.
fn resolve_batch(request: &ProcessRequest) -> Result<Uuid, AppError> {
    if let Some(id) = request.batch_id {
        return Ok(id);
    }
    request
        .file_paths
        .first()
        .and_then(|p| Path::new(p).parent())
        .and_then(|dir| dir.file_name())
        .and_then(|name| name.to_str())
        .and_then(|name| Uuid::parse_str(name).ok())
        .ok_or_else(|| {
            AppError::Validation("Unable to determine the batch for the given files".to_string())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::default_page_layout;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Scorer stand-in that records the manifest it was handed.
    struct StubScorer {
        result: Result<String, String>,
        seen: Mutex<Vec<ScoringManifest>>,
    }

    impl StubScorer {
        fn ok(output: &str) -> Arc<Self> {
            Arc::new(Self {
                result: Ok(output.to_string()),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn failing(detail: &str) -> Arc<Self> {
            Arc::new(Self {
                result: Err(detail.to_string()),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl Scorer for StubScorer {
        async fn run(&self, invocation: &ScorerInvocation) -> Result<String, AppError> {
            let raw = std::fs::read_to_string(&invocation.manifest_path).unwrap();
            let manifest: ScoringManifest = serde_json::from_str(&raw).unwrap();
            assert_eq!(manifest.batch_id, invocation.batch_id);
            self.seen.lock().unwrap().push(manifest);
            self.result
                .clone()
                .map_err(|detail| AppError::ScriptExecutionFailed { detail })
        }
    }

    fn make_workflow(root: &TempDir, scorer: Arc<dyn Scorer>) -> Workflow {
        let mut workflow = Workflow {
            intake: IntakeStore::new(root.path().join("uploads")),
            jobdesc_root: root.path().join("jobdesc"),
            page_layout: default_page_layout(),
            scorer,
        };
        workflow.ensure_dirs().unwrap();
        workflow
    }

    fn two_resumes() -> Vec<UploadedFile> {
        vec![
            UploadedFile::new("resume1.pdf", b"%PDF-1.4 one".to_vec()),
            UploadedFile::new("resume2.pdf", b"%PDF-1.4 two".to_vec()),
        ]
    }

    fn dir_len(path: &Path) -> usize {
        std::fs::read_dir(path).map(|d| d.count()).unwrap_or(0)
    }

    // ── submit ──────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_submit_empty_batch_rejected_regardless_of_description() {
        let root = TempDir::new().unwrap();
        let workflow = make_workflow(&root, StubScorer::ok(""));

        for jd in ["", "x"] {
            let result = workflow.submit(vec![], jd.to_string()).await;
            assert!(matches!(result, Err(AppError::EmptyBatch)));
        }
        assert_eq!(dir_len(workflow.intake.root()), 0);
        assert_eq!(dir_len(&workflow.jobdesc_root), 0);
    }

    #[tokio::test]
    async fn test_submit_stores_files_and_renders_description() {
        let root = TempDir::new().unwrap();
        let workflow = make_workflow(&root, StubScorer::ok(""));

        let response = workflow
            .submit(two_resumes(), "Full-stack role".to_string())
            .await
            .unwrap();

        assert_eq!(response.message, "Files uploaded successfully");
        assert_eq!(response.job_description, "Full-stack role");
        assert_eq!(response.file_paths.len(), 2);
        assert!(response.file_paths[0].ends_with("resume1.pdf"));
        assert!(response.file_paths[1].ends_with("resume2.pdf"));
        for path in &response.file_paths {
            assert!(Path::new(path).is_file());
        }
        // Rendered before the response was produced.
        assert!(workflow.document_path(response.batch_id).is_file());
    }

    #[tokio::test]
    async fn test_submit_without_description_skips_document() {
        let root = TempDir::new().unwrap();
        let workflow = make_workflow(&root, StubScorer::ok(""));

        let response = workflow.submit(two_resumes(), String::new()).await.unwrap();

        assert!(!workflow.document_path(response.batch_id).exists());
    }

    #[tokio::test]
    async fn test_concurrent_submits_do_not_collide() {
        let root = TempDir::new().unwrap();
        let workflow = make_workflow(&root, StubScorer::ok(""));

        let a = workflow.submit(two_resumes(), "Role A".to_string()).await.unwrap();
        let b = workflow.submit(two_resumes(), "Role B".to_string()).await.unwrap();

        assert_ne!(a.batch_id, b.batch_id);
        assert!(workflow.document_path(a.batch_id).is_file());
        assert!(workflow.document_path(b.batch_id).is_file());
        assert_eq!(dir_len(workflow.intake.root()), 2);
    }

    // ── process ─────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_process_empty_paths_rejected() {
        let root = TempDir::new().unwrap();
        let scorer = StubScorer::ok("Score: 87");
        let workflow = make_workflow(&root, scorer.clone());

        let result = workflow.process(ProcessRequest::default()).await;

        assert!(matches!(result, Err(AppError::NothingToProcess)));
        assert!(scorer.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_process_success_returns_output_and_cleans_up() {
        let root = TempDir::new().unwrap();
        let scorer = StubScorer::ok("Score: 87");
        let workflow = make_workflow(&root, scorer.clone());
        let submitted = workflow
            .submit(two_resumes(), "Full-stack role".to_string())
            .await
            .unwrap();

        let response = workflow
            .process(ProcessRequest {
                file_paths: submitted.file_paths.clone(),
                batch_id: None,
            })
            .await
            .unwrap();

        assert_eq!(response.message, "Script executed successfully");
        assert_eq!(response.output, "Score: 87");
        assert_eq!(dir_len(workflow.intake.root()), 0);
        assert!(!workflow.document_path(submitted.batch_id).exists());

        let seen = scorer.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].resumes.len(), 2);
        assert_eq!(
            seen[0].job_description_path,
            Some(workflow.document_path(submitted.batch_id))
        );
    }

    #[tokio::test]
    async fn test_process_without_description_still_cleans_up() {
        let root = TempDir::new().unwrap();
        let scorer = StubScorer::ok("Score: 12");
        let workflow = make_workflow(&root, scorer.clone());
        let submitted = workflow.submit(two_resumes(), String::new()).await.unwrap();

        workflow
            .process(ProcessRequest {
                file_paths: submitted.file_paths,
                batch_id: Some(submitted.batch_id),
            })
            .await
            .unwrap();

        assert_eq!(scorer.seen.lock().unwrap()[0].job_description_path, None);
        assert_eq!(dir_len(workflow.intake.root()), 0);
        assert!(!workflow.document_path(submitted.batch_id).exists());
    }

    #[tokio::test]
    async fn test_process_failure_leaves_files_for_retry() {
        let root = TempDir::new().unwrap();
        let workflow = make_workflow(&root, StubScorer::failing("exit status: 1"));
        let submitted = workflow
            .submit(two_resumes(), "Full-stack role".to_string())
            .await
            .unwrap();
        let document = workflow.document_path(submitted.batch_id);
        let document_bytes = std::fs::read(&document).unwrap();

        let result = workflow
            .process(ProcessRequest {
                file_paths: submitted.file_paths.clone(),
                batch_id: None,
            })
            .await;

        assert!(matches!(result, Err(AppError::ScriptExecutionFailed { .. })));
        for path in &submitted.file_paths {
            assert!(Path::new(path).is_file());
        }
        assert_eq!(dir_len(&workflow.intake.batch_dir(submitted.batch_id)), 2);
        assert_eq!(std::fs::read(&document).unwrap(), document_bytes);
    }

    #[tokio::test]
    async fn test_process_cleanup_failure_keeps_output() {
        let root = TempDir::new().unwrap();
        let workflow = make_workflow(&root, StubScorer::ok("Score: 87"));
        let batch_id = Uuid::new_v4();
        // A regular file where the batch directory should be cannot be listed.
        std::fs::write(workflow.intake.batch_dir(batch_id), b"not a directory").unwrap();

        let result = workflow
            .process(ProcessRequest {
                file_paths: vec!["resume1.pdf".to_string()],
                batch_id: Some(batch_id),
            })
            .await;

        match result {
            Err(AppError::CleanupFailed { output, .. }) => assert_eq!(output, "Score: 87"),
            other => panic!("expected CleanupFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_process_unknown_batch_rejected() {
        let root = TempDir::new().unwrap();
        let scorer = StubScorer::ok("");
        let workflow = make_workflow(&root, scorer.clone());

        let result = workflow
            .process(ProcessRequest {
                file_paths: vec!["uploads/resume1.pdf".to_string()],
                batch_id: None,
            })
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
        assert!(scorer.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_process_well_formed_but_unsubmitted_batch_writes_nothing() {
        let root = TempDir::new().unwrap();
        let scorer = StubScorer::ok("");
        let workflow = make_workflow(&root, scorer.clone());
        let batch_id = Uuid::new_v4();

        let result = workflow
            .process(ProcessRequest {
                file_paths: vec![workflow
                    .intake
                    .batch_dir(batch_id)
                    .join("resume1.pdf")
                    .display()
                    .to_string()],
                batch_id: None,
            })
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
        assert!(scorer.seen.lock().unwrap().is_empty());
        assert!(!workflow.jobdesc_dir(batch_id).exists());
        assert_eq!(dir_len(&workflow.jobdesc_root), 0);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_relative_roots_reach_scorer_in_other_workdir() {
        use crate::config::ScorerConfig;
        use crate::scorer::ProcessScorer;
        use std::time::Duration;

        let cwd = std::env::current_dir().unwrap();
        let base = tempfile::Builder::new()
            .prefix("screener-relative-")
            .tempdir_in(&cwd)
            .unwrap();
        let relative = base.path().strip_prefix(&cwd).unwrap().to_path_buf();
        assert!(relative.is_relative());
        let scorer_workdir = TempDir::new().unwrap();

        // Reads the manifest and the document next to it, both by the path it was given.
        let script = r#"cat "$1" >/dev/null && cat "$(dirname "$1")/job_description.pdf" >/dev/null && printf ok"#;
        let scorer = ProcessScorer::new(ScorerConfig {
            program: "sh".to_string(),
            args: vec!["-c".to_string(), script.to_string(), "scorer".to_string()],
            workdir: scorer_workdir.path().to_path_buf(),
            timeout: Duration::from_secs(10),
        });
        let mut workflow = Workflow {
            intake: IntakeStore::new(relative.join("uploads")),
            jobdesc_root: relative.join("jobdesc"),
            page_layout: default_page_layout(),
            scorer: Arc::new(scorer),
        };
        workflow.ensure_dirs().unwrap();
        assert!(workflow.intake.root().is_absolute());
        assert!(workflow.jobdesc_root.is_absolute());

        let submitted = workflow
            .submit(two_resumes(), "Full-stack role".to_string())
            .await
            .unwrap();
        for path in &submitted.file_paths {
            assert!(Path::new(path).is_absolute());
        }

        let response = workflow
            .process(ProcessRequest {
                file_paths: submitted.file_paths,
                batch_id: None,
            })
            .await
            .unwrap();

        assert_eq!(response.output, "ok");
        assert_eq!(dir_len(workflow.intake.root()), 0);
    }

    // ── resolve_batch ───────────────────────────────────────────────────────

    #[test]
    fn test_resolve_batch_prefers_explicit_id() {
        let explicit = Uuid::new_v4();
        let inferred = Uuid::new_v4();
        let request = ProcessRequest {
            file_paths: vec![format!("uploads/{inferred}/cv.pdf")],
            batch_id: Some(explicit),
        };
        assert_eq!(resolve_batch(&request).unwrap(), explicit);
    }

    #[test]
    fn test_resolve_batch_from_parent_directory() {
        let id = Uuid::new_v4();
        let request = ProcessRequest {
            file_paths: vec![format!("/srv/screener/uploads/{id}/cv.pdf")],
            batch_id: None,
        };
        assert_eq!(resolve_batch(&request).unwrap(), id);
    }
}
