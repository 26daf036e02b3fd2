use crate::config::Config;
use crate::workflow::Workflow;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Upload store, job-description root, page layout and the pluggable scorer.
    pub workflow: Workflow,
}
