mod config;
mod document;
mod errors;
mod intake;
mod routes;
mod scorer;
mod state;
mod workflow;

use anyhow::Result;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use std::sync::Arc;

use crate::config::Config;
use crate::document::default_page_layout;
use crate::intake::IntakeStore;
use crate::routes::build_router;
use crate::scorer::ProcessScorer;
use crate::state::AppState;
use crate::workflow::Workflow;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting screener v{}", env!("CARGO_PKG_VERSION"));

    let mut workflow = Workflow {
        intake: IntakeStore::new(&config.uploads_dir),
        jobdesc_root: config.jobdesc_dir.clone(),
        page_layout: default_page_layout(),
        scorer: Arc::new(ProcessScorer::new(config.scorer.clone())),
    };
    workflow.ensure_dirs()?;
    info!(
        "Uploads in {}, job descriptions in {}",
        workflow.intake.root().display(),
        workflow.jobdesc_root.display()
    );
    info!(
        "Scorer: {} {:?} (timeout {}s)",
        config.scorer.program,
        config.scorer.args,
        config.scorer.timeout.as_secs()
    );

    let state = AppState {
        config: config.clone(),
        workflow,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
