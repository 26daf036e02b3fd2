pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::state::AppState;
use crate::workflow::handlers;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/upload", post(handlers::handle_upload))
        .route("/api/run-script", post(handlers::handle_run_script))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
