pub mod health;
pub mod info;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::screening::handlers;
use crate::state::AppState;

/// Uploads are PDFs; axum's default 2 MB body cap is too small for scanned
/// documents.
const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health::root_handler))
        .route("/health", get(health::health_handler))
        .route("/list-models", get(info::list_models_handler))
        .route("/usage-info", get(info::usage_info_handler))
        .route("/screen-resume", post(handlers::screen_resume_handler))
        .route("/bulk-screen", post(handlers::bulk_screen_handler))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}
