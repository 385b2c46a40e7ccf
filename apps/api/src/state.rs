use std::sync::Arc;

use crate::llm_client::ModelState;
use crate::screening::Screener;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Model initialization result, computed once at startup.
    pub model: ModelState,
    pub screener: Arc<Screener>,
}
