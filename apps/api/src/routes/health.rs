use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::llm_client::ModelState;
use crate::state::AppState;

/// GET /
/// Service banner: readiness flag plus the active model identifier.
pub async fn root_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "message": "Resume Screener API - Powered by Google Gemini",
        "status": if state.model.is_ready() { "ready" } else { "error" },
        "model": state.model.model_name().unwrap_or("unknown"),
    }))
}

/// GET /health
/// Liveness probe that also exercises the completion client with a trivial
/// prompt, reporting a short snippet of whatever came back.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    match &state.model {
        ModelState::Ready { name, client } => {
            match client.complete("Say 'API is working'").await {
                Ok(text) => Json(json!({
                    "status": "healthy",
                    "api": "google-gemini",
                    "model": name,
                    "test": text.chars().take(50).collect::<String>(),
                })),
                Err(e) => Json(json!({
                    "status": "error",
                    "api": "google-gemini",
                    "model": name,
                    "error": e.to_string(),
                })),
            }
        }
        ModelState::Unavailable { reason } => Json(json!({
            "status": "error",
            "message": format!("Model not initialized: {reason}"),
            "tip": "Check /list-models",
        })),
    }
}
