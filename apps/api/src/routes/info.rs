use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::llm_client::ModelState;
use crate::state::AppState;

/// GET /list-models
/// Enumerates upstream models usable for text generation. Failures come
/// back as an `{error}` object, matching the other status endpoints.
pub async fn list_models_handler(State(state): State<AppState>) -> Json<Value> {
    match &state.model {
        ModelState::Ready { client, .. } => match client.list_generation_models().await {
            Ok(models) => Json(json!({ "available_models": models })),
            Err(e) => Json(json!({ "error": e.to_string() })),
        },
        ModelState::Unavailable { reason } => Json(json!({ "error": reason })),
    }
}

/// GET /usage-info
/// Static capability and pricing description; no business logic.
pub async fn usage_info_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "api": "Google Gemini",
        "model": state.model.model_name().unwrap_or("unknown"),
        "model_status": if state.model.is_ready() { "working" } else { "not initialized" },
        "pricing": "Free tier - 60 queries per minute",
        "daily_limit": "1,500 requests per day before paid tier",
        "cost_per_resume": "$0.00 within the free tier",
        "tips": [
            "Gemini 1.5 Flash covers this workload within the free tier",
            "60 requests per minute supports sustained bulk screening",
            "Check /list-models to see all available models",
        ],
    }))
}
