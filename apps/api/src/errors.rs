#![allow(dead_code)]

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::screening::MAX_BATCH_SIZE;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
///
/// Every variant maps to a user-visible `{error, message?, tip?}` body.
/// `to_body` is exposed separately so bulk screening can embed the same
/// object in a per-document result slot without going through a response.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("model not initialized: {0}")]
    ModelUnavailable(String),

    #[error("document extraction failed: {0}")]
    Extraction(String),

    #[error("completion request failed: {0}")]
    Upstream(String),

    #[error("batch of {0} exceeds the {max}-resume cap", max = MAX_BATCH_SIZE)]
    BatchSize(usize),

    #[error("invalid request: {0}")]
    BadRequest(String),

    #[error("internal server error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// The user-visible JSON body for this error.
    pub fn to_body(&self) -> Value {
        match self {
            AppError::ModelUnavailable(_) => json!({
                "error": "Model not initialized",
                "message": "Please check /list-models to see available models",
                "tip": "Set GEMINI_API_KEY (and optionally GEMINI_MODEL) and restart",
            }),
            AppError::Extraction(detail) => json!({
                "error": detail,
                "message": "Failed to process resume",
                "tip": "Make sure the file is a valid PDF and try again",
            }),
            AppError::Upstream(detail) => json!({
                "error": detail,
                "message": "Failed to process resume",
                "tip": "Check /list-models for available models",
            }),
            AppError::BatchSize(_) => json!({
                "error": format!("Maximum {MAX_BATCH_SIZE} resumes per batch"),
            }),
            AppError::BadRequest(detail) => json!({ "error": detail }),
            AppError::Internal(_) => json!({
                "error": "Internal server error",
                "message": "An unexpected error occurred",
            }),
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::ModelUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Extraction(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::BatchSize(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Upstream(detail) => tracing::error!("upstream completion error: {detail}"),
            AppError::Internal(e) => tracing::error!("internal error: {e:?}"),
            _ => {}
        }
        (self.status(), Json(self.to_body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extraction_body_has_message_and_tip() {
        let body = AppError::Extraction("bad pdf".to_string()).to_body();
        assert_eq!(body["error"], "bad pdf");
        assert_eq!(body["message"], "Failed to process resume");
        assert_eq!(body["tip"], "Make sure the file is a valid PDF and try again");
    }

    #[test]
    fn test_upstream_tip_points_at_list_models() {
        let body = AppError::Upstream("429".to_string()).to_body();
        assert_eq!(body["tip"], "Check /list-models for available models");
    }

    #[test]
    fn test_batch_size_body_names_the_cap() {
        let body = AppError::BatchSize(11).to_body();
        assert_eq!(body["error"], "Maximum 10 resumes per batch");
        assert!(body.get("tip").is_none());
    }

    #[test]
    fn test_model_unavailable_maps_to_503() {
        let response = AppError::ModelUnavailable("no key".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_batch_size_maps_to_400() {
        let response = AppError::BatchSize(11).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_upstream_maps_to_502() {
        let response = AppError::Upstream("down".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
