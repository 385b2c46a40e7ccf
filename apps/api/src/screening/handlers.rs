//! HTTP handlers for the screening endpoints. Multipart decoding lives
//! here; everything past the form boundary is the Screener's job.

use axum::extract::{Multipart, State};
use axum::Json;
use bytes::Bytes;
use serde_json::Value;

use crate::errors::AppError;
use crate::screening::BulkScreenResponse;
use crate::state::AppState;

/// POST /screen-resume
/// Multipart form: one document file field plus an optional
/// `job_requirements` text field.
pub async fn screen_resume_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<Value>, AppError> {
    let mut document: Option<Bytes> = None;
    let mut job_requirements = String::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("invalid multipart body: {e}")))?
    {
        if field.name() == Some("job_requirements") {
            job_requirements = field
                .text()
                .await
                .map_err(|e| AppError::BadRequest(format!("unreadable job_requirements: {e}")))?;
        } else if document.is_none() {
            document = Some(
                field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("unreadable file field: {e}")))?,
            );
        }
    }

    let document =
        document.ok_or_else(|| AppError::BadRequest("missing 'file' field".to_string()))?;

    let result = state
        .screener
        .screen_one(&document, &job_requirements)
        .await?;
    Ok(Json(Value::Object(result)))
}

/// POST /bulk-screen
/// Multipart form: up to ten document file fields plus an optional
/// `job_requirements` text field.
pub async fn bulk_screen_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<BulkScreenResponse>, AppError> {
    let mut documents: Vec<(String, Bytes)> = Vec::new();
    let mut job_requirements = String::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("invalid multipart body: {e}")))?
    {
        if field.name() == Some("job_requirements") {
            job_requirements = field
                .text()
                .await
                .map_err(|e| AppError::BadRequest(format!("unreadable job_requirements: {e}")))?;
            continue;
        }

        let filename = field.file_name().unwrap_or("resume.pdf").to_string();
        let bytes = field.bytes().await.map_err(|e| {
            AppError::BadRequest(format!("unreadable file field '{filename}': {e}"))
        })?;
        documents.push((filename, bytes));
    }

    if documents.is_empty() {
        return Err(AppError::BadRequest("no files uploaded".to_string()));
    }

    let response = state
        .screener
        .screen_batch(documents, &job_requirements)
        .await?;
    Ok(Json(response))
}
