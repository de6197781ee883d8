//! Batch upload handler
//!
//! Accepts a multipart body, turns every file field into an `IncomingFile`,
//! and hands the batch to the ingestion pipeline. The response always carries
//! both `files` and `errors` so clients can render partial success.

use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    http::HeaderMap,
    response::IntoResponse,
    Json,
};
use medialake_core::AppError;
use medialake_services::IncomingFile;
use uuid::Uuid;

use crate::error::HttpAppError;
use crate::handlers::user_id_from_headers;
use crate::state::AppState;

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

#[tracing::instrument(skip(state, multipart), fields(operation = "upload_media"))]
pub async fn upload_media(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, HttpAppError> {
    // Anonymous uploads are owned by the nil user.
    let user_id = user_id_from_headers(&headers)?.unwrap_or_else(Uuid::nil);

    let mut batch = Vec::new();
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        HttpAppError(AppError::InvalidInput(format!(
            "Malformed multipart body: {}",
            e
        )))
    })? {
        // Fields without a filename are form metadata, not files.
        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };
        let content_type = field
            .content_type()
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_string();
        let data = field.bytes().await.map_err(|e| {
            HttpAppError(AppError::InvalidInput(format!(
                "Failed to read multipart field {}: {}",
                filename, e
            )))
        })?;
        batch.push(IncomingFile {
            filename,
            content_type,
            data,
        });
    }

    if batch.is_empty() {
        return Err(AppError::BadRequest("No files in upload".to_string()).into());
    }

    let report = state.pipeline.ingest(user_id, batch).await?;
    Ok(Json(report))
}
