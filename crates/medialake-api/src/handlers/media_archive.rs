//! Batch zip export
//!
//! `POST /media/archive` takes `[{id, name}]` and responds with a zip
//! attachment whose entries are `name.<ext>` in request order.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::Response,
};
use medialake_core::AppError;
use medialake_services::ArchiveRequest;
use serde::Deserialize;

use crate::error::{HttpAppError, ValidatedJson};
use crate::handlers::user_id_from_headers;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ArchiveItem {
    pub id: String,
    pub name: String,
}

#[tracing::instrument(skip(state, headers, items), fields(entries = items.len()))]
pub async fn archive_media(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    ValidatedJson(items): ValidatedJson<Vec<ArchiveItem>>,
) -> Result<Response, HttpAppError> {
    let user_id = user_id_from_headers(&headers)?;

    let requests: Vec<ArchiveRequest> = items
        .into_iter()
        .map(|item| ArchiveRequest {
            public_id: item.id,
            name: item.name,
        })
        .collect();

    let data = state.archive.archive(user_id, &requests).await?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/zip")
        .header(
            header::CONTENT_DISPOSITION,
            "attachment; filename=\"archive.zip\"",
        )
        .header(header::CONTENT_LENGTH, data.len())
        .body(Body::from(data))
        .map_err(|e| HttpAppError(AppError::Internal(format!("Failed to build response: {}", e))))
}
