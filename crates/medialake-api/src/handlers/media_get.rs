//! Whole-object retrieval
//!
//! `GET /media/{public_id}` streams the object with a content type inferred
//! from the key extension. `?mode=group` short-circuits to a JSON group
//! lookup; `?download=<name>` switches the disposition to an attachment
//! named `<name>.<ext>`.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use futures::StreamExt;
use medialake_core::AppError;
use medialake_services::{ResolveMode, ResolvedContent};
use medialake_storage::keys;
use serde::Deserialize;

use crate::error::HttpAppError;
use crate::handlers::user_id_from_headers;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct GetMediaQuery {
    pub mode: Option<String>,
    pub download: Option<String>,
}

#[tracing::instrument(skip(state, headers), fields(public_id = %public_id))]
pub async fn get_media(
    State(state): State<Arc<AppState>>,
    Path(public_id): Path<String>,
    Query(query): Query<GetMediaQuery>,
    headers: HeaderMap,
) -> Result<Response, HttpAppError> {
    let user_id = user_id_from_headers(&headers)?;

    let mode = match query.mode.as_deref() {
        Some("group") => ResolveMode::Group,
        Some(other) => {
            return Err(AppError::BadRequest(format!("Unknown mode: {}", other)).into());
        }
        None => ResolveMode::Content,
    };

    match state.resolver.resolve(&public_id, user_id, mode).await? {
        ResolvedContent::Group(group) => {
            Ok(Json(serde_json::json!({ "group": group })).into_response())
        }
        ResolvedContent::Stream { content_type, body } => {
            let disposition = match &query.download {
                Some(name) => {
                    let parsed = keys::parse_public_id(&public_id).ok_or_else(|| {
                        AppError::BadRequest(format!("Invalid public id: {}", public_id))
                    })?;
                    format!(
                        "attachment; filename=\"{}.{}\"",
                        sanitize_filename(name),
                        parsed.extension
                    )
                }
                None => "inline".to_string(),
            };

            let body_stream = body.map(|result| {
                result.map_err(|e| std::io::Error::other(format!("Storage stream error: {}", e)))
            });

            Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, content_type)
                .header(header::CONTENT_DISPOSITION, disposition)
                .body(Body::from_stream(body_stream))
                .map_err(|e| {
                    HttpAppError(AppError::Internal(format!("Failed to build response: {}", e)))
                })
        }
    }
}

/// Keep the requested download name header-safe.
fn sanitize_filename(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_control() && !matches!(c, '"' | '\\' | '/'))
        .collect()
}
