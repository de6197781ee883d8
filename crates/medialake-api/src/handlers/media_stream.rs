//! Range-seekable video streaming
//!
//! `GET /media/stream/{public_id}` serves the primary object of a videos
//! upload through the pull-based range reader. An explicit `Range` header
//! yields a 206 with `Content-Range`; otherwise the whole object is
//! auto-chunked under a 200. Non-video uploads are not streamable.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::Response,
};
use futures::StreamExt;
use medialake_core::classifier::content_type_for_extension;
use medialake_core::models::Group;
use medialake_core::AppError;
use medialake_services::{RangeStreamReader, ResolveMode, ResolvedContent};
use medialake_storage::keys;

use crate::error::HttpAppError;
use crate::handlers::user_id_from_headers;
use crate::state::AppState;

#[tracing::instrument(skip(state, headers), fields(public_id = %public_id))]
pub async fn stream_media(
    State(state): State<Arc<AppState>>,
    Path(public_id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, HttpAppError> {
    let user_id = user_id_from_headers(&headers)?;

    let resolved = state
        .resolver
        .resolve(&public_id, user_id, ResolveMode::Group)
        .await?;
    let group = match resolved {
        ResolvedContent::Group(group) => group,
        ResolvedContent::Stream { .. } => {
            return Err(AppError::Internal(
                "Resolver returned a stream in group mode".to_string(),
            )
            .into());
        }
    };
    if group != Group::Videos {
        return Err(
            AppError::NotFound(format!("No streamable object for {}", public_id)).into(),
        );
    }

    let parsed = keys::parse_public_id(&public_id)
        .ok_or_else(|| AppError::BadRequest(format!("Invalid public id: {}", public_id)))?;

    let range_header = headers
        .get(header::RANGE)
        .map(|value| {
            value
                .to_str()
                .map_err(|_| AppError::BadRequest("Range header is not valid UTF-8".to_string()))
        })
        .transpose()?;

    let reader = RangeStreamReader::open(
        Arc::clone(&state.gateway),
        group.bucket(),
        public_id.clone(),
        0,
        range_header,
        state.config.media.stream_chunk_size_bytes,
    )
    .await?;

    let mut builder = Response::builder()
        .header(
            header::CONTENT_TYPE,
            content_type_for_extension(&parsed.extension),
        )
        .header(header::ACCEPT_RANGES, "bytes")
        .header(header::CONTENT_LENGTH, reader.remaining_length());

    builder = match reader.content_range() {
        Some(content_range) => builder
            .status(StatusCode::PARTIAL_CONTENT)
            .header(header::CONTENT_RANGE, content_range),
        None => builder.status(StatusCode::OK),
    };

    let body_stream = reader
        .into_stream()
        .map(|result| result.map_err(|e| std::io::Error::other(e.to_string())));

    builder
        .body(Body::from_stream(body_stream))
        .map_err(|e| HttpAppError(AppError::Internal(format!("Failed to build response: {}", e))))
}
