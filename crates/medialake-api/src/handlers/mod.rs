//! Request handlers for the media endpoints.

pub mod health;
pub mod media_archive;
pub mod media_get;
pub mod media_stream;
pub mod media_upload;
pub mod upload_status;

use axum::http::HeaderMap;
use medialake_core::AppError;
use uuid::Uuid;

pub(crate) const USER_ID_HEADER: &str = "x-user-id";

/// Read the optional requester id header. Absent means anonymous; a present
/// but malformed value is rejected rather than silently ignored.
pub(crate) fn user_id_from_headers(headers: &HeaderMap) -> Result<Option<Uuid>, AppError> {
    let Some(value) = headers.get(USER_ID_HEADER) else {
        return Ok(None);
    };
    let raw = value
        .to_str()
        .map_err(|_| AppError::InvalidInput("x-user-id header is not valid UTF-8".to_string()))?;
    let id = Uuid::parse_str(raw)
        .map_err(|_| AppError::InvalidInput(format!("Invalid x-user-id header: {}", raw)))?;
    Ok(Some(id))
}
