use serde::Serialize;
use uuid::Uuid;

use crate::error::{AppError, ErrorMetadata};

use super::group::{Bucket, Group};

/// Pixel dimensions of a decoded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Error attached to a single file of a batch; never persisted, surfaced
/// once in the batch response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorInfo {
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
}

impl ErrorInfo {
    /// Build the per-file view of an [`AppError`]. Internal detail is only
    /// included when `include_detail` is set (debug builds / non-production).
    pub fn from_app_error(err: &AppError, file_name: Option<String>, include_detail: bool) -> Self {
        let detail = if include_detail || !err.is_sensitive() {
            Some(err.detailed_message())
        } else {
            None
        };
        ErrorInfo {
            status: err.http_status_code(),
            code: Some(err.error_code().to_string()),
            title: err.client_message(),
            detail,
            file_name,
        }
    }
}

/// In-flight record of one uploaded file.
///
/// Created when a multipart file part begins, mutated as bytes flush to the
/// store and post-write checks run, immutable once returned from the
/// pipeline. Group and bucket are decided once at classification time and
/// never revised.
#[derive(Debug, Clone, Serialize)]
pub struct FileDescriptor {
    pub id: Uuid,
    pub key: String,
    pub extension: String,
    pub mime_type: String,
    pub filename: String,
    pub size: u64,
    pub is_saved: bool,
    pub group: Group,
    pub bucket: Bucket,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<Dimensions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview_url: Option<String>,
    #[serde(skip)]
    pub error: Option<ErrorInfo>,
}

impl FileDescriptor {
    /// Stored, classified, and past post-write validation.
    pub fn is_succeeded(&self) -> bool {
        self.is_saved && self.error.is_none()
    }
}
