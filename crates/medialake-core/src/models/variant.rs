use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Derived, resized copy of an original image.
///
/// Composite key `(upload_id, size_type)`. A row exists iff the resized
/// bytes exist at `{upload_id}.{size_type}.{extension}` in the images
/// bucket; the resolver treats absence of either as not found.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ImageVariant {
    pub upload_id: Uuid,
    pub size_type: String,
    pub mime_type: String,
    pub width: i32,
    pub height: i32,
    pub created_at: DateTime<Utc>,
}

/// Metadata row for an ingested document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Document {
    pub upload_id: Uuid,
    pub mime_type: String,
    pub created_at: DateTime<Utc>,
}

/// Metadata row for an ingested video.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Video {
    pub upload_id: Uuid,
    pub mime_type: String,
    pub created_at: DateTime<Utc>,
}
