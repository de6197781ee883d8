//! Metadata persistence trait
//!
//! The `MetadataStore` trait covers the durable records behind ingestion:
//! Upload rows plus the per-group derivative rows (image variants,
//! documents, videos). Finishers insert derivative rows; the resolver reads
//! them back before streaming.

use async_trait::async_trait;
use medialake_core::models::{Document, Group, ImageVariant, Upload, UploadStatus, Video};
use medialake_core::AppError;
use uuid::Uuid;

#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Insert a new upload record in `Pending` state.
    async fn insert_upload(
        &self,
        id: Uuid,
        user_id: Uuid,
        group: Group,
    ) -> Result<Upload, AppError>;

    /// Look up an upload by id. Soft-deleted records are invisible.
    async fn find_upload(&self, id: Uuid) -> Result<Option<Upload>, AppError>;

    /// Look up an upload by id, failing with `NotFound` when absent.
    async fn get_upload(&self, id: Uuid) -> Result<Upload, AppError> {
        self.find_upload(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Upload {} not found", id)))
    }

    /// Transition an upload's lifecycle state. Fails with `NotFound` when
    /// the record does not exist.
    async fn set_upload_status(&self, id: Uuid, status: UploadStatus) -> Result<(), AppError>;

    /// Record a resized image variant. Keyed by `(upload_id, size_type)`.
    async fn insert_image_variant(
        &self,
        upload_id: Uuid,
        size_type: &str,
        mime_type: &str,
        width: i32,
        height: i32,
    ) -> Result<ImageVariant, AppError>;

    /// Look up one image variant by its composite key.
    async fn find_image_variant(
        &self,
        upload_id: Uuid,
        size_type: &str,
    ) -> Result<Option<ImageVariant>, AppError>;

    /// Record the metadata row for an ingested document.
    async fn insert_document(
        &self,
        upload_id: Uuid,
        mime_type: &str,
    ) -> Result<Document, AppError>;

    /// Look up a document row by upload id.
    async fn find_document(&self, upload_id: Uuid) -> Result<Option<Document>, AppError>;

    /// Record the metadata row for an ingested video.
    async fn insert_video(&self, upload_id: Uuid, mime_type: &str) -> Result<Video, AppError>;

    /// Look up a video row by upload id.
    async fn find_video(&self, upload_id: Uuid) -> Result<Option<Video>, AppError>;
}
