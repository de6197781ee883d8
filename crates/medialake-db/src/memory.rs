//! In-memory metadata store for tests and local development.

use async_trait::async_trait;
use chrono::Utc;
use medialake_core::models::{Document, Group, ImageVariant, Upload, UploadStatus, Video};
use medialake_core::AppError;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::store::MetadataStore;

/// Metadata store backed by in-process hash maps. Mirrors the Postgres
/// implementation's semantics, including the soft-delete filter.
#[derive(Default)]
pub struct InMemoryMetadataStore {
    uploads: RwLock<HashMap<Uuid, Upload>>,
    variants: RwLock<HashMap<(Uuid, String), ImageVariant>>,
    documents: RwLock<HashMap<Uuid, Document>>,
    videos: RwLock<HashMap<Uuid, Video>>,
}

impl InMemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MetadataStore for InMemoryMetadataStore {
    async fn insert_upload(
        &self,
        id: Uuid,
        user_id: Uuid,
        group: Group,
    ) -> Result<Upload, AppError> {
        let now = Utc::now();
        let upload = Upload {
            id,
            user_id,
            group,
            status: UploadStatus::Pending,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        self.uploads.write().await.insert(id, upload.clone());
        Ok(upload)
    }

    async fn find_upload(&self, id: Uuid) -> Result<Option<Upload>, AppError> {
        let uploads = self.uploads.read().await;
        Ok(uploads
            .get(&id)
            .filter(|u| u.deleted_at.is_none())
            .cloned())
    }

    async fn set_upload_status(&self, id: Uuid, status: UploadStatus) -> Result<(), AppError> {
        let mut uploads = self.uploads.write().await;
        match uploads.get_mut(&id).filter(|u| u.deleted_at.is_none()) {
            Some(upload) => {
                upload.status = status;
                upload.updated_at = Utc::now();
                Ok(())
            }
            None => Err(AppError::NotFound(format!("Upload {} not found", id))),
        }
    }

    async fn insert_image_variant(
        &self,
        upload_id: Uuid,
        size_type: &str,
        mime_type: &str,
        width: i32,
        height: i32,
    ) -> Result<ImageVariant, AppError> {
        let variant = ImageVariant {
            upload_id,
            size_type: size_type.to_string(),
            mime_type: mime_type.to_string(),
            width,
            height,
            created_at: Utc::now(),
        };
        self.variants
            .write()
            .await
            .insert((upload_id, size_type.to_string()), variant.clone());
        Ok(variant)
    }

    async fn find_image_variant(
        &self,
        upload_id: Uuid,
        size_type: &str,
    ) -> Result<Option<ImageVariant>, AppError> {
        let variants = self.variants.read().await;
        Ok(variants.get(&(upload_id, size_type.to_string())).cloned())
    }

    async fn insert_document(
        &self,
        upload_id: Uuid,
        mime_type: &str,
    ) -> Result<Document, AppError> {
        let document = Document {
            upload_id,
            mime_type: mime_type.to_string(),
            created_at: Utc::now(),
        };
        self.documents
            .write()
            .await
            .insert(upload_id, document.clone());
        Ok(document)
    }

    async fn find_document(&self, upload_id: Uuid) -> Result<Option<Document>, AppError> {
        Ok(self.documents.read().await.get(&upload_id).cloned())
    }

    async fn insert_video(&self, upload_id: Uuid, mime_type: &str) -> Result<Video, AppError> {
        let video = Video {
            upload_id,
            mime_type: mime_type.to_string(),
            created_at: Utc::now(),
        };
        self.videos.write().await.insert(upload_id, video.clone());
        Ok(video)
    }

    async fn find_video(&self, upload_id: Uuid) -> Result<Option<Video>, AppError> {
        Ok(self.videos.read().await.get(&upload_id).cloned())
    }
}
