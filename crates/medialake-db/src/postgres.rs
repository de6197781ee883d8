//! Postgres-backed metadata store.

use async_trait::async_trait;
use medialake_core::models::{Document, Group, ImageVariant, Upload, UploadStatus, Video};
use medialake_core::AppError;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use crate::store::MetadataStore;

/// Metadata store over the uploads, image_variants, documents and videos
/// tables.
#[derive(Clone)]
pub struct PgMetadataStore {
    pool: PgPool,
}

impl PgMetadataStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MetadataStore for PgMetadataStore {
    #[tracing::instrument(skip(self), fields(db.table = "uploads", db.operation = "insert"))]
    async fn insert_upload(
        &self,
        id: Uuid,
        user_id: Uuid,
        group: Group,
    ) -> Result<Upload, AppError> {
        let upload: Upload = sqlx::query_as::<Postgres, Upload>(
            r#"
            INSERT INTO uploads (id, user_id, upload_group, status)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, upload_group, status, created_at, updated_at, deleted_at
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(group)
        .bind(UploadStatus::Pending)
        .fetch_one(&self.pool)
        .await?;
        Ok(upload)
    }

    #[tracing::instrument(skip(self), fields(db.table = "uploads", db.operation = "select"))]
    async fn find_upload(&self, id: Uuid) -> Result<Option<Upload>, AppError> {
        let upload: Option<Upload> = sqlx::query_as::<Postgres, Upload>(
            r#"
            SELECT id, user_id, upload_group, status, created_at, updated_at, deleted_at
            FROM uploads
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(upload)
    }

    #[tracing::instrument(skip(self), fields(db.table = "uploads", db.operation = "update"))]
    async fn set_upload_status(&self, id: Uuid, status: UploadStatus) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE uploads
            SET status = $2, updated_at = now()
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .bind(status)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Upload {} not found", id)));
        }
        Ok(())
    }

    #[tracing::instrument(
        skip(self),
        fields(db.table = "image_variants", db.operation = "insert")
    )]
    async fn insert_image_variant(
        &self,
        upload_id: Uuid,
        size_type: &str,
        mime_type: &str,
        width: i32,
        height: i32,
    ) -> Result<ImageVariant, AppError> {
        let variant: ImageVariant = sqlx::query_as::<Postgres, ImageVariant>(
            r#"
            INSERT INTO image_variants (upload_id, size_type, mime_type, width, height)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING upload_id, size_type, mime_type, width, height, created_at
            "#,
        )
        .bind(upload_id)
        .bind(size_type)
        .bind(mime_type)
        .bind(width)
        .bind(height)
        .fetch_one(&self.pool)
        .await?;
        Ok(variant)
    }

    #[tracing::instrument(
        skip(self),
        fields(db.table = "image_variants", db.operation = "select")
    )]
    async fn find_image_variant(
        &self,
        upload_id: Uuid,
        size_type: &str,
    ) -> Result<Option<ImageVariant>, AppError> {
        let variant: Option<ImageVariant> = sqlx::query_as::<Postgres, ImageVariant>(
            r#"
            SELECT upload_id, size_type, mime_type, width, height, created_at
            FROM image_variants
            WHERE upload_id = $1 AND size_type = $2
            "#,
        )
        .bind(upload_id)
        .bind(size_type)
        .fetch_optional(&self.pool)
        .await?;
        Ok(variant)
    }

    #[tracing::instrument(skip(self), fields(db.table = "documents", db.operation = "insert"))]
    async fn insert_document(
        &self,
        upload_id: Uuid,
        mime_type: &str,
    ) -> Result<Document, AppError> {
        let document: Document = sqlx::query_as::<Postgres, Document>(
            r#"
            INSERT INTO documents (upload_id, mime_type)
            VALUES ($1, $2)
            RETURNING upload_id, mime_type, created_at
            "#,
        )
        .bind(upload_id)
        .bind(mime_type)
        .fetch_one(&self.pool)
        .await?;
        Ok(document)
    }

    #[tracing::instrument(skip(self), fields(db.table = "documents", db.operation = "select"))]
    async fn find_document(&self, upload_id: Uuid) -> Result<Option<Document>, AppError> {
        let document: Option<Document> = sqlx::query_as::<Postgres, Document>(
            r#"
            SELECT upload_id, mime_type, created_at
            FROM documents
            WHERE upload_id = $1
            "#,
        )
        .bind(upload_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(document)
    }

    #[tracing::instrument(skip(self), fields(db.table = "videos", db.operation = "insert"))]
    async fn insert_video(&self, upload_id: Uuid, mime_type: &str) -> Result<Video, AppError> {
        let video: Video = sqlx::query_as::<Postgres, Video>(
            r#"
            INSERT INTO videos (upload_id, mime_type)
            VALUES ($1, $2)
            RETURNING upload_id, mime_type, created_at
            "#,
        )
        .bind(upload_id)
        .bind(mime_type)
        .fetch_one(&self.pool)
        .await?;
        Ok(video)
    }

    #[tracing::instrument(skip(self), fields(db.table = "videos", db.operation = "select"))]
    async fn find_video(&self, upload_id: Uuid) -> Result<Option<Video>, AppError> {
        let video: Option<Video> = sqlx::query_as::<Postgres, Video>(
            r#"
            SELECT upload_id, mime_type, created_at
            FROM videos
            WHERE upload_id = $1
            "#,
        )
        .bind(upload_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(video)
    }
}
