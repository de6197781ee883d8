//! Derivative dispatch
//!
//! After a file's bytes are durably stored, the dispatcher runs the single
//! finisher for its group and settles the upload lifecycle: `Pending ->
//! Ready` when the finisher succeeds, `Pending -> Failed` when it does not.
//! Dispatch is an exhaustive match on the closed `Group` type, so adding a
//! group forces a finisher decision at compile time.

use std::sync::Arc;

use bytes::Bytes;
use futures::future::try_join_all;
use medialake_core::config::{MediaConfig, SizeSpec};
use medialake_core::models::{FileDescriptor, Group, UploadStatus};
use medialake_core::AppError;
use medialake_db::MetadataStore;
use medialake_processing::{render_preview, render_variant};
use medialake_storage::{keys, ObjectGateway};

pub struct DerivativeDispatcher {
    gateway: Arc<dyn ObjectGateway>,
    metadata: Arc<dyn MetadataStore>,
    media: MediaConfig,
}

impl DerivativeDispatcher {
    pub fn new(
        gateway: Arc<dyn ObjectGateway>,
        metadata: Arc<dyn MetadataStore>,
        media: MediaConfig,
    ) -> Self {
        Self {
            gateway,
            metadata,
            media,
        }
    }

    /// Run the group finisher for a stored descriptor and settle the
    /// upload status. Returns the enriched descriptor on success.
    #[tracing::instrument(
        skip(self, descriptor),
        fields(upload_id = %descriptor.id, group = %descriptor.group)
    )]
    pub async fn dispatch(&self, descriptor: FileDescriptor) -> Result<FileDescriptor, AppError> {
        let id = descriptor.id;
        let group = descriptor.group;

        let finished = match group {
            Group::Images => self.finish_image(descriptor).await,
            Group::Docs => self.finish_document(descriptor).await,
            Group::Videos => self.finish_video(descriptor).await,
            // Unsupported files are rejected during ingestion and never
            // reach the dispatcher.
            Group::Tmp => Err(AppError::Internal(format!(
                "Upload {} is temporary and has no derivatives",
                id
            ))),
        };

        match finished {
            Ok(descriptor) => {
                self.metadata
                    .set_upload_status(id, UploadStatus::Ready)
                    .await?;
                Ok(descriptor)
            }
            Err(err) => {
                tracing::error!(upload_id = %id, error = %err, "Derivative generation failed");
                if group != Group::Tmp {
                    if let Err(status_err) = self
                        .metadata
                        .set_upload_status(id, UploadStatus::Failed)
                        .await
                    {
                        tracing::error!(
                            upload_id = %id,
                            error = %status_err,
                            "Failed to mark upload failed"
                        );
                    }
                }
                Err(err)
            }
        }
    }

    /// Preview first, then all size variants concurrently. Every variant
    /// write must land before the upload may be marked ready.
    async fn finish_image(
        &self,
        mut descriptor: FileDescriptor,
    ) -> Result<FileDescriptor, AppError> {
        let data = self.gateway.get(descriptor.bucket, &descriptor.key).await?;

        let preview = render_preview(data.clone(), self.media.preview).await?;
        let preview_key = keys::preview_key(descriptor.id);
        let preview_url = self
            .gateway
            .put(descriptor.bucket, &preview_key, "image/png", preview.bytes)
            .await?;
        descriptor.dimensions = Some(preview.original);
        descriptor.preview_url = Some(preview_url);

        try_join_all(
            self.media
                .sizes
                .iter()
                .map(|size| self.store_variant(&descriptor, data.clone(), size)),
        )
        .await?;

        Ok(descriptor)
    }

    async fn store_variant(
        &self,
        descriptor: &FileDescriptor,
        data: Bytes,
        size: &SizeSpec,
    ) -> Result<(), AppError> {
        let rendered = render_variant(data, size.coefficient, descriptor.mime_type.clone()).await?;
        let key = keys::variant_key(descriptor.id, &size.label, &descriptor.extension);
        self.gateway
            .put(descriptor.bucket, &key, &descriptor.mime_type, rendered.bytes)
            .await?;
        self.metadata
            .insert_image_variant(
                descriptor.id,
                &size.label,
                &descriptor.mime_type,
                rendered.dimensions.width as i32,
                rendered.dimensions.height as i32,
            )
            .await?;
        Ok(())
    }

    async fn finish_document(
        &self,
        descriptor: FileDescriptor,
    ) -> Result<FileDescriptor, AppError> {
        self.metadata
            .insert_document(descriptor.id, &descriptor.mime_type)
            .await?;
        Ok(descriptor)
    }

    async fn finish_video(&self, descriptor: FileDescriptor) -> Result<FileDescriptor, AppError> {
        self.metadata
            .insert_video(descriptor.id, &descriptor.mime_type)
            .await?;
        Ok(descriptor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, RgbaImage};
    use medialake_core::config::{
        BucketTable, FitMode, PreviewConfig, StorageConfig,
    };
    use medialake_core::models::Bucket;
    use medialake_core::StorageBackend;
    use medialake_db::InMemoryMetadataStore;
    use medialake_storage::create_gateway;
    use std::io::Cursor;
    use uuid::Uuid;

    fn media_config() -> MediaConfig {
        MediaConfig {
            max_file_size_bytes: 1024 * 1024,
            image_mime_types: vec!["image/png".to_string()],
            doc_mime_types: vec!["application/pdf".to_string()],
            video_mime_types: vec!["video/mp4".to_string()],
            preview: PreviewConfig {
                width: 32,
                height: 32,
                fit: FitMode::Fill,
            },
            sizes: vec![
                SizeSpec {
                    label: "s".to_string(),
                    coefficient: 0.5,
                },
                SizeSpec {
                    label: "m".to_string(),
                    coefficient: 1.0,
                },
            ],
            stream_chunk_size_bytes: 1024,
        }
    }

    async fn dispatcher() -> (
        DerivativeDispatcher,
        Arc<dyn ObjectGateway>,
        Arc<InMemoryMetadataStore>,
    ) {
        let config = StorageConfig {
            backend: StorageBackend::Memory,
            buckets: BucketTable {
                images: "images".to_string(),
                docs: "docs".to_string(),
                videos: "videos".to_string(),
                tmp: "tmp".to_string(),
            },
            s3_region: None,
            s3_endpoint: None,
            local_storage_path: None,
        };
        let gateway = create_gateway(&config).await.unwrap();
        let metadata = Arc::new(InMemoryMetadataStore::default());
        let store: Arc<dyn MetadataStore> = metadata.clone();
        let dispatcher =
            DerivativeDispatcher::new(Arc::clone(&gateway), store, media_config());
        (dispatcher, gateway, metadata)
    }

    fn descriptor(id: Uuid, mime_type: &str, group: Group, bucket: Bucket) -> FileDescriptor {
        let extension = medialake_core::classifier::extension_for_mime(mime_type);
        FileDescriptor {
            id,
            key: keys::primary_key(id, extension),
            extension: extension.to_string(),
            mime_type: mime_type.to_string(),
            filename: format!("file.{}", extension),
            size: 0,
            is_saved: true,
            group,
            bucket,
            dimensions: None,
            preview_url: None,
            error: None,
        }
    }

    fn png_bytes(width: u32, height: u32) -> Bytes {
        let img = DynamicImage::ImageRgba8(RgbaImage::new(width, height));
        let mut buffer = Vec::new();
        img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
            .unwrap();
        Bytes::from(buffer)
    }

    #[tokio::test]
    async fn test_dispatch_image_generates_all_derivatives() {
        let (dispatcher, gateway, metadata) = dispatcher().await;
        let user = Uuid::new_v4();
        let id = Uuid::new_v4();
        let descriptor = descriptor(id, "image/png", Group::Images, Bucket::Images);

        metadata.insert_upload(id, user, Group::Images).await.unwrap();
        gateway
            .put(Bucket::Images, &descriptor.key, "image/png", png_bytes(64, 48))
            .await
            .unwrap();

        let enriched = dispatcher.dispatch(descriptor).await.unwrap();
        assert!(enriched.preview_url.is_some());
        assert_eq!(
            enriched.dimensions,
            Some(medialake_core::models::Dimensions {
                width: 64,
                height: 48
            })
        );

        let upload = metadata.get_upload(id).await.unwrap();
        assert_eq!(upload.status, UploadStatus::Ready);

        for label in ["s", "m"] {
            assert!(metadata
                .find_image_variant(id, label)
                .await
                .unwrap()
                .is_some());
            assert!(gateway
                .exists(Bucket::Images, &keys::variant_key(id, label, "png"))
                .await
                .unwrap());
        }
        assert!(gateway
            .exists(Bucket::Images, &keys::preview_key(id))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_dispatch_marks_failed_on_undecodable_image() {
        let (dispatcher, gateway, metadata) = dispatcher().await;
        let id = Uuid::new_v4();
        let descriptor = descriptor(id, "image/png", Group::Images, Bucket::Images);

        metadata
            .insert_upload(id, Uuid::new_v4(), Group::Images)
            .await
            .unwrap();
        gateway
            .put(
                Bucket::Images,
                &descriptor.key,
                "image/png",
                Bytes::from_static(b"not an image"),
            )
            .await
            .unwrap();

        let err = dispatcher.dispatch(descriptor).await.unwrap_err();
        assert!(matches!(err, AppError::ImageProcessing(_)));

        let upload = metadata.get_upload(id).await.unwrap();
        assert_eq!(upload.status, UploadStatus::Failed);
    }

    #[tokio::test]
    async fn test_dispatch_document_persists_row() {
        let (dispatcher, gateway, metadata) = dispatcher().await;
        let id = Uuid::new_v4();
        let descriptor = descriptor(id, "application/pdf", Group::Docs, Bucket::Docs);

        metadata
            .insert_upload(id, Uuid::new_v4(), Group::Docs)
            .await
            .unwrap();
        gateway
            .put(
                Bucket::Docs,
                &descriptor.key,
                "application/pdf",
                Bytes::from_static(b"%PDF-1.4"),
            )
            .await
            .unwrap();

        dispatcher.dispatch(descriptor).await.unwrap();

        let document = metadata.find_document(id).await.unwrap().unwrap();
        assert_eq!(document.mime_type, "application/pdf");
        let upload = metadata.get_upload(id).await.unwrap();
        assert_eq!(upload.status, UploadStatus::Ready);
    }

    #[tokio::test]
    async fn test_dispatch_video_persists_row() {
        let (dispatcher, gateway, metadata) = dispatcher().await;
        let id = Uuid::new_v4();
        let descriptor = descriptor(id, "video/mp4", Group::Videos, Bucket::Videos);

        metadata
            .insert_upload(id, Uuid::new_v4(), Group::Videos)
            .await
            .unwrap();
        gateway
            .put(
                Bucket::Videos,
                &descriptor.key,
                "video/mp4",
                Bytes::from_static(b"ftyp"),
            )
            .await
            .unwrap();

        dispatcher.dispatch(descriptor).await.unwrap();
        assert!(metadata.find_video(id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_dispatch_tmp_is_internal_error() {
        let (dispatcher, _gateway, _metadata) = dispatcher().await;
        let descriptor = descriptor(
            Uuid::new_v4(),
            "application/octet-stream",
            Group::Tmp,
            Bucket::Tmp,
        );

        let err = dispatcher.dispatch(descriptor).await.unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }
}
