//! Batch ingestion pipeline
//!
//! Drains a multipart batch into the object store, validates each part
//! post-write, records Upload rows, and hands stored files to the
//! derivative dispatcher. One failing file never aborts its siblings; the
//! batch report carries both the stored descriptors and the per-file
//! errors.

use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use medialake_core::classifier::{extension_for_mime, MimeClassifier};
use medialake_core::config::MediaConfig;
use medialake_core::models::{ErrorInfo, FileDescriptor, Group};
use medialake_core::AppError;
use medialake_db::MetadataStore;
use medialake_storage::{keys, ObjectGateway};
use serde::Serialize;
use uuid::Uuid;

use crate::dispatch::DerivativeDispatcher;

/// One file of a multipart batch, already drained from the wire.
#[derive(Debug, Clone)]
pub struct IncomingFile {
    pub filename: String,
    pub content_type: String,
    pub data: Bytes,
}

/// Batch result: stored descriptors in submission order plus the errors of
/// rejected files, each annotated with its original filename.
#[derive(Debug, Serialize)]
pub struct IngestReport {
    pub files: Vec<FileDescriptor>,
    pub errors: Vec<ErrorInfo>,
}

pub struct IngestionPipeline {
    classifier: MimeClassifier,
    gateway: Arc<dyn ObjectGateway>,
    metadata: Arc<dyn MetadataStore>,
    dispatcher: DerivativeDispatcher,
    media: MediaConfig,
    include_error_detail: bool,
}

impl IngestionPipeline {
    pub fn new(
        gateway: Arc<dyn ObjectGateway>,
        metadata: Arc<dyn MetadataStore>,
        media: MediaConfig,
        include_error_detail: bool,
    ) -> Self {
        let classifier = MimeClassifier::new(&media);
        let dispatcher = DerivativeDispatcher::new(
            Arc::clone(&gateway),
            Arc::clone(&metadata),
            media.clone(),
        );
        Self {
            classifier,
            gateway,
            metadata,
            dispatcher,
            media,
            include_error_detail,
        }
    }

    /// Ingest one batch for `user_id`. Parts are stored concurrently and
    /// joined positionally, so the report preserves submission order.
    #[tracing::instrument(skip(self, batch), fields(batch_size = batch.len()))]
    pub async fn ingest(
        &self,
        user_id: Uuid,
        batch: Vec<IncomingFile>,
    ) -> Result<IngestReport, AppError> {
        let batch_id = Uuid::new_v4();
        let began = Instant::now();

        let mut handles = Vec::with_capacity(batch.len());
        for file in batch {
            let descriptor = self.describe(batch_id, &file);
            handles.push(tokio::spawn(store_part(
                Arc::clone(&self.gateway),
                descriptor,
                file.data,
                self.media.max_file_size_bytes as u64,
                self.include_error_detail,
            )));
        }

        let mut descriptors = Vec::with_capacity(handles.len());
        for handle in handles {
            let descriptor = handle
                .await
                .map_err(|e| AppError::Internal(format!("Ingestion task panicked: {}", e)))?;
            descriptors.push(descriptor);
        }

        self.sweep_rejected(&descriptors).await;

        let mut files = Vec::new();
        let mut errors = Vec::new();
        for descriptor in descriptors {
            if descriptor.is_succeeded() {
                match self.persist_and_finish(user_id, descriptor).await {
                    Ok(descriptor) => files.push(descriptor),
                    Err(info) => errors.push(info),
                }
            } else if let Some(error) = descriptor.error {
                errors.push(error);
            }
        }

        tracing::info!(
            batch_id = %batch_id,
            stored = files.len(),
            rejected = errors.len(),
            duration_ms = began.elapsed().as_secs_f64() * 1000.0,
            "Ingested upload batch"
        );

        Ok(IngestReport { files, errors })
    }

    /// Classify one part and build its in-flight descriptor. Unsupported
    /// mime types land under a per-batch prefix in the tmp bucket so the
    /// batch sweep can remove them.
    fn describe(&self, batch_id: Uuid, file: &IncomingFile) -> FileDescriptor {
        let mime_type = file.content_type.to_lowercase();
        let classification = self.classifier.classify(&mime_type);
        let id = Uuid::new_v4();
        let extension = extension_for_mime(&mime_type).to_string();
        let primary = keys::primary_key(id, &extension);
        let key = if classification.supported {
            primary
        } else {
            keys::batch_tmp_key(batch_id, &primary)
        };

        FileDescriptor {
            id,
            key,
            extension,
            mime_type,
            filename: file.filename.clone(),
            size: file.data.len() as u64,
            is_saved: false,
            group: classification.group,
            bucket: classification.bucket,
            dimensions: None,
            preview_url: None,
            error: None,
        }
    }

    /// Remove the stored bytes of every rejected part. Deletion failures
    /// are logged, not surfaced; the batch report is already settled.
    async fn sweep_rejected(&self, descriptors: &[FileDescriptor]) {
        for descriptor in descriptors
            .iter()
            .filter(|d| d.is_saved && !d.is_succeeded())
        {
            if let Err(err) = self.gateway.delete(descriptor.bucket, &descriptor.key).await {
                tracing::warn!(
                    key = %descriptor.key,
                    error = %err,
                    "Failed to remove rejected upload bytes"
                );
            }
        }
    }

    async fn persist_and_finish(
        &self,
        user_id: Uuid,
        descriptor: FileDescriptor,
    ) -> Result<FileDescriptor, ErrorInfo> {
        if let Err(err) = self
            .metadata
            .insert_upload(descriptor.id, user_id, descriptor.group)
            .await
        {
            tracing::error!(upload_id = %descriptor.id, error = %err, "Failed to record upload");
            if let Err(delete_err) = self.gateway.delete(descriptor.bucket, &descriptor.key).await
            {
                tracing::warn!(
                    key = %descriptor.key,
                    error = %delete_err,
                    "Failed to remove orphaned object"
                );
            }
            return Err(ErrorInfo::from_app_error(
                &err,
                Some(descriptor.filename.clone()),
                self.include_error_detail,
            ));
        }

        match self.dispatcher.dispatch(descriptor.clone()).await {
            Ok(enriched) => Ok(enriched),
            // Bytes are stored and the upload row is marked failed; clients
            // observe the state through the upload inspection endpoint.
            Err(_) => Ok(descriptor),
        }
    }
}

async fn store_part(
    gateway: Arc<dyn ObjectGateway>,
    mut descriptor: FileDescriptor,
    data: Bytes,
    max_file_size_bytes: u64,
    include_error_detail: bool,
) -> FileDescriptor {
    if let Err(err) = put_and_validate(&*gateway, &mut descriptor, data, max_file_size_bytes).await
    {
        tracing::warn!(filename = %descriptor.filename, error = %err, "Rejected upload part");
        descriptor.error = Some(ErrorInfo::from_app_error(
            &err,
            Some(descriptor.filename.clone()),
            include_error_detail,
        ));
    }
    descriptor
}

/// Store one part and run the post-write checks: stored size against the
/// configured ceiling, then the classification verdict.
async fn put_and_validate(
    gateway: &dyn ObjectGateway,
    descriptor: &mut FileDescriptor,
    data: Bytes,
    max_file_size_bytes: u64,
) -> Result<(), AppError> {
    gateway
        .put(descriptor.bucket, &descriptor.key, &descriptor.mime_type, data)
        .await
        .map_err(|e| AppError::IngestFailed(format!("Failed to store {}: {}", descriptor.key, e)))?;
    descriptor.is_saved = true;

    let stored = gateway
        .content_length(descriptor.bucket, &descriptor.key)
        .await
        .map_err(|e| {
            AppError::IngestFailed(format!("Failed to verify {}: {}", descriptor.key, e))
        })?;
    descriptor.size = stored;

    if stored > max_file_size_bytes {
        return Err(AppError::PayloadTooLarge(format!(
            "File is {} bytes, limit is {} bytes",
            stored, max_file_size_bytes
        )));
    }
    if descriptor.group == Group::Tmp {
        return Err(AppError::UnsupportedMediaType(descriptor.mime_type.clone()));
    }
    Ok(())
}
