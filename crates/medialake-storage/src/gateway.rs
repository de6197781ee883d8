//! Object store gateway
//!
//! One gateway fronts all four logical buckets. Each bucket is backed by its
//! own `object_store` instance so the same code path serves S3, the local
//! filesystem, and the in-memory store used in tests.

use crate::keys;
use crate::traits::{ByteStream, ObjectGateway, StorageError, StorageResult};
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use medialake_core::config::BucketTable;
use medialake_core::models::Bucket;
use medialake_core::StorageBackend;
use object_store::path::Path;
use object_store::{
    Attribute, Attributes, DynObjectStore, Error as ObjectStoreError, ObjectStore, ObjectStoreExt,
    PutOptions, PutPayload, Result as ObjectResult,
};
use std::sync::Arc;

/// How public URLs are formed for stored objects.
#[derive(Debug, Clone)]
pub enum UrlStyle {
    /// Standard AWS format: `https://{bucket}.s3.{region}.amazonaws.com/{key}`.
    VirtualHost { region: String },
    /// Path-style for S3-compatible providers: `{endpoint}/{bucket}/{key}`.
    PathStyle { endpoint: String },
    /// Relative URLs served by this process: `/media/{bucket}/{key}`.
    Relative,
}

/// Gateway over the per-bucket object stores.
pub struct ObjectStoreGateway {
    images: Arc<DynObjectStore>,
    docs: Arc<DynObjectStore>,
    videos: Arc<DynObjectStore>,
    tmp: Arc<DynObjectStore>,
    buckets: BucketTable,
    url_style: UrlStyle,
    backend: StorageBackend,
}

impl ObjectStoreGateway {
    /// Build the gateway, opening one store per logical bucket.
    ///
    /// `open_store` receives the configured bucket name and returns the
    /// backing store for it.
    pub fn new(
        buckets: BucketTable,
        url_style: UrlStyle,
        backend: StorageBackend,
        mut open_store: impl FnMut(&str) -> StorageResult<Arc<DynObjectStore>>,
    ) -> StorageResult<Self> {
        Ok(ObjectStoreGateway {
            images: open_store(&buckets.images)?,
            docs: open_store(&buckets.docs)?,
            videos: open_store(&buckets.videos)?,
            tmp: open_store(&buckets.tmp)?,
            buckets,
            url_style,
            backend,
        })
    }

    fn store_for(&self, bucket: Bucket) -> &DynObjectStore {
        match bucket {
            Bucket::Images => self.images.as_ref(),
            Bucket::Docs => self.docs.as_ref(),
            Bucket::Videos => self.videos.as_ref(),
            Bucket::Tmp => self.tmp.as_ref(),
        }
    }

    /// Validate a storage key and convert it to an object store path.
    ///
    /// Keys come from the `keys` module but batch prefixes embed caller
    /// input, so traversal sequences are rejected here as well.
    fn checked_path(key: &str) -> StorageResult<Path> {
        if key.is_empty() || key.contains("..") || key.starts_with('/') {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(Path::from(key))
    }
}

#[async_trait]
impl ObjectGateway for ObjectStoreGateway {
    async fn put(
        &self,
        bucket: Bucket,
        key: &str,
        content_type: &str,
        data: Bytes,
    ) -> StorageResult<String> {
        let location = Self::checked_path(key)?;
        let bucket_name = self.buckets.name_of(bucket);
        let size = data.len() as u64;
        let began = std::time::Instant::now();

        let mut attributes = Attributes::new();
        attributes.insert(Attribute::ContentType, content_type.to_string().into());
        let opts = PutOptions {
            attributes,
            ..Default::default()
        };

        let result: ObjectResult<_> = self
            .store_for(bucket)
            .put_opts(&location, PutPayload::from(data), opts)
            .await;

        result.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %bucket_name,
                key = %key,
                size_bytes = size,
                duration_ms = began.elapsed().as_secs_f64() * 1000.0,
                "object upload failed"
            );
            StorageError::UploadFailed(e.to_string())
        })?;

        tracing::info!(
            bucket = %bucket_name,
            key = %key,
            size_bytes = size,
            duration_ms = began.elapsed().as_secs_f64() * 1000.0,
            "object upload successful"
        );

        Ok(self.public_url(bucket, key))
    }

    async fn get(&self, bucket: Bucket, key: &str) -> StorageResult<Bytes> {
        let location = Self::checked_path(key)?;
        let bucket_name = self.buckets.name_of(bucket);
        let began = std::time::Instant::now();

        let result: ObjectResult<_> = self.store_for(bucket).get(&location).await;

        let result = result.map_err(|e| match e {
            ObjectStoreError::NotFound { .. } => StorageError::NotFound(key.to_string()),
            other => {
                tracing::error!(
                    error = %other,
                    bucket = %bucket_name,
                    key = %key,
                    duration_ms = began.elapsed().as_secs_f64() * 1000.0,
                    "object download failed"
                );
                StorageError::DownloadFailed(other.to_string())
            }
        })?;

        let bytes = result
            .bytes()
            .await
            .map_err(|e| StorageError::DownloadFailed(e.to_string()))?;

        tracing::info!(
            bucket = %bucket_name,
            key = %key,
            size_bytes = bytes.len() as u64,
            duration_ms = began.elapsed().as_secs_f64() * 1000.0,
            "object download successful"
        );

        Ok(bytes)
    }

    async fn get_range(
        &self,
        bucket: Bucket,
        key: &str,
        start: u64,
        end: u64,
    ) -> StorageResult<Bytes> {
        let location = Self::checked_path(key)?;
        let bucket_name = self.buckets.name_of(bucket);
        let began = std::time::Instant::now();

        // Trait range is inclusive, object_store takes an exclusive end.
        let result: ObjectResult<_> = self
            .store_for(bucket)
            .get_range(&location, start..end.saturating_add(1))
            .await;

        let bytes = result.map_err(|e| match e {
            ObjectStoreError::NotFound { .. } => StorageError::NotFound(key.to_string()),
            other => {
                tracing::error!(
                    error = %other,
                    bucket = %bucket_name,
                    key = %key,
                    range_start = start,
                    range_end = end,
                    duration_ms = began.elapsed().as_secs_f64() * 1000.0,
                    "object range read failed"
                );
                StorageError::DownloadFailed(other.to_string())
            }
        })?;

        Ok(bytes)
    }

    async fn content_length(&self, bucket: Bucket, key: &str) -> StorageResult<u64> {
        let location = Self::checked_path(key)?;
        match self.store_for(bucket).head(&location).await {
            Ok(meta) => Ok(meta.size),
            Err(ObjectStoreError::NotFound { .. }) => Err(StorageError::NotFound(key.to_string())),
            Err(e) => Err(StorageError::BackendError(e.to_string())),
        }
    }

    async fn delete(&self, bucket: Bucket, key: &str) -> StorageResult<()> {
        let location = Self::checked_path(key)?;
        let bucket_name = self.buckets.name_of(bucket);
        let began = std::time::Instant::now();

        let result: ObjectResult<_> = self.store_for(bucket).delete(&location).await;

        result.map_err(|e| match e {
            ObjectStoreError::NotFound { .. } => StorageError::NotFound(key.to_string()),
            other => {
                tracing::error!(
                    error = %other,
                    bucket = %bucket_name,
                    key = %key,
                    duration_ms = began.elapsed().as_secs_f64() * 1000.0,
                    "object delete failed"
                );
                StorageError::DeleteFailed(other.to_string())
            }
        })?;

        tracing::info!(
            bucket = %bucket_name,
            key = %key,
            duration_ms = began.elapsed().as_secs_f64() * 1000.0,
            "object delete successful"
        );

        Ok(())
    }

    async fn delete_many(&self, bucket: Bucket, keys: &[String]) -> StorageResult<()> {
        let mut first_error = None;

        for key in keys {
            if let Err(e) = self.delete(bucket, key).await {
                tracing::warn!(
                    bucket = %self.buckets.name_of(bucket),
                    key = %key,
                    error = %e,
                    "object delete failed, continuing with remaining keys"
                );
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }

        match first_error {
            None => Ok(()),
            Some(e) => Err(e),
        }
    }

    async fn exists(&self, bucket: Bucket, key: &str) -> StorageResult<bool> {
        let location = Self::checked_path(key)?;
        match self.store_for(bucket).head(&location).await {
            Ok(_) => Ok(true),
            Err(ObjectStoreError::NotFound { .. }) => Ok(false),
            Err(e) => Err(StorageError::BackendError(e.to_string())),
        }
    }

    async fn download_stream(&self, bucket: Bucket, key: &str) -> StorageResult<ByteStream> {
        let location = Self::checked_path(key)?;
        let bucket_name = self.buckets.name_of(bucket).to_string();

        let result: ObjectResult<_> = self.store_for(bucket).get(&location).await;

        let result = result.map_err(|e| match e {
            ObjectStoreError::NotFound { .. } => StorageError::NotFound(key.to_string()),
            other => StorageError::DownloadFailed(other.to_string()),
        })?;

        let key = key.to_string();
        let stream = result.into_stream().map(move |res| match res {
            Ok(bytes) => Ok(bytes),
            Err(e) => {
                tracing::error!(
                    bucket = %bucket_name,
                    key = %key,
                    error = %e,
                    "object stream read error"
                );
                Err(StorageError::DownloadFailed(e.to_string()))
            }
        });

        Ok(Box::pin(stream))
    }

    fn public_url(&self, bucket: Bucket, key: &str) -> String {
        let bucket_name = self.buckets.name_of(bucket);
        match &self.url_style {
            UrlStyle::VirtualHost { region } => {
                format!(
                    "https://{}.s3.{}.amazonaws.com/{}",
                    bucket_name, region, key
                )
            }
            UrlStyle::PathStyle { endpoint } => {
                format!("{}/{}/{}", endpoint.trim_end_matches('/'), bucket_name, key)
            }
            UrlStyle::Relative => format!("/media/{}/{}", bucket_name, key),
        }
    }

    fn backend_type(&self) -> StorageBackend {
        self.backend
    }
}
