//! Storage abstraction trait
//!
//! This module defines the ObjectGateway trait the rest of the system uses
//! to talk to the object store. Objects are addressed by (bucket, key);
//! the gateway owns the bucket-name table so callers only ever see the
//! logical [`Bucket`] enum.

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use medialake_core::models::Bucket;
use medialake_core::{AppError, StorageBackend};
use std::pin::Pin;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(key) => AppError::NotFound(format!("Object {} not found", key)),
            other => AppError::Storage(other.to_string()),
        }
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// A stream of object bytes, yielded chunk by chunk.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, StorageError>> + Send>>;

/// Object store capability.
///
/// All backends (S3, local filesystem, in-memory) implement this trait so
/// the ingestion pipeline, resolver, and range reader can work with any of
/// them without coupling to implementation details.
///
/// **Key format:** `{uuid}.{extension}` for primary objects,
/// `{uuid}.{size_type}.{extension}` for image variants, `{uuid}.thumb.png`
/// for previews, and `{batch_id}/{uuid}.{extension}` for per-batch
/// temporaries in the tmp bucket. Key generation is centralized in the
/// `keys` module.
#[async_trait]
pub trait ObjectGateway: Send + Sync {
    /// Store an object and return its public URL.
    async fn put(
        &self,
        bucket: Bucket,
        key: &str,
        content_type: &str,
        data: Bytes,
    ) -> StorageResult<String>;

    /// Fetch a whole object.
    async fn get(&self, bucket: Bucket, key: &str) -> StorageResult<Bytes>;

    /// Fetch the inclusive byte window `[start, end]` of an object.
    async fn get_range(
        &self,
        bucket: Bucket,
        key: &str,
        start: u64,
        end: u64,
    ) -> StorageResult<Bytes>;

    /// Size in bytes of an object, if it exists.
    async fn content_length(&self, bucket: Bucket, key: &str) -> StorageResult<u64>;

    /// Delete one object.
    async fn delete(&self, bucket: Bucket, key: &str) -> StorageResult<()>;

    /// Delete several objects; continues past individual failures and
    /// reports the first error once all deletes settled.
    async fn delete_many(&self, bucket: Bucket, keys: &[String]) -> StorageResult<()>;

    /// Check if an object exists.
    async fn exists(&self, bucket: Bucket, key: &str) -> StorageResult<bool>;

    /// Open a streaming read of a whole object.
    async fn download_stream(&self, bucket: Bucket, key: &str) -> StorageResult<ByteStream>;

    /// Public URL for an object (addressable without going through the
    /// gateway again).
    fn public_url(&self, bucket: Bucket, key: &str) -> String;

    /// The backend type behind this gateway.
    fn backend_type(&self) -> StorageBackend;
}
