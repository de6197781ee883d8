//! Medialake Storage Library
//!
//! This crate provides the object store abstraction and implementations for
//! Medialake. One [`ObjectStoreGateway`] fronts the four logical buckets
//! (images, docs, videos, tmp) and is backed by S3, the local filesystem,
//! or an in-memory store.
//!
//! # Storage key format
//!
//! All backends use the same key layout for consistency:
//!
//! - **Primary objects**: `{uuid}.{extension}`
//! - **Image variants**: `{uuid}.{size_type}.{extension}`
//! - **Previews**: `{uuid}.thumb.png`
//! - **Batch temporaries**: `{batch_id}/{key}` (tmp bucket only)
//!
//! Keys must not contain `..` or a leading `/`. Key generation is centralized
//! in the `keys` module so all callers stay consistent.

pub mod factory;
pub mod gateway;
pub mod keys;
pub mod traits;

// Re-export commonly used types
pub use factory::create_gateway;
pub use gateway::{ObjectStoreGateway, UrlStyle};
pub use medialake_core::StorageBackend;
pub use traits::{ByteStream, ObjectGateway, StorageError, StorageResult};
