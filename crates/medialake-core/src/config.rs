//! Configuration module
//!
//! This module provides configuration structures for the service: server,
//! database, storage, and media settings. Everything is loaded once from the
//! environment at startup and threaded explicitly through constructors; there
//! is no ambient/global lookup.

use std::env;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::Bucket;
use crate::storage_types::StorageBackend;

// Common constants
const MAX_CONNECTIONS: u32 = 20;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const DEFAULT_SERVER_PORT: u16 = 3000;
const DEFAULT_MAX_FILE_SIZE_MB: usize = 10;
const DEFAULT_PREVIEW_WIDTH: u32 = 320;
const DEFAULT_PREVIEW_HEIGHT: u32 = 320;
const DEFAULT_STREAM_CHUNK_SIZE: u64 = 1024 * 1024;

const DEFAULT_IMAGE_MIME_TYPES: &str = "image/jpeg,image/gif,image/png,image/tiff,image/webp";
const DEFAULT_DOC_MIME_TYPES: &str = "application/pdf";
const DEFAULT_VIDEO_MIME_TYPES: &str = "video/mp4,video/webm,video/quicktime";
const DEFAULT_SIZE_VARIANTS: &str = "s:0.25,m:1,l:2";

/// How resized output relates to the requested box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FitMode {
    /// Cover the box exactly, cropping overflow.
    Fill,
    /// Fit inside the box, preserving aspect ratio.
    Inside,
}

impl FromStr for FitMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fill" => Ok(FitMode::Fill),
            "inside" => Ok(FitMode::Inside),
            _ => Err(anyhow::anyhow!("Invalid fit mode: {}", s)),
        }
    }
}

/// One configured size variant: label plus the coefficient applied to the
/// original dimensions.
#[derive(Debug, Clone, PartialEq)]
pub struct SizeSpec {
    pub label: String,
    pub coefficient: f64,
}

/// Fixed preview box settings.
#[derive(Debug, Clone, Copy)]
pub struct PreviewConfig {
    pub width: u32,
    pub height: u32,
    pub fit: FitMode,
}

/// Bucket name table. The tmp bucket holds per-batch temporaries only.
#[derive(Debug, Clone)]
pub struct BucketTable {
    pub images: String,
    pub docs: String,
    pub videos: String,
    pub tmp: String,
}

impl BucketTable {
    pub fn name_of(&self, bucket: Bucket) -> &str {
        match bucket {
            Bucket::Images => &self.images,
            Bucket::Docs => &self.docs,
            Bucket::Videos => &self.videos,
            Bucket::Tmp => &self.tmp,
        }
    }

    /// Temporary buckets hold no durable objects; their contents are
    /// batch-scoped and removed before the batch response returns.
    pub fn is_temporary(&self, bucket: Bucket) -> bool {
        matches!(bucket, Bucket::Tmp)
    }
}

/// Media classification and derivative settings.
#[derive(Debug, Clone)]
pub struct MediaConfig {
    pub max_file_size_bytes: usize,
    pub image_mime_types: Vec<String>,
    pub doc_mime_types: Vec<String>,
    pub video_mime_types: Vec<String>,
    pub preview: PreviewConfig,
    pub sizes: Vec<SizeSpec>,
    pub stream_chunk_size_bytes: u64,
}

/// Storage backend selection and addressing.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub buckets: BucketTable,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>,
    pub local_storage_path: Option<String>,
}

/// Base configuration shared by server and tooling.
#[derive(Debug, Clone)]
pub struct BaseConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub environment: String,
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub base: BaseConfig,
    pub database_url: String,
    pub media: MediaConfig,
    pub storage: StorageConfig,
}

fn parse_mime_list(var: &str, default: &str) -> Vec<String> {
    env::var(var)
        .unwrap_or_else(|_| default.to_string())
        .split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_size_variants(raw: &str) -> Result<Vec<SizeSpec>, anyhow::Error> {
    let mut sizes = Vec::new();
    for entry in raw.split(',').filter(|s| !s.trim().is_empty()) {
        let (label, coefficient) = entry
            .split_once(':')
            .ok_or_else(|| anyhow::anyhow!("Invalid size variant entry: {}", entry))?;
        let coefficient: f64 = coefficient
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid size coefficient in {:?}: {}", entry, e))?;
        sizes.push(SizeSpec {
            label: label.trim().to_string(),
            coefficient,
        });
    }
    Ok(sizes)
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());
        let cors_origins = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let max_file_size_mb = env::var("MAX_FILE_SIZE_MB")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(DEFAULT_MAX_FILE_SIZE_MB);

        let sizes_raw =
            env::var("SIZE_VARIANTS").unwrap_or_else(|_| DEFAULT_SIZE_VARIANTS.to_string());

        let preview_fit = env::var("PREVIEW_FIT")
            .unwrap_or_else(|_| "fill".to_string())
            .parse::<FitMode>()?;

        let storage_backend = env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "s3".to_string())
            .parse::<StorageBackend>()?;

        let buckets = BucketTable {
            images: env::var("BUCKET_IMAGES").unwrap_or_else(|_| "medialake-images".to_string()),
            docs: env::var("BUCKET_DOCS").unwrap_or_else(|_| "medialake-docs".to_string()),
            videos: env::var("BUCKET_VIDEOS").unwrap_or_else(|_| "medialake-videos".to_string()),
            tmp: env::var("BUCKET_TMP").unwrap_or_else(|_| "medialake-tmp".to_string()),
        };

        let config = Config {
            base: BaseConfig {
                server_port: env::var("PORT")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(DEFAULT_SERVER_PORT),
                cors_origins,
                db_max_connections: env::var("DB_MAX_CONNECTIONS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(MAX_CONNECTIONS),
                db_timeout_seconds: env::var("DB_TIMEOUT_SECONDS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(CONNECTION_TIMEOUT_SECS),
                environment,
            },
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgres://localhost/medialake".to_string()),
            media: MediaConfig {
                max_file_size_bytes: max_file_size_mb * 1024 * 1024,
                image_mime_types: parse_mime_list("IMAGE_MIME_TYPES", DEFAULT_IMAGE_MIME_TYPES),
                doc_mime_types: parse_mime_list("DOC_MIME_TYPES", DEFAULT_DOC_MIME_TYPES),
                video_mime_types: parse_mime_list("VIDEO_MIME_TYPES", DEFAULT_VIDEO_MIME_TYPES),
                preview: PreviewConfig {
                    width: env::var("PREVIEW_WIDTH")
                        .ok()
                        .and_then(|v| v.parse().ok())
                        .unwrap_or(DEFAULT_PREVIEW_WIDTH),
                    height: env::var("PREVIEW_HEIGHT")
                        .ok()
                        .and_then(|v| v.parse().ok())
                        .unwrap_or(DEFAULT_PREVIEW_HEIGHT),
                    fit: preview_fit,
                },
                sizes: parse_size_variants(&sizes_raw)?,
                stream_chunk_size_bytes: env::var("STREAM_CHUNK_SIZE_BYTES")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(DEFAULT_STREAM_CHUNK_SIZE),
            },
            storage: StorageConfig {
                backend: storage_backend,
                buckets,
                s3_region: env::var("S3_REGION")
                    .or_else(|_| env::var("AWS_REGION"))
                    .ok(),
                s3_endpoint: env::var("S3_ENDPOINT").ok(),
                local_storage_path: env::var("LOCAL_STORAGE_PATH").ok(),
            },
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.media.max_file_size_bytes == 0 {
            anyhow::bail!("MAX_FILE_SIZE_MB must be greater than zero");
        }
        if self.media.sizes.is_empty() {
            anyhow::bail!("SIZE_VARIANTS must name at least one size");
        }
        if self.media.sizes.iter().any(|s| s.coefficient <= 0.0) {
            anyhow::bail!("size variant coefficients must be positive");
        }
        if self.media.preview.width == 0 || self.media.preview.height == 0 {
            anyhow::bail!("preview dimensions must be positive");
        }
        if self.media.stream_chunk_size_bytes == 0 {
            anyhow::bail!("STREAM_CHUNK_SIZE_BYTES must be greater than zero");
        }
        match self.storage.backend {
            StorageBackend::S3 => {
                if self.storage.s3_region.is_none() && self.storage.s3_endpoint.is_none() {
                    anyhow::bail!("S3_REGION or S3_ENDPOINT required for the s3 backend");
                }
            }
            StorageBackend::Local => {
                if self.storage.local_storage_path.is_none() {
                    anyhow::bail!("LOCAL_STORAGE_PATH required for the local backend");
                }
            }
            StorageBackend::Memory => {}
        }
        Ok(())
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.base.environment.to_lowercase();
        env == "production" || env == "prod"
    }
}
