//! Gateway construction from configuration.

use crate::gateway::{ObjectStoreGateway, UrlStyle};
use crate::traits::{ObjectGateway, StorageError, StorageResult};
use medialake_core::config::StorageConfig;
use medialake_core::StorageBackend;
use object_store::aws::AmazonS3Builder;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::DynObjectStore;
use std::path::PathBuf;
use std::sync::Arc;

/// Create the object gateway selected by configuration.
pub async fn create_gateway(config: &StorageConfig) -> StorageResult<Arc<dyn ObjectGateway>> {
    match config.backend {
        StorageBackend::S3 => {
            let endpoint = config.s3_endpoint.clone();
            let region = match (config.s3_region.clone(), &endpoint) {
                (Some(region), _) => region,
                // S3-compatible endpoints still need a region for request signing.
                (None, Some(_)) => "us-east-1".to_string(),
                (None, None) => {
                    return Err(StorageError::ConfigError(
                        "S3_REGION, AWS_REGION or S3_ENDPOINT not configured".to_string(),
                    ))
                }
            };

            let url_style = match &endpoint {
                Some(endpoint) => UrlStyle::PathStyle {
                    endpoint: endpoint.trim_end_matches('/').to_string(),
                },
                None => UrlStyle::VirtualHost {
                    region: region.clone(),
                },
            };

            let gateway = ObjectStoreGateway::new(
                config.buckets.clone(),
                url_style,
                StorageBackend::S3,
                |bucket| build_s3_store(bucket, &region, endpoint.as_deref()),
            )?;
            Ok(Arc::new(gateway))
        }

        StorageBackend::Local => {
            let base_path = config.local_storage_path.clone().ok_or_else(|| {
                StorageError::ConfigError("LOCAL_STORAGE_PATH not configured".to_string())
            })?;
            let base_path = PathBuf::from(base_path);

            for name in [
                &config.buckets.images,
                &config.buckets.docs,
                &config.buckets.videos,
                &config.buckets.tmp,
            ] {
                let dir = base_path.join(name);
                tokio::fs::create_dir_all(&dir).await.map_err(|e| {
                    StorageError::ConfigError(format!(
                        "Failed to create storage directory {}: {}",
                        dir.display(),
                        e
                    ))
                })?;
            }

            let gateway = ObjectStoreGateway::new(
                config.buckets.clone(),
                UrlStyle::Relative,
                StorageBackend::Local,
                |bucket| {
                    let store = LocalFileSystem::new_with_prefix(base_path.join(bucket))
                        .map_err(|e| StorageError::ConfigError(e.to_string()))?;
                    let store: Arc<DynObjectStore> = Arc::new(store);
                    Ok(store)
                },
            )?;
            Ok(Arc::new(gateway))
        }

        StorageBackend::Memory => {
            let gateway = ObjectStoreGateway::new(
                config.buckets.clone(),
                UrlStyle::Relative,
                StorageBackend::Memory,
                |_| {
                    let store: Arc<DynObjectStore> = Arc::new(InMemory::new());
                    Ok(store)
                },
            )?;
            Ok(Arc::new(gateway))
        }
    }
}

fn build_s3_store(
    bucket: &str,
    region: &str,
    endpoint: Option<&str>,
) -> StorageResult<Arc<DynObjectStore>> {
    let mut builder = AmazonS3Builder::from_env()
        .with_region(region)
        .with_bucket_name(bucket);

    if let Some(endpoint) = endpoint {
        let allow_http = endpoint.starts_with("http://");
        builder = builder
            .with_endpoint(endpoint)
            .with_allow_http(allow_http);
    }

    let store = builder
        .build()
        .map_err(|e| StorageError::ConfigError(e.to_string()))?;

    Ok(Arc::new(store))
}
