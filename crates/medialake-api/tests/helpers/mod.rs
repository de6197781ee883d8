//! Shared test wiring: an app router over in-memory backends.

use std::sync::Arc;

use medialake_api::setup::routes::setup_routes;
use medialake_api::state::AppState;
use medialake_core::config::{
    BaseConfig, BucketTable, Config, FitMode, MediaConfig, PreviewConfig, SizeSpec, StorageConfig,
};
use medialake_core::StorageBackend;
use medialake_db::{InMemoryMetadataStore, MetadataStore};
use medialake_storage::create_gateway;

pub const BOUNDARY: &str = "medialake-test-boundary";

pub fn test_config() -> Config {
    Config {
        base: BaseConfig {
            server_port: 0,
            cors_origins: vec!["*".to_string()],
            db_max_connections: 2,
            db_timeout_seconds: 5,
            environment: "test".to_string(),
        },
        database_url: "postgres://localhost/medialake_test".to_string(),
        media: MediaConfig {
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
            stream_chunk_size_bytes: 4,
        },
        storage: StorageConfig {
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
        },
    }
}

pub async fn test_app() -> (axum::Router, Arc<AppState>) {
    let config = test_config();
    let gateway = create_gateway(&config.storage).await.unwrap();
    let metadata: Arc<dyn MetadataStore> = Arc::new(InMemoryMetadataStore::default());
    let state = Arc::new(AppState::new(config, gateway, metadata));
    let router = setup_routes(state.clone()).unwrap();
    (router, state)
}

/// Build a multipart body of `(filename, content_type, data)` file parts.
pub fn multipart_body(parts: &[(&str, &str, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (filename, content_type, data) in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n",
                filename
            )
            .as_bytes(),
        );
        body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={}", BOUNDARY)
}
