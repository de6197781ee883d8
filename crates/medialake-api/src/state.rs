//! Application state
//!
//! One `AppState` is built at startup and shared across handlers behind an
//! `Arc`. Service objects are constructed here from the storage gateway and
//! metadata store so tests can wire the same state over in-memory backends.

use std::sync::Arc;

use medialake_core::Config;
use medialake_db::MetadataStore;
use medialake_services::{ArchiveService, ContentResolver, IngestionPipeline};
use medialake_storage::ObjectGateway;

pub struct AppState {
    pub config: Config,
    pub gateway: Arc<dyn ObjectGateway>,
    pub metadata: Arc<dyn MetadataStore>,
    pub pipeline: IngestionPipeline,
    pub resolver: Arc<ContentResolver>,
    pub archive: ArchiveService,
}

impl AppState {
    pub fn new(
        config: Config,
        gateway: Arc<dyn ObjectGateway>,
        metadata: Arc<dyn MetadataStore>,
    ) -> Self {
        let pipeline = IngestionPipeline::new(
            Arc::clone(&gateway),
            Arc::clone(&metadata),
            config.media.clone(),
            !config.is_production(),
        );
        let resolver = Arc::new(ContentResolver::new(
            Arc::clone(&gateway),
            Arc::clone(&metadata),
        ));
        let archive = ArchiveService::new(Arc::clone(&resolver));
        Self {
            config,
            gateway,
            metadata,
            pipeline,
            resolver,
            archive,
        }
    }
}

// Compile-time check that AppState can be shared across handler tasks.
#[allow(dead_code)]
fn _assert_app_state_send_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<AppState>();
}
