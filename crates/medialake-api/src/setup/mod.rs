//! Application setup and initialization
//!
//! All startup logic lives here instead of main.rs: telemetry, database
//! pool and migrations, storage gateway, service wiring, and routes.

pub mod database;
pub mod routes;
pub mod server;

use std::sync::Arc;

use anyhow::Result;
use medialake_core::Config;
use medialake_db::{MetadataStore, PgMetadataStore};
use medialake_storage::create_gateway;

use crate::state::AppState;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    // Fail fast on misconfiguration before opening any connection.
    config.validate()?;

    crate::telemetry::init_telemetry();

    tracing::info!(
        environment = %config.base.environment,
        storage_backend = %config.storage.backend,
        "Configuration loaded and validated successfully"
    );

    let pool = database::setup_database(&config).await?;
    let metadata: Arc<dyn MetadataStore> = Arc::new(PgMetadataStore::new(pool));

    let gateway = create_gateway(&config.storage).await?;

    let state = Arc::new(AppState::new(config, gateway, metadata));

    let router = routes::setup_routes(state.clone())?;

    Ok((state, router))
}
