//! Route configuration and setup.

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

// The per-file ceiling is enforced post-write, so the transport limit only
// bounds one whole multipart batch.
const MAX_BATCH_FILES: usize = 32;

/// Setup all application routes
pub fn setup_routes(state: Arc<AppState>) -> Result<Router, anyhow::Error> {
    let cors = setup_cors(&state)?;
    let body_limit = state
        .config
        .media
        .max_file_size_bytes
        .saturating_mul(MAX_BATCH_FILES);

    let app = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/media/upload", post(handlers::media_upload::upload_media))
        .route(
            "/media/uploads/{id}",
            get(handlers::upload_status::get_upload),
        )
        .route(
            "/media/stream/{public_id}",
            get(handlers::media_stream::stream_media),
        )
        .route(
            "/media/archive",
            post(handlers::media_archive::archive_media),
        )
        .route("/media/{public_id}", get(handlers::media_get::get_media))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(DefaultBodyLimit::disable())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Ok(app)
}

fn setup_cors(state: &Arc<AppState>) -> Result<CorsLayer, anyhow::Error> {
    let origins = &state.config.base.cors_origins;
    let cors = if origins.contains(&"*".to_string()) {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any)
    } else {
        let parsed: Result<Vec<HeaderValue>, _> = origins.iter().map(|o| o.parse()).collect();
        CorsLayer::new()
            .allow_origin(parsed.unwrap_or_default())
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any)
    };
    Ok(cors)
}
