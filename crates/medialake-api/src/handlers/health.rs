//! Health check handler and response type.

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::{http::StatusCode, response::IntoResponse, Json};
use medialake_core::models::Bucket;
use uuid::Uuid;

use crate::state::AppState;

/// Run an async check with timeout; returns "healthy", "timeout", or
/// "{prefix}: {error}".
async fn run_check<F, E>(timeout: Duration, f: F, error_prefix: &str) -> String
where
    F: Future<Output = Result<(), E>>,
    E: Display,
{
    match tokio::time::timeout(timeout, f).await {
        Ok(Ok(())) => "healthy".to_string(),
        Ok(Err(e)) => format!("{}: {}", error_prefix, e),
        Err(_) => "timeout".to_string(),
    }
}

#[derive(serde::Serialize)]
struct HealthCheckResponse {
    status: String,
    metadata: String,
    storage: String,
}

/// Liveness probe plus a shallow check of both backends. The metadata store
/// gates the overall status; storage degradation is reported but does not
/// fail the probe.
pub async fn health_check(
    axum::extract::State(state): axum::extract::State<Arc<AppState>>,
) -> impl IntoResponse {
    const TIMEOUT: Duration = Duration::from_secs(5);

    let mut response = HealthCheckResponse {
        status: "healthy".to_string(),
        metadata: "unknown".to_string(),
        storage: "unknown".to_string(),
    };

    let metadata = Arc::clone(&state.metadata);
    response.metadata = run_check(
        TIMEOUT,
        async move { metadata.find_upload(Uuid::nil()).await.map(drop) },
        "unhealthy",
    )
    .await;
    let overall_healthy = response.metadata == "healthy";

    let gateway = Arc::clone(&state.gateway);
    response.storage = run_check(
        TIMEOUT,
        async move {
            gateway
                .exists(Bucket::Tmp, "health-check-non-existent-key")
                .await
                .map(drop)
        },
        "degraded",
    )
    .await;

    let status_code = if overall_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(response))
}
