//! Upload readiness polling
//!
//! `GET /media/uploads/{id}` returns the durable upload record so clients
//! can poll `status` until the derivative chain settles.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use medialake_core::models::Upload;
use uuid::Uuid;

use crate::error::HttpAppError;
use crate::state::AppState;

#[tracing::instrument(skip(state), fields(upload_id = %id))]
pub async fn get_upload(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Upload>, HttpAppError> {
    let upload = state.metadata.get_upload(id).await?;
    Ok(Json(upload))
}
