use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::group::Group;

/// Lifecycle of an upload's derivative chain.
///
/// `Pending` until the group finisher has committed every expected
/// derivative row; `Failed` when the finisher errored so the record is
/// queryable instead of stuck.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "upload_status", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    Pending,
    Ready,
    Failed,
}

/// Durable record of one ingested file. `id` equals the descriptor id the
/// file was ingested under, and the object-store key is derived from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Upload {
    pub id: Uuid,
    pub user_id: Uuid,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "upload_group"))]
    pub group: Group,
    pub status: UploadStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Upload {
    pub fn is_ready(&self) -> bool {
        self.status == UploadStatus::Ready
    }
}
