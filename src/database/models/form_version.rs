use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// Immutable snapshot row. `snapshot` holds the serialized `FormSnapshot` exactly as
/// it was written at creation time.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct FormVersion {
    pub id: Uuid,
    pub form_id: Uuid,
    pub version: i32,
    pub snapshot: Value,
    pub created_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
}

impl FormVersion {
    pub fn is_published(&self) -> bool {
        self.published_at.is_some()
    }
}
