use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::types::Document;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub id: Uuid,
    pub form_id: Uuid,
    pub form_version_id: Uuid,
    pub answers: Document,
    pub started_at: Option<DateTime<Utc>>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Response {
    pub fn is_submitted(&self) -> bool {
        self.submitted_at.is_some()
    }
}
