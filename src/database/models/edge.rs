use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::types::Document;

/// Directed branch between two questions of the same form
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub id: Uuid,
    pub form_id: Uuid,
    pub source_question_id: Uuid,
    pub target_question_id: Uuid,
    pub condition: Option<Document>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
