use chrono::Utc;
use serde::{Deserialize, Deserializer};
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::models::Edge;
use crate::types::Document;

use super::{access, ServiceError};

const EDGE_COLUMNS: &str =
    "id, form_id, source_question_id, target_question_id, condition, created_at, updated_at";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEdge {
    pub source_question_id: Uuid,
    pub target_question_id: Uuid,
    pub condition: Option<Document>,
}

/// `condition: null` clears the condition; leaving it out keeps it
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeUpdate {
    pub source_question_id: Option<Uuid>,
    pub target_question_id: Option<Uuid>,
    #[serde(default, deserialize_with = "present")]
    pub condition: Option<Option<Document>>,
}

fn present<'de, D>(deserializer: D) -> Result<Option<Option<Document>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Document>::deserialize(deserializer).map(Some)
}

pub struct EdgeService {
    pool: PgPool,
}

impl EdgeService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, form_id: Uuid, user_id: &str, input: NewEdge) -> Result<Edge, ServiceError> {
        access::editable_form_for_user(&self.pool, form_id, user_id).await?;
        self.check_endpoints(form_id, input.source_question_id, input.target_question_id)
            .await?;

        let edge = sqlx::query_as::<_, Edge>(&format!(
            "INSERT INTO edges (id, form_id, source_question_id, target_question_id, condition)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {EDGE_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(form_id)
        .bind(input.source_question_id)
        .bind(input.target_question_id)
        .bind(&input.condition)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Created edge {} in form {}", edge.id, form_id);
        Ok(edge)
    }

    pub async fn list(&self, form_id: Uuid, user_id: &str) -> Result<Vec<Edge>, ServiceError> {
        access::form_for_user(&self.pool, form_id, user_id).await?;
        let edges = sqlx::query_as::<_, Edge>(&format!(
            "SELECT {EDGE_COLUMNS} FROM edges WHERE form_id = $1 ORDER BY created_at, id"
        ))
        .bind(form_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(edges)
    }

    pub async fn update(&self, edge_id: Uuid, user_id: &str, update: EdgeUpdate) -> Result<Edge, ServiceError> {
        let current = self.find(edge_id).await?;
        access::editable_form_for_user(&self.pool, current.form_id, user_id).await?;

        let source = update.source_question_id.unwrap_or(current.source_question_id);
        let target = update.target_question_id.unwrap_or(current.target_question_id);
        if source != current.source_question_id || target != current.target_question_id {
            self.check_endpoints(current.form_id, source, target).await?;
        }
        let condition = update.condition.unwrap_or(current.condition);

        let edge = sqlx::query_as::<_, Edge>(&format!(
            "UPDATE edges SET source_question_id = $2, target_question_id = $3, condition = $4, updated_at = $5
             WHERE id = $1
             RETURNING {EDGE_COLUMNS}"
        ))
        .bind(edge_id)
        .bind(source)
        .bind(target)
        .bind(&condition)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;
        Ok(edge)
    }

    pub async fn delete(&self, edge_id: Uuid, user_id: &str) -> Result<(), ServiceError> {
        let edge = self.find(edge_id).await?;
        access::editable_form_for_user(&self.pool, edge.form_id, user_id).await?;
        sqlx::query("DELETE FROM edges WHERE id = $1")
            .bind(edge_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn find(&self, edge_id: Uuid) -> Result<Edge, ServiceError> {
        sqlx::query_as::<_, Edge>(&format!("SELECT {EDGE_COLUMNS} FROM edges WHERE id = $1"))
            .bind(edge_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Edge {} not found", edge_id)))
    }

    /// Both ends must be questions of the same form
    async fn check_endpoints(&self, form_id: Uuid, source: Uuid, target: Uuid) -> Result<(), ServiceError> {
        check_distinct(source, target)?;
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM questions WHERE form_id = $1 AND id IN ($2, $3)",
        )
        .bind(form_id)
        .bind(source)
        .bind(target)
        .fetch_one(&self.pool)
        .await?;

        if count != 2 {
            return Err(ServiceError::BadRequest(
                "Both edge endpoints must be questions of this form".to_string(),
            ));
        }
        Ok(())
    }
}

fn check_distinct(source: Uuid, target: Uuid) -> Result<(), ServiceError> {
    if source == target {
        return Err(ServiceError::BadRequest(
            "An edge cannot point a question at itself".to_string(),
        ));
    }
    Ok(())
}
