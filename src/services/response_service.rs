use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::database::models::Response;
use crate::types::Document;

use super::{access, ServiceError};

const RESPONSE_COLUMNS: &str =
    "id, form_id, form_version_id, answers, started_at, submitted_at, created_at";

/// The two timestamps the dashboard needs from each response row
#[derive(Debug, Clone, Copy, FromRow)]
pub struct ResponseTiming {
    pub started_at: Option<DateTime<Utc>>,
    pub submitted_at: Option<DateTime<Utc>>,
}

pub struct ResponseService {
    pool: PgPool,
}

impl ResponseService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a response against the version the respondent was served
    pub async fn start(&self, form_id: Uuid, form_version_id: Uuid) -> Result<Response, ServiceError> {
        let response = sqlx::query_as::<_, Response>(&format!(
            "INSERT INTO responses (id, form_id, form_version_id, answers, started_at)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {RESPONSE_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(form_id)
        .bind(form_version_id)
        .bind(Document::empty())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Started response {} for form {}", response.id, form_id);
        Ok(response)
    }

    /// Store the answers once; a second submission is a conflict
    pub async fn submit(&self, form_id: Uuid, response_id: Uuid, answers: Document) -> Result<Response, ServiceError> {
        let updated = sqlx::query_as::<_, Response>(&format!(
            "UPDATE responses SET answers = $3, submitted_at = $4
             WHERE id = $1 AND form_id = $2 AND submitted_at IS NULL
             RETURNING {RESPONSE_COLUMNS}"
        ))
        .bind(response_id)
        .bind(form_id)
        .bind(&answers)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        if let Some(response) = updated {
            return Ok(response);
        }

        let exists: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM responses WHERE id = $1 AND form_id = $2")
                .bind(response_id)
                .bind(form_id)
                .fetch_optional(&self.pool)
                .await?;

        match exists {
            Some(_) => Err(ServiceError::Conflict(format!(
                "Response {} has already been submitted",
                response_id
            ))),
            None => Err(ServiceError::NotFound(format!("Response {} not found", response_id))),
        }
    }

    pub async fn list_for_form(&self, form_id: Uuid, user_id: &str) -> Result<Vec<Response>, ServiceError> {
        access::form_for_user(&self.pool, form_id, user_id).await?;
        let responses = sqlx::query_as::<_, Response>(&format!(
            "SELECT {RESPONSE_COLUMNS} FROM responses WHERE form_id = $1 ORDER BY created_at DESC, id"
        ))
        .bind(form_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(responses)
    }

    pub async fn timings_for_form(&self, form_id: Uuid, user_id: &str) -> Result<Vec<ResponseTiming>, ServiceError> {
        access::form_for_user(&self.pool, form_id, user_id).await?;
        let timings = sqlx::query_as::<_, ResponseTiming>(
            "SELECT started_at, submitted_at FROM responses WHERE form_id = $1",
        )
        .bind(form_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(timings)
    }
}
