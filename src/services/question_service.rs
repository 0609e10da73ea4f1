use chrono::Utc;
use serde::Deserialize;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::database::models::{Question, QuestionOption, QuestionWithOptions};
use crate::types::{Document, QuestionType};

use super::{access, merge_optional_text, validate_name, ServiceError};

const QUESTION_COLUMNS: &str = "id, form_id, type, title, description, required, metadata, \
     position_x, position_y, created_at, updated_at";

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOption {
    pub label: String,
    pub value: Option<String>,
    pub sort_order: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewQuestion {
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub metadata: Document,
    #[serde(default)]
    pub position: Position,
    #[serde(default)]
    pub options: Vec<NewOption>,
}

/// Partial update; `options`, when present, replaces the whole option set
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionUpdate {
    #[serde(rename = "type")]
    pub question_type: Option<QuestionType>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub required: Option<bool>,
    pub metadata: Option<Document>,
    pub position: Option<Position>,
    pub options: Option<Vec<NewOption>>,
}

pub struct QuestionService {
    pool: PgPool,
}

impl QuestionService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, form_id: Uuid, user_id: &str, input: NewQuestion) -> Result<QuestionWithOptions, ServiceError> {
        let title = validate_name("Question title", &input.title)?;
        check_options(input.question_type, &input.options)?;
        access::editable_form_for_user(&self.pool, form_id, user_id).await?;

        let mut tx = self.pool.begin().await?;
        let question = sqlx::query_as::<_, Question>(&format!(
            "INSERT INTO questions (id, form_id, type, title, description, required, metadata, position_x, position_y)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING {QUESTION_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(form_id)
        .bind(input.question_type)
        .bind(&title)
        .bind(merge_optional_text(None, input.description))
        .bind(input.required)
        .bind(&input.metadata)
        .bind(input.position.x)
        .bind(input.position.y)
        .fetch_one(&mut *tx)
        .await?;

        let options = insert_options(&mut tx, question.id, &input.options).await?;
        tx.commit().await?;

        Ok(QuestionWithOptions { question, options })
    }

    pub async fn list(&self, form_id: Uuid, user_id: &str) -> Result<Vec<QuestionWithOptions>, ServiceError> {
        access::form_for_user(&self.pool, form_id, user_id).await?;

        let questions = sqlx::query_as::<_, Question>(&format!(
            "SELECT {QUESTION_COLUMNS} FROM questions WHERE form_id = $1 ORDER BY created_at, id"
        ))
        .bind(form_id)
        .fetch_all(&self.pool)
        .await?;

        let ids: Vec<Uuid> = questions.iter().map(|q| q.id).collect();
        let mut options = sqlx::query_as::<_, QuestionOption>(
            "SELECT id, question_id, label, value, sort_order FROM question_options
             WHERE question_id = ANY($1) ORDER BY sort_order, id",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(questions
            .into_iter()
            .map(|question| {
                let (mine, rest): (Vec<_>, Vec<_>) =
                    options.drain(..).partition(|o| o.question_id == question.id);
                options = rest;
                QuestionWithOptions {
                    question,
                    options: mine,
                }
            })
            .collect())
    }

    pub async fn get(&self, question_id: Uuid, user_id: &str) -> Result<QuestionWithOptions, ServiceError> {
        let question = self.find(question_id).await?;
        access::form_for_user(&self.pool, question.form_id, user_id).await?;
        let options = self.options_for(question.id).await?;
        Ok(QuestionWithOptions { question, options })
    }

    pub async fn update(&self, question_id: Uuid, user_id: &str, update: QuestionUpdate) -> Result<QuestionWithOptions, ServiceError> {
        let current = self.find(question_id).await?;
        access::editable_form_for_user(&self.pool, current.form_id, user_id).await?;

        let question_type = update.question_type.unwrap_or(current.question_type);
        let title = match update.title {
            Some(t) => validate_name("Question title", &t)?,
            None => current.title,
        };
        if let Some(options) = &update.options {
            check_options(question_type, options)?;
        } else if !question_type.has_options() && !self.options_for(question_id).await?.is_empty() {
            return Err(ServiceError::BadRequest(format!(
                "{:?} questions cannot keep options; send an empty options list",
                question_type
            )));
        }
        let position = update.position.unwrap_or(Position {
            x: current.position_x,
            y: current.position_y,
        });

        let mut tx = self.pool.begin().await?;
        let question = sqlx::query_as::<_, Question>(&format!(
            "UPDATE questions SET type = $2, title = $3, description = $4, required = $5,
                    metadata = $6, position_x = $7, position_y = $8, updated_at = $9
             WHERE id = $1
             RETURNING {QUESTION_COLUMNS}"
        ))
        .bind(question_id)
        .bind(question_type)
        .bind(&title)
        .bind(merge_optional_text(current.description, update.description))
        .bind(update.required.unwrap_or(current.required))
        .bind(update.metadata.unwrap_or(current.metadata))
        .bind(position.x)
        .bind(position.y)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await?;

        let options = match &update.options {
            Some(new_options) => {
                sqlx::query("DELETE FROM question_options WHERE question_id = $1")
                    .bind(question_id)
                    .execute(&mut *tx)
                    .await?;
                insert_options(&mut tx, question_id, new_options).await?
            }
            None => {
                sqlx::query_as::<_, QuestionOption>(
                    "SELECT id, question_id, label, value, sort_order FROM question_options
                     WHERE question_id = $1 ORDER BY sort_order, id",
                )
                .bind(question_id)
                .fetch_all(&mut *tx)
                .await?
            }
        };
        tx.commit().await?;

        Ok(QuestionWithOptions { question, options })
    }

    /// Removes the question together with its options and every edge touching it
    pub async fn delete(&self, question_id: Uuid, user_id: &str) -> Result<(), ServiceError> {
        let question = self.find(question_id).await?;
        access::editable_form_for_user(&self.pool, question.form_id, user_id).await?;

        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM edges WHERE source_question_id = $1 OR target_question_id = $1")
            .bind(question_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM questions WHERE id = $1")
            .bind(question_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn find(&self, question_id: Uuid) -> Result<Question, ServiceError> {
        sqlx::query_as::<_, Question>(&format!(
            "SELECT {QUESTION_COLUMNS} FROM questions WHERE id = $1"
        ))
        .bind(question_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Question {} not found", question_id)))
    }

    async fn options_for(&self, question_id: Uuid) -> Result<Vec<QuestionOption>, ServiceError> {
        let options = sqlx::query_as::<_, QuestionOption>(
            "SELECT id, question_id, label, value, sort_order FROM question_options
             WHERE question_id = $1 ORDER BY sort_order, id",
        )
        .bind(question_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(options)
    }
}

async fn insert_options(
    tx: &mut Transaction<'_, Postgres>,
    question_id: Uuid,
    options: &[NewOption],
) -> Result<Vec<QuestionOption>, ServiceError> {
    let mut inserted = Vec::with_capacity(options.len());
    for (index, option) in options.iter().enumerate() {
        let label = option.label.trim().to_string();
        let value = option.value.clone().unwrap_or_else(|| label.clone());
        let row = sqlx::query_as::<_, QuestionOption>(
            "INSERT INTO question_options (id, question_id, label, value, sort_order)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id, question_id, label, value, sort_order",
        )
        .bind(Uuid::new_v4())
        .bind(question_id)
        .bind(&label)
        .bind(&value)
        .bind(option.sort_order.unwrap_or(index as i32))
        .fetch_one(&mut **tx)
        .await?;
        inserted.push(row);
    }
    inserted.sort_by(|a, b| a.sort_order.cmp(&b.sort_order).then(a.id.cmp(&b.id)));
    Ok(inserted)
}

pub fn check_options(question_type: QuestionType, options: &[NewOption]) -> Result<(), ServiceError> {
    if !question_type.has_options() && !options.is_empty() {
        return Err(ServiceError::BadRequest(format!(
            "{:?} questions do not take options",
            question_type
        )));
    }
    if options.iter().any(|o| o.label.trim().is_empty()) {
        return Err(ServiceError::BadRequest("Option labels must not be empty".to_string()));
    }
    Ok(())
}
