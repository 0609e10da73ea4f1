use axum::{extract::State, Extension};
use uuid::Uuid;

use crate::database::models::QuestionWithOptions;
use crate::middleware::{ApiJson, ApiPath, ApiResponse, ApiResult, AuthUser};
use crate::services::question_service::{NewQuestion, QuestionUpdate};
use crate::state::AppState;

/// POST /api/v1/forms/:form_id/questions
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(form_id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<NewQuestion>,
) -> ApiResult<QuestionWithOptions> {
    let question = state.questions.create(form_id, &user.user_id, body).await?;
    Ok(ApiResponse::created(question))
}

pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(form_id): ApiPath<Uuid>,
) -> ApiResult<Vec<QuestionWithOptions>> {
    Ok(ApiResponse::success(state.questions.list(form_id, &user.user_id).await?))
}

pub async fn show(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(question_id): ApiPath<Uuid>,
) -> ApiResult<QuestionWithOptions> {
    Ok(ApiResponse::success(state.questions.get(question_id, &user.user_id).await?))
}

/// PATCH /api/v1/questions/:question_id - `options`, when sent, replaces the whole set
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(question_id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<QuestionUpdate>,
) -> ApiResult<QuestionWithOptions> {
    let question = state.questions.update(question_id, &user.user_id, body).await?;
    Ok(ApiResponse::success(question))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(question_id): ApiPath<Uuid>,
) -> ApiResult<()> {
    state.questions.delete(question_id, &user.user_id).await?;
    Ok(ApiResponse::no_content())
}
