use axum::{extract::State, Extension};
use uuid::Uuid;

use crate::database::models::FormView;
use crate::middleware::{ApiJson, ApiPath, ApiResponse, ApiResult, AuthUser};
use crate::services::form_service::{FormUpdate, NewForm};
use crate::state::AppState;

/// POST /api/v1/projects/:project_id/forms
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(project_id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<NewForm>,
) -> ApiResult<FormView> {
    let form = state.forms.create(project_id, &user.user_id, body).await?;
    Ok(ApiResponse::created(form.into()))
}

pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(project_id): ApiPath<Uuid>,
) -> ApiResult<Vec<FormView>> {
    let forms = state.forms.list(project_id, &user.user_id).await?;
    Ok(ApiResponse::success(forms.into_iter().map(FormView::from).collect()))
}

pub async fn show(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(form_id): ApiPath<Uuid>,
) -> ApiResult<FormView> {
    let form = state.forms.get(form_id, &user.user_id).await?;
    Ok(ApiResponse::success(form.into()))
}

/// PATCH /api/v1/forms/:form_id - settings, status, password and custom domain
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(form_id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<FormUpdate>,
) -> ApiResult<FormView> {
    let form = state.forms.update(form_id, &user.user_id, body).await?;
    Ok(ApiResponse::success(form.into()))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(form_id): ApiPath<Uuid>,
) -> ApiResult<()> {
    state.forms.delete(form_id, &user.user_id).await?;
    Ok(ApiResponse::no_content())
}
