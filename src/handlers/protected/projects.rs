use axum::{extract::State, Extension};
use serde::Deserialize;
use uuid::Uuid;

use crate::database::models::Project;
use crate::middleware::{ApiJson, ApiPath, ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct NewProjectBody {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProjectUpdateBody {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// POST /api/v1/teams/:team_id/projects
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(team_id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<NewProjectBody>,
) -> ApiResult<Project> {
    let project = state
        .projects
        .create(team_id, &user.user_id, &body.name, body.description)
        .await?;
    Ok(ApiResponse::created(project))
}

pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(team_id): ApiPath<Uuid>,
) -> ApiResult<Vec<Project>> {
    Ok(ApiResponse::success(state.projects.list(team_id, &user.user_id).await?))
}

pub async fn show(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(project_id): ApiPath<Uuid>,
) -> ApiResult<Project> {
    Ok(ApiResponse::success(state.projects.get(project_id, &user.user_id).await?))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(project_id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<ProjectUpdateBody>,
) -> ApiResult<Project> {
    let project = state
        .projects
        .update(project_id, &user.user_id, body.name, body.description)
        .await?;
    Ok(ApiResponse::success(project))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(project_id): ApiPath<Uuid>,
) -> ApiResult<()> {
    state.projects.delete(project_id, &user.user_id).await?;
    Ok(ApiResponse::no_content())
}
