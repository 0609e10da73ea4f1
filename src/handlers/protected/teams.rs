use axum::{extract::State, Extension};
use serde::Deserialize;
use uuid::Uuid;

use crate::database::models::{Team, TeamMember};
use crate::middleware::{ApiJson, ApiPath, ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;
use crate::types::TeamRole;

#[derive(Debug, Deserialize)]
pub struct TeamBody {
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddMemberBody {
    pub user_id: String,
    #[serde(default = "default_role")]
    pub role: TeamRole,
}

fn default_role() -> TeamRole {
    TeamRole::Member
}

/// POST /api/v1/teams
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(body): ApiJson<TeamBody>,
) -> ApiResult<Team> {
    let team = state.teams.create(&body.name, &user.user_id).await?;
    Ok(ApiResponse::created(team))
}

/// GET /api/v1/teams - teams the caller belongs to
pub async fn list(State(state): State<AppState>, Extension(user): Extension<AuthUser>) -> ApiResult<Vec<Team>> {
    Ok(ApiResponse::success(state.teams.list_for_user(&user.user_id).await?))
}

pub async fn show(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(team_id): ApiPath<Uuid>,
) -> ApiResult<Team> {
    Ok(ApiResponse::success(state.teams.get(team_id, &user.user_id).await?))
}

pub async fn rename(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(team_id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<TeamBody>,
) -> ApiResult<Team> {
    let team = state.teams.rename(team_id, &user.user_id, &body.name).await?;
    Ok(ApiResponse::success(team))
}

/// DELETE /api/v1/teams/:team_id - owners only, soft delete
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(team_id): ApiPath<Uuid>,
) -> ApiResult<()> {
    state.teams.delete(team_id, &user.user_id).await?;
    Ok(ApiResponse::no_content())
}

pub async fn members(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(team_id): ApiPath<Uuid>,
) -> ApiResult<Vec<TeamMember>> {
    Ok(ApiResponse::success(state.teams.members(team_id, &user.user_id).await?))
}

pub async fn add_member(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(team_id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<AddMemberBody>,
) -> ApiResult<TeamMember> {
    let member = state
        .teams
        .add_member(team_id, &user.user_id, &body.user_id, body.role)
        .await?;
    Ok(ApiResponse::created(member))
}

pub async fn remove_member(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath((team_id, member_id)): ApiPath<(Uuid, String)>,
) -> ApiResult<()> {
    state.teams.remove_member(team_id, &user.user_id, &member_id).await?;
    Ok(ApiResponse::no_content())
}
