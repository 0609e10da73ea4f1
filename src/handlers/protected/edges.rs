use axum::{extract::State, Extension};
use uuid::Uuid;

use crate::database::models::Edge;
use crate::middleware::{ApiJson, ApiPath, ApiResponse, ApiResult, AuthUser};
use crate::services::edge_service::{EdgeUpdate, NewEdge};
use crate::state::AppState;

pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(form_id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<NewEdge>,
) -> ApiResult<Edge> {
    let edge = state.edges.create(form_id, &user.user_id, body).await?;
    Ok(ApiResponse::created(edge))
}

pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(form_id): ApiPath<Uuid>,
) -> ApiResult<Vec<Edge>> {
    Ok(ApiResponse::success(state.edges.list(form_id, &user.user_id).await?))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(edge_id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<EdgeUpdate>,
) -> ApiResult<Edge> {
    Ok(ApiResponse::success(state.edges.update(edge_id, &user.user_id, body).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(edge_id): ApiPath<Uuid>,
) -> ApiResult<()> {
    state.edges.delete(edge_id, &user.user_id).await?;
    Ok(ApiResponse::no_content())
}
