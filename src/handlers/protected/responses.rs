use axum::{extract::State, Extension};
use uuid::Uuid;

use crate::database::models::Response;
use crate::middleware::{ApiPath, ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;

/// GET /api/v1/forms/:form_id/responses - newest first
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(form_id): ApiPath<Uuid>,
) -> ApiResult<Vec<Response>> {
    Ok(ApiResponse::success(state.responses.list_for_form(form_id, &user.user_id).await?))
}
