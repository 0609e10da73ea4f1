use axum::{extract::State, Extension};
use chrono::Utc;
use uuid::Uuid;

use crate::middleware::{ApiPath, ApiResponse, ApiResult, AuthUser};
use crate::services::analytics::{compute_dashboard, Dashboard};
use crate::state::AppState;

/// GET /api/v1/forms/:form_id/dashboard - recomputed on every request
pub async fn show(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(form_id): ApiPath<Uuid>,
) -> ApiResult<Dashboard> {
    let timings = state.responses.timings_for_form(form_id, &user.user_id).await?;
    Ok(ApiResponse::success(compute_dashboard(&timings, Utc::now())))
}
