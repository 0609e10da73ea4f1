use axum::{
    extract::{Query, State},
    Extension,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::middleware::{ApiJson, ApiPath, ApiResponse, ApiResult, AuthUser};
use crate::services::upload_service::{DownloadRequest, PresignedUrl, UploadRequest};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct KeyQuery {
    pub key: String,
}

/// POST /api/v1/forms/:form_id/uploads - presigned PUT under the form's prefix
pub async fn presign_upload(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(form_id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<UploadRequest>,
) -> ApiResult<PresignedUrl> {
    state.forms.get(form_id, &user.user_id).await?;
    let signed = state.uploads.presign_upload(form_id, &body).await?;
    Ok(ApiResponse::created(signed))
}

/// POST /api/v1/forms/:form_id/uploads/download - presigned GET for a key of this form
pub async fn presign_download(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(form_id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<DownloadRequest>,
) -> ApiResult<PresignedUrl> {
    state.forms.get(form_id, &user.user_id).await?;
    let signed = state.uploads.presign_download(form_id, &body).await?;
    Ok(ApiResponse::success(signed))
}

/// DELETE /api/v1/forms/:form_id/uploads?key=...
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(form_id): ApiPath<Uuid>,
    Query(query): Query<KeyQuery>,
) -> ApiResult<()> {
    state.forms.get(form_id, &user.user_id).await?;
    state.uploads.delete(form_id, &query.key).await?;
    tracing::info!("Deleted upload '{}' from form {}", query.key, form_id);
    Ok(ApiResponse::no_content())
}
