use axum::{extract::State, Extension};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::database::models::{FormVersion, FormView};
use crate::error::ApiError;
use crate::middleware::{ApiPath, ApiResponse, ApiResult, AuthUser};
use crate::services::{access, check_publishable};
use crate::state::AppState;

/// Version row without its snapshot body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionSummary {
    pub id: Uuid,
    pub form_id: Uuid,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
}

impl From<&FormVersion> for VersionSummary {
    fn from(v: &FormVersion) -> Self {
        Self {
            id: v.id,
            form_id: v.form_id,
            version: v.version,
            created_at: v.created_at,
            published_at: v.published_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Published {
    pub form: FormView,
    pub version: VersionSummary,
}

/// POST /api/v1/forms/:form_id/publish - snapshot the live graph as the next published version.
/// CLOSED forms are reopened through a status update first.
pub async fn publish(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(form_id): ApiPath<Uuid>,
) -> ApiResult<Published> {
    let form = state.forms.get(form_id, &user.user_id).await?;
    check_publishable(&form)?;

    // Address first: a failed append leaves an unpublished form, never an orphaned version
    let form = state.forms.ensure_subdomain(form).await?;
    let graph = state.forms.load_graph(form).await?;

    let version = state.publisher.publish(&graph, Utc::now()).await?;
    let form = state.forms.mark_published(&graph.form).await?;

    tracing::info!("Form {} published as version {} by {}", form.id, version.version, user.user_id);
    Ok(ApiResponse::created(Published {
        form: form.into(),
        version: VersionSummary::from(&version),
    }))
}

/// POST /api/v1/forms/:form_id/draft - snapshot without publishing
pub async fn save_draft(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(form_id): ApiPath<Uuid>,
) -> ApiResult<VersionSummary> {
    let form = state.forms.get(form_id, &user.user_id).await?;
    access::ensure_editable(&form)?;
    let graph = state.forms.load_graph(form).await?;

    let version = state.publisher.save_draft(&graph).await?;
    Ok(ApiResponse::created(VersionSummary::from(&version)))
}

/// GET /api/v1/forms/:form_id/versions - newest first
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(form_id): ApiPath<Uuid>,
) -> ApiResult<Vec<VersionSummary>> {
    state.forms.get(form_id, &user.user_id).await?;
    let versions = state.versions.list_for_form(form_id).await?;
    Ok(ApiResponse::success(versions.iter().map(VersionSummary::from).collect()))
}

/// GET /api/v1/forms/:form_id/versions/:version_id - full stored snapshot
pub async fn show(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath((form_id, version_id)): ApiPath<(Uuid, Uuid)>,
) -> ApiResult<FormVersion> {
    state.forms.get(form_id, &user.user_id).await?;
    let version = state.versions.get_by_id(version_id).await?;
    if version.form_id != form_id {
        return Err(ApiError::not_found(format!("Version {} not found", version_id)));
    }
    Ok(ApiResponse::success(version))
}
