use axum::extract::State;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::database::models::Form;
use crate::error::ApiError;
use crate::middleware::{ApiJson, ApiPath, ApiResponse, ApiResult};
use crate::services::form_service::verify_password;
use crate::services::submission::PublicSubmission;
use crate::services::upload_service::{PresignedUrl, UploadRequest};
use crate::state::AppState;
use crate::types::{Document, UploadIntent};

#[derive(Debug, Default, Deserialize)]
pub struct StartRequest {
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartedResponse {
    pub response_id: Uuid,
    pub form_version: i32,
    pub started_at: Option<DateTime<Utc>>,
}

/// Upload request from a respondent; password-protected forms need the password here too
#[derive(Debug, Deserialize)]
pub struct PublicUploadRequest {
    #[serde(flatten)]
    pub upload: UploadRequest,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    pub answers: Document,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedResponse {
    pub response_id: Uuid,
    pub submitted_at: Option<DateTime<Utc>>,
}

/// GET /api/v1/submission/:domain - latest published snapshot for the domain
pub async fn show(
    State(state): State<AppState>,
    ApiPath(domain): ApiPath<String>,
) -> ApiResult<PublicSubmission> {
    let resolved = state.resolver.resolve(&domain).await?;
    Ok(ApiResponse::success(resolved.submission))
}

/// POST /api/v1/submission/:domain/responses - open a response on the served version
pub async fn start_response(
    State(state): State<AppState>,
    ApiPath(domain): ApiPath<String>,
    body: Option<ApiJson<StartRequest>>,
) -> ApiResult<StartedResponse> {
    let body = body.map(|ApiJson(b)| b).unwrap_or_default();
    let resolved = state.resolver.resolve(&domain).await?;
    admit_respondent(&resolved.form, body.password.as_deref())?;

    let response = state
        .responses
        .start(resolved.form.id, resolved.version.id)
        .await?;

    Ok(ApiResponse::created(StartedResponse {
        response_id: response.id,
        form_version: resolved.version.version,
        started_at: response.started_at,
    }))
}

/// PUT /api/v1/submission/:domain/responses/:response_id - store answers once
pub async fn submit_response(
    State(state): State<AppState>,
    ApiPath((domain, response_id)): ApiPath<(String, Uuid)>,
    ApiJson(body): ApiJson<SubmitRequest>,
) -> ApiResult<SubmittedResponse> {
    let resolved = state.resolver.resolve(&domain).await?;
    ensure_accepting(&resolved.form)?;

    let response = state
        .responses
        .submit(resolved.form.id, response_id, body.answers)
        .await?;

    tracing::info!("Response {} submitted for form {}", response.id, resolved.form.id);
    Ok(ApiResponse::success(SubmittedResponse {
        response_id: response.id,
        submitted_at: response.submitted_at,
    }))
}

/// POST /api/v1/submission/:domain/uploads - presigned upload for a respondent's file
pub async fn upload(
    State(state): State<AppState>,
    ApiPath(domain): ApiPath<String>,
    ApiJson(body): ApiJson<PublicUploadRequest>,
) -> ApiResult<PresignedUrl> {
    let resolved = state.resolver.resolve(&domain).await?;
    admit_respondent(&resolved.form, body.password.as_deref())?;

    let mut request = body.upload;
    match request.intent {
        UploadIntent::Response => {}
        UploadIntent::Other => request.intent = UploadIntent::Response,
        other => {
            return Err(ApiError::bad_request(format!(
                "Respondents can only upload with intent 'response', not '{}'",
                other
            )))
        }
    }

    let signed = state.uploads.presign_upload(resolved.form.id, &request).await?;
    Ok(ApiResponse::created(signed))
}

/// Form must be taking responses and, when protected, the password must match
fn admit_respondent(form: &Form, password: Option<&str>) -> Result<(), ApiError> {
    ensure_accepting(form)?;
    if !verify_password(form, password) {
        return Err(ApiError::unauthorized("A valid password is required for this form"));
    }
    Ok(())
}

fn ensure_accepting(form: &Form) -> Result<(), ApiError> {
    if !form.status.accepts_responses() {
        return Err(ApiError::conflict(format!("Form {} is not accepting responses", form.id)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::form_service::hash_password;
    use crate::testing::fixtures;
    use crate::types::FormStatus;

    fn protected_form() -> Form {
        let mut form = fixtures::form();
        form.status = FormStatus::Published;
        form.password_hash = Some(hash_password(form.id, "letmein"));
        form
    }

    #[test]
    fn protected_form_needs_the_password() {
        let form = protected_form();
        assert_eq!(admit_respondent(&form, None).unwrap_err().status_code(), 401);
        assert_eq!(admit_respondent(&form, Some("guess")).unwrap_err().status_code(), 401);
        assert!(admit_respondent(&form, Some("letmein")).is_ok());
    }

    #[test]
    fn closed_form_is_a_conflict_before_the_password() {
        let mut form = protected_form();
        form.status = FormStatus::Closed;
        assert_eq!(admit_respondent(&form, Some("letmein")).unwrap_err().status_code(), 409);
    }

    #[test]
    fn open_form_admits_anyone() {
        let mut form = fixtures::form();
        form.status = FormStatus::Published;
        assert!(admit_respondent(&form, None).is_ok());
    }

    #[test]
    fn upload_body_carries_the_password() {
        let body: PublicUploadRequest = serde_json::from_value(serde_json::json!({
            "filename": "cv.pdf",
            "contentType": "application/pdf",
            "password": "letmein"
        }))
        .unwrap();
        assert_eq!(body.password.as_deref(), Some("letmein"));
        assert_eq!(body.upload.content_type, "application/pdf");
        assert_eq!(body.upload.intent, UploadIntent::Other);
    }
}
