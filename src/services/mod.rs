pub mod access;
pub mod analytics;
pub mod edge_service;
pub mod form_service;
pub mod project_service;
pub mod publisher;
pub mod question_service;
pub mod response_service;
pub mod submission;
pub mod team_service;
pub mod upload_service;
pub mod version_store;

pub use edge_service::EdgeService;
pub use form_service::FormService;
pub use project_service::ProjectService;
pub use publisher::{check_publishable, FormPublisher, PublishError};
pub use question_service::QuestionService;
pub use response_service::ResponseService;
pub use submission::{FormDirectory, SubmissionError, SubmissionResolver};
pub use team_service::TeamService;
pub use upload_service::{UploadError, UploadService};
pub use version_store::{PgVersionStore, VersionStore};

use crate::database::manager::DatabaseError;

/// Errors from the CRUD services
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    Conflict(String),
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        ServiceError::Database(DatabaseError::Sqlx(err))
    }
}

pub const MAX_NAME_LEN: usize = 200;

/// Trim and bound a display name
pub fn validate_name(field: &str, value: &str) -> Result<String, ServiceError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::BadRequest(format!("{} must not be empty", field)));
    }
    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err(ServiceError::BadRequest(format!(
            "{} must be at most {} characters",
            field, MAX_NAME_LEN
        )));
    }
    Ok(trimmed.to_string())
}

/// `Some("")` clears an optional text field, `None` leaves it alone
pub fn merge_optional_text(current: Option<String>, update: Option<String>) -> Option<String> {
    match update {
        None => current,
        Some(v) if v.trim().is_empty() => None,
        Some(v) => Some(v.trim().to_string()),
    }
}
