//! Team-membership checks shared by the CRUD services.
//!
//! A row the caller's teams cannot see is reported as not found, so ids from other
//! tenants are indistinguishable from ids that do not exist.

use sqlx::PgPool;
use uuid::Uuid;

use crate::database::models::{Form, Project};
use crate::types::{FormStatus, TeamRole};

use super::ServiceError;

pub const FORM_COLUMNS: &str = "f.id, f.team_id, f.project_id, f.name, f.description, f.status, \
     f.theme, f.logo_url, f.require_consent, f.allow_anonymous, f.password_hash, f.page_layout, \
     f.subdomain, f.custom_domain, f.created_by, f.valid, f.created_at, f.updated_at";

pub const PROJECT_COLUMNS: &str =
    "p.id, p.team_id, p.name, p.description, p.valid, p.created_at, p.updated_at";

/// The caller's role in a live team, if any
pub async fn team_role(pool: &PgPool, team_id: Uuid, user_id: &str) -> Result<Option<TeamRole>, ServiceError> {
    let row: Option<(TeamRole,)> = sqlx::query_as(
        "SELECT m.role FROM team_members m
         JOIN teams t ON t.id = m.team_id AND t.valid
         WHERE m.team_id = $1 AND m.user_id = $2",
    )
    .bind(team_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(|(role,)| role))
}

pub async fn require_member(pool: &PgPool, team_id: Uuid, user_id: &str) -> Result<TeamRole, ServiceError> {
    team_role(pool, team_id, user_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Team {} not found", team_id)))
}

pub async fn require_owner(pool: &PgPool, team_id: Uuid, user_id: &str) -> Result<(), ServiceError> {
    match require_member(pool, team_id, user_id).await? {
        TeamRole::Owner => Ok(()),
        TeamRole::Member => Err(ServiceError::Forbidden(
            "Only team owners can perform this action".to_string(),
        )),
    }
}

pub async fn project_for_user(pool: &PgPool, project_id: Uuid, user_id: &str) -> Result<Project, ServiceError> {
    sqlx::query_as::<_, Project>(&format!(
        "SELECT {PROJECT_COLUMNS} FROM projects p
         JOIN teams t ON t.id = p.team_id AND t.valid
         JOIN team_members m ON m.team_id = p.team_id AND m.user_id = $2
         WHERE p.id = $1 AND p.valid"
    ))
    .bind(project_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| ServiceError::NotFound(format!("Project {} not found", project_id)))
}

pub async fn form_for_user(pool: &PgPool, form_id: Uuid, user_id: &str) -> Result<Form, ServiceError> {
    sqlx::query_as::<_, Form>(&format!(
        "SELECT {FORM_COLUMNS} FROM forms f
         JOIN projects p ON p.id = f.project_id AND p.valid
         JOIN teams t ON t.id = f.team_id AND t.valid
         JOIN team_members m ON m.team_id = f.team_id AND m.user_id = $2
         WHERE f.id = $1 AND f.valid"
    ))
    .bind(form_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| ServiceError::NotFound(format!("Form {} not found", form_id)))
}

/// Same as `form_for_user` but refuses archived forms, for anything that edits the draft
pub async fn editable_form_for_user(pool: &PgPool, form_id: Uuid, user_id: &str) -> Result<Form, ServiceError> {
    let form = form_for_user(pool, form_id, user_id).await?;
    ensure_editable(&form)?;
    Ok(form)
}

pub fn ensure_editable(form: &Form) -> Result<(), ServiceError> {
    if form.status == FormStatus::Archived {
        return Err(ServiceError::Conflict(format!(
            "Form {} is archived and can no longer be edited",
            form.id
        )));
    }
    Ok(())
}
