use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::models::Project;

use super::{access, merge_optional_text, validate_name, ServiceError};

const RETURNING_PROJECT: &str = "RETURNING id, team_id, name, description, valid, created_at, updated_at";

pub struct ProjectService {
    pool: PgPool,
}

impl ProjectService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        team_id: Uuid,
        user_id: &str,
        name: &str,
        description: Option<String>,
    ) -> Result<Project, ServiceError> {
        let name = validate_name("Project name", name)?;
        access::require_member(&self.pool, team_id, user_id).await?;

        let project = sqlx::query_as::<_, Project>(&format!(
            "INSERT INTO projects (id, team_id, name, description) VALUES ($1, $2, $3, $4) {RETURNING_PROJECT}"
        ))
        .bind(Uuid::new_v4())
        .bind(team_id)
        .bind(&name)
        .bind(merge_optional_text(None, description))
        .fetch_one(&self.pool)
        .await?;
        Ok(project)
    }

    pub async fn list(&self, team_id: Uuid, user_id: &str) -> Result<Vec<Project>, ServiceError> {
        access::require_member(&self.pool, team_id, user_id).await?;

        let projects = sqlx::query_as::<_, Project>(&format!(
            "SELECT {} FROM projects p WHERE p.team_id = $1 AND p.valid ORDER BY p.created_at DESC",
            access::PROJECT_COLUMNS
        ))
        .bind(team_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(projects)
    }

    pub async fn get(&self, project_id: Uuid, user_id: &str) -> Result<Project, ServiceError> {
        access::project_for_user(&self.pool, project_id, user_id).await
    }

    pub async fn update(
        &self,
        project_id: Uuid,
        user_id: &str,
        name: Option<String>,
        description: Option<String>,
    ) -> Result<Project, ServiceError> {
        let current = access::project_for_user(&self.pool, project_id, user_id).await?;
        let name = match name {
            Some(n) => validate_name("Project name", &n)?,
            None => current.name,
        };
        let description = merge_optional_text(current.description, description);

        let project = sqlx::query_as::<_, Project>(&format!(
            "UPDATE projects SET name = $2, description = $3, updated_at = $4 WHERE id = $1 {RETURNING_PROJECT}"
        ))
        .bind(project_id)
        .bind(&name)
        .bind(&description)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;
        Ok(project)
    }

    pub async fn delete(&self, project_id: Uuid, user_id: &str) -> Result<(), ServiceError> {
        access::project_for_user(&self.pool, project_id, user_id).await?;

        sqlx::query("UPDATE projects SET valid = FALSE, updated_at = $2 WHERE id = $1")
            .bind(project_id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
