use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::models::{Team, TeamMember};
use crate::types::TeamRole;

use super::{access, validate_name, ServiceError};

const TEAM_COLUMNS: &str = "t.id, t.name, t.created_by, t.valid, t.created_at, t.updated_at";

pub struct TeamService {
    pool: PgPool,
}

impl TeamService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a team; the creator becomes its first owner
    pub async fn create(&self, name: &str, user_id: &str) -> Result<Team, ServiceError> {
        let name = validate_name("Team name", name)?;
        let mut tx = self.pool.begin().await?;

        let team = sqlx::query_as::<_, Team>(
            "INSERT INTO teams (id, name, created_by) VALUES ($1, $2, $3)
             RETURNING id, name, created_by, valid, created_at, updated_at",
        )
        .bind(Uuid::new_v4())
        .bind(&name)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO team_members (team_id, user_id, role) VALUES ($1, $2, $3)")
            .bind(team.id)
            .bind(user_id)
            .bind(TeamRole::Owner)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        tracing::info!("Created team {} ({}) for {}", team.name, team.id, user_id);
        Ok(team)
    }

    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<Team>, ServiceError> {
        let teams = sqlx::query_as::<_, Team>(&format!(
            "SELECT {TEAM_COLUMNS} FROM teams t
             JOIN team_members m ON m.team_id = t.id
             WHERE m.user_id = $1 AND t.valid
             ORDER BY t.created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(teams)
    }

    pub async fn get(&self, team_id: Uuid, user_id: &str) -> Result<Team, ServiceError> {
        sqlx::query_as::<_, Team>(&format!(
            "SELECT {TEAM_COLUMNS} FROM teams t
             JOIN team_members m ON m.team_id = t.id AND m.user_id = $2
             WHERE t.id = $1 AND t.valid"
        ))
        .bind(team_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Team {} not found", team_id)))
    }

    pub async fn rename(&self, team_id: Uuid, user_id: &str, name: &str) -> Result<Team, ServiceError> {
        let name = validate_name("Team name", name)?;
        access::require_owner(&self.pool, team_id, user_id).await?;

        let team = sqlx::query_as::<_, Team>(
            "UPDATE teams SET name = $2, updated_at = $3 WHERE id = $1 AND valid
             RETURNING id, name, created_by, valid, created_at, updated_at",
        )
        .bind(team_id)
        .bind(&name)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;
        Ok(team)
    }

    /// Soft delete. Projects and forms under the team become unreachable with it.
    pub async fn delete(&self, team_id: Uuid, user_id: &str) -> Result<(), ServiceError> {
        access::require_owner(&self.pool, team_id, user_id).await?;

        sqlx::query("UPDATE teams SET valid = FALSE, updated_at = $2 WHERE id = $1")
            .bind(team_id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;
        tracing::info!("Team {} deleted by {}", team_id, user_id);
        Ok(())
    }

    pub async fn members(&self, team_id: Uuid, user_id: &str) -> Result<Vec<TeamMember>, ServiceError> {
        access::require_member(&self.pool, team_id, user_id).await?;

        let members = sqlx::query_as::<_, TeamMember>(
            "SELECT team_id, user_id, role, created_at FROM team_members
             WHERE team_id = $1 ORDER BY created_at",
        )
        .bind(team_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(members)
    }

    pub async fn add_member(
        &self,
        team_id: Uuid,
        user_id: &str,
        member_id: &str,
        role: TeamRole,
    ) -> Result<TeamMember, ServiceError> {
        let member_id = member_id.trim();
        if member_id.is_empty() {
            return Err(ServiceError::BadRequest("userId must not be empty".to_string()));
        }
        access::require_owner(&self.pool, team_id, user_id).await?;

        let member = sqlx::query_as::<_, TeamMember>(
            "INSERT INTO team_members (team_id, user_id, role) VALUES ($1, $2, $3)
             RETURNING team_id, user_id, role, created_at",
        )
        .bind(team_id)
        .bind(member_id)
        .bind(role)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            crate::database::DatabaseError::conflict_on_unique(
                e,
                format!("{} is already a member of team {}", member_id, team_id),
            )
        })?;
        Ok(member)
    }

    pub async fn remove_member(&self, team_id: Uuid, user_id: &str, member_id: &str) -> Result<(), ServiceError> {
        access::require_owner(&self.pool, team_id, user_id).await?;
        let mut tx = self.pool.begin().await?;

        let owners: Vec<(String,)> = sqlx::query_as(
            "SELECT user_id FROM team_members WHERE team_id = $1 AND role = $2 FOR UPDATE",
        )
        .bind(team_id)
        .bind(TeamRole::Owner)
        .fetch_all(&mut *tx)
        .await?;
        if owners.len() == 1 && owners[0].0 == member_id {
            return Err(ServiceError::Conflict(
                "A team must keep at least one owner".to_string(),
            ));
        }

        let removed = sqlx::query("DELETE FROM team_members WHERE team_id = $1 AND user_id = $2")
            .bind(team_id)
            .bind(member_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if removed == 0 {
            return Err(ServiceError::NotFound(format!(
                "{} is not a member of team {}",
                member_id, team_id
            )));
        }

        tx.commit().await?;
        Ok(())
    }
}
