use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::FormVersion;

/// Append-only log of form snapshots.
///
/// Implementations never update or delete a version once written. Version numbers
/// are per form, start at 1 and grow by exactly 1 per append.
#[async_trait]
pub trait VersionStore: Send + Sync {
    /// Append a snapshot as the form's next version. `published_at: None` stores a
    /// draft snapshot.
    async fn create_version(
        &self,
        form_id: Uuid,
        snapshot: Value,
        published_at: Option<DateTime<Utc>>,
    ) -> Result<FormVersion, DatabaseError>;

    async fn get_by_id(&self, version_id: Uuid) -> Result<FormVersion, DatabaseError>;

    /// Highest-numbered version with a publish timestamp
    async fn get_latest_published(&self, form_id: Uuid) -> Result<FormVersion, DatabaseError>;

    /// Every version of the form, newest first
    async fn list_for_form(&self, form_id: Uuid) -> Result<Vec<FormVersion>, DatabaseError>;
}

const VERSION_COLUMNS: &str = "id, form_id, version, snapshot, created_at, published_at";

pub struct PgVersionStore {
    pool: PgPool,
}

impl PgVersionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VersionStore for PgVersionStore {
    async fn create_version(
        &self,
        form_id: Uuid,
        snapshot: Value,
        published_at: Option<DateTime<Utc>>,
    ) -> Result<FormVersion, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        // Serializes concurrent appends for the same form
        let locked: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM forms WHERE id = $1 FOR UPDATE")
            .bind(form_id)
            .fetch_optional(&mut *tx)
            .await?;
        if locked.is_none() {
            return Err(DatabaseError::NotFound(format!("Form {} not found", form_id)));
        }

        let (next,): (i32,) = sqlx::query_as(
            "SELECT COALESCE(MAX(version), 0) + 1 FROM form_versions WHERE form_id = $1",
        )
        .bind(form_id)
        .fetch_one(&mut *tx)
        .await?;

        let version = sqlx::query_as::<_, FormVersion>(&format!(
            "INSERT INTO form_versions (id, form_id, version, snapshot, published_at)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {VERSION_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(form_id)
        .bind(next)
        .bind(&snapshot)
        .bind(published_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            DatabaseError::conflict_on_unique(
                e,
                format!("Version {} of form {} already exists", next, form_id),
            )
        })?;

        tx.commit().await?;

        tracing::info!(
            "Stored version {} of form {} (published: {})",
            version.version,
            form_id,
            version.is_published()
        );
        Ok(version)
    }

    async fn get_by_id(&self, version_id: Uuid) -> Result<FormVersion, DatabaseError> {
        sqlx::query_as::<_, FormVersion>(&format!(
            "SELECT {VERSION_COLUMNS} FROM form_versions WHERE id = $1"
        ))
        .bind(version_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::NotFound(format!("Version {} not found", version_id)))
    }

    async fn get_latest_published(&self, form_id: Uuid) -> Result<FormVersion, DatabaseError> {
        // Ordered by version number. Creation time is not trusted for ordering.
        sqlx::query_as::<_, FormVersion>(&format!(
            "SELECT {VERSION_COLUMNS} FROM form_versions
             WHERE form_id = $1 AND published_at IS NOT NULL
             ORDER BY version DESC
             LIMIT 1"
        ))
        .bind(form_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::NotFound(format!("Form {} has no published version", form_id)))
    }

    async fn list_for_form(&self, form_id: Uuid) -> Result<Vec<FormVersion>, DatabaseError> {
        let versions = sqlx::query_as::<_, FormVersion>(&format!(
            "SELECT {VERSION_COLUMNS} FROM form_versions WHERE form_id = $1 ORDER BY version DESC"
        ))
        .bind(form_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(versions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryVersionStore;
    use chrono::Duration;
    use serde_json::json;

    #[tokio::test]
    async fn numbers_start_at_one_and_increase_by_one() {
        let store = MemoryVersionStore::default();
        let form = Uuid::new_v4();

        let v1 = store.create_version(form, json!({"n": 1}), Some(Utc::now())).await.unwrap();
        let v2 = store.create_version(form, json!({"n": 2}), Some(Utc::now())).await.unwrap();
        assert_eq!(v1.version, 1);
        assert_eq!(v2.version, v1.version + 1);

        let other = store.create_version(Uuid::new_v4(), json!({}), None).await.unwrap();
        assert_eq!(other.version, 1);
    }

    #[tokio::test]
    async fn latest_published_skips_drafts() {
        let store = MemoryVersionStore::default();
        let form = Uuid::new_v4();

        store.create_version(form, json!({"n": 1}), Some(Utc::now())).await.unwrap();
        store.create_version(form, json!({"n": 2}), None).await.unwrap();

        let latest = store.get_latest_published(form).await.unwrap();
        assert_eq!(latest.version, 1);
        assert_eq!(latest.snapshot["n"], 1);
    }

    #[tokio::test]
    async fn latest_published_orders_by_version_not_clock() {
        let store = MemoryVersionStore::default();
        let form = Uuid::new_v4();
        let now = Utc::now();

        // Backfilled rows whose timestamps run backwards relative to their numbers
        store.insert_raw(form, 3, now - Duration::days(30), Some(now - Duration::days(30))).await;
        store.insert_raw(form, 1, now, Some(now)).await;
        store.insert_raw(form, 2, now + Duration::days(1), Some(now + Duration::days(1))).await;
        store.insert_raw(form, 4, now + Duration::days(2), None).await;

        let latest = store.get_latest_published(form).await.unwrap();
        assert_eq!(latest.version, 3);
    }

    #[tokio::test]
    async fn never_published_is_not_found() {
        let store = MemoryVersionStore::default();
        let form = Uuid::new_v4();
        store.create_version(form, json!({}), None).await.unwrap();

        assert!(matches!(
            store.get_latest_published(form).await,
            Err(DatabaseError::NotFound(_))
        ));
        assert!(matches!(
            store.get_by_id(Uuid::new_v4()).await,
            Err(DatabaseError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn list_is_newest_first() {
        let store = MemoryVersionStore::default();
        let form = Uuid::new_v4();
        for _ in 0..3 {
            store.create_version(form, json!({}), None).await.unwrap();
        }
        let numbers: Vec<i32> = store
            .list_for_form(form)
            .await
            .unwrap()
            .iter()
            .map(|v| v.version)
            .collect();
        assert_eq!(numbers, [3, 2, 1]);
    }
}
