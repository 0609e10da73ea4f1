use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::database::manager::DatabaseError;
use crate::database::models::{Form, FormVersion};
use crate::snapshot::{build_snapshot, FormGraph, SnapshotError};
use crate::types::FormStatus;

use super::version_store::VersionStore;

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Form {0} is archived and cannot be published")]
    Archived(uuid::Uuid),

    #[error("Form {0} is closed; reopen it before publishing a new version")]
    Closed(uuid::Uuid),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// Turns the live graph into versions in the store
pub struct FormPublisher {
    versions: Arc<dyn VersionStore>,
}

impl FormPublisher {
    pub fn new(versions: Arc<dyn VersionStore>) -> Self {
        Self { versions }
    }

    /// Append a published snapshot of the graph as the form's next version
    pub async fn publish(&self, graph: &FormGraph, now: DateTime<Utc>) -> Result<FormVersion, PublishError> {
        check_publishable(&graph.form)?;
        self.append(graph, Some(now)).await
    }

    /// Append a snapshot with no publish timestamp; the public path ignores it
    pub async fn save_draft(&self, graph: &FormGraph) -> Result<FormVersion, PublishError> {
        self.append(graph, None).await
    }

    async fn append(&self, graph: &FormGraph, published_at: Option<DateTime<Utc>>) -> Result<FormVersion, PublishError> {
        let snapshot = build_snapshot(graph)?.to_value()?;
        let version = self
            .versions
            .create_version(graph.form.id, snapshot, published_at)
            .await?;
        Ok(version)
    }
}

/// Only DRAFT and PUBLISHED forms take a new published version
pub fn check_publishable(form: &Form) -> Result<(), PublishError> {
    match form.status {
        FormStatus::Archived => Err(PublishError::Archived(form.id)),
        FormStatus::Closed => Err(PublishError::Closed(form.id)),
        FormStatus::Draft | FormStatus::Published => Ok(()),
    }
}
