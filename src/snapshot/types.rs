use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::types::{Document, PageLayout, QuestionType};

#[derive(Debug, Error)]
pub enum SnapshotError {
    /// The loaded graph references data that is not there
    #[error("Data integrity violation: {0}")]
    DataIntegrity(String),

    /// A stored snapshot no longer matches the snapshot shape
    #[error("Stored snapshot is corrupt: {0}")]
    Corrupt(#[source] serde_json::Error),

    #[error("Failed to serialize snapshot: {0}")]
    Serialize(#[source] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormSnapshot {
    pub form: FormMetadata,
    pub questions: Vec<SnapshotQuestion>,
    pub edges: Vec<SnapshotEdge>,
}

/// Display settings copied off the form at snapshot time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormMetadata {
    pub name: String,
    pub description: Option<String>,
    pub theme: Document,
    pub logo_url: Option<String>,
    pub require_consent: bool,
    pub allow_anonymous: bool,
    pub password_protected: bool,
    pub page_layout: PageLayout,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotQuestion {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub title: String,
    pub description: Option<String>,
    pub required: bool,
    pub metadata: Document,
    pub position: CanvasPosition,
    pub options: Vec<SnapshotOption>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasPosition {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotOption {
    pub id: Uuid,
    pub label: String,
    pub value: String,
    pub sort_order: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotEdge {
    pub id: Uuid,
    pub source: Uuid,
    pub target: Uuid,
    pub condition: Option<Document>,
}

impl FormSnapshot {
    pub fn to_value(&self) -> Result<Value, SnapshotError> {
        serde_json::to_value(self).map_err(SnapshotError::Serialize)
    }

    /// Parse a blob read back from the version store
    pub fn from_stored(value: &Value) -> Result<Self, SnapshotError> {
        FormSnapshot::deserialize(value).map_err(SnapshotError::Corrupt)
    }
}
