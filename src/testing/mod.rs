//! In-memory stand-ins for the database and object storage, plus graph fixtures.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::Mutex;
use url::Url;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{Form, FormVersion};
use crate::services::submission::{DomainLookup, FormDirectory};
use crate::services::version_store::VersionStore;
use crate::storage::{ObjectStorage, StorageError};

/// Version store over a vector, numbering versions the same way the database does
#[derive(Default)]
pub struct MemoryVersionStore {
    rows: Mutex<Vec<FormVersion>>,
}

impl MemoryVersionStore {
    /// Insert a row as-is, bypassing numbering, to simulate backfilled data
    pub async fn insert_raw(
        &self,
        form_id: Uuid,
        version: i32,
        created_at: DateTime<Utc>,
        published_at: Option<DateTime<Utc>>,
    ) {
        self.rows.lock().await.push(FormVersion {
            id: Uuid::new_v4(),
            form_id,
            version,
            snapshot: serde_json::json!({}),
            created_at,
            published_at,
        });
    }
}

#[async_trait]
impl VersionStore for MemoryVersionStore {
    async fn create_version(
        &self,
        form_id: Uuid,
        snapshot: Value,
        published_at: Option<DateTime<Utc>>,
    ) -> Result<FormVersion, DatabaseError> {
        let mut rows = self.rows.lock().await;
        let next = rows
            .iter()
            .filter(|v| v.form_id == form_id)
            .map(|v| v.version)
            .max()
            .unwrap_or(0)
            + 1;

        let version = FormVersion {
            id: Uuid::new_v4(),
            form_id,
            version: next,
            snapshot,
            created_at: Utc::now(),
            published_at,
        };
        rows.push(version.clone());
        Ok(version)
    }

    async fn get_by_id(&self, version_id: Uuid) -> Result<FormVersion, DatabaseError> {
        self.rows
            .lock()
            .await
            .iter()
            .find(|v| v.id == version_id)
            .cloned()
            .ok_or_else(|| DatabaseError::NotFound(format!("Version {} not found", version_id)))
    }

    async fn get_latest_published(&self, form_id: Uuid) -> Result<FormVersion, DatabaseError> {
        self.rows
            .lock()
            .await
            .iter()
            .filter(|v| v.form_id == form_id && v.is_published())
            .max_by_key(|v| v.version)
            .cloned()
            .ok_or_else(|| DatabaseError::NotFound(format!("Form {} has no published version", form_id)))
    }

    async fn list_for_form(&self, form_id: Uuid) -> Result<Vec<FormVersion>, DatabaseError> {
        let mut versions: Vec<FormVersion> = self
            .rows
            .lock()
            .await
            .iter()
            .filter(|v| v.form_id == form_id)
            .cloned()
            .collect();
        versions.sort_by(|a, b| b.version.cmp(&a.version));
        Ok(versions)
    }
}

#[derive(Default)]
pub struct MemoryFormDirectory {
    forms: Mutex<Vec<Form>>,
}

impl MemoryFormDirectory {
    /// Add a form, replacing any earlier copy with the same id
    pub async fn insert(&self, form: Form) {
        let mut forms = self.forms.lock().await;
        forms.retain(|f| f.id != form.id);
        forms.push(form);
    }
}

#[async_trait]
impl FormDirectory for MemoryFormDirectory {
    async fn find_for_submission(&self, lookup: &DomainLookup) -> Result<Option<Form>, DatabaseError> {
        let forms = self.forms.lock().await;
        Ok(forms
            .iter()
            .find(|f| {
                f.custom_domain.as_deref() == Some(lookup.host.as_str())
                    || (lookup.subdomain.is_some() && f.subdomain == lookup.subdomain)
                    || lookup.form_id == Some(f.id)
            })
            .cloned())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageCall {
    pub operation: &'static str,
    pub key: String,
    pub expires_in: Option<Duration>,
}

/// Records calls and hands back fake signed URLs
#[derive(Default)]
pub struct RecordingStorage {
    calls: Mutex<Vec<StorageCall>>,
}

impl RecordingStorage {
    pub async fn calls(&self) -> Vec<StorageCall> {
        self.calls.lock().await.clone()
    }

    async fn record(&self, operation: &'static str, key: &str, expires_in: Option<Duration>) {
        self.calls.lock().await.push(StorageCall {
            operation,
            key: key.to_string(),
            expires_in,
        });
    }

    fn url(key: &str, expires_in: Duration) -> Result<Url, StorageError> {
        let raw = format!("https://storage.test/bucket/{}?X-Amz-Expires={}", key, expires_in.as_secs());
        Url::parse(&raw).map_err(|_| StorageError::InvalidKey(key.to_string()))
    }
}

#[async_trait]
impl ObjectStorage for RecordingStorage {
    async fn presign_upload(&self, key: &str, expires_in: Duration) -> Result<Url, StorageError> {
        self.record("put", key, Some(expires_in)).await;
        Self::url(key, expires_in)
    }

    async fn presign_download(&self, key: &str, expires_in: Duration) -> Result<Url, StorageError> {
        self.record("get", key, Some(expires_in)).await;
        Self::url(key, expires_in)
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.record("delete", key, None).await;
        Ok(())
    }
}

pub mod fixtures {
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    use crate::database::models::{Edge, Form, Question, QuestionOption};
    use crate::snapshot::FormGraph;
    use crate::types::{Document, FormStatus, PageLayout, QuestionType};

    pub fn form() -> Form {
        let now = Utc::now();
        Form {
            id: Uuid::new_v4(),
            team_id: Uuid::new_v4(),
            project_id: Uuid::new_v4(),
            name: "Customer survey".to_string(),
            description: Some("Quarterly check-in".to_string()),
            status: FormStatus::Draft,
            theme: Document::empty(),
            logo_url: None,
            require_consent: false,
            allow_anonymous: true,
            password_hash: None,
            page_layout: PageLayout::SinglePage,
            subdomain: None,
            custom_domain: None,
            created_by: "user-1".to_string(),
            valid: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// `n` short-text questions chained by `n - 1` edges, created one second apart
    pub fn graph_with_questions(n: usize) -> FormGraph {
        let form = form();
        let base = Utc::now() - Duration::hours(1);

        let questions: Vec<Question> = (0..n)
            .map(|i| {
                let at = base + Duration::seconds(i as i64);
                Question {
                    id: Uuid::new_v4(),
                    form_id: form.id,
                    question_type: QuestionType::ShortText,
                    title: format!("Question {}", i + 1),
                    description: None,
                    required: i == 0,
                    metadata: Document::empty(),
                    position_x: 0.0,
                    position_y: i as f64 * 120.0,
                    created_at: at,
                    updated_at: at,
                }
            })
            .collect();

        let edges = questions
            .windows(2)
            .map(|pair| Edge {
                id: Uuid::new_v4(),
                form_id: form.id,
                source_question_id: pair[0].id,
                target_question_id: pair[1].id,
                condition: None,
                created_at: pair[1].created_at,
                updated_at: pair[1].created_at,
            })
            .collect();

        FormGraph {
            form,
            questions,
            options: Vec::new(),
            edges,
        }
    }

    pub fn option(question_id: Uuid, label: &str, sort_order: i32) -> QuestionOption {
        QuestionOption {
            id: Uuid::new_v4(),
            question_id,
            label: label.to_string(),
            value: label.to_lowercase(),
            sort_order,
        }
    }
}
