//! Public read path: domain → form → latest published snapshot.
//!
//! Nothing here touches live question or edge rows. The only form data read is the
//! row needed to find the form; everything served comes out of the version store.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{Form, FormVersion};
use crate::snapshot::{FormMetadata, FormSnapshot, SnapshotEdge, SnapshotError, SnapshotQuestion};
use crate::types::FormStatus;

use super::version_store::VersionStore;

/// How a public identifier should be matched against forms
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainLookup {
    /// Normalized host, compared with custom domains
    pub host: String,
    /// Label compared with generated subdomains
    pub subdomain: Option<String>,
    /// Set when the identifier is a form id (preview links)
    pub form_id: Option<Uuid>,
}

impl DomainLookup {
    pub fn parse(raw: &str, base_domain: Option<&str>) -> Self {
        let host = raw.trim().trim_end_matches('.').to_lowercase();
        let host = match host.rsplit_once(':') {
            Some((h, port)) if !port.is_empty() && port.chars().all(|c| c.is_ascii_digit()) => h.to_string(),
            _ => host,
        };

        let subdomain = match base_domain {
            Some(base) => host
                .strip_suffix(base)
                .and_then(|rest| rest.strip_suffix('.'))
                .filter(|label| !label.is_empty() && !label.contains('.'))
                .map(str::to_string),
            None => None,
        }
        .or_else(|| (!host.contains('.')).then(|| host.clone()));

        let form_id = Uuid::parse_str(&host).ok();

        Self {
            host,
            subdomain,
            form_id,
        }
    }
}

/// Finds the form a public identifier points at
#[async_trait]
pub trait FormDirectory: Send + Sync {
    async fn find_for_submission(&self, lookup: &DomainLookup) -> Result<Option<Form>, DatabaseError>;
}

#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("{0}")]
    NotFound(String),

    #[error("Form {0} has no subdomain or custom domain and is not publishable")]
    NotPublishable(Uuid),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error(transparent)]
    Database(DatabaseError),
}

impl From<DatabaseError> for SubmissionError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound(msg) => SubmissionError::NotFound(msg),
            other => SubmissionError::Database(other),
        }
    }
}

/// What the public endpoint returns
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicSubmission {
    pub form_id: Uuid,
    pub form_version: i32,
    pub published_at: DateTime<Utc>,
    pub form_metadata: FormMetadata,
    pub questions: Vec<SnapshotQuestion>,
    pub edges: Vec<SnapshotEdge>,
}

/// A resolved form together with the version being served
#[derive(Debug, Clone)]
pub struct ResolvedSubmission {
    pub form: Form,
    pub version: FormVersion,
    pub submission: PublicSubmission,
}

pub struct SubmissionResolver {
    forms: Arc<dyn FormDirectory>,
    versions: Arc<dyn VersionStore>,
    base_domain: Option<String>,
}

impl SubmissionResolver {
    pub fn new(forms: Arc<dyn FormDirectory>, versions: Arc<dyn VersionStore>, base_domain: Option<String>) -> Self {
        Self {
            forms,
            versions,
            base_domain,
        }
    }

    pub async fn resolve(&self, domain: &str) -> Result<ResolvedSubmission, SubmissionError> {
        let lookup = DomainLookup::parse(domain, self.base_domain.as_deref());

        let form = self
            .forms
            .find_for_submission(&lookup)
            .await?
            .filter(|f| f.valid && f.status != FormStatus::Archived)
            .ok_or_else(|| SubmissionError::NotFound(format!("No form is served at '{}'", domain)))?;

        if !form.is_addressable() {
            return Err(SubmissionError::NotPublishable(form.id));
        }

        let version = self.versions.get_latest_published(form.id).await.map_err(|e| match e {
            DatabaseError::NotFound(_) => {
                SubmissionError::NotFound(format!("Form {} has not been published", form.id))
            }
            other => SubmissionError::Database(other),
        })?;

        // The store only hands out published rows here; checked again at the boundary.
        let published_at = version.published_at.ok_or_else(|| {
            SubmissionError::NotFound(format!("Form {} has not been published", form.id))
        })?;

        let snapshot = FormSnapshot::from_stored(&version.snapshot).map_err(|e| {
            tracing::error!("Version {} of form {} failed to parse: {}", version.version, form.id, e);
            e
        })?;

        tracing::debug!("Serving version {} of form {} for '{}'", version.version, form.id, domain);

        let submission = PublicSubmission {
            form_id: form.id,
            form_version: version.version,
            published_at,
            form_metadata: snapshot.form,
            questions: snapshot.questions,
            edges: snapshot.edges,
        };

        Ok(ResolvedSubmission {
            form,
            version,
            submission,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::publisher::FormPublisher;
    use crate::testing::{fixtures, MemoryFormDirectory, MemoryVersionStore};
    use serde_json::json;

    const BASE: &str = "forms.example.com";

    #[test]
    fn lookup_parsing() {
        let l = DomainLookup::parse("Acme-123.forms.example.com", Some(BASE));
        assert_eq!(l.subdomain.as_deref(), Some("acme-123"));
        assert_eq!(l.host, "acme-123.forms.example.com");

        let l = DomainLookup::parse("survey.acme.com:443", Some(BASE));
        assert_eq!(l.host, "survey.acme.com");
        assert_eq!(l.subdomain, None);

        let l = DomainLookup::parse("F1-domain", Some(BASE));
        assert_eq!(l.subdomain.as_deref(), Some("f1-domain"));

        let l = DomainLookup::parse("a.b.forms.example.com", Some(BASE));
        assert_eq!(l.subdomain, None);

        let id = Uuid::new_v4();
        assert_eq!(DomainLookup::parse(&id.to_string(), None).form_id, Some(id));
    }

    struct Fixture {
        forms: Arc<MemoryFormDirectory>,
        versions: Arc<MemoryVersionStore>,
        resolver: SubmissionResolver,
        publisher: FormPublisher,
    }

    fn fixture() -> Fixture {
        let forms = Arc::new(MemoryFormDirectory::default());
        let versions = Arc::new(MemoryVersionStore::default());
        let resolver = SubmissionResolver::new(forms.clone(), versions.clone(), Some(BASE.to_string()));
        let publisher = FormPublisher::new(versions.clone());
        Fixture {
            forms,
            versions,
            resolver,
            publisher,
        }
    }

    #[tokio::test]
    async fn unknown_domain_is_not_found() {
        let fx = fixture();
        let err = fx.resolver.resolve("nobody.forms.example.com").await.unwrap_err();
        assert!(matches!(err, SubmissionError::NotFound(_)));
    }

    #[tokio::test]
    async fn never_published_is_not_found() {
        let fx = fixture();
        let mut form = fixtures::form();
        form.subdomain = Some("fresh".to_string());
        fx.forms.insert(form.clone()).await;

        let err = fx.resolver.resolve("fresh").await.unwrap_err();
        assert!(matches!(err, SubmissionError::NotFound(_)), "{err}");
    }

    #[tokio::test]
    async fn form_without_address_is_not_publishable() {
        let fx = fixture();
        let form = fixtures::form();
        fx.forms.insert(form.clone()).await;

        let err = fx.resolver.resolve(&form.id.to_string()).await.unwrap_err();
        assert!(matches!(err, SubmissionError::NotPublishable(id) if id == form.id));
    }

    #[tokio::test]
    async fn deleted_or_archived_forms_are_hidden() {
        let fx = fixture();
        let mut graph = fixtures::graph_with_questions(1);
        graph.form.subdomain = Some("gone".to_string());
        fx.publisher.publish(&graph, Utc::now()).await.unwrap();

        let mut deleted = graph.form.clone();
        deleted.valid = false;
        fx.forms.insert(deleted).await;
        assert!(matches!(fx.resolver.resolve("gone").await, Err(SubmissionError::NotFound(_))));

        let mut archived = graph.form.clone();
        archived.status = FormStatus::Archived;
        fx.forms.insert(archived).await;
        assert!(matches!(fx.resolver.resolve("gone").await, Err(SubmissionError::NotFound(_))));
    }

    #[tokio::test]
    async fn corrupt_snapshot_is_internal() {
        let fx = fixture();
        let mut form = fixtures::form();
        form.subdomain = Some("broken".to_string());
        fx.forms.insert(form.clone()).await;
        fx.versions
            .create_version(form.id, json!({"form": "not an object"}), Some(Utc::now()))
            .await
            .unwrap();

        let err = fx.resolver.resolve("broken").await.unwrap_err();
        assert!(matches!(err, SubmissionError::Snapshot(SnapshotError::Corrupt(_))));
    }

    #[tokio::test]
    async fn serves_last_published_not_live_or_draft() {
        let fx = fixture();

        // F1 with three questions, published
        let mut graph = fixtures::graph_with_questions(3);
        graph.form.subdomain = Some("f1-domain".to_string());
        fx.forms.insert(graph.form.clone()).await;
        let v1 = fx.publisher.publish(&graph, Utc::now()).await.unwrap();
        assert_eq!(v1.version, 1);
        assert!(v1.is_published());

        // Edit a question and publish again
        graph.questions[0].title = "What is your name, really?".to_string();
        let v2 = fx.publisher.publish(&graph, Utc::now()).await.unwrap();
        assert_eq!(v2.version, 2);

        // Draft-only edits afterwards, saved as a draft snapshot and left live
        graph.questions[1].title = "Draft wording".to_string();
        graph.questions.pop();
        graph.edges.pop();
        fx.publisher.save_draft(&graph).await.unwrap();
        graph.questions[0].title = "Unsaved live edit".to_string();

        let resolved = fx.resolver.resolve("F1-domain.forms.example.com").await.unwrap();
        let served = resolved.submission;
        assert_eq!(served.form_version, 2);
        assert_eq!(resolved.version.id, v2.id);
        assert_eq!(served.questions.len(), 3);
        assert_eq!(served.questions[0].title, "What is your name, really?");
        assert_ne!(served.questions[1].title, "Draft wording");

        let stored_v2 = FormSnapshot::from_stored(&v2.snapshot).unwrap();
        assert_eq!(served.questions, stored_v2.questions);
        assert_eq!(served.edges, stored_v2.edges);
    }
}
