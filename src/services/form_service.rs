use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{Edge, Form, Question, QuestionOption};
use crate::snapshot::FormGraph;
use crate::types::{Document, FormStatus, PageLayout};

use super::access::{self, FORM_COLUMNS};
use super::submission::{DomainLookup, FormDirectory};
use super::{merge_optional_text, validate_name, ServiceError};

const SUBDOMAIN_STEM_LEN: usize = 40;
const SUBDOMAIN_ATTEMPTS: u32 = 3;
const MAX_DOMAIN_LEN: usize = 253;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewForm {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub theme: Document,
    pub logo_url: Option<String>,
    #[serde(default)]
    pub require_consent: bool,
    #[serde(default = "default_true")]
    pub allow_anonymous: bool,
    #[serde(default)]
    pub page_layout: PageLayout,
}

fn default_true() -> bool {
    true
}

/// Partial update. Absent fields are left alone; an empty string clears optional text
/// (`description`, `logoUrl`, `password`, `customDomain`).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub theme: Option<Document>,
    pub logo_url: Option<String>,
    pub require_consent: Option<bool>,
    pub allow_anonymous: Option<bool>,
    pub page_layout: Option<PageLayout>,
    pub status: Option<FormStatus>,
    pub password: Option<String>,
    pub custom_domain: Option<String>,
}

pub struct FormService {
    pool: PgPool,
    base_domain: Option<String>,
}

impl FormService {
    pub fn new(pool: PgPool, base_domain: Option<String>) -> Self {
        Self { pool, base_domain }
    }

    pub async fn create(&self, project_id: Uuid, user_id: &str, input: NewForm) -> Result<Form, ServiceError> {
        let name = validate_name("Form name", &input.name)?;
        let project = access::project_for_user(&self.pool, project_id, user_id).await?;

        let form = sqlx::query_as::<_, Form>(&format!(
            "INSERT INTO forms AS f (id, team_id, project_id, name, description, theme, logo_url,
                                     require_consent, allow_anonymous, page_layout, created_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
             RETURNING {FORM_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(project.team_id)
        .bind(project.id)
        .bind(&name)
        .bind(merge_optional_text(None, input.description))
        .bind(&input.theme)
        .bind(merge_optional_text(None, input.logo_url))
        .bind(input.require_consent)
        .bind(input.allow_anonymous)
        .bind(input.page_layout)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!("Created form {} in project {}", form.id, project.id);
        Ok(form)
    }

    pub async fn list(&self, project_id: Uuid, user_id: &str) -> Result<Vec<Form>, ServiceError> {
        access::project_for_user(&self.pool, project_id, user_id).await?;

        let forms = sqlx::query_as::<_, Form>(&format!(
            "SELECT {FORM_COLUMNS} FROM forms f WHERE f.project_id = $1 AND f.valid ORDER BY f.created_at DESC"
        ))
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(forms)
    }

    pub async fn get(&self, form_id: Uuid, user_id: &str) -> Result<Form, ServiceError> {
        access::form_for_user(&self.pool, form_id, user_id).await
    }

    pub async fn update(&self, form_id: Uuid, user_id: &str, update: FormUpdate) -> Result<Form, ServiceError> {
        let current = access::form_for_user(&self.pool, form_id, user_id).await?;

        let status = match update.status {
            Some(requested) => {
                let has_published = self.has_published_version(form_id).await?;
                check_status_change(current.status, requested, has_published)?;
                requested
            }
            None => {
                access::ensure_editable(&current)?;
                current.status
            }
        };

        let name = match update.name {
            Some(n) => validate_name("Form name", &n)?,
            None => current.name,
        };
        let password_hash = match update.password {
            None => current.password_hash,
            Some(p) if p.is_empty() => None,
            Some(p) => Some(hash_password(form_id, &p)),
        };
        let custom_domain = match update.custom_domain {
            None => current.custom_domain,
            Some(d) if d.trim().is_empty() => None,
            Some(d) => Some(normalize_custom_domain(&d, self.base_domain.as_deref())?),
        };

        let form = sqlx::query_as::<_, Form>(&format!(
            "UPDATE forms AS f SET
                name = $2, description = $3, theme = $4, logo_url = $5, require_consent = $6,
                allow_anonymous = $7, page_layout = $8, status = $9, password_hash = $10,
                custom_domain = $11, updated_at = $12
             WHERE f.id = $1
             RETURNING {FORM_COLUMNS}"
        ))
        .bind(form_id)
        .bind(&name)
        .bind(merge_optional_text(current.description, update.description))
        .bind(update.theme.unwrap_or(current.theme))
        .bind(merge_optional_text(current.logo_url, update.logo_url))
        .bind(update.require_consent.unwrap_or(current.require_consent))
        .bind(update.allow_anonymous.unwrap_or(current.allow_anonymous))
        .bind(update.page_layout.unwrap_or(current.page_layout))
        .bind(status)
        .bind(&password_hash)
        .bind(&custom_domain)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DatabaseError::conflict_on_unique(e, "Custom domain is already in use"))?;

        Ok(form)
    }

    /// Soft delete; published snapshots stay in the version store untouched
    pub async fn delete(&self, form_id: Uuid, user_id: &str) -> Result<(), ServiceError> {
        access::form_for_user(&self.pool, form_id, user_id).await?;

        sqlx::query("UPDATE forms SET valid = FALSE, updated_at = $2 WHERE id = $1")
            .bind(form_id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;
        tracing::info!("Form {} deleted by {}", form_id, user_id);
        Ok(())
    }

    /// Load the live authoring graph. Callers check access first.
    pub async fn load_graph(&self, form: Form) -> Result<FormGraph, ServiceError> {
        let questions = sqlx::query_as::<_, Question>(
            "SELECT id, form_id, type, title, description, required, metadata, position_x,
                    position_y, created_at, updated_at
             FROM questions WHERE form_id = $1 ORDER BY created_at, id",
        )
        .bind(form.id)
        .fetch_all(&self.pool)
        .await?;

        let question_ids: Vec<Uuid> = questions.iter().map(|q| q.id).collect();
        let options = sqlx::query_as::<_, QuestionOption>(
            "SELECT id, question_id, label, value, sort_order
             FROM question_options WHERE question_id = ANY($1) ORDER BY sort_order, id",
        )
        .bind(&question_ids)
        .fetch_all(&self.pool)
        .await?;

        let edges = sqlx::query_as::<_, Edge>(
            "SELECT id, form_id, source_question_id, target_question_id, condition, created_at, updated_at
             FROM edges WHERE form_id = $1 ORDER BY created_at, id",
        )
        .bind(form.id)
        .fetch_all(&self.pool)
        .await?;

        Ok(FormGraph {
            form,
            questions,
            options,
            edges,
        })
    }

    /// Give the form a generated subdomain if it has none. Runs before the version is
    /// appended so a collision leaves nothing behind.
    pub async fn ensure_subdomain(&self, form: Form) -> Result<Form, ServiceError> {
        if form.subdomain.is_some() {
            return Ok(form);
        }

        let mut attempt = 0;
        loop {
            attempt += 1;
            let result = sqlx::query_as::<_, Form>(&format!(
                "UPDATE forms AS f SET subdomain = $2, updated_at = $3
                 WHERE f.id = $1
                 RETURNING {FORM_COLUMNS}"
            ))
            .bind(form.id)
            .bind(generate_subdomain(&form.name))
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DatabaseError::conflict_on_unique(e, "Generated subdomain collided, retry publishing"));

            match result {
                Ok(updated) => return Ok(updated),
                Err(DatabaseError::Conflict(msg)) if attempt >= SUBDOMAIN_ATTEMPTS => {
                    return Err(DatabaseError::Conflict(msg).into())
                }
                Err(DatabaseError::Conflict(_)) => {
                    tracing::debug!("Subdomain collision for form {}, retrying", form.id);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Flip the form to PUBLISHED after its version has been appended
    pub async fn mark_published(&self, form: &Form) -> Result<Form, ServiceError> {
        let updated = sqlx::query_as::<_, Form>(&format!(
            "UPDATE forms AS f SET status = $2, updated_at = $3
             WHERE f.id = $1
             RETURNING {FORM_COLUMNS}"
        ))
        .bind(form.id)
        .bind(FormStatus::Published)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;
        Ok(updated)
    }

    async fn has_published_version(&self, form_id: Uuid) -> Result<bool, ServiceError> {
        let (exists,): (bool,) = sqlx::query_as(
            "SELECT EXISTS (SELECT 1 FROM form_versions WHERE form_id = $1 AND published_at IS NOT NULL)",
        )
        .bind(form_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }
}

#[async_trait]
impl FormDirectory for FormService {
    async fn find_for_submission(&self, lookup: &DomainLookup) -> Result<Option<Form>, DatabaseError> {
        // Custom domain wins over a subdomain label of the same spelling
        let form = sqlx::query_as::<_, Form>(&format!(
            "SELECT {FORM_COLUMNS} FROM forms f
             WHERE f.valid
               AND (f.custom_domain = $1
                    OR ($2::text IS NOT NULL AND f.subdomain = $2)
                    OR ($3::uuid IS NOT NULL AND f.id = $3))
             ORDER BY (f.custom_domain = $1) DESC NULLS LAST
             LIMIT 1"
        ))
        .bind(&lookup.host)
        .bind(&lookup.subdomain)
        .bind(lookup.form_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(form)
    }
}

/// Status moves allowed through a plain update. PUBLISHED is normally reached by
/// publishing; here it only reopens a form that already has a published version.
pub fn check_status_change(current: FormStatus, requested: FormStatus, has_published: bool) -> Result<(), ServiceError> {
    use FormStatus::*;

    if current == Archived && requested != Archived {
        return Err(ServiceError::Conflict("Archived forms cannot change status".to_string()));
    }
    match (current, requested) {
        (a, b) if a == b => Ok(()),
        (_, Archived) => Ok(()),
        (Published, Closed) => Ok(()),
        (Closed, Published) if has_published => Ok(()),
        (_, Published) => Err(ServiceError::BadRequest(
            "Publish the form to make it live".to_string(),
        )),
        (_, Draft) => Err(ServiceError::Conflict(
            "A form cannot return to draft once it has left it".to_string(),
        )),
        (from, to) => Err(ServiceError::Conflict(format!(
            "Cannot change form status from {:?} to {:?}",
            from, to
        ))),
    }
}

/// Salted with the form id so equal passwords on different forms hash differently
pub fn hash_password(form_id: Uuid, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(form_id.as_bytes());
    hasher.update(b":");
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

pub fn verify_password(form: &Form, candidate: Option<&str>) -> bool {
    match (&form.password_hash, candidate) {
        (None, _) => true,
        (Some(_), None) => false,
        (Some(stored), Some(candidate)) => *stored == hash_password(form.id, candidate),
    }
}

/// `<slug-of-name>-<6 hex>`, e.g. `customer-survey-3fa9c1`
pub fn generate_subdomain(name: &str) -> String {
    let mut slug = String::new();
    for c in name.trim().to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
        if slug.len() >= SUBDOMAIN_STEM_LEN {
            break;
        }
    }
    let slug = slug.trim_end_matches('-');
    let stem = if slug.is_empty() { "form" } else { slug };
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}-{}", stem, &suffix[..6])
}

pub fn normalize_custom_domain(raw: &str, base_domain: Option<&str>) -> Result<String, ServiceError> {
    let domain = raw.trim().trim_end_matches('.').to_lowercase();
    let valid_chars = domain
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.');
    let valid_labels = domain
        .split('.')
        .all(|label| !label.is_empty() && !label.starts_with('-') && !label.ends_with('-'));

    if domain.len() > MAX_DOMAIN_LEN || !domain.contains('.') || !valid_chars || !valid_labels {
        return Err(ServiceError::BadRequest(format!("'{}' is not a valid domain name", raw)));
    }
    if let Some(base) = base_domain {
        if domain == base || domain.ends_with(&format!(".{}", base)) {
            return Err(ServiceError::BadRequest(format!(
                "Custom domains cannot live under {}",
                base
            )));
        }
    }
    Ok(domain)
}
