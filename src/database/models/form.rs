use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use crate::types::{Document, FormStatus, PageLayout};

/// Live, mutable form row. Public reads never go through this type; they use the
/// snapshot stored in `form_versions`.
#[derive(Debug, Clone, FromRow)]
pub struct Form {
    pub id: Uuid,
    pub team_id: Uuid,
    pub project_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub status: FormStatus,
    pub theme: Document,
    pub logo_url: Option<String>,
    pub require_consent: bool,
    pub allow_anonymous: bool,
    pub password_hash: Option<String>,
    pub page_layout: PageLayout,
    pub subdomain: Option<String>,
    pub custom_domain: Option<String>,
    pub created_by: String,
    pub valid: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Form {
    pub fn password_protected(&self) -> bool {
        self.password_hash.is_some()
    }

    /// A form can only be served publicly once it has an address
    pub fn is_addressable(&self) -> bool {
        self.subdomain.is_some() || self.custom_domain.is_some()
    }
}

/// Form as returned to team members; the password hash never leaves the server
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormView {
    pub id: Uuid,
    pub team_id: Uuid,
    pub project_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub status: FormStatus,
    pub theme: Document,
    pub logo_url: Option<String>,
    pub require_consent: bool,
    pub allow_anonymous: bool,
    pub password_protected: bool,
    pub page_layout: PageLayout,
    pub subdomain: Option<String>,
    pub custom_domain: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Form> for FormView {
    fn from(form: Form) -> Self {
        let password_protected = form.password_protected();
        Self {
            id: form.id,
            team_id: form.team_id,
            project_id: form.project_id,
            name: form.name,
            description: form.description,
            status: form.status,
            theme: form.theme,
            logo_url: form.logo_url,
            require_consent: form.require_consent,
            allow_anonymous: form.allow_anonymous,
            password_protected,
            page_layout: form.page_layout,
            subdomain: form.subdomain,
            custom_domain: form.custom_domain,
            created_by: form.created_by,
            created_at: form.created_at,
            updated_at: form.updated_at,
        }
    }
}
