use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::StorageConfig;
use crate::storage::{ObjectStorage, StorageError};
use crate::types::UploadIntent;

/// Content types accepted for upload, with the extension every stored key gets
const ALLOWED_MIME_TYPES: &[(&str, &str)] = &[
    ("image/jpeg", "jpg"),
    ("image/png", "png"),
    ("image/gif", "gif"),
    ("image/webp", "webp"),
    ("image/svg+xml", "svg"),
    ("application/pdf", "pdf"),
    ("text/plain", "txt"),
    ("text/csv", "csv"),
    ("application/msword", "doc"),
    ("application/vnd.openxmlformats-officedocument.wordprocessingml.document", "docx"),
    ("application/vnd.ms-excel", "xls"),
    ("application/vnd.openxmlformats-officedocument.spreadsheetml.sheet", "xlsx"),
    ("audio/mpeg", "mp3"),
    ("video/mp4", "mp4"),
];

const MAX_STEM_LEN: usize = 100;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Content type '{0}' is not allowed")]
    UnsupportedMimeType(String),

    #[error("{0}")]
    InvalidKey(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRequest {
    pub filename: String,
    pub content_type: String,
    #[serde(default = "default_intent")]
    pub intent: UploadIntent,
    pub expiration_mins: Option<i64>,
}

fn default_intent() -> UploadIntent {
    UploadIntent::Other
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadRequest {
    pub key: String,
    pub expiration_mins: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresignedUrl {
    pub url: String,
    pub key: String,
    pub expiration_mins: i64,
    pub expires_at: DateTime<Utc>,
}

/// Default and ceiling for link lifetimes, in minutes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryPolicy {
    pub default_mins: i64,
    pub max_mins: i64,
}

impl ExpiryPolicy {
    /// Missing or non-positive requests get the default; anything above the ceiling is clamped
    pub fn resolve(self, requested: Option<i64>) -> i64 {
        match requested {
            Some(mins) if mins > 0 => mins.min(self.max_mins),
            _ => self.default_mins,
        }
    }
}

pub struct UploadService {
    storage: Arc<dyn ObjectStorage>,
    upload_expiry: ExpiryPolicy,
    download_expiry: ExpiryPolicy,
}

impl UploadService {
    pub fn new(storage: Arc<dyn ObjectStorage>, config: &StorageConfig) -> Self {
        Self {
            storage,
            upload_expiry: ExpiryPolicy {
                default_mins: config.default_upload_mins,
                max_mins: config.max_upload_mins,
            },
            download_expiry: ExpiryPolicy {
                default_mins: config.default_download_mins,
                max_mins: config.max_download_mins,
            },
        }
    }

    pub async fn presign_upload(&self, form_id: Uuid, request: &UploadRequest) -> Result<PresignedUrl, UploadError> {
        let content_type = request.content_type.trim().to_ascii_lowercase();
        let ext = allowed_extension(&content_type)
            .ok_or_else(|| UploadError::UnsupportedMimeType(request.content_type.clone()))?;

        let key = object_key(form_id, request.intent, &request.filename, ext, Uuid::new_v4());
        let mins = self.upload_expiry.resolve(request.expiration_mins);
        let url = self.storage.presign_upload(&key, minutes(mins)).await?;

        tracing::debug!("Presigned upload '{}' for {} minutes", key, mins);
        Ok(PresignedUrl {
            url: url.to_string(),
            key,
            expiration_mins: mins,
            expires_at: Utc::now() + chrono::Duration::minutes(mins),
        })
    }

    pub async fn presign_download(&self, form_id: Uuid, request: &DownloadRequest) -> Result<PresignedUrl, UploadError> {
        check_key_for_form(form_id, &request.key)?;
        let mins = self.download_expiry.resolve(request.expiration_mins);
        let url = self.storage.presign_download(&request.key, minutes(mins)).await?;

        Ok(PresignedUrl {
            url: url.to_string(),
            key: request.key.clone(),
            expiration_mins: mins,
            expires_at: Utc::now() + chrono::Duration::minutes(mins),
        })
    }

    pub async fn delete(&self, form_id: Uuid, key: &str) -> Result<(), UploadError> {
        check_key_for_form(form_id, key)?;
        self.storage.delete(key).await?;
        Ok(())
    }
}

fn minutes(mins: i64) -> Duration {
    Duration::from_secs(mins.max(0) as u64 * 60)
}

pub fn allowed_extension(content_type: &str) -> Option<&'static str> {
    ALLOWED_MIME_TYPES
        .iter()
        .find(|(mime, _)| *mime == content_type)
        .map(|(_, ext)| *ext)
}

pub fn form_prefix(form_id: Uuid) -> String {
    format!("uploads/form_{}/", form_id)
}

/// `uploads/form_{formId}/{intent}/{stem}_{uuid}.{ext}`
///
/// `ext` comes from the allow-listed content type; whatever extension the client's
/// filename carries is dropped with the rest of the name's suffix.
pub fn object_key(form_id: Uuid, intent: UploadIntent, filename: &str, ext: &str, unique: Uuid) -> String {
    let name = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    let stem = match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => name,
    };

    let mut stem = sanitize_stem(stem);
    if stem.is_empty() {
        stem.push_str("file");
    }

    format!("{}{}/{}_{}.{}", form_prefix(form_id), intent, stem, unique, ext)
}

fn sanitize_stem(stem: &str) -> String {
    stem.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .take(MAX_STEM_LEN)
        .collect()
}

fn check_key_for_form(form_id: Uuid, key: &str) -> Result<(), UploadError> {
    let prefix = form_prefix(form_id);
    let rest = key
        .strip_prefix(&prefix)
        .ok_or_else(|| UploadError::InvalidKey(format!("Key '{}' does not belong to form {}", key, form_id)))?;

    if rest.is_empty() || rest.split('/').any(|seg| seg.is_empty() || seg == "." || seg == "..") {
        return Err(UploadError::InvalidKey(format!("Key '{}' is not a valid object key", key)));
    }
    Ok(())
}
