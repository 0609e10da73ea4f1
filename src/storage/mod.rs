//! Object storage behind a trait, so upload rules can be tested without S3.

pub mod s3;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use url::Url;

pub use s3::S3Storage;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Invalid object key '{0}'")]
    InvalidKey(String),

    #[error("Object storage is not configured: {0}")]
    Configuration(String),

    #[error(transparent)]
    Backend(#[from] object_store::Error),
}

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Presigned PUT for `key`
    async fn presign_upload(&self, key: &str, expires_in: Duration) -> Result<Url, StorageError>;

    /// Presigned GET for `key`
    async fn presign_download(&self, key: &str, expires_in: Duration) -> Result<Url, StorageError>;

    async fn delete(&self, key: &str) -> Result<(), StorageError>;
}
