use std::time::Duration;

use async_trait::async_trait;
use axum::http::Method;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path;
use object_store::signer::Signer;
use object_store::ObjectStore;
use url::Url;

use crate::config::StorageConfig;

use super::{ObjectStorage, StorageError};

/// S3 or any S3-compatible endpoint (MinIO in development)
pub struct S3Storage {
    store: AmazonS3,
}

impl S3Storage {
    pub fn from_config(config: &StorageConfig) -> Result<Self, StorageError> {
        let mut builder = AmazonS3Builder::new()
            .with_bucket_name(&config.bucket)
            .with_region(&config.region)
            .with_allow_http(config.allow_http);

        if let Some(endpoint) = &config.endpoint {
            builder = builder.with_endpoint(endpoint);
        }
        if let (Some(key), Some(secret)) = (&config.access_key_id, &config.secret_access_key) {
            builder = builder
                .with_access_key_id(key)
                .with_secret_access_key(secret);
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::Configuration(e.to_string()))?;

        tracing::info!("Object storage ready for bucket '{}'", config.bucket);
        Ok(Self { store })
    }

    fn path(key: &str) -> Result<Path, StorageError> {
        Path::parse(key).map_err(|_| StorageError::InvalidKey(key.to_string()))
    }
}

#[async_trait]
impl ObjectStorage for S3Storage {
    async fn presign_upload(&self, key: &str, expires_in: Duration) -> Result<Url, StorageError> {
        let path = Self::path(key)?;
        Ok(self.store.signed_url(Method::PUT, &path, expires_in).await?)
    }

    async fn presign_download(&self, key: &str, expires_in: Duration) -> Result<Url, StorageError> {
        let path = Self::path(key)?;
        Ok(self.store.signed_url(Method::GET, &path, expires_in).await?)
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let path = Self::path(key)?;
        self.store.delete(&path).await?;
        tracing::debug!("Deleted object '{}'", key);
        Ok(())
    }
}
