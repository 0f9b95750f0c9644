//! Object storage for uploaded media.
//!
//! [`ObjectStorage`] is the seam the API uses; [`S3Storage`] talks to S3 or an
//! S3-compatible endpoint and [`MemoryStorage`] keeps objects in process.

use std::sync::Arc;

use async_trait::async_trait;

pub mod key;
pub mod memory;
pub mod s3;

pub use key::{key_from_url, object_key};
pub use memory::MemoryStorage;
pub use s3::{S3Config, S3Storage};

/// Errors from the object store.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Failed to upload {key}: {message}")]
    Upload { key: String, message: String },

    #[error("Failed to delete {key}: {message}")]
    Delete { key: String, message: String },

    #[error("Cannot derive an object key from URL: {0}")]
    InvalidUrl(String),
}

/// A bucket of publicly readable objects.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    fn bucket(&self) -> &str;

    /// URL under which `key` is served.
    fn public_url(&self, key: &str) -> String;

    async fn put(&self, key: &str, data: Vec<u8>, content_type: &str) -> Result<(), StorageError>;

    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// Store `data` under a fresh key derived from `content_type` and
    /// `filename`, returning its public URL.
    async fn upload(
        &self,
        data: Vec<u8>,
        filename: &str,
        content_type: &str,
    ) -> Result<String, StorageError> {
        let key = object_key(content_type, filename);
        self.put(&key, data, content_type).await?;
        Ok(self.public_url(&key))
    }

    /// Delete the object a stored media URL points at.
    async fn delete_by_url(&self, url: &str) -> Result<(), StorageError> {
        let key =
            key_from_url(url, self.bucket()).ok_or_else(|| StorageError::InvalidUrl(url.into()))?;
        self.delete(&key).await
    }
}

/// Storage handle shared through application state.
pub type SharedStorage = Arc<dyn ObjectStorage>;
