//! S3 (or S3-compatible) object storage via the AWS SDK.

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;

use crate::{key, ObjectStorage, StorageError};

/// Default region when `S3_REGION` is not set.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Connection settings for the media bucket.
#[derive(Debug, Clone)]
pub struct S3Config {
    pub bucket: String,
    pub region: String,
    /// Static credentials; when either is missing the SDK's default provider
    /// chain is used instead.
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    /// Custom endpoint for S3-compatible services (MinIO, R2, ...).
    pub endpoint: Option<String>,
    pub use_path_style: bool,
}

impl S3Config {
    /// Load from environment variables.
    ///
    /// | Variable            | Default     |
    /// |---------------------|-------------|
    /// | `S3_BUCKET`         | required    |
    /// | `S3_REGION`         | `us-east-1` |
    /// | `S3_ACCESS_KEY`     | unset       |
    /// | `S3_SECRET_KEY`     | unset       |
    /// | `S3_ENDPOINT`       | unset       |
    /// | `S3_USE_PATH_STYLE` | `false`     |
    ///
    /// # Panics
    ///
    /// Panics if `S3_BUCKET` is not set.
    pub fn from_env() -> Self {
        let bucket = std::env::var("S3_BUCKET").expect("S3_BUCKET must be set");
        let region = std::env::var("S3_REGION").unwrap_or_else(|_| DEFAULT_REGION.into());
        let non_empty = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());
        let use_path_style = std::env::var("S3_USE_PATH_STYLE")
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "true" | "1" | "yes"))
            .unwrap_or(false);

        Self {
            bucket,
            region,
            access_key: non_empty("S3_ACCESS_KEY"),
            secret_key: non_empty("S3_SECRET_KEY"),
            endpoint: non_empty("S3_ENDPOINT"),
            use_path_style,
        }
    }
}

/// [`ObjectStorage`] backed by an S3 bucket.
pub struct S3Storage {
    client: Client,
    bucket: String,
    endpoint: Option<String>,
}

impl S3Storage {
    /// Build an SDK client from `config`. No request is made until first use.
    pub async fn connect(config: &S3Config) -> Self {
        let mut loader =
            aws_config::defaults(BehaviorVersion::latest()).region(Region::new(config.region.clone()));

        if let (Some(access_key), Some(secret_key)) = (&config.access_key, &config.secret_key) {
            loader = loader.credentials_provider(Credentials::new(
                access_key.clone(),
                secret_key.clone(),
                None,
                None,
                "static",
            ));
        }
        if let Some(endpoint) = &config.endpoint {
            loader = loader.endpoint_url(endpoint.clone());
        }

        let sdk_config = loader.load().await;
        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(config.use_path_style)
            .build();

        tracing::info!(
            bucket = %config.bucket,
            region = %config.region,
            endpoint = config.endpoint.as_deref().unwrap_or("aws"),
            path_style = config.use_path_style,
            "S3 storage configured",
        );

        Self {
            client: Client::from_conf(s3_config),
            bucket: config.bucket.clone(),
            endpoint: config.endpoint.clone(),
        }
    }
}

#[async_trait]
impl ObjectStorage for S3Storage {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    fn public_url(&self, key: &str) -> String {
        key::public_url(self.endpoint.as_deref(), &self.bucket, key)
    }

    async fn put(&self, key: &str, data: Vec<u8>, content_type: &str) -> Result<(), StorageError> {
        let size = data.len();
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| StorageError::Upload {
                key: key.to_string(),
                message: DisplayErrorContext(&e).to_string(),
            })?;

        tracing::debug!(bucket = %self.bucket, key, size, content_type, "Object stored");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StorageError::Delete {
                key: key.to_string(),
                message: DisplayErrorContext(&e).to_string(),
            })?;

        tracing::debug!(bucket = %self.bucket, key, "Object deleted");
        Ok(())
    }
}
