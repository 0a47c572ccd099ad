//! Capability URL issuance against the object store
//!
//! Clients never hold storage credentials. They receive pre-signed URLs that
//! grant exactly one verb (PUT or GET) on exactly one key, for a bounded time.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::{Client, presigning::PresigningConfig};
use std::env;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Lifetime of every capability URL; matches the AWS presigner default.
pub const CAPABILITY_TTL: Duration = Duration::from_secs(900);

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to sign {verb} request for {key}: {message}")]
    Signing {
        verb: &'static str,
        key: String,
        message: String,
    },

    #[error("Storage configuration error: {0}")]
    Configuration(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Mints time-limited capability URLs for object keys
#[async_trait]
pub trait CapabilitySigner: Send + Sync {
    /// URL allowing a single upload to `key`
    async fn sign_write(&self, key: &str) -> StorageResult<String>;

    /// URL allowing `key` to be fetched
    async fn sign_read(&self, key: &str) -> StorageResult<String>;
}

/// Object store configuration
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Bucket holding every video object
    pub bucket: String,
    /// Custom endpoint (MinIO, localstack); switches to path-style addressing
    pub endpoint_url: Option<String>,
}

impl StorageConfig {
    /// Create a new StorageConfig from environment variables
    ///
    /// # Environment Variables
    /// - `AWS_BUCKET_NAME`: bucket for video objects (required)
    /// - `S3_ENDPOINT_URL`: optional endpoint override
    ///
    /// Credentials and region come from the standard AWS provider chain.
    pub fn from_env() -> StorageResult<Self> {
        let bucket = env::var("AWS_BUCKET_NAME")
            .ok()
            .filter(|bucket| !bucket.trim().is_empty())
            .ok_or_else(|| {
                StorageError::Configuration(
                    "AWS_BUCKET_NAME environment variable not set".to_string(),
                )
            })?;

        let endpoint_url = env::var("S3_ENDPOINT_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());

        Ok(Self {
            bucket,
            endpoint_url,
        })
    }
}

/// Signer backed by the AWS S3 presigner
#[derive(Clone)]
pub struct S3CapabilitySigner {
    client: Client,
    bucket: String,
}

impl S3CapabilitySigner {
    /// Wrap an existing client
    pub fn new(client: Client, bucket: String) -> Self {
        Self { client, bucket }
    }

    /// Build a client from the ambient AWS configuration
    pub async fn from_config(config: &StorageConfig) -> Self {
        let shared = aws_config::load_defaults(BehaviorVersion::latest()).await;
        let mut builder = aws_sdk_s3::config::Builder::from(&shared);

        if let Some(endpoint) = &config.endpoint_url {
            info!("Using custom S3 endpoint: {}", endpoint);
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        let client = Client::from_conf(builder.build());
        info!("S3 signer initialized for bucket: {}", config.bucket);

        Self::new(client, config.bucket.clone())
    }

    fn presigning_config(verb: &'static str, key: &str) -> StorageResult<PresigningConfig> {
        PresigningConfig::expires_in(CAPABILITY_TTL).map_err(|e| StorageError::Signing {
            verb,
            key: key.to_string(),
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl CapabilitySigner for S3CapabilitySigner {
    async fn sign_write(&self, key: &str) -> StorageResult<String> {
        let request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(Self::presigning_config("PUT", key)?)
            .await
            .map_err(|e| StorageError::Signing {
                verb: "PUT",
                key: key.to_string(),
                message: e.to_string(),
            })?;

        debug!(key, "Signed PUT capability");
        Ok(request.uri().to_string())
    }

    async fn sign_read(&self, key: &str) -> StorageResult<String> {
        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(Self::presigning_config("GET", key)?)
            .await
            .map_err(|e| StorageError::Signing {
                verb: "GET",
                key: key.to_string(),
                message: e.to_string(),
            })?;

        debug!(key, "Signed GET capability");
        Ok(request.uri().to_string())
    }
}
