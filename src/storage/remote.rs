//! Remote object store backed by S3.
//!
//! The remote store is the source of truth for every durable object the bot
//! owns: guild configuration, the janken ledger and media resources. Keys are
//! slash-delimited, deterministic functions of feature + guild/entity ids.

use async_trait::async_trait;
use aws_credential_types::Credentials;
use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::operation::get_object::GetObjectError;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use aws_types::region::Region;
use thiserror::Error;
use tracing::debug;

use crate::config::Settings;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StorageError {
    /// The object does not exist in the remote store
    #[error("object not found: {0}")]
    NotFound(String),
    /// Error retrieving an object
    #[error("S3 get error: {0}")]
    Get(Box<SdkError<GetObjectError>>),
    /// Error checking object existence
    #[error("S3 head error: {0}")]
    Head(String),
    /// Error putting an object
    #[error("S3 put error: {0}")]
    Put(String),
    /// Standard I/O error (local mirror access)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    /// True when the error means the object is simply absent.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Interface to the remote key/value object service
#[mockall::automock]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch the full object body. Fails with [`StorageError::NotFound`]
    /// when the key is absent.
    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError>;

    /// Overwrite the object unconditionally.
    async fn put(&self, key: &str, body: Vec<u8>) -> Result<(), StorageError>;

    /// Check object existence. Absence maps to `Ok(false)`; any other
    /// failure (authorization, transport) propagates as an error and is
    /// never coerced to `false`.
    async fn exists(&self, key: &str) -> Result<bool, StorageError>;

    /// Deterministic public URL for the key. No network call.
    fn url_for(&self, key: &str) -> String;
}

/// S3-backed implementation of [`ObjectStore`]
pub struct RemoteStore {
    client: Client,
    bucket: String,
    region: String,
}

impl RemoteStore {
    /// Create a new store client from the application settings.
    pub async fn new(settings: &Settings) -> Self {
        let credentials = Credentials::new(
            &settings.aws_access_key,
            &settings.aws_secret_key,
            None,
            None,
            "bot-config",
        );

        let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .credentials_provider(credentials)
            .region(Region::new(settings.aws_region.clone()))
            .load()
            .await;

        Self {
            client: Client::new(&sdk_config),
            bucket: settings.aws_bucket.clone(),
            region: settings.aws_region.clone(),
        }
    }
}

#[async_trait]
impl ObjectStore for RemoteStore {
    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let result = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await;

        match result {
            Ok(output) => {
                let data = output
                    .body
                    .collect()
                    .await
                    .map_err(|e| StorageError::Io(std::io::Error::other(e)))?;
                debug!(key, "fetched object from remote store");
                Ok(data.into_bytes().to_vec())
            }
            Err(SdkError::ServiceError(err)) if err.err().is_no_such_key() => {
                Err(StorageError::NotFound(key.to_string()))
            }
            Err(e) => Err(StorageError::Get(Box::new(e))),
        }
    }

    async fn put(&self, key: &str, body: Vec<u8>) -> Result<(), StorageError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| StorageError::Put(e.to_string()))?;
        debug!(key, "stored object in remote store");
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        let result = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await;

        match result {
            Ok(_) => Ok(true),
            Err(SdkError::ServiceError(err)) if err.err().is_not_found() => Ok(false),
            Err(e) => Err(StorageError::Head(e.to_string())),
        }
    }

    fn url_for(&self, key: &str) -> String {
        format!(
            "https://s3-{}.amazonaws.com/{}/{}",
            self.region, self.bucket, key
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::test_settings;

    #[tokio::test]
    async fn url_is_deterministic_and_offline() {
        let store = RemoteStore::new(&test_settings()).await;
        let url = store.url_for("player-resource/ab/cd/thumbnail.webp");
        assert_eq!(
            url,
            "https://s3-test-region-1.amazonaws.com/test-bucket/player-resource/ab/cd/thumbnail.webp"
        );
        assert_eq!(url, store.url_for("player-resource/ab/cd/thumbnail.webp"));
    }
}
