//! Configured S3 client handle

use aws_sdk_s3::Client as S3Client;
use tracing::{debug, error, info};

use crate::config::StorageConfig;
use crate::error::{StorageError, StorageResult};
use crate::image::ImageRef;

/// Authenticated connection profile for the configured bucket
///
/// Only [`crate::StorageProvider`] constructs this; everything else borrows it.
#[derive(Debug, Clone)]
pub struct StorageClient {
    s3_client: S3Client,
    config: StorageConfig,
}

impl StorageClient {
    pub(crate) const fn new(s3_client: S3Client, config: StorageConfig) -> Self {
        Self { s3_client, config }
    }

    /// Underlying S3 client for bucket operations
    #[must_use]
    pub const fn s3(&self) -> &S3Client {
        &self.s3_client
    }

    /// Bucket every operation targets
    #[must_use]
    pub fn bucket_name(&self) -> &str {
        self.config.bucket_name()
    }

    /// Confirms the bucket exists and the credentials can reach it
    ///
    /// # Errors
    ///
    /// Returns `StorageError::BucketNotFound` if the bucket does not exist
    /// Returns `StorageError::AccessDenied` if the credentials may not access it
    /// Returns `StorageError::Unreachable` if the endpoint could not be contacted
    /// Returns `StorageError::UpstreamError` for 5xx errors after retries
    pub async fn verify_reachable(&self) -> StorageResult<()> {
        let bucket = self.config.bucket_name();
        debug!("Checking bucket is reachable: {}", bucket);

        match self.s3_client.head_bucket().bucket(bucket).send().await {
            Ok(_) => {
                info!("Bucket {} is reachable", bucket);
                Ok(())
            }
            Err(e) => {
                let err = StorageError::from_head_bucket(bucket, &e);
                error!("Bucket {} is not reachable: {}", bucket, err);
                Err(err)
            }
        }
    }

    /// Public URL of the object stored at `path`
    #[must_use]
    pub fn public_url(&self, path: &str) -> String {
        self.config.public_url(path)
    }

    /// Public URL of a cataloged image
    #[must_use]
    pub fn image_url(&self, image: &ImageRef) -> String {
        self.public_url(&image.path)
    }
}
