//! Error types for object storage operations

use aws_sdk_s3::{
    error::{DisplayErrorContext, SdkError},
    operation::head_bucket::HeadBucketError,
};
use thiserror::Error;

/// Result type for object storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur while configuring or using the storage client
#[derive(Error, Debug)]
pub enum StorageError {
    /// Required configuration is missing or malformed
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Container-metadata credentials could not be resolved
    #[error("Credentials error: {0}")]
    CredentialsError(String),

    /// The configured bucket does not exist
    #[error("Bucket not found: {0}")]
    BucketNotFound(String),

    /// The bucket exists but the credentials may not access it
    #[error("Access denied to bucket: {0}")]
    AccessDenied(String),

    /// Upstream service error (5xx from S3)
    #[error("Upstream service error: {0}")]
    UpstreamError(String),

    /// The endpoint could not be reached (connection failure or timeout)
    #[error("Storage endpoint unreachable: {0}")]
    Unreachable(String),

    /// Any other S3 service error
    #[error("S3 service error: {0}")]
    S3Error(String),

    /// The client was used before the provider initialized it
    #[error("S3 client not initialized, call get_client() or verify_reachable() first")]
    NotInitialized,

    /// A process-wide provider was already installed
    #[error("Storage provider already initialized")]
    AlreadyInitialized,
}

impl StorageError {
    /// Maps a `HeadBucket` failure for `bucket` onto a storage error
    pub(crate) fn from_head_bucket(bucket: &str, error: &SdkError<HeadBucketError>) -> Self {
        match error {
            SdkError::ServiceError(service_err) => match service_err.raw().status().as_u16() {
                404 => Self::BucketNotFound(bucket.to_string()),
                401 | 403 => Self::AccessDenied(bucket.to_string()),
                status if status >= 500 => {
                    Self::UpstreamError(format!("{status}: {:?}", service_err.err()))
                }
                _ => Self::S3Error(format!("{:?}", service_err.err())),
            },
            SdkError::DispatchFailure(_) | SdkError::TimeoutError(_) => {
                Self::Unreachable(DisplayErrorContext(error).to_string())
            }
            _ => Self::S3Error(DisplayErrorContext(error).to_string()),
        }
    }
}
