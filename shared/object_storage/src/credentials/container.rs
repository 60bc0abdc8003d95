//! Container-metadata (ECS task role) credential resolver

use std::time::Duration;

use async_trait::async_trait;
use aws_config::ecs::EcsCredentialsProvider;
use aws_credential_types::provider::{ProvideCredentials, SharedCredentialsProvider};
use tracing::{debug, warn};

use super::{CredentialResolver, ResolvedCredentials};
use crate::error::{StorageError, StorageResult};

/// Per-attempt timeout for the metadata endpoint
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Retries after the first failed attempt
pub const DEFAULT_MAX_RETRIES: usize = 3;

const RETRY_BACKOFF: Duration = Duration::from_millis(100);

/// Resolves temporary credentials from the container-metadata endpoint
///
/// Every attempt is bounded by `timeout`; a failed or timed out attempt is
/// retried up to `max_retries` times.
#[derive(Debug, Clone)]
pub struct ContainerMetadataResolver {
    provider: SharedCredentialsProvider,
    timeout: Duration,
    max_retries: usize,
}

impl Default for ContainerMetadataResolver {
    fn default() -> Self {
        Self::with_provider(
            EcsCredentialsProvider::builder().build(),
            DEFAULT_TIMEOUT,
            DEFAULT_MAX_RETRIES,
        )
    }
}

impl ContainerMetadataResolver {
    /// Builds a resolver over an arbitrary upstream credential provider
    #[must_use]
    pub fn with_provider(
        provider: impl ProvideCredentials + 'static,
        timeout: Duration,
        max_retries: usize,
    ) -> Self {
        Self {
            provider: SharedCredentialsProvider::new(provider),
            timeout,
            max_retries,
        }
    }

    async fn attempt(&self) -> StorageResult<ResolvedCredentials> {
        match tokio::time::timeout(self.timeout, self.provider.provide_credentials()).await {
            Ok(Ok(credentials)) => Ok(ResolvedCredentials::from(&credentials)),
            Ok(Err(e)) => Err(StorageError::CredentialsError(format!("{e:?}"))),
            Err(_) => Err(StorageError::CredentialsError(format!(
                "container metadata did not respond within {:?}",
                self.timeout
            ))),
        }
    }
}

#[async_trait]
impl CredentialResolver for ContainerMetadataResolver {
    async fn resolve(&self) -> StorageResult<ResolvedCredentials> {
        let mut attempt = 0;
        loop {
            match self.attempt().await {
                Ok(credentials) => {
                    debug!("Resolved container credentials on attempt {}", attempt + 1);
                    return Ok(credentials);
                }
                Err(e) => {
                    if attempt >= self.max_retries {
                        return Err(e);
                    }
                    attempt += 1;
                    warn!(
                        "Container credentials attempt {} of {} failed: {}",
                        attempt,
                        self.max_retries + 1,
                        e
                    );
                    tokio::time::sleep(RETRY_BACKOFF).await;
                }
            }
        }
    }
}
