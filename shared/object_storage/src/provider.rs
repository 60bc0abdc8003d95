//! Lazily constructed, memoized storage client

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use aws_config::{retry::RetryConfig, timeout::TimeoutConfig, BehaviorVersion, Region};
use aws_credential_types::{provider::SharedCredentialsProvider, Credentials};
use aws_sdk_s3::Client as S3Client;
use tokio::sync::OnceCell;
use tracing::info;

use crate::client::StorageClient;
use crate::config::StorageConfig;
use crate::credentials::{
    ContainerMetadataResolver, CredentialResolver, CredentialStrategy, IamCredentialsProvider,
    STATIC_PROVIDER_NAME,
};
use crate::error::{StorageError, StorageResult};

const MAX_ATTEMPTS: u32 = 3;

static GLOBAL_PROVIDER: OnceLock<StorageProvider> = OnceLock::new();

/// Owns the storage configuration and builds the client on first use
///
/// Concurrent first callers of [`StorageProvider::get_client`] share one
/// in-flight construction; afterwards the client is read without locking.
#[derive(Debug)]
pub struct StorageProvider {
    config: StorageConfig,
    resolver: Arc<dyn CredentialResolver>,
    client: OnceCell<StorageClient>,
}

impl StorageProvider {
    /// Creates a provider that resolves IAM credentials from container metadata
    #[must_use]
    pub fn new(config: StorageConfig) -> Self {
        Self::with_resolver(config, Arc::new(ContainerMetadataResolver::default()))
    }

    /// Creates a provider with a custom IAM credential resolver
    ///
    /// The resolver is only consulted when the configuration lacks static keys.
    #[must_use]
    pub fn with_resolver(config: StorageConfig, resolver: Arc<dyn CredentialResolver>) -> Self {
        Self {
            config,
            resolver,
            client: OnceCell::new(),
        }
    }

    /// Configuration the client is built from
    #[must_use]
    pub const fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Returns the storage client, constructing it on first call
    ///
    /// A failed construction is not memoized; the next call tries again.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::CredentialsError` if IAM credentials cannot be resolved
    pub async fn get_client(&self) -> StorageResult<&StorageClient> {
        self.client.get_or_try_init(|| self.build_client()).await
    }

    /// Returns the storage client if it has already been constructed
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotInitialized` before the first successful
    /// [`StorageProvider::get_client`]
    pub fn client(&self) -> StorageResult<&StorageClient> {
        self.client.get().ok_or(StorageError::NotInitialized)
    }

    /// Confirms the configured bucket exists and is accessible
    ///
    /// Constructs the client first if needed.
    ///
    /// # Errors
    ///
    /// Returns the construction error from [`StorageProvider::get_client`], or
    /// the reachability error from [`StorageClient::verify_reachable`]
    pub async fn verify_reachable(&self) -> StorageResult<()> {
        self.get_client().await?.verify_reachable().await
    }

    /// Public URL of the object stored at `path`
    #[must_use]
    pub fn public_url(&self, path: &str) -> String {
        self.config.public_url(path)
    }

    async fn build_client(&self) -> StorageResult<StorageClient> {
        let credentials_provider = match self.config.credential_strategy() {
            CredentialStrategy::Static {
                access_key,
                secret_key,
            } => SharedCredentialsProvider::new(Credentials::new(
                access_key.clone(),
                secret_key.clone(),
                None,
                None,
                STATIC_PROVIDER_NAME,
            )),
            CredentialStrategy::ContainerMetadata => {
                // Resolve up front so missing credentials fail construction; the
                // first signed request reuses this result
                let initial = self.resolver.resolve().await?;
                SharedCredentialsProvider::new(IamCredentialsProvider::with_initial(
                    self.resolver.clone(),
                    initial,
                ))
            }
        };

        let retry_config = RetryConfig::standard()
            .with_max_attempts(MAX_ATTEMPTS)
            .with_initial_backoff(Duration::from_millis(50));

        let timeout_config = TimeoutConfig::builder()
            .operation_timeout(Duration::from_secs(30))
            .build();

        let s3_config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(self.config.region().to_string()))
            .endpoint_url(self.config.endpoint_url())
            .force_path_style(self.config.force_path_style())
            .credentials_provider(credentials_provider)
            .retry_config(retry_config)
            .timeout_config(timeout_config)
            .build();

        info!(
            "Initialized S3 client for bucket {} at {} using {} credentials",
            self.config.bucket_name(),
            self.config.endpoint_url(),
            self.config.credential_strategy().label()
        );

        Ok(StorageClient::new(S3Client::from_conf(s3_config), self.config.clone()))
    }
}

/// Installs the process-wide provider
///
/// # Errors
///
/// Returns `StorageError::AlreadyInitialized` if a provider was installed before
pub fn install(provider: StorageProvider) -> StorageResult<&'static StorageProvider> {
    GLOBAL_PROVIDER
        .set(provider)
        .map_err(|_| StorageError::AlreadyInitialized)?;
    global()
}

/// Returns the process-wide provider
///
/// # Errors
///
/// Returns `StorageError::NotInitialized` before [`install`]
pub fn global() -> StorageResult<&'static StorageProvider> {
    GLOBAL_PROVIDER.get().ok_or(StorageError::NotInitialized)
}
