use anyhow::Context;
use object_storage::{StorageConfig, StorageProvider};

/// Loads the storage configuration, installs the process-wide provider and
/// fails fast if the bucket cannot be reached
///
/// # Errors
///
/// Returns an error if the configuration is invalid, credentials cannot be
/// resolved, or the bucket is missing or inaccessible
pub async fn start() -> anyhow::Result<&'static StorageProvider> {
    let config = StorageConfig::from_env().context("invalid object storage configuration")?;
    tracing::info!(
        "Connecting to bucket {} at {}",
        config.bucket_name(),
        config.endpoint_url()
    );

    start_with(StorageProvider::new(config)).await
}

/// Installs `provider` process-wide and checks bucket reachability
///
/// # Errors
///
/// Returns an error if a provider is already installed or the bucket check fails
pub async fn start_with(provider: StorageProvider) -> anyhow::Result<&'static StorageProvider> {
    let provider = object_storage::install(provider)?;
    provider
        .verify_reachable()
        .await
        .with_context(|| format!("bucket {} is not reachable", provider.config().bucket_name()))?;
    Ok(provider)
}
