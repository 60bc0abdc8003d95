//! Connection configuration for the object storage endpoint

use std::env;
use std::net::Ipv6Addr;

use url::Url;

use crate::credentials::CredentialStrategy;
use crate::error::{StorageError, StorageResult};

/// Region used when `AWS_REGION` is not set
pub const DEFAULT_REGION: &str = "us-east-1";

const AWS_HOST_SUFFIX: &str = "amazonaws.com";

/// Connection profile for an S3-compatible endpoint
///
/// Built once at startup and handed to [`crate::StorageProvider`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    host: String,
    port: Option<u16>,
    use_ssl: bool,
    region: String,
    bucket_name: String,
    public_base_url: String,
    credential_strategy: CredentialStrategy,
    force_path_style: bool,
}

impl StorageConfig {
    /// Reads the configuration from the process environment
    ///
    /// # Errors
    ///
    /// Returns `StorageError::ConfigError` if a required variable is missing
    /// or a value is malformed
    pub fn from_env() -> StorageResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Reads the configuration through an arbitrary key lookup
    ///
    /// Empty values are treated as unset.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::ConfigError` if a required key is missing
    /// or a value is malformed
    pub fn from_lookup<F>(lookup: F) -> StorageResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let require = |key: &str| {
            get(key).ok_or_else(|| {
                StorageError::ConfigError(format!("{key} environment variable not set"))
            })
        };

        let host = require("S3_HOST")?.trim().to_string();
        validate_host(&host)?;

        let bucket_name = require("S3_BUCKET")?.trim().to_string();
        validate_bucket(&bucket_name)?;

        let public_base_url = require("S3_PUBLIC_URL")?
            .trim()
            .trim_end_matches('/')
            .to_string();
        if public_base_url.is_empty() {
            return Err(StorageError::ConfigError(
                "S3_PUBLIC_URL must not be only slashes".to_string(),
            ));
        }

        let port = get("S3_PORT").map(|raw| parse_port(&raw)).transpose()?;
        let use_ssl = get("S3_USE_SSL")
            .map(|raw| parse_flag("S3_USE_SSL", &raw))
            .transpose()?
            .unwrap_or(true);
        let force_path_style = get("S3_FORCE_PATH_STYLE")
            .map(|raw| parse_flag("S3_FORCE_PATH_STYLE", &raw))
            .transpose()?
            .unwrap_or_else(|| !host.ends_with(AWS_HOST_SUFFIX));
        let region = get("AWS_REGION")
            .map_or_else(|| DEFAULT_REGION.to_string(), |r| r.trim().to_string());

        let credential_strategy = match (get("S3_ACCESS_KEY"), get("S3_SECRET_KEY")) {
            (Some(access_key), Some(secret_key)) => CredentialStrategy::Static {
                access_key,
                secret_key,
            },
            _ => CredentialStrategy::ContainerMetadata,
        };

        let config = Self {
            host,
            port,
            use_ssl,
            region,
            bucket_name,
            public_base_url,
            credential_strategy,
            force_path_style,
        };

        let endpoint = config.endpoint_url();
        Url::parse(&endpoint).map_err(|e| {
            StorageError::ConfigError(format!("invalid S3 endpoint {endpoint}: {e}"))
        })?;

        Ok(config)
    }

    /// Endpoint host, without scheme or port
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Explicit endpoint port, `None` for the protocol default
    #[must_use]
    pub const fn port(&self) -> Option<u16> {
        self.port
    }

    /// Whether the endpoint is reached over TLS
    #[must_use]
    pub const fn use_ssl(&self) -> bool {
        self.use_ssl
    }

    /// Signing region
    #[must_use]
    pub fn region(&self) -> &str {
        &self.region
    }

    /// Target bucket
    #[must_use]
    pub fn bucket_name(&self) -> &str {
        &self.bucket_name
    }

    /// Public URL base, without a trailing slash
    #[must_use]
    pub fn public_base_url(&self) -> &str {
        &self.public_base_url
    }

    /// How the client authenticates
    #[must_use]
    pub const fn credential_strategy(&self) -> &CredentialStrategy {
        &self.credential_strategy
    }

    /// Whether requests address the bucket in the path instead of the host
    #[must_use]
    pub const fn force_path_style(&self) -> bool {
        self.force_path_style
    }

    /// Full endpoint URL handed to the S3 client
    #[must_use]
    pub fn endpoint_url(&self) -> String {
        let scheme = if self.use_ssl { "https" } else { "http" };
        match self.port {
            Some(port) => format!("{scheme}://{}:{port}", self.host),
            None => format!("{scheme}://{}", self.host),
        }
    }

    /// Public URL of the object stored at `path`
    ///
    /// Plain concatenation: `path` is neither validated nor escaped.
    #[must_use]
    pub fn public_url(&self, path: &str) -> String {
        format!("{}/{path}", self.public_base_url)
    }
}

fn validate_host(host: &str) -> StorageResult<()> {
    if host.contains("://") {
        return Err(StorageError::ConfigError(format!(
            "S3_HOST must not include a scheme, got {host}"
        )));
    }
    if host.contains('/') || host.chars().any(char::is_whitespace) {
        return Err(StorageError::ConfigError(format!(
            "S3_HOST must be a bare host name, got {host}"
        )));
    }
    // Only a bracketed IPv6 literal may contain colons; ports go in S3_PORT
    if let Some(literal) = host.strip_prefix('[') {
        let is_ipv6 = literal
            .strip_suffix(']')
            .is_some_and(|inner| inner.parse::<Ipv6Addr>().is_ok());
        if !is_ipv6 {
            return Err(StorageError::ConfigError(format!(
                "S3_HOST is not a valid bracketed IPv6 address, got {host}"
            )));
        }
    } else if host.contains(':') {
        return Err(StorageError::ConfigError(format!(
            "S3_HOST must not include a port, set S3_PORT instead, got {host}"
        )));
    }
    Ok(())
}

fn validate_bucket(bucket: &str) -> StorageResult<()> {
    if bucket.contains('/') || bucket.chars().any(char::is_whitespace) {
        return Err(StorageError::ConfigError(format!(
            "S3_BUCKET must not contain slashes or whitespace, got {bucket}"
        )));
    }
    Ok(())
}

fn parse_port(raw: &str) -> StorageResult<u16> {
    match raw.trim().parse::<u16>() {
        Ok(port) if port > 0 => Ok(port),
        _ => Err(StorageError::ConfigError(format!(
            "S3_PORT must be a port number between 1 and 65535, got {raw}"
        ))),
    }
}

fn parse_flag(key: &str, raw: &str) -> StorageResult<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(StorageError::ConfigError(format!(
            "{key} must be true or false, got {raw}"
        ))),
    }
}
