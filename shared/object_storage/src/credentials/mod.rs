//! Credential strategies for the storage client
//!
//! Static keys go straight into the S3 client. Otherwise the client receives
//! an [`IamCredentialsProvider`], which asks a [`CredentialResolver`] for
//! temporary credentials every time the SDK needs them.

mod container;

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::SystemTime;

use async_trait::async_trait;
use aws_credential_types::{
    provider::{error::CredentialsError, future, ProvideCredentials},
    Credentials,
};

pub use container::{ContainerMetadataResolver, DEFAULT_MAX_RETRIES, DEFAULT_TIMEOUT};

use crate::error::StorageResult;

/// Provider name attached to credentials produced by the IAM adapter
pub const IAM_PROVIDER_NAME: &str = "ContainerMetadataResolver";

/// Provider name attached to statically configured credentials
pub const STATIC_PROVIDER_NAME: &str = "StaticStorageCredentials";

/// How the storage client authenticates
#[derive(Clone, PartialEq, Eq)]
pub enum CredentialStrategy {
    /// Access key and secret key supplied by configuration
    Static {
        /// Access key id
        access_key: String,
        /// Secret access key
        secret_key: String,
    },
    /// Temporary credentials from the container-metadata (IAM role) endpoint
    ContainerMetadata,
}

impl CredentialStrategy {
    /// Short label for logs
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Static { .. } => "static",
            Self::ContainerMetadata => "container-metadata",
        }
    }
}

impl fmt::Debug for CredentialStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static { access_key, .. } => f
                .debug_struct("Static")
                .field("access_key", access_key)
                .field("secret_key", &"** redacted **")
                .finish(),
            Self::ContainerMetadata => f.write_str("ContainerMetadata"),
        }
    }
}

/// Credentials as returned by a [`CredentialResolver`]
#[derive(Clone, PartialEq, Eq)]
pub struct ResolvedCredentials {
    /// Access key id
    pub access_key_id: String,
    /// Secret access key
    pub secret_access_key: String,
    /// Session token, present for temporary credentials
    pub session_token: Option<String>,
    /// When the credentials stop being valid
    pub expiry: Option<SystemTime>,
}

impl fmt::Debug for ResolvedCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"** redacted **")
            .field(
                "session_token",
                &self.session_token.as_ref().map(|_| "** redacted **"),
            )
            .field("expiry", &self.expiry)
            .finish()
    }
}

impl ResolvedCredentials {
    /// Converts into the credential type the S3 client signs with
    #[must_use]
    pub fn into_credentials(self) -> Credentials {
        Credentials::new(
            self.access_key_id,
            self.secret_access_key,
            self.session_token,
            self.expiry,
            IAM_PROVIDER_NAME,
        )
    }
}

impl From<&Credentials> for ResolvedCredentials {
    fn from(credentials: &Credentials) -> Self {
        Self {
            access_key_id: credentials.access_key_id().to_string(),
            secret_access_key: credentials.secret_access_key().to_string(),
            session_token: credentials.session_token().map(str::to_string),
            expiry: credentials.expiry(),
        }
    }
}

/// Source of temporary credentials
///
/// The resolver owns its own timeout and retry bounds.
#[async_trait]
pub trait CredentialResolver: fmt::Debug + Send + Sync {
    /// Fetches a fresh set of credentials
    ///
    /// # Errors
    ///
    /// Returns `StorageError::CredentialsError` when no credentials could be obtained
    async fn resolve(&self) -> StorageResult<ResolvedCredentials>;
}

/// Adapts a [`CredentialResolver`] to the SDK's credential provider interface
#[derive(Debug)]
pub struct IamCredentialsProvider {
    resolver: Arc<dyn CredentialResolver>,
    initial: Mutex<Option<ResolvedCredentials>>,
}

impl IamCredentialsProvider {
    /// Wraps `resolver`
    #[must_use]
    pub fn new(resolver: Arc<dyn CredentialResolver>) -> Self {
        Self {
            resolver,
            initial: Mutex::new(None),
        }
    }

    /// Wraps `resolver`, handing out `initial` for the first request
    /// instead of resolving again
    #[must_use]
    pub fn with_initial(
        resolver: Arc<dyn CredentialResolver>,
        initial: ResolvedCredentials,
    ) -> Self {
        Self {
            resolver,
            initial: Mutex::new(Some(initial)),
        }
    }

    async fn load(&self) -> aws_credential_types::provider::Result {
        let initial = self
            .initial
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let resolved = match initial {
            Some(resolved) => resolved,
            None => self
                .resolver
                .resolve()
                .await
                .map_err(CredentialsError::provider_error)?,
        };
        Ok(resolved.into_credentials())
    }
}

impl ProvideCredentials for IamCredentialsProvider {
    fn provide_credentials<'a>(&'a self) -> future::ProvideCredentials<'a>
    where
        Self: 'a,
    {
        future::ProvideCredentials::new(self.load())
    }
}
