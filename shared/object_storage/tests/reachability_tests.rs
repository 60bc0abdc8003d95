use std::net::{SocketAddr, TcpListener};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use mockito::{Matcher, Server};
use object_storage::credentials::{CredentialResolver, ResolvedCredentials};
use object_storage::{ImageRef, StorageConfig, StorageError, StorageProvider, StorageResult};

/// Config pointing at `addr` over plain HTTP, with static keys when `static_keys`
fn config_for(addr: SocketAddr, bucket: &str, static_keys: bool) -> StorageConfig {
    let port = addr.port().to_string();
    let host = addr.ip().to_string();
    StorageConfig::from_lookup(|key| {
        let value = match key {
            "S3_HOST" => host.as_str(),
            "S3_PORT" => port.as_str(),
            "S3_USE_SSL" => "false",
            "S3_BUCKET" => bucket,
            "S3_PUBLIC_URL" => "https://cdn.example.com",
            "S3_ACCESS_KEY" if static_keys => "test",
            "S3_SECRET_KEY" if static_keys => "test",
            _ => return None,
        };
        Some(value.to_string())
    })
    .expect("valid test config")
}

/// Provider with static keys pointing at `addr`
fn provider_for(addr: SocketAddr, bucket: &str) -> StorageProvider {
    StorageProvider::new(config_for(addr, bucket, true))
}

/// Hands out role credentials with a session token
#[derive(Debug, Default)]
struct RoleResolver {
    calls: AtomicUsize,
}

#[async_trait]
impl CredentialResolver for RoleResolver {
    async fn resolve(&self) -> StorageResult<ResolvedCredentials> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(ResolvedCredentials {
            access_key_id: "ASIAROLEEXAMPLE".to_string(),
            secret_access_key: "role-secret".to_string(),
            session_token: Some("role-session-token".to_string()),
            expiry: None,
        })
    }
}

#[tokio::test]
async fn test_existing_bucket_is_reachable() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("HEAD", Matcher::Any)
        .with_status(200)
        .create_async()
        .await;

    let provider = provider_for(server.socket_address(), "media");
    provider.verify_reachable().await.unwrap();

    mock.assert_async().await;
    assert!(provider.client().is_ok());
}

#[tokio::test]
async fn test_missing_bucket_is_a_failure() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("HEAD", Matcher::Regex("does-not-exist".to_string()))
        .with_status(404)
        .create_async()
        .await;

    let provider = provider_for(server.socket_address(), "does-not-exist");
    let err = provider.verify_reachable().await.unwrap_err();

    mock.assert_async().await;
    assert!(
        matches!(&err, StorageError::BucketNotFound(bucket) if bucket == "does-not-exist"),
        "unexpected error: {err}"
    );
}

#[tokio::test]
async fn test_forbidden_bucket_is_access_denied() {
    let mut server = Server::new_async().await;
    server
        .mock("HEAD", Matcher::Any)
        .with_status(403)
        .create_async()
        .await;

    let provider = provider_for(server.socket_address(), "private");
    let err = provider.verify_reachable().await.unwrap_err();

    assert!(
        matches!(err, StorageError::AccessDenied(_)),
        "unexpected error: {err}"
    );
}

#[tokio::test]
async fn test_closed_endpoint_is_unreachable() {
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };

    let provider = provider_for(addr, "media");
    let err = provider.verify_reachable().await.unwrap_err();

    assert!(
        matches!(err, StorageError::Unreachable(_)),
        "unexpected error: {err}"
    );
}

#[tokio::test]
async fn test_image_url_uses_public_base() {
    let mut server = Server::new_async().await;
    server
        .mock("HEAD", Matcher::Any)
        .with_status(200)
        .create_async()
        .await;

    let provider = provider_for(server.socket_address(), "media");
    let client = provider.get_client().await.unwrap();
    let image = ImageRef {
        width: 64,
        height: 64,
        thumbhash: "1QcSHQRnh493V4dIh4eXh1h4kJUI".to_string(),
        path: "avatars/7f/3a/7f3a.webp".to_string(),
    };

    assert_eq!(
        client.image_url(&image),
        "https://cdn.example.com/avatars/7f/3a/7f3a.webp"
    );
    assert_eq!(client.image_url(&image), provider.public_url(&image.path));
}

#[tokio::test]
async fn test_server_error_is_upstream_error() {
    let mut server = Server::new_async().await;
    server
        .mock("HEAD", Matcher::Any)
        .with_status(503)
        .expect_at_least(1)
        .create_async()
        .await;

    let provider = provider_for(server.socket_address(), "media");
    let err = provider.verify_reachable().await.unwrap_err();

    assert!(
        matches!(err, StorageError::UpstreamError(_)),
        "unexpected error: {err}"
    );
}

#[tokio::test]
async fn test_other_status_is_s3_error() {
    let mut server = Server::new_async().await;
    server
        .mock("HEAD", Matcher::Any)
        .with_status(400)
        .create_async()
        .await;

    let provider = provider_for(server.socket_address(), "media");
    let err = provider.verify_reachable().await.unwrap_err();

    assert!(
        matches!(err, StorageError::S3Error(_)),
        "unexpected error: {err}"
    );
}

#[tokio::test]
async fn test_role_session_token_is_signed_into_requests() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("HEAD", Matcher::Any)
        .match_header("x-amz-security-token", "role-session-token")
        .with_status(200)
        .create_async()
        .await;

    let resolver = Arc::new(RoleResolver::default());
    let provider = StorageProvider::with_resolver(
        config_for(server.socket_address(), "media", false),
        resolver.clone(),
    );

    provider.verify_reachable().await.unwrap();

    mock.assert_async().await;
    // The credentials resolved while building the client sign the first request
    assert_eq!(resolver.calls.load(Ordering::SeqCst), 1);
}
