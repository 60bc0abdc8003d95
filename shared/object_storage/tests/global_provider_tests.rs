use std::collections::HashMap;

use object_storage::{global, install, StorageConfig, StorageError, StorageProvider};

fn static_config() -> StorageConfig {
    let vars: HashMap<&str, &str> = HashMap::from([
        ("S3_HOST", "localhost"),
        ("S3_PORT", "4566"),
        ("S3_USE_SSL", "false"),
        ("S3_BUCKET", "world-chat-media"),
        ("S3_PUBLIC_URL", "http://localhost:4566/world-chat-media"),
        ("S3_ACCESS_KEY", "test"),
        ("S3_SECRET_KEY", "test"),
    ]);
    StorageConfig::from_lookup(|key| vars.get(key).map(|v| (*v).to_string()))
        .expect("valid test config")
}

// Single test: the process-wide slot can only be filled once per test binary
#[tokio::test]
async fn test_process_wide_provider_lifecycle() {
    assert!(matches!(global(), Err(StorageError::NotInitialized)));

    let provider = install(StorageProvider::new(static_config())).unwrap();
    assert!(std::ptr::eq(provider, global().unwrap()));

    // Installed but not yet used
    assert!(matches!(
        global().unwrap().client(),
        Err(StorageError::NotInitialized)
    ));

    let client = global().unwrap().get_client().await.unwrap();
    assert!(std::ptr::eq(client, global().unwrap().client().unwrap()));
    assert_eq!(client.bucket_name(), "world-chat-media");

    let err = install(StorageProvider::new(static_config())).unwrap_err();
    assert!(matches!(err, StorageError::AlreadyInitialized));
    assert!(std::ptr::eq(client, global().unwrap().client().unwrap()));
}
