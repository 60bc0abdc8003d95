//! S3-compatible object storage client provider
//!
//! Builds one authenticated S3 client per process from a [`StorageConfig`],
//! using static keys when both are configured and the container-metadata
//! (IAM role) credential chain otherwise.

#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    dead_code
)]

mod client;
mod config;
mod error;
mod image;
mod provider;

/// Credential strategies and the IAM credential adapter
pub mod credentials;

pub use client::StorageClient;
pub use config::{StorageConfig, DEFAULT_REGION};
pub use error::{StorageError, StorageResult};
pub use image::ImageRef;
pub use provider::{global, install, StorageProvider};
