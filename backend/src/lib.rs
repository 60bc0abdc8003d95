//! Backend process wiring for the object storage provider

#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    dead_code
)]

/// Startup sequence
pub mod startup;

/// Shared types
pub mod types;
