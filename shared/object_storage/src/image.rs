//! Stored image metadata

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A stored image: its dimensions, perceptual hash, and storage path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ImageRef {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Base64 thumbhash placeholder
    pub thumbhash: String,
    /// Object key relative to the bucket
    pub path: String,
}
