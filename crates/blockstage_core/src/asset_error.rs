//! Asset error types
//!
//! Errors raised while fetching, parsing or instantiating assets.

use std::io;

use thiserror::Error;

/// Error type for asset operations
#[derive(Debug, Error)]
pub enum AssetError {
    /// IO error (file not found, permission denied, etc.)
    #[error("Asset IO error: {0}")]
    Io(#[from] io::Error),
    /// Parse error (invalid file format, malformed template)
    #[error("Asset parse error: {0}")]
    Parse(String),
    /// No asset at the requested location
    #[error("Asset not found: {0}")]
    NotFound(String),
    /// The load finished after its scene was torn down
    #[error("Asset load for {0} outlived its scene")]
    Stale(String),
    /// The loaded asset could not be registered
    #[error("Asset registration failed: {0}")]
    Registry(#[from] crate::registry::RegistryError),
}

impl From<ron::error::SpannedError> for AssetError {
    fn from(err: ron::error::SpannedError) -> Self {
        AssetError::Parse(err.to_string())
    }
}

impl From<&str> for AssetError {
    fn from(msg: &str) -> Self {
        AssetError::Parse(msg.to_string())
    }
}
