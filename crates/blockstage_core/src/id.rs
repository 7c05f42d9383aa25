//! Stable object identifiers

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier of a managed scene object
///
/// Unlike a [`NodeKey`](crate::NodeKey), a `CustomId` survives scene
/// rebuilds and save/load cycles. Editor-placed objects get a random v4
/// UUID; objects created by the block program use their block identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomId(String);

impl CustomId {
    /// Generate a fresh random identifier
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Wrap an existing identifier (e.g. a block id or a saved id)
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier as a string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this identifier is a randomly generated (v4) UUID
    pub fn is_generated(&self) -> bool {
        Uuid::parse_str(&self.0)
            .map(|uuid| uuid.get_version_num() == 4)
            .unwrap_or(false)
    }
}

impl fmt::Display for CustomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CustomId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for CustomId {
    fn from(id: String) -> Self {
        Self(id)
    }
}
