pub mod error;
pub mod generation;

pub use error::{ErrorCategory, ForgeError, Result, ResultExt};
pub use generation::*;

// =============================================================================
// Domain Newtypes
// =============================================================================

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity a generation is recorded against (a post slug or id in the host)
///
/// Prevents accidental mixing of post keys with other string types.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostKey(String);

impl PostKey {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Derive a key from a title: lowercase alphanumeric runs joined by '-'
    pub fn from_title(title: &str) -> Self {
        let slug = title
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("-");

        if slug.is_empty() {
            Self(uuid::Uuid::new_v4().to_string())
        } else {
            Self(slug)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PostKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PostKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for PostKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
