//! Unique identifiers for Phasewatch records.

use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Unique identifier for a logged task error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ErrorId(Ulid);

impl ErrorId {
    /// Generate a new ErrorId
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for ErrorId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ErrorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for ErrorId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}
