//! Optimistic concurrency stamps shared by profile and submission writes.
//!
//! Every write carries the version the caller last observed. Stores compare it
//! with the stored version before touching anything and bump it on success.

use serde::{Deserialize, Serialize};

/// Monotonic record version; new records start at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Version(pub u64);

impl Version {
    pub const INITIAL: Version = Version(1);

    pub fn next(self) -> Version {
        Version(self.0.saturating_add(1))
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "v{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("version mismatch (expected {expected}, stored {stored})")]
pub struct VersionMismatch {
    pub expected: Version,
    pub stored: Version,
}

/// Fail before any write when the caller's view is stale.
pub fn ensure_version(stored: Version, expected: Version) -> Result<(), VersionMismatch> {
    if stored == expected {
        Ok(())
    } else {
        Err(VersionMismatch { expected, stored })
    }
}
