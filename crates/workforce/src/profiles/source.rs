use async_trait::async_trait;

use super::domain::{Profile, ProfileId, UserId};
use crate::version::VersionMismatch;

/// Resolves profiles for the forms engine. Read-only from the engine's side.
#[async_trait]
pub trait ProfileSource: Send + Sync {
    async fn profile(&self, profile_id: &ProfileId) -> Result<Profile, ProfileError>;

    /// Resolve the profile owned by an authenticated user.
    async fn profile_for_user(&self, user_id: &UserId) -> Result<Profile, ProfileError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("unknown user {0}")]
    UnknownUser(UserId),
    #[error("profile {0} not found")]
    ProfileNotFound(ProfileId),
    #[error(transparent)]
    VersionMismatch(#[from] VersionMismatch),
    #[error("profile source unavailable: {0}")]
    Unavailable(String),
}
