use super::domain::{FormAction, ProviderId, SubmissionId, SubmissionStatus, TemplateId};
use super::provider::ProviderError;
use crate::profiles::{ProfileError, UserId};
use crate::version::VersionMismatch;

/// Failures surfaced by the forms service and action executor.
#[derive(Debug, thiserror::Error)]
pub enum FormsError {
    #[error("unknown user {0}")]
    UnknownUser(UserId),
    #[error("form submission {0} not found")]
    SubmissionNotFound(String),
    #[error("template {0} not found or not creatable")]
    TemplateNotFound(TemplateId),
    #[error("action {action} is not permitted while the submission is {status}")]
    UnprocessableAction {
        action: FormAction,
        status: SubmissionStatus,
    },
    #[error("answers of submission {0} are locked")]
    AnswersLocked(SubmissionId),
    #[error("submission {0} cannot be deleted")]
    NotDeletable(SubmissionId),
    #[error(transparent)]
    VersionMismatch(#[from] VersionMismatch),
    #[error("no form provider registered with id {0}")]
    ProviderNotMatched(ProviderId),
    /// Storage broke an invariant (e.g. a submission references a missing
    /// template). Terminates the operation; never a client mistake.
    #[error("data consistency error: {0}")]
    DataConsistency(String),
    #[error("backing store unavailable: {0}")]
    Unavailable(String),
}

impl FormsError {
    /// Whether the caller can fix the request and retry.
    pub fn is_user_correctable(&self) -> bool {
        !matches!(
            self,
            FormsError::ProviderNotMatched(_)
                | FormsError::DataConsistency(_)
                | FormsError::Unavailable(_)
        )
    }
}

impl From<ProviderError> for FormsError {
    fn from(value: ProviderError) -> Self {
        match value {
            ProviderError::TemplateNotFound(id) => FormsError::TemplateNotFound(id),
            ProviderError::SubmissionNotFound(id) => FormsError::SubmissionNotFound(id.0),
            ProviderError::ProviderNotMatched(id) => FormsError::ProviderNotMatched(id),
            ProviderError::VersionMismatch(mismatch) => FormsError::VersionMismatch(mismatch),
            ProviderError::Unavailable(reason) => FormsError::Unavailable(reason),
        }
    }
}

impl From<ProfileError> for FormsError {
    fn from(value: ProfileError) -> Self {
        match value {
            ProfileError::UnknownUser(id) => FormsError::UnknownUser(id),
            ProfileError::ProfileNotFound(id) => {
                FormsError::DataConsistency(format!("profile {id} not found"))
            }
            ProfileError::VersionMismatch(mismatch) => FormsError::VersionMismatch(mismatch),
            ProfileError::Unavailable(reason) => FormsError::Unavailable(reason),
        }
    }
}
