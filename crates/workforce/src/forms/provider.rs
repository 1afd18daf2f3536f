use async_trait::async_trait;
use serde_json::Value;

use super::domain::{
    ProviderId, ProviderSubmissionId, SubmissionKey, SubmissionStatus, Template, TemplateId,
    UnverifiedFormSubmission,
};
use crate::profiles::ProfileId;
use crate::version::{Version, VersionMismatch};

/// Storage backend owning a subset of templates and submissions.
///
/// Writes carry the version the caller last read; implementations must reject
/// a stale version with `ProviderError::VersionMismatch` before writing.
#[async_trait]
pub trait FormProvider: Send + Sync {
    fn id(&self) -> &ProviderId;

    async fn template(&self, template_id: &TemplateId) -> Result<Template, ProviderError>;

    async fn creatable_templates(&self, profile_id: &ProfileId)
        -> Result<Vec<Template>, ProviderError>;

    async fn creatable_template(
        &self,
        profile_id: &ProfileId,
        template_id: &TemplateId,
    ) -> Result<Template, ProviderError> {
        self.creatable_templates(profile_id)
            .await?
            .into_iter()
            .find(|template| &template.id == template_id)
            .ok_or_else(|| ProviderError::TemplateNotFound(template_id.clone()))
    }

    async fn active_submissions(
        &self,
        profile_id: &ProfileId,
    ) -> Result<Vec<UnverifiedFormSubmission>, ProviderError>;

    /// Active submissions across every profile, for administrative listings.
    async fn all_active_submissions(&self) -> Result<Vec<UnverifiedFormSubmission>, ProviderError>;

    async fn create_submission(
        &self,
        profile_id: &ProfileId,
        template_id: &TemplateId,
        answers: Value,
    ) -> Result<UnverifiedFormSubmission, ProviderError>;

    async fn update_submission(
        &self,
        key: &SubmissionKey,
        version: Version,
        profile_id: &ProfileId,
        status: SubmissionStatus,
        answers: Value,
    ) -> Result<UnverifiedFormSubmission, ProviderError>;

    async fn update_submission_status(
        &self,
        key: &SubmissionKey,
        version: Version,
        profile_id: &ProfileId,
        status: SubmissionStatus,
        other_data: Value,
    ) -> Result<UnverifiedFormSubmission, ProviderError>;

    async fn delete_submission(&self, key: &SubmissionKey) -> Result<(), ProviderError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("template {0} not found")]
    TemplateNotFound(TemplateId),
    #[error("submission {0} not found")]
    SubmissionNotFound(ProviderSubmissionId),
    #[error("no form provider registered with id {0}")]
    ProviderNotMatched(ProviderId),
    #[error(transparent)]
    VersionMismatch(#[from] VersionMismatch),
    #[error("form provider unavailable: {0}")]
    Unavailable(String),
}
