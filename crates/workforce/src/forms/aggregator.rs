use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use super::domain::{
    ProviderId, SubmissionKey, SubmissionStatus, Template, TemplateId, UnverifiedFormSubmission,
};
use super::provider::{FormProvider, ProviderError};
use crate::profiles::ProfileId;
use crate::version::Version;

/// Presents every registered provider as one form source. Reads fan out in
/// registration order; writes go to the provider named by the record.
#[derive(Clone, Default)]
pub struct ProviderAggregator {
    providers: Vec<Arc<dyn FormProvider>>,
}

impl ProviderAggregator {
    pub fn new(providers: Vec<Arc<dyn FormProvider>>) -> Self {
        Self { providers }
    }

    pub fn register(&mut self, provider: Arc<dyn FormProvider>) {
        self.providers.push(provider);
    }

    pub fn provider_ids(&self) -> Vec<ProviderId> {
        self.providers
            .iter()
            .map(|provider| provider.id().clone())
            .collect()
    }

    fn provider(&self, provider_id: &ProviderId) -> Result<&Arc<dyn FormProvider>, ProviderError> {
        self.providers
            .iter()
            .find(|provider| provider.id() == provider_id)
            .ok_or_else(|| ProviderError::ProviderNotMatched(provider_id.clone()))
    }

    pub async fn active_submissions(
        &self,
        profile_id: &ProfileId,
    ) -> Result<Vec<UnverifiedFormSubmission>, ProviderError> {
        let mut submissions = Vec::new();
        for provider in &self.providers {
            submissions.extend(provider.active_submissions(profile_id).await?);
        }
        Ok(submissions)
    }

    pub async fn all_active_submissions(
        &self,
    ) -> Result<Vec<UnverifiedFormSubmission>, ProviderError> {
        let mut submissions = Vec::new();
        for provider in &self.providers {
            submissions.extend(provider.all_active_submissions().await?);
        }
        Ok(submissions)
    }

    pub async fn creatable_templates(
        &self,
        profile_id: &ProfileId,
    ) -> Result<Vec<Template>, ProviderError> {
        let mut templates = Vec::new();
        for provider in &self.providers {
            templates.extend(provider.creatable_templates(profile_id).await?);
        }
        Ok(templates)
    }

    /// First provider to resolve the id wins. `TemplateNotFound` only when
    /// every provider answered so; otherwise the last failure is returned.
    pub async fn template(&self, template_id: &TemplateId) -> Result<Template, ProviderError> {
        let mut last_failure = None;
        for provider in &self.providers {
            match provider.template(template_id).await {
                Ok(template) => return Ok(template),
                Err(ProviderError::TemplateNotFound(_)) => {}
                Err(error) => {
                    warn!(provider = %provider.id(), %template_id, %error, "template lookup failed");
                    last_failure = Some(error);
                }
            }
        }
        Err(last_failure.unwrap_or_else(|| ProviderError::TemplateNotFound(template_id.clone())))
    }

    pub async fn creatable_template(
        &self,
        profile_id: &ProfileId,
        template_id: &TemplateId,
    ) -> Result<Template, ProviderError> {
        for provider in &self.providers {
            match provider.creatable_template(profile_id, template_id).await {
                Ok(template) => return Ok(template),
                Err(ProviderError::TemplateNotFound(_)) => {}
                Err(error) => return Err(error),
            }
        }
        Err(ProviderError::TemplateNotFound(template_id.clone()))
    }

    /// Routed to the provider owning the template.
    pub async fn create_submission(
        &self,
        profile_id: &ProfileId,
        template: &Template,
        answers: Value,
    ) -> Result<UnverifiedFormSubmission, ProviderError> {
        let provider = self.provider(&template.provider_id)?;
        debug!(provider = %provider.id(), template_id = %template.id, "creating submission");
        provider
            .create_submission(profile_id, &template.id, answers)
            .await
    }

    pub async fn update_submission(
        &self,
        key: &SubmissionKey,
        version: Version,
        profile_id: &ProfileId,
        status: SubmissionStatus,
        answers: Value,
    ) -> Result<UnverifiedFormSubmission, ProviderError> {
        self.provider(&key.provider_id)?
            .update_submission(key, version, profile_id, status, answers)
            .await
    }

    pub async fn update_submission_status(
        &self,
        key: &SubmissionKey,
        version: Version,
        profile_id: &ProfileId,
        status: SubmissionStatus,
        other_data: Value,
    ) -> Result<UnverifiedFormSubmission, ProviderError> {
        self.provider(&key.provider_id)?
            .update_submission_status(key, version, profile_id, status, other_data)
            .await
    }

    pub async fn delete_submission(&self, key: &SubmissionKey) -> Result<(), ProviderError> {
        self.provider(&key.provider_id)?.delete_submission(key).await
    }
}
