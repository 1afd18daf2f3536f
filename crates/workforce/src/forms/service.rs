use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use super::actions::{ActionExecutor, ActionOutcome};
use super::aggregator::ProviderAggregator;
use super::domain::{
    AnswersModifiable, FormAction, SubmissionDeletable, SubmissionId, SubmissionWithTemplate,
    Template, TemplateId, UnverifiedFormSubmission, VerifiedFormSubmission,
};
use super::error::FormsError;
use super::provider::ProviderError;
use super::questions::{AnswerValidator, QuestionSchemaValidator};
use super::validation::{other_data, SubmissionValidator};
use crate::profiles::{Profile, ProfileId, ProfileSource, UserId};
use crate::version::{ensure_version, Version};

/// New answers for an existing submission. `version`, when supplied, is the
/// version the caller last saw and must still be current.
#[derive(Debug, Clone, Deserialize)]
pub struct AnswersUpdate {
    pub answers: Value,
    #[serde(default)]
    pub version: Option<Version>,
}

impl AnswersUpdate {
    pub fn new(answers: Value) -> Self {
        Self {
            answers,
            version: None,
        }
    }
}

/// Facade consumed by the API layer: resolves profiles, merges submissions
/// with their templates, verifies them and delegates writes.
pub struct FormsService {
    profiles: Arc<dyn ProfileSource>,
    providers: ProviderAggregator,
    answers: Arc<dyn AnswerValidator>,
}

impl FormsService {
    pub fn new(profiles: Arc<dyn ProfileSource>, providers: ProviderAggregator) -> Self {
        Self::with_answer_validator(profiles, providers, Arc::new(QuestionSchemaValidator))
    }

    pub fn with_answer_validator(
        profiles: Arc<dyn ProfileSource>,
        providers: ProviderAggregator,
        answers: Arc<dyn AnswerValidator>,
    ) -> Self {
        Self {
            profiles,
            providers,
            answers,
        }
    }

    fn validator(&self) -> SubmissionValidator<'_> {
        SubmissionValidator::new(self.answers.as_ref())
    }

    pub fn providers(&self) -> &ProviderAggregator {
        &self.providers
    }

    pub async fn profile_for_user(&self, user_id: &UserId) -> Result<Profile, FormsError> {
        Ok(self.profiles.profile_for_user(user_id).await?)
    }

    /// Templates referenced by the submissions. A reference to a template no
    /// provider knows is a storage defect, not a client error.
    async fn templates_for(
        &self,
        submissions: &[UnverifiedFormSubmission],
    ) -> Result<HashMap<TemplateId, Template>, FormsError> {
        let ids: BTreeSet<&TemplateId> = submissions
            .iter()
            .map(|submission| &submission.template_id)
            .collect();

        let mut templates = HashMap::with_capacity(ids.len());
        for id in ids {
            match self.providers.template(id).await {
                Ok(template) => {
                    templates.insert(id.clone(), template);
                }
                Err(ProviderError::TemplateNotFound(missing)) => {
                    error!(template_id = %missing, "submission references a missing template");
                    return Err(FormsError::DataConsistency(format!(
                        "template {missing} not found but is referenced by a form submission"
                    )));
                }
                Err(other) => return Err(other.into()),
            }
        }
        Ok(templates)
    }

    fn merge(
        submissions: Vec<UnverifiedFormSubmission>,
        templates: &HashMap<TemplateId, Template>,
    ) -> Result<Vec<SubmissionWithTemplate>, FormsError> {
        submissions
            .into_iter()
            .map(|submission| {
                let template = templates.get(&submission.template_id).cloned().ok_or_else(|| {
                    FormsError::DataConsistency(format!(
                        "template {} missing for submission {}",
                        submission.template_id, submission.id
                    ))
                })?;
                Ok(submission.with_template(template))
            })
            .collect()
    }

    pub async fn list_submissions(
        &self,
        profile: &Profile,
    ) -> Result<Vec<VerifiedFormSubmission>, FormsError> {
        let submissions = self.providers.active_submissions(&profile.id).await?;
        let templates = self.templates_for(&submissions).await?;
        let merged = Self::merge(submissions, &templates)?;
        let verified = self.validator().verify_all(profile, merged);

        debug!(profile_id = %profile.id, count = verified.len(), "listed form submissions");
        Ok(verified)
    }

    pub async fn list_submissions_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<VerifiedFormSubmission>, FormsError> {
        let profile = self.profile_for_user(user_id).await?;
        self.list_submissions(&profile).await
    }

    /// Every active submission, each verified against its own profile.
    pub async fn list_all_submissions(&self) -> Result<Vec<VerifiedFormSubmission>, FormsError> {
        let submissions = self.providers.all_active_submissions().await?;
        let templates = self.templates_for(&submissions).await?;

        let profile_ids: BTreeSet<&ProfileId> = submissions
            .iter()
            .map(|submission| &submission.profile_id)
            .collect();
        let mut profiles = HashMap::with_capacity(profile_ids.len());
        for profile_id in profile_ids {
            let profile = self.profiles.profile(profile_id).await?;
            profiles.insert(profile_id.clone(), profile);
        }

        let merged = Self::merge(submissions, &templates)?;
        let validator = self.validator();
        merged
            .into_iter()
            .map(|form| {
                let profile = profiles.get(&form.submission.profile_id).ok_or_else(|| {
                    FormsError::DataConsistency(format!(
                        "profile {} not found but is referenced by a form submission",
                        form.submission.profile_id
                    ))
                })?;
                Ok(validator.verify(profile, form))
            })
            .collect()
    }

    /// Submissions are only visible through the profile that owns them.
    async fn locate(
        &self,
        submission_id: &SubmissionId,
        profile: &Profile,
    ) -> Result<VerifiedFormSubmission, FormsError> {
        self.list_submissions(profile)
            .await?
            .into_iter()
            .find(|submission| submission.id() == submission_id)
            .ok_or_else(|| FormsError::SubmissionNotFound(submission_id.0.clone()))
    }

    pub async fn update_submission_answers(
        &self,
        submission_id: &SubmissionId,
        update: AnswersUpdate,
        profile: &Profile,
    ) -> Result<VerifiedFormSubmission, FormsError> {
        let existing = self.locate(submission_id, profile).await?;

        if existing.answers_modifiable == AnswersModifiable::Locked {
            return Err(FormsError::AnswersLocked(submission_id.clone()));
        }
        if let Some(expected) = update.version {
            ensure_version(existing.submission.version, expected)?;
        }

        let SubmissionWithTemplate {
            submission,
            template,
        } = existing.into_unverified();
        let updated = self
            .providers
            .update_submission(
                &submission.key(),
                submission.version,
                &profile.id,
                submission.status,
                update.answers,
            )
            .await?;

        info!(%submission_id, version = %updated.version, "form answers updated");
        Ok(self.validator().verify(profile, updated.with_template(template)))
    }

    pub async fn update_submission_answers_for_user(
        &self,
        user_id: &UserId,
        submission_id: &SubmissionId,
        update: AnswersUpdate,
    ) -> Result<VerifiedFormSubmission, FormsError> {
        let profile = self.profile_for_user(user_id).await?;
        self.update_submission_answers(submission_id, update, &profile)
            .await
    }

    pub async fn delete_submission(
        &self,
        submission_id: &SubmissionId,
        profile: &Profile,
    ) -> Result<(), FormsError> {
        let existing = self.locate(submission_id, profile).await?;
        if existing.submission_deletable == SubmissionDeletable::NotDeletable {
            return Err(FormsError::NotDeletable(submission_id.clone()));
        }

        self.providers
            .delete_submission(&existing.submission.key())
            .await?;
        info!(%submission_id, "form submission deleted");
        Ok(())
    }

    pub async fn delete_submission_for_user(
        &self,
        user_id: &UserId,
        submission_id: &SubmissionId,
    ) -> Result<(), FormsError> {
        let profile = self.profile_for_user(user_id).await?;
        self.delete_submission(submission_id, &profile).await
    }

    pub async fn perform_action(
        &self,
        submission_id: &SubmissionId,
        profile: &Profile,
        action: FormAction,
    ) -> Result<ActionOutcome, FormsError> {
        let existing = self.locate(submission_id, profile).await?;
        ActionExecutor::new(&self.providers, self.validator())
            .apply(action, profile, existing.into_unverified())
            .await
    }

    pub async fn perform_action_for_user(
        &self,
        user_id: &UserId,
        submission_id: &SubmissionId,
        action: FormAction,
    ) -> Result<ActionOutcome, FormsError> {
        let profile = self.profile_for_user(user_id).await?;
        self.perform_action(submission_id, &profile, action).await
    }

    pub async fn list_creatable_templates(
        &self,
        profile: &Profile,
    ) -> Result<Vec<Template>, FormsError> {
        Ok(self.providers.creatable_templates(&profile.id).await?)
    }

    pub async fn list_creatable_templates_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<Template>, FormsError> {
        let profile = self.profile_for_user(user_id).await?;
        self.list_creatable_templates(&profile).await
    }

    pub async fn create_submission(
        &self,
        profile: &Profile,
        template_id: &TemplateId,
        answers: Value,
    ) -> Result<VerifiedFormSubmission, FormsError> {
        let template = self
            .providers
            .creatable_template(&profile.id, template_id)
            .await?;
        let created = self
            .providers
            .create_submission(&profile.id, &template, answers)
            .await?;

        info!(submission_id = %created.id, %template_id, profile_id = %profile.id, "form submission created");
        Ok(self.validator().verify(profile, created.with_template(template)))
    }

    pub async fn create_submission_for_user(
        &self,
        user_id: &UserId,
        template_id: &TemplateId,
        answers: Value,
    ) -> Result<VerifiedFormSubmission, FormsError> {
        let profile = self.profile_for_user(user_id).await?;
        self.create_submission(&profile, template_id, answers).await
    }

    /// Backfill the cached profile snapshot on submissions that never had one.
    /// Status is written back unchanged. Returns how many were refreshed.
    pub async fn refresh_other_data(&self) -> Result<usize, FormsError> {
        let pending: Vec<_> = self
            .list_all_submissions()
            .await?
            .into_iter()
            .filter(|form| !form.submission.has_other_data())
            .collect();

        let mut refreshed = 0;
        for form in pending {
            let snapshot = other_data(&form.profile, &form.template);
            let submission = &form.submission;
            match self
                .providers
                .update_submission_status(
                    &submission.key(),
                    submission.version,
                    &submission.profile_id,
                    submission.status,
                    snapshot,
                )
                .await
            {
                Ok(_) => refreshed += 1,
                Err(ProviderError::SubmissionNotFound(id)) => {
                    warn!(provider_submission_id = %id, "submission vanished during other data refresh");
                }
                Err(other) => return Err(other.into()),
            }
        }

        info!(refreshed, "other data refresh complete");
        Ok(refreshed)
    }
}
