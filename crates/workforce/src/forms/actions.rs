//! Lifecycle transitions a user may invoke on a submission.
//!
//! `draft -> submittable -> submitted -> accepted`, with `retract` taking a
//! submitted form back to `submittable` (or `draft` if it no longer
//! qualifies). `accepted` is only reached through an external acceptance.

use tracing::info;

use super::aggregator::ProviderAggregator;
use super::domain::{
    FormAction, SubmissionStatus, SubmissionWithTemplate, VerifiedFormSubmission, VerifiedStatus,
};
use super::error::FormsError;
use super::validation::{other_data, SubmissionValidator};
use crate::profiles::Profile;

pub fn available_actions(status: VerifiedStatus) -> Vec<FormAction> {
    match status.status() {
        SubmissionStatus::Submittable => vec![FormAction::Submit],
        SubmissionStatus::Submitted => vec![FormAction::Retract],
        SubmissionStatus::Draft | SubmissionStatus::Accepted => Vec::new(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    StatusUpdated(VerifiedFormSubmission),
}

impl ActionOutcome {
    pub fn into_submission(self) -> VerifiedFormSubmission {
        match self {
            ActionOutcome::StatusUpdated(submission) => submission,
        }
    }
}

/// Gates actions on the verified status and applies them through the
/// owning provider, one write per action.
pub struct ActionExecutor<'a> {
    providers: &'a ProviderAggregator,
    validator: SubmissionValidator<'a>,
}

impl<'a> ActionExecutor<'a> {
    pub fn new(providers: &'a ProviderAggregator, validator: SubmissionValidator<'a>) -> Self {
        Self {
            providers,
            validator,
        }
    }

    pub async fn apply(
        &self,
        action: FormAction,
        profile: &Profile,
        form: SubmissionWithTemplate,
    ) -> Result<ActionOutcome, FormsError> {
        let verified_status = self.validator.determine_status(profile, &form);
        if !available_actions(verified_status).contains(&action) {
            return Err(FormsError::UnprocessableAction {
                action,
                status: verified_status.status(),
            });
        }

        let SubmissionWithTemplate {
            submission,
            template,
        } = &form;

        let (status, snapshot) = match action {
            FormAction::Submit => (SubmissionStatus::Submitted, other_data(profile, template)),
            FormAction::Retract => (
                self.validator
                    .status_following_retraction(profile, &form)
                    .status(),
                submission.other_data.clone(),
            ),
        };

        let updated = self
            .providers
            .update_submission_status(
                &submission.key(),
                submission.version,
                &profile.id,
                status,
                snapshot,
            )
            .await?;

        info!(
            submission_id = %updated.id,
            %action,
            from = %submission.status,
            to = %updated.status,
            "form action applied"
        );

        let refreshed = updated.with_template(form.template);
        Ok(ActionOutcome::StatusUpdated(
            self.validator.verify(profile, refreshed),
        ))
    }
}
