//! Pure status derivation for submissions. Nothing here persists or fails:
//! an incomplete submission is reported as `draft`, never as an error.

use serde_json::{Map, Value};

use super::actions::available_actions;
use super::domain::{
    AnswersModifiable, CrudFlags, OtherDataRequirements, SubmissionDeletable, SubmissionStatus,
    SubmissionWithTemplate, Template, VerifiedFormSubmission, VerifiedStatus,
};
use super::questions::AnswerValidator;
use crate::profiles::Profile;

/// Computes verified statuses with a pluggable answer validator.
#[derive(Clone, Copy)]
pub struct SubmissionValidator<'a> {
    answers: &'a dyn AnswerValidator,
}

impl<'a> SubmissionValidator<'a> {
    pub fn new(answers: &'a dyn AnswerValidator) -> Self {
        Self { answers }
    }

    fn requirements_met(&self, profile: &Profile, requirements: &OtherDataRequirements) -> bool {
        let fields_present = requirements.profile_requirements.iter().all(|name| {
            profile
                .field(name)
                .is_some_and(|value| !value.trim().is_empty())
        });
        let photo_present = !requirements.profile_photo_required || profile.has_photo();
        fields_present && photo_present
    }

    /// Answers pass the schema and every profile requirement is met.
    pub fn is_submittable(&self, profile: &Profile, form: &SubmissionWithTemplate) -> bool {
        self.answers
            .answers_valid(&form.template.questions, &form.submission.answers)
            && self.requirements_met(profile, &form.template.other_data_requirements)
    }

    pub fn determine_status(&self, profile: &Profile, form: &SubmissionWithTemplate) -> VerifiedStatus {
        match form.submission.status {
            sticky @ (SubmissionStatus::Submitted | SubmissionStatus::Accepted) => {
                VerifiedStatus::new(sticky)
            }
            SubmissionStatus::Draft | SubmissionStatus::Submittable => {
                if self.is_submittable(profile, form) {
                    VerifiedStatus::new(SubmissionStatus::Submittable)
                } else {
                    VerifiedStatus::new(SubmissionStatus::Draft)
                }
            }
        }
    }

    /// The current status plus, unless accepted, whichever of
    /// `submittable`/`draft` the submission currently qualifies for.
    pub fn permitted_statuses(
        &self,
        profile: &Profile,
        form: &SubmissionWithTemplate,
    ) -> Vec<VerifiedStatus> {
        let current = form.submission.status;
        let mut permitted = vec![VerifiedStatus::new(current)];

        if current != SubmissionStatus::Accepted {
            let derived = if self.is_submittable(profile, form) {
                SubmissionStatus::Submittable
            } else {
                SubmissionStatus::Draft
            };
            if derived != current {
                permitted.push(VerifiedStatus::new(derived));
            }
        }
        permitted
    }

    pub fn is_status_permitted(
        &self,
        status: SubmissionStatus,
        profile: &Profile,
        form: &SubmissionWithTemplate,
    ) -> bool {
        self.permitted_statuses(profile, form)
            .iter()
            .any(|permitted| *permitted == status)
    }

    pub fn status_following_retraction(
        &self,
        profile: &Profile,
        form: &SubmissionWithTemplate,
    ) -> VerifiedStatus {
        let permitted = self.permitted_statuses(profile, form);
        [SubmissionStatus::Submittable, SubmissionStatus::Draft]
            .into_iter()
            .find(|preferred| permitted.iter().any(|status| status == preferred))
            .map(VerifiedStatus::new)
            .unwrap_or_else(|| VerifiedStatus::new(form.submission.status))
    }

    pub fn verify(&self, profile: &Profile, form: SubmissionWithTemplate) -> VerifiedFormSubmission {
        let verified_status = self.determine_status(profile, &form);
        let flags = crud_flags(verified_status.status());

        VerifiedFormSubmission {
            submission: form.submission,
            template: form.template,
            profile: profile.clone(),
            verified_status,
            answers_modifiable: flags.answers_modifiable,
            submission_deletable: flags.submission_deletable,
            available_actions: available_actions(verified_status),
        }
    }

    pub fn verify_all(
        &self,
        profile: &Profile,
        forms: Vec<SubmissionWithTemplate>,
    ) -> Vec<VerifiedFormSubmission> {
        forms
            .into_iter()
            .map(|form| self.verify(profile, form))
            .collect()
    }
}

pub fn crud_flags(status: SubmissionStatus) -> CrudFlags {
    match status {
        SubmissionStatus::Draft | SubmissionStatus::Submittable => CrudFlags {
            answers_modifiable: AnswersModifiable::Modifiable,
            submission_deletable: SubmissionDeletable::Deletable,
        },
        SubmissionStatus::Submitted => CrudFlags {
            answers_modifiable: AnswersModifiable::Locked,
            submission_deletable: SubmissionDeletable::Deletable,
        },
        SubmissionStatus::Accepted => CrudFlags {
            answers_modifiable: AnswersModifiable::Locked,
            submission_deletable: SubmissionDeletable::NotDeletable,
        },
    }
}

/// Snapshot of the profile data a template requires, cached on the
/// submission whenever an action is applied.
pub fn other_data(profile: &Profile, template: &Template) -> Value {
    let requirements = &template.other_data_requirements;
    let mut snapshot = Map::new();
    for name in &requirements.profile_requirements {
        if let Some(value) = profile.field(name) {
            snapshot.insert(name.clone(), Value::String(value.to_string()));
        }
    }
    if requirements.profile_photo_required {
        let photo = profile
            .primary_photo()
            .map(|photo| Value::String(photo.0.clone()))
            .unwrap_or(Value::Null);
        snapshot.insert("photoId".to_string(), photo);
    }
    Value::Object(snapshot)
}
