use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::profiles::{Profile, ProfileId};
use crate::version::Version;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(
    /// Identifies a registered form provider (storage backend).
    ProviderId
);
string_id!(
    /// Submission id local to the owning provider.
    ProviderSubmissionId
);
string_id!(
    /// Globally unique submission id exposed to API callers.
    SubmissionId
);
string_id!(TemplateId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateStatus {
    Draft,
    Active,
    Archived,
}

/// Profile data a template needs before a submission can be submitted.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OtherDataRequirements {
    pub profile_requirements: Vec<String>,
    #[serde(default)]
    pub profile_photo_required: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateConstraints {
    pub max_forms_per_profile: u32,
}

/// Form definition owned by a provider. The question schema is opaque to the
/// lifecycle engine and only interpreted by an `AnswerValidator`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: TemplateId,
    pub provider_id: ProviderId,
    pub version: u32,
    pub short_name: String,
    pub full_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub questions: Value,
    pub other_data_requirements: OtherDataRequirements,
    pub constraints: TemplateConstraints,
    pub status: TemplateStatus,
}

/// Lifecycle status as last persisted by a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    Draft,
    Submittable,
    Submitted,
    Accepted,
}

impl SubmissionStatus {
    pub const fn label(self) -> &'static str {
        match self {
            SubmissionStatus::Draft => "draft",
            SubmissionStatus::Submittable => "submittable",
            SubmissionStatus::Submitted => "submitted",
            SubmissionStatus::Accepted => "accepted",
        }
    }
}

impl std::fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Status recomputed by the validator. Only `validation` can mint one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct VerifiedStatus(SubmissionStatus);

impl VerifiedStatus {
    pub(crate) const fn new(status: SubmissionStatus) -> Self {
        Self(status)
    }

    pub const fn status(self) -> SubmissionStatus {
        self.0
    }
}

impl PartialEq<SubmissionStatus> for VerifiedStatus {
    fn eq(&self, other: &SubmissionStatus) -> bool {
        self.0 == *other
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveStatus {
    Active,
    Archived,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnswersModifiable {
    Modifiable,
    Locked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SubmissionDeletable {
    Deletable,
    NotDeletable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrudFlags {
    pub answers_modifiable: AnswersModifiable,
    pub submission_deletable: SubmissionDeletable,
}

/// User-invocable lifecycle transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormAction {
    Submit,
    Retract,
}

impl FormAction {
    pub const fn label(self) -> &'static str {
        match self {
            FormAction::Submit => "submit",
            FormAction::Retract => "retract",
        }
    }
}

impl std::fmt::Display for FormAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Addresses a submission inside the provider that owns it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubmissionKey {
    pub provider_id: ProviderId,
    pub provider_submission_id: ProviderSubmissionId,
}

/// Raw submission as persisted by a provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnverifiedFormSubmission {
    pub id: SubmissionId,
    pub provider_id: ProviderId,
    pub provider_submission_id: ProviderSubmissionId,
    pub template_id: TemplateId,
    pub profile_id: ProfileId,
    pub answers: Value,
    /// Profile snapshot cached at action time; deliberately stale between actions.
    #[serde(default)]
    pub other_data: Value,
    #[serde(rename = "submissionStatus")]
    pub status: SubmissionStatus,
    pub archive_status: ArchiveStatus,
    pub version: Version,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl UnverifiedFormSubmission {
    pub fn key(&self) -> SubmissionKey {
        SubmissionKey {
            provider_id: self.provider_id.clone(),
            provider_submission_id: self.provider_submission_id.clone(),
        }
    }

    pub fn has_other_data(&self) -> bool {
        match &self.other_data {
            Value::Null => false,
            Value::Object(map) => !map.is_empty(),
            _ => true,
        }
    }

    pub fn with_template(self, template: Template) -> SubmissionWithTemplate {
        SubmissionWithTemplate {
            submission: self,
            template,
        }
    }
}

/// Submission joined with the template it references.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionWithTemplate {
    pub submission: UnverifiedFormSubmission,
    pub template: Template,
}

/// Presentation-ready submission: verified status, CRUD flags and permitted actions.
///
/// On the wire `submissionStatus` carries the verified status; the stored
/// status never leaves the service.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedFormSubmission {
    pub submission: UnverifiedFormSubmission,
    pub template: Template,
    pub profile: Profile,
    pub verified_status: VerifiedStatus,
    pub answers_modifiable: AnswersModifiable,
    pub submission_deletable: SubmissionDeletable,
    pub available_actions: Vec<FormAction>,
}

impl VerifiedFormSubmission {
    pub fn id(&self) -> &SubmissionId {
        &self.submission.id
    }

    pub fn status(&self) -> SubmissionStatus {
        self.verified_status.status()
    }

    pub fn permits(&self, action: FormAction) -> bool {
        self.available_actions.contains(&action)
    }

    /// Drop the verification, keeping the persisted record and its template.
    pub fn into_unverified(self) -> SubmissionWithTemplate {
        SubmissionWithTemplate {
            submission: self.submission,
            template: self.template,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VerifiedWire<'a> {
    id: &'a SubmissionId,
    provider_id: &'a ProviderId,
    provider_submission_id: &'a ProviderSubmissionId,
    template_id: &'a TemplateId,
    profile_id: &'a ProfileId,
    answers: &'a Value,
    other_data: &'a Value,
    submission_status: VerifiedStatus,
    archive_status: ArchiveStatus,
    version: Version,
    created_at: &'a DateTime<Utc>,
    modified_at: &'a DateTime<Utc>,
    template: &'a Template,
    profile: &'a Profile,
    answers_modifiable: AnswersModifiable,
    submission_deletable: SubmissionDeletable,
    available_actions: &'a [FormAction],
}

impl Serialize for VerifiedFormSubmission {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let submission = &self.submission;
        VerifiedWire {
            id: &submission.id,
            provider_id: &submission.provider_id,
            provider_submission_id: &submission.provider_submission_id,
            template_id: &submission.template_id,
            profile_id: &submission.profile_id,
            answers: &submission.answers,
            other_data: &submission.other_data,
            submission_status: self.verified_status,
            archive_status: submission.archive_status,
            version: submission.version,
            created_at: &submission.created_at,
            modified_at: &submission.modified_at,
            template: &self.template,
            profile: &self.profile,
            answers_modifiable: self.answers_modifiable,
            submission_deletable: self.submission_deletable,
            available_actions: &self.available_actions,
        }
        .serialize(serializer)
    }
}
