use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::http::StatusCode;
use axum::response::Response;
use chrono::{TimeZone, Utc};
use serde_json::{json, Value};

use crate::forms::catalog::TemplateCatalog;
use crate::forms::domain::{
    ArchiveStatus, OtherDataRequirements, ProviderId, ProviderSubmissionId, SubmissionId,
    SubmissionKey, SubmissionStatus, SubmissionWithTemplate, Template, TemplateConstraints,
    TemplateId, TemplateStatus, UnverifiedFormSubmission,
};
use crate::forms::provider::{FormProvider, ProviderError};
use crate::forms::{FormsService, ProviderAggregator, QuestionSchemaValidator, SubmissionValidator};
use crate::profiles::{PhotoId, Profile, ProfileError, ProfileId, ProfileSource, UserId};
use crate::version::{ensure_version, Version};

pub(super) const PROVIDER: &str = "volunteer-provider";
pub(super) const TEMPLATE: &str = "Volunteer2025";
pub(super) const USER: &str = "user-ada";
pub(super) const PROFILE: &str = "profile-ada";

pub(super) fn provider_id() -> ProviderId {
    ProviderId(PROVIDER.to_string())
}

pub(super) fn template_id() -> TemplateId {
    TemplateId(TEMPLATE.to_string())
}

pub(super) fn template_for(provider: &ProviderId, id: &str) -> Template {
    Template {
        id: TemplateId(id.to_string()),
        provider_id: provider.clone(),
        version: 1,
        short_name: "Volunteer".to_string(),
        full_name: "Volunteer Application".to_string(),
        description: None,
        questions: json!({
            "pages": [{
                "elements": [
                    { "type": "text", "name": "teamPreference", "isRequired": true },
                    { "type": "radiogroup", "name": "tShirtSize", "choices": ["S", "M", "L"] }
                ]
            }]
        }),
        other_data_requirements: OtherDataRequirements {
            profile_requirements: vec![
                "givenName".to_string(),
                "surname".to_string(),
                "telephone".to_string(),
            ],
            profile_photo_required: true,
        },
        constraints: TemplateConstraints {
            max_forms_per_profile: 1,
        },
        status: TemplateStatus::Active,
    }
}

pub(super) fn template() -> Template {
    template_for(&provider_id(), TEMPLATE)
}

pub(super) fn profile() -> Profile {
    Profile {
        id: ProfileId(PROFILE.to_string()),
        version: Version::INITIAL,
        display_name: "Ada Lovelace".to_string(),
        given_name: "Ada".to_string(),
        surname: "Lovelace".to_string(),
        email: "ada@example.org".to_string(),
        address: "1 Analytical Row".to_string(),
        telephone: "01234 567890".to_string(),
        photo_ids: vec![PhotoId("photo-1".to_string())],
    }
}

pub(super) fn profile_without_telephone() -> Profile {
    let mut profile = profile();
    profile.telephone.clear();
    profile
}

pub(super) fn valid_answers() -> Value {
    json!({ "teamPreference": "Stewarding", "tShirtSize": "M" })
}

pub(super) fn invalid_answers() -> Value {
    json!({ "tShirtSize": "XXXL" })
}

pub(super) fn submission(id: &str, status: SubmissionStatus, answers: Value) -> UnverifiedFormSubmission {
    let created = Utc
        .with_ymd_and_hms(2025, 3, 1, 9, 30, 0)
        .single()
        .expect("valid timestamp");
    UnverifiedFormSubmission {
        id: SubmissionId(id.to_string()),
        provider_id: provider_id(),
        provider_submission_id: ProviderSubmissionId(id.to_string()),
        template_id: template_id(),
        profile_id: ProfileId(PROFILE.to_string()),
        answers,
        other_data: json!({}),
        status,
        archive_status: ArchiveStatus::Active,
        version: Version::INITIAL,
        created_at: created,
        modified_at: created,
    }
}

pub(super) fn form(status: SubmissionStatus, answers: Value) -> SubmissionWithTemplate {
    submission("sub-1", status, answers).with_template(template())
}

pub(super) fn validator() -> SubmissionValidator<'static> {
    static ANSWERS: QuestionSchemaValidator = QuestionSchemaValidator;
    SubmissionValidator::new(&ANSWERS)
}

/// A write observed by `MemoryProvider`, in call order.
#[derive(Debug, Clone, PartialEq)]
pub(super) enum RecordedWrite {
    Create(TemplateId),
    Answers(ProviderSubmissionId, SubmissionStatus),
    Status(ProviderSubmissionId, SubmissionStatus, Value),
    Delete(ProviderSubmissionId),
}

#[derive(Clone)]
pub(super) struct MemoryProvider {
    id: ProviderId,
    catalog: TemplateCatalog,
    pub(super) submissions: Arc<Mutex<Vec<UnverifiedFormSubmission>>>,
    pub(super) writes: Arc<Mutex<Vec<RecordedWrite>>>,
    template_outage: bool,
}

impl MemoryProvider {
    pub(super) fn new(id: ProviderId, templates: Vec<Template>) -> Self {
        Self {
            id,
            catalog: TemplateCatalog::new(templates),
            submissions: Arc::new(Mutex::new(Vec::new())),
            writes: Arc::new(Mutex::new(Vec::new())),
            template_outage: false,
        }
    }

    /// Submissions stay readable while template lookups fail.
    pub(super) fn with_template_outage(mut self) -> Self {
        self.template_outage = true;
        self
    }

    pub(super) fn standard() -> Self {
        Self::new(provider_id(), vec![template()])
    }

    pub(super) fn with_submission(self, submission: UnverifiedFormSubmission) -> Self {
        self.submissions
            .lock()
            .expect("submissions mutex poisoned")
            .push(submission);
        self
    }

    pub(super) fn writes(&self) -> Vec<RecordedWrite> {
        self.writes.lock().expect("writes mutex poisoned").clone()
    }

    pub(super) fn stored(&self, id: &str) -> UnverifiedFormSubmission {
        self.submissions
            .lock()
            .expect("submissions mutex poisoned")
            .iter()
            .find(|submission| submission.provider_submission_id.0 == id)
            .cloned()
            .expect("stored submission")
    }

    fn record(&self, write: RecordedWrite) {
        self.writes.lock().expect("writes mutex poisoned").push(write);
    }

    fn modify(
        &self,
        key: &SubmissionKey,
        version: Version,
        change: impl FnOnce(&mut UnverifiedFormSubmission),
    ) -> Result<UnverifiedFormSubmission, ProviderError> {
        let mut guard = self.submissions.lock().expect("submissions mutex poisoned");
        let stored = guard
            .iter_mut()
            .find(|submission| {
                submission.provider_submission_id == key.provider_submission_id
                    && submission.archive_status == ArchiveStatus::Active
            })
            .ok_or_else(|| ProviderError::SubmissionNotFound(key.provider_submission_id.clone()))?;
        ensure_version(stored.version, version)?;
        change(stored);
        stored.version = stored.version.next();
        Ok(stored.clone())
    }
}

#[async_trait]
impl FormProvider for MemoryProvider {
    fn id(&self) -> &ProviderId {
        &self.id
    }

    async fn template(&self, template_id: &TemplateId) -> Result<Template, ProviderError> {
        if self.template_outage {
            return Err(ProviderError::Unavailable("template list offline".to_string()));
        }
        self.catalog
            .get(template_id)
            .cloned()
            .ok_or_else(|| ProviderError::TemplateNotFound(template_id.clone()))
    }

    async fn creatable_templates(
        &self,
        profile_id: &ProfileId,
    ) -> Result<Vec<Template>, ProviderError> {
        let mut held = HashMap::new();
        for submission in self.active_submissions(profile_id).await? {
            *held.entry(submission.template_id).or_insert(0) += 1;
        }
        Ok(self.catalog.creatable_for(&held))
    }

    async fn active_submissions(
        &self,
        profile_id: &ProfileId,
    ) -> Result<Vec<UnverifiedFormSubmission>, ProviderError> {
        Ok(self
            .all_active_submissions()
            .await?
            .into_iter()
            .filter(|submission| &submission.profile_id == profile_id)
            .collect())
    }

    async fn all_active_submissions(&self) -> Result<Vec<UnverifiedFormSubmission>, ProviderError> {
        let guard = self.submissions.lock().expect("submissions mutex poisoned");
        Ok(guard
            .iter()
            .filter(|submission| submission.archive_status == ArchiveStatus::Active)
            .cloned()
            .collect())
    }

    async fn create_submission(
        &self,
        profile_id: &ProfileId,
        template_id: &TemplateId,
        answers: Value,
    ) -> Result<UnverifiedFormSubmission, ProviderError> {
        let mut guard = self.submissions.lock().expect("submissions mutex poisoned");
        let id = format!("{}-created-{}", self.id, guard.len() + 1);
        let mut created = submission(&id, SubmissionStatus::Draft, answers);
        created.provider_id = self.id.clone();
        created.template_id = template_id.clone();
        created.profile_id = profile_id.clone();
        guard.push(created.clone());
        drop(guard);

        self.record(RecordedWrite::Create(template_id.clone()));
        Ok(created)
    }

    async fn update_submission(
        &self,
        key: &SubmissionKey,
        version: Version,
        _profile_id: &ProfileId,
        status: SubmissionStatus,
        answers: Value,
    ) -> Result<UnverifiedFormSubmission, ProviderError> {
        let updated = self.modify(key, version, |stored| {
            stored.status = status;
            stored.answers = answers;
        })?;
        self.record(RecordedWrite::Answers(
            key.provider_submission_id.clone(),
            status,
        ));
        Ok(updated)
    }

    async fn update_submission_status(
        &self,
        key: &SubmissionKey,
        version: Version,
        _profile_id: &ProfileId,
        status: SubmissionStatus,
        other_data: Value,
    ) -> Result<UnverifiedFormSubmission, ProviderError> {
        let recorded = other_data.clone();
        let updated = self.modify(key, version, |stored| {
            stored.status = status;
            stored.other_data = other_data;
        })?;
        self.record(RecordedWrite::Status(
            key.provider_submission_id.clone(),
            status,
            recorded,
        ));
        Ok(updated)
    }

    async fn delete_submission(&self, key: &SubmissionKey) -> Result<(), ProviderError> {
        let mut guard = self.submissions.lock().expect("submissions mutex poisoned");
        let stored = guard
            .iter_mut()
            .find(|submission| submission.provider_submission_id == key.provider_submission_id)
            .ok_or_else(|| ProviderError::SubmissionNotFound(key.provider_submission_id.clone()))?;
        stored.archive_status = ArchiveStatus::Archived;
        drop(guard);

        self.record(RecordedWrite::Delete(key.provider_submission_id.clone()));
        Ok(())
    }
}

/// Provider whose backing store is offline.
pub(super) struct UnavailableProvider(pub(super) ProviderId);

#[async_trait]
impl FormProvider for UnavailableProvider {
    fn id(&self) -> &ProviderId {
        &self.0
    }

    async fn template(&self, _template_id: &TemplateId) -> Result<Template, ProviderError> {
        Err(ProviderError::Unavailable("list offline".to_string()))
    }

    async fn creatable_templates(
        &self,
        _profile_id: &ProfileId,
    ) -> Result<Vec<Template>, ProviderError> {
        Err(ProviderError::Unavailable("list offline".to_string()))
    }

    async fn active_submissions(
        &self,
        _profile_id: &ProfileId,
    ) -> Result<Vec<UnverifiedFormSubmission>, ProviderError> {
        Err(ProviderError::Unavailable("list offline".to_string()))
    }

    async fn all_active_submissions(&self) -> Result<Vec<UnverifiedFormSubmission>, ProviderError> {
        Err(ProviderError::Unavailable("list offline".to_string()))
    }

    async fn create_submission(
        &self,
        _profile_id: &ProfileId,
        _template_id: &TemplateId,
        _answers: Value,
    ) -> Result<UnverifiedFormSubmission, ProviderError> {
        Err(ProviderError::Unavailable("list offline".to_string()))
    }

    async fn update_submission(
        &self,
        _key: &SubmissionKey,
        _version: Version,
        _profile_id: &ProfileId,
        _status: SubmissionStatus,
        _answers: Value,
    ) -> Result<UnverifiedFormSubmission, ProviderError> {
        Err(ProviderError::Unavailable("list offline".to_string()))
    }

    async fn update_submission_status(
        &self,
        _key: &SubmissionKey,
        _version: Version,
        _profile_id: &ProfileId,
        _status: SubmissionStatus,
        _other_data: Value,
    ) -> Result<UnverifiedFormSubmission, ProviderError> {
        Err(ProviderError::Unavailable("list offline".to_string()))
    }

    async fn delete_submission(&self, _key: &SubmissionKey) -> Result<(), ProviderError> {
        Err(ProviderError::Unavailable("list offline".to_string()))
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryProfiles {
    users: Arc<Mutex<HashMap<UserId, ProfileId>>>,
    profiles: Arc<Mutex<HashMap<ProfileId, Profile>>>,
}

impl MemoryProfiles {
    pub(super) fn with_user(user: &str, profile: Profile) -> Self {
        let profiles = Self::default();
        profiles
            .users
            .lock()
            .expect("users mutex poisoned")
            .insert(UserId(user.to_string()), profile.id.clone());
        profiles.replace(profile);
        profiles
    }

    pub(super) fn replace(&self, profile: Profile) {
        self.profiles
            .lock()
            .expect("profiles mutex poisoned")
            .insert(profile.id.clone(), profile);
    }
}

#[async_trait]
impl ProfileSource for MemoryProfiles {
    async fn profile(&self, profile_id: &ProfileId) -> Result<Profile, ProfileError> {
        self.profiles
            .lock()
            .expect("profiles mutex poisoned")
            .get(profile_id)
            .cloned()
            .ok_or_else(|| ProfileError::ProfileNotFound(profile_id.clone()))
    }

    async fn profile_for_user(&self, user_id: &UserId) -> Result<Profile, ProfileError> {
        let profile_id = self
            .users
            .lock()
            .expect("users mutex poisoned")
            .get(user_id)
            .cloned()
            .ok_or_else(|| ProfileError::UnknownUser(user_id.clone()))?;
        self.profile(&profile_id).await
    }
}

pub(super) fn user_id() -> UserId {
    UserId(USER.to_string())
}

/// Service over one `MemoryProvider` and a profile source holding `profile`.
pub(super) fn build_service(
    provider: MemoryProvider,
    profile: Profile,
) -> (FormsService, MemoryProvider, MemoryProfiles) {
    let profiles = MemoryProfiles::with_user(USER, profile);
    let aggregator = ProviderAggregator::new(vec![Arc::new(provider.clone())]);
    let service = FormsService::new(Arc::new(profiles.clone()), aggregator);
    (service, provider, profiles)
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) fn assert_status(response: &Response, status: StatusCode) {
    assert_eq!(response.status(), status);
}
