use async_trait::async_trait;
use chrono::Utc;
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tracing::debug;
use uuid::Uuid;
use workforce::forms::{
    ArchiveStatus, FormProvider, ProviderError, ProviderId, ProviderSubmissionId, SubmissionId,
    SubmissionKey, SubmissionStatus, Template, TemplateCatalog, TemplateId,
    UnverifiedFormSubmission,
};
use workforce::profiles::{PhotoId, Profile, ProfileError, ProfileId, ProfileSource, UserId};
use workforce::version::{ensure_version, Version};

pub(crate) const DEMO_USER: &str = "demo-user";

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Form provider backed by process memory, serving the standard catalog.
#[derive(Clone)]
pub(crate) struct InMemoryFormProvider {
    id: ProviderId,
    catalog: Arc<TemplateCatalog>,
    submissions: Arc<Mutex<HashMap<ProviderSubmissionId, UnverifiedFormSubmission>>>,
}

impl InMemoryFormProvider {
    pub(crate) fn new(id: ProviderId) -> Self {
        Self {
            catalog: Arc::new(TemplateCatalog::standard(&id)),
            id,
            submissions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn write(
        &self,
        key: &SubmissionKey,
        version: Version,
        change: impl FnOnce(&mut UnverifiedFormSubmission),
    ) -> Result<UnverifiedFormSubmission, ProviderError> {
        let mut guard = self.submissions.lock().expect("provider mutex poisoned");
        let stored = guard
            .get_mut(&key.provider_submission_id)
            .filter(|stored| stored.archive_status == ArchiveStatus::Active)
            .ok_or_else(|| ProviderError::SubmissionNotFound(key.provider_submission_id.clone()))?;
        ensure_version(stored.version, version)?;

        change(stored);
        stored.version = stored.version.next();
        stored.modified_at = Utc::now();
        Ok(stored.clone())
    }
}

#[async_trait]
impl FormProvider for InMemoryFormProvider {
    fn id(&self) -> &ProviderId {
        &self.id
    }

    async fn template(&self, template_id: &TemplateId) -> Result<Template, ProviderError> {
        self.catalog
            .get(template_id)
            .cloned()
            .ok_or_else(|| ProviderError::TemplateNotFound(template_id.clone()))
    }

    async fn creatable_templates(
        &self,
        profile_id: &ProfileId,
    ) -> Result<Vec<Template>, ProviderError> {
        let mut held: HashMap<TemplateId, u32> = HashMap::new();
        for submission in self.active_submissions(profile_id).await? {
            *held.entry(submission.template_id).or_default() += 1;
        }
        Ok(self.catalog.creatable_for(&held))
    }

    async fn active_submissions(
        &self,
        profile_id: &ProfileId,
    ) -> Result<Vec<UnverifiedFormSubmission>, ProviderError> {
        let mut submissions = self.all_active_submissions().await?;
        submissions.retain(|submission| &submission.profile_id == profile_id);
        Ok(submissions)
    }

    async fn all_active_submissions(&self) -> Result<Vec<UnverifiedFormSubmission>, ProviderError> {
        let guard = self.submissions.lock().expect("provider mutex poisoned");
        let mut submissions: Vec<_> = guard
            .values()
            .filter(|submission| submission.archive_status == ArchiveStatus::Active)
            .cloned()
            .collect();
        submissions.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(submissions)
    }

    async fn create_submission(
        &self,
        profile_id: &ProfileId,
        template_id: &TemplateId,
        answers: Value,
    ) -> Result<UnverifiedFormSubmission, ProviderError> {
        let template = self
            .catalog
            .get(template_id)
            .ok_or_else(|| ProviderError::TemplateNotFound(template_id.clone()))?;

        let now = Utc::now();
        let submission = UnverifiedFormSubmission {
            id: SubmissionId(Uuid::new_v4().to_string()),
            provider_id: self.id.clone(),
            provider_submission_id: ProviderSubmissionId(Uuid::new_v4().to_string()),
            template_id: template_id.clone(),
            profile_id: profile_id.clone(),
            answers,
            other_data: Value::Null,
            status: SubmissionStatus::Draft,
            archive_status: ArchiveStatus::Active,
            version: Version::INITIAL,
            created_at: now,
            modified_at: now,
        };

        // Limit check and insert share one lock.
        let mut guard = self.submissions.lock().expect("provider mutex poisoned");
        let held = guard
            .values()
            .filter(|stored| {
                stored.archive_status == ArchiveStatus::Active
                    && &stored.profile_id == profile_id
                    && &stored.template_id == template_id
            })
            .count();
        if held >= template.constraints.max_forms_per_profile as usize {
            debug!(provider = %self.id, %template_id, held, "per-profile form limit reached");
            return Err(ProviderError::TemplateNotFound(template_id.clone()));
        }
        guard.insert(submission.provider_submission_id.clone(), submission.clone());
        debug!(provider = %self.id, submission_id = %submission.id, "stored new submission");
        Ok(submission)
    }

    async fn update_submission(
        &self,
        key: &SubmissionKey,
        version: Version,
        _profile_id: &ProfileId,
        status: SubmissionStatus,
        answers: Value,
    ) -> Result<UnverifiedFormSubmission, ProviderError> {
        self.write(key, version, |stored| {
            stored.status = status;
            stored.answers = answers;
        })
    }

    async fn update_submission_status(
        &self,
        key: &SubmissionKey,
        version: Version,
        _profile_id: &ProfileId,
        status: SubmissionStatus,
        other_data: Value,
    ) -> Result<UnverifiedFormSubmission, ProviderError> {
        self.write(key, version, |stored| {
            stored.status = status;
            stored.other_data = other_data;
        })
    }

    async fn delete_submission(&self, key: &SubmissionKey) -> Result<(), ProviderError> {
        let mut guard = self.submissions.lock().expect("provider mutex poisoned");
        let stored = guard
            .get_mut(&key.provider_submission_id)
            .ok_or_else(|| ProviderError::SubmissionNotFound(key.provider_submission_id.clone()))?;
        stored.archive_status = ArchiveStatus::Archived;
        stored.version = stored.version.next();
        stored.modified_at = Utc::now();
        Ok(())
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryProfileSource {
    users: Arc<Mutex<HashMap<UserId, ProfileId>>>,
    profiles: Arc<Mutex<HashMap<ProfileId, Profile>>>,
}

impl InMemoryProfileSource {
    pub(crate) fn insert(&self, user_id: UserId, profile: Profile) {
        self.users
            .lock()
            .expect("profile mutex poisoned")
            .insert(user_id, profile.id.clone());
        self.profiles
            .lock()
            .expect("profile mutex poisoned")
            .insert(profile.id.clone(), profile);
    }

    /// Replace a profile the caller read at `profile.version`.
    pub(crate) fn update_profile(&self, profile: Profile) -> Result<Profile, ProfileError> {
        let mut guard = self.profiles.lock().expect("profile mutex poisoned");
        let stored = guard
            .get_mut(&profile.id)
            .ok_or_else(|| ProfileError::ProfileNotFound(profile.id.clone()))?;
        ensure_version(stored.version, profile.version)?;

        *stored = Profile {
            version: profile.version.next(),
            ..profile
        };
        Ok(stored.clone())
    }
}

#[async_trait]
impl ProfileSource for InMemoryProfileSource {
    async fn profile(&self, profile_id: &ProfileId) -> Result<Profile, ProfileError> {
        self.profiles
            .lock()
            .expect("profile mutex poisoned")
            .get(profile_id)
            .cloned()
            .ok_or_else(|| ProfileError::ProfileNotFound(profile_id.clone()))
    }

    async fn profile_for_user(&self, user_id: &UserId) -> Result<Profile, ProfileError> {
        let profile_id = self
            .users
            .lock()
            .expect("profile mutex poisoned")
            .get(user_id)
            .cloned()
            .ok_or_else(|| ProfileError::UnknownUser(user_id.clone()))?;
        self.profile(&profile_id).await
    }
}

/// Seed profile used by `serve` and `demo` so the API has a user to act for.
pub(crate) fn demo_profile() -> Profile {
    Profile {
        id: ProfileId("demo-profile".to_string()),
        version: Version::INITIAL,
        display_name: "Robin Marsh".to_string(),
        given_name: "Robin".to_string(),
        surname: "Marsh".to_string(),
        email: "robin.marsh@example.org".to_string(),
        address: "12 Meadow Close, Lowfield".to_string(),
        telephone: "07700 900321".to_string(),
        photo_ids: vec![PhotoId("demo-photo".to_string())],
    }
}

pub(crate) fn seeded_profiles() -> InMemoryProfileSource {
    let profiles = InMemoryProfileSource::default();
    profiles.insert(UserId(DEMO_USER.to_string()), demo_profile());
    profiles
}
