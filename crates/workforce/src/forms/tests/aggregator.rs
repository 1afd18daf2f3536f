use std::sync::Arc;

use serde_json::json;

use super::common::{
    provider_id, submission, template, template_for, valid_answers, MemoryProvider,
    RecordedWrite, UnavailableProvider, PROFILE,
};
use crate::forms::aggregator::ProviderAggregator;
use crate::forms::domain::{
    ProviderId, ProviderSubmissionId, SubmissionKey, SubmissionStatus, TemplateId,
};
use crate::forms::provider::ProviderError;
use crate::profiles::ProfileId;
use crate::version::Version;

fn secondary_id() -> ProviderId {
    ProviderId("legacy-provider".into())
}

fn secondary() -> MemoryProvider {
    let legacy = template_for(&secondary_id(), "Legacy2019");
    let mut stored = submission("legacy-1", SubmissionStatus::Submitted, valid_answers());
    stored.provider_id = secondary_id();
    stored.template_id = legacy.id.clone();
    MemoryProvider::new(secondary_id(), vec![legacy]).with_submission(stored)
}

fn profile_id() -> ProfileId {
    ProfileId(PROFILE.into())
}

#[tokio::test]
async fn reads_fan_out_in_registration_order() {
    let primary = MemoryProvider::standard().with_submission(submission(
        "sub-1",
        SubmissionStatus::Draft,
        valid_answers(),
    ));
    let aggregator = ProviderAggregator::new(vec![Arc::new(primary), Arc::new(secondary())]);

    let submissions = aggregator
        .active_submissions(&profile_id())
        .await
        .expect("fan out");
    let ids: Vec<_> = submissions
        .iter()
        .map(|submission| submission.id.0.as_str())
        .collect();
    assert_eq!(ids, vec!["sub-1", "legacy-1"]);

    // both templates allow one form per profile and both are held
    let creatable = aggregator
        .creatable_templates(&profile_id())
        .await
        .expect("templates");
    assert!(creatable.is_empty());
}

#[tokio::test]
async fn creatable_templates_merge_across_providers() {
    let aggregator = ProviderAggregator::new(vec![
        Arc::new(MemoryProvider::standard()),
        Arc::new(secondary()),
    ]);

    let creatable = aggregator
        .creatable_templates(&profile_id())
        .await
        .expect("templates");

    assert_eq!(creatable, vec![template()]);
}

#[tokio::test]
async fn failing_provider_fails_the_listing() {
    let aggregator = ProviderAggregator::new(vec![
        Arc::new(MemoryProvider::standard()),
        Arc::new(UnavailableProvider(secondary_id())),
    ]);

    match aggregator.all_active_submissions().await {
        Err(ProviderError::Unavailable(_)) => {}
        other => panic!("expected unavailable, got {other:?}"),
    }
}

#[tokio::test]
async fn template_lookup_skips_failing_provider() {
    let aggregator = ProviderAggregator::new(vec![
        Arc::new(UnavailableProvider(secondary_id())),
        Arc::new(MemoryProvider::standard()),
    ]);

    let found = aggregator
        .template(&TemplateId("Volunteer2025".into()))
        .await
        .expect("second provider resolves");
    assert_eq!(found.provider_id, provider_id());

    match aggregator.template(&TemplateId("Unknown".into())).await {
        Err(ProviderError::Unavailable(_)) => {}
        other => panic!("expected the outage to surface, got {other:?}"),
    }
}

#[tokio::test]
async fn template_not_found_only_when_every_provider_says_so() {
    let aggregator = ProviderAggregator::new(vec![
        Arc::new(MemoryProvider::standard()),
        Arc::new(secondary()),
    ]);

    match aggregator.template(&TemplateId("Unknown".into())).await {
        Err(ProviderError::TemplateNotFound(id)) => assert_eq!(id.0, "Unknown"),
        other => panic!("expected template not found, got {other:?}"),
    }
}

#[tokio::test]
async fn writes_are_routed_by_provider_id() {
    let primary = MemoryProvider::standard().with_submission(submission(
        "sub-1",
        SubmissionStatus::Draft,
        valid_answers(),
    ));
    let legacy = secondary();
    let aggregator = ProviderAggregator::new(vec![
        Arc::new(primary.clone()),
        Arc::new(legacy.clone()),
    ]);
    let key = SubmissionKey {
        provider_id: secondary_id(),
        provider_submission_id: ProviderSubmissionId("legacy-1".into()),
    };

    aggregator
        .update_submission_status(
            &key,
            Version::INITIAL,
            &profile_id(),
            SubmissionStatus::Submittable,
            json!({}),
        )
        .await
        .expect("routed write");
    aggregator.delete_submission(&key).await.expect("routed delete");

    assert!(primary.writes().is_empty());
    assert_eq!(
        legacy.writes(),
        vec![
            RecordedWrite::Status(
                ProviderSubmissionId("legacy-1".into()),
                SubmissionStatus::Submittable,
                json!({}),
            ),
            RecordedWrite::Delete(ProviderSubmissionId("legacy-1".into())),
        ]
    );
}

#[tokio::test]
async fn create_goes_to_template_owner() {
    let primary = MemoryProvider::standard();
    let legacy = secondary();
    let aggregator = ProviderAggregator::new(vec![
        Arc::new(legacy.clone()),
        Arc::new(primary.clone()),
    ]);

    let created = aggregator
        .create_submission(&profile_id(), &template(), json!({}))
        .await
        .expect("created");

    assert_eq!(created.provider_id, provider_id());
    assert_eq!(
        primary.writes(),
        vec![RecordedWrite::Create(template().id)]
    );
    assert!(legacy.writes().is_empty());
}

#[tokio::test]
async fn unknown_provider_is_not_matched() {
    let aggregator = ProviderAggregator::new(vec![Arc::new(MemoryProvider::standard())]);
    let key = SubmissionKey {
        provider_id: secondary_id(),
        provider_submission_id: ProviderSubmissionId("legacy-1".into()),
    };

    match aggregator.delete_submission(&key).await {
        Err(ProviderError::ProviderNotMatched(id)) => assert_eq!(id, secondary_id()),
        other => panic!("expected provider not matched, got {other:?}"),
    }
}

#[test]
fn registered_providers_are_listed() {
    let mut aggregator = ProviderAggregator::default();
    aggregator.register(Arc::new(MemoryProvider::standard()));
    aggregator.register(Arc::new(secondary()));

    assert_eq!(aggregator.provider_ids(), vec![provider_id(), secondary_id()]);
}
