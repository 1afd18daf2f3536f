use crate::infra::{seeded_profiles, InMemoryFormProvider, DEMO_USER};
use clap::Args;
use serde_json::{json, Value};
use std::sync::Arc;
use workforce::config::AppConfig;
use workforce::error::AppError;
use workforce::forms::{
    AnswersUpdate, FormAction, FormsError, FormsService, ProviderAggregator, ProviderId,
    TemplateCatalog, TemplateId, VerifiedFormSubmission, WORKFORCE_APPLICATION_TEMPLATE_ID,
};
use workforce::profiles::UserId;

#[derive(Args, Debug, Default)]
pub(crate) struct TemplatesArgs {
    /// Provider id to attribute the templates to (defaults to WF_PROVIDER_ID)
    #[arg(long)]
    pub(crate) provider_id: Option<String>,
    /// Print the full template definitions as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Stop after the first retraction instead of clearing a profile field
    #[arg(long)]
    pub(crate) skip_profile_change: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct MigrateArgs {
    /// Provider id whose submissions are migrated (defaults to WF_PROVIDER_ID)
    #[arg(long)]
    pub(crate) provider_id: Option<String>,
}

pub(crate) async fn run_migrate_other_data(args: MigrateArgs) -> Result<(), AppError> {
    let provider_id = match args.provider_id {
        Some(id) => ProviderId(id),
        None => AppConfig::load()?.forms.provider_id,
    };
    let service = FormsService::new(
        Arc::new(seeded_profiles()),
        ProviderAggregator::new(vec![Arc::new(InMemoryFormProvider::new(provider_id.clone()))]),
    );

    let refreshed = migrate_other_data(&service).await?;
    println!("Refreshed other data on {refreshed} submission(s) from {provider_id}");
    Ok(())
}

/// Backfill the profile snapshot on every active submission missing one.
pub(crate) async fn migrate_other_data(service: &FormsService) -> Result<usize, AppError> {
    Ok(service.refresh_other_data().await?)
}

pub(crate) fn run_templates(args: TemplatesArgs) -> Result<(), AppError> {
    let provider_id = match args.provider_id {
        Some(id) => ProviderId(id),
        None => AppConfig::load()?.forms.provider_id,
    };
    let catalog = TemplateCatalog::standard(&provider_id);

    if args.json {
        let rendered =
            serde_json::to_string_pretty(catalog.all()).map_err(std::io::Error::from)?;
        println!("{rendered}");
        return Ok(());
    }

    println!("Templates served by {provider_id}");
    for template in catalog.all() {
        let requirements = &template.other_data_requirements;
        println!(
            "- {} ({}) v{} [{:?}]",
            template.full_name, template.id, template.version, template.status
        );
        println!(
            "  profile fields: {}{}",
            requirements.profile_requirements.join(", "),
            if requirements.profile_photo_required {
                " + photo"
            } else {
                ""
            }
        );
        println!(
            "  max forms per profile: {}",
            template.constraints.max_forms_per_profile
        );
    }
    Ok(())
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let provider = InMemoryFormProvider::new(ProviderId("demo-provider".to_string()));
    let profiles = seeded_profiles();
    let service = FormsService::new(
        Arc::new(profiles.clone()),
        ProviderAggregator::new(vec![Arc::new(provider)]),
    );
    let user = UserId(DEMO_USER.to_string());
    let template_id = TemplateId(WORKFORCE_APPLICATION_TEMPLATE_ID.to_string());

    println!("Workforce application demo for {DEMO_USER}");

    let created = service
        .create_submission_for_user(&user, &template_id, json!({ "ageGroup": "26-35" }))
        .await?;
    render_submission("Created with partial answers", &created);
    let submission_id = created.id().clone();

    let completed = service
        .update_submission_answers_for_user(
            &user,
            &submission_id,
            AnswersUpdate {
                answers: complete_answers(),
                version: Some(created.submission.version),
            },
        )
        .await?;
    render_submission("Answers completed", &completed);

    let submitted = service
        .perform_action_for_user(&user, &submission_id, FormAction::Submit)
        .await?
        .into_submission();
    render_submission("Submitted", &submitted);

    let retracted = service
        .perform_action_for_user(&user, &submission_id, FormAction::Retract)
        .await?
        .into_submission();
    render_submission("Retracted", &retracted);

    if args.skip_profile_change {
        return Ok(());
    }

    service
        .perform_action_for_user(&user, &submission_id, FormAction::Submit)
        .await?;
    let mut profile = service.profile_for_user(&user).await?;
    profile.telephone.clear();
    profiles
        .update_profile(profile)
        .map_err(FormsError::from)?;
    println!("\nProfile telephone cleared");

    let retracted = service
        .perform_action_for_user(&user, &submission_id, FormAction::Retract)
        .await?
        .into_submission();
    render_submission("Retracted with incomplete profile", &retracted);

    Ok(())
}

fn complete_answers() -> Value {
    json!({
        "daysAvailable": ["day1", "day2", "day3"],
        "ageGroup": "26-35",
        "camping": true,
        "emergencyContactName": "Alex Marsh",
        "emergencyContactTelephone": "07700 900654",
        "teamPreference1": "Stewarding",
        "teamPreference2": "Litter Picking",
        "tShirtSize": "M",
        "acceptedTermsAndConditions": true
    })
}

fn render_submission(heading: &str, submission: &VerifiedFormSubmission) {
    let actions: Vec<&str> = submission
        .available_actions
        .iter()
        .map(|action| action.label())
        .collect();

    println!("\n{heading}");
    println!(
        "  stored status: {} | verified status: {} | version: {}",
        submission.submission.status,
        submission.status(),
        submission.submission.version
    );
    println!(
        "  answers: {:?} | deletable: {:?}",
        submission.answers_modifiable, submission.submission_deletable
    );
    if actions.is_empty() {
        println!("  available actions: none");
    } else {
        println!("  available actions: {}", actions.join(", "));
    }
}
