use std::collections::HashMap;

use serde_json::json;

use super::domain::{
    OtherDataRequirements, ProviderId, Template, TemplateConstraints, TemplateId, TemplateStatus,
};

pub const WORKFORCE_APPLICATION_TEMPLATE_ID: &str = "WorkforceApplicationForm";

/// Ordered set of templates served by one provider.
#[derive(Debug, Clone, Default)]
pub struct TemplateCatalog {
    templates: Vec<Template>,
}

impl TemplateCatalog {
    pub fn new(templates: Vec<Template>) -> Self {
        Self { templates }
    }

    /// Catalog holding the yearly workforce application owned by `provider_id`.
    pub fn standard(provider_id: &ProviderId) -> Self {
        Self::new(vec![workforce_application_template(provider_id)])
    }

    pub fn get(&self, template_id: &TemplateId) -> Option<&Template> {
        self.templates
            .iter()
            .find(|template| &template.id == template_id)
    }

    pub fn all(&self) -> &[Template] {
        &self.templates
    }

    pub fn active(&self) -> impl Iterator<Item = &Template> {
        self.templates
            .iter()
            .filter(|template| template.status == TemplateStatus::Active)
    }

    /// Active templates a profile may still create, given how many
    /// submissions it already holds per template.
    pub fn creatable_for(&self, existing: &HashMap<TemplateId, u32>) -> Vec<Template> {
        self.active()
            .filter(|template| {
                let held = existing.get(&template.id).copied().unwrap_or(0);
                held < template.constraints.max_forms_per_profile
            })
            .cloned()
            .collect()
    }
}

/// The yearly volunteer application: every contact field plus a photo is required.
pub fn workforce_application_template(provider_id: &ProviderId) -> Template {
    let days: Vec<_> = [
        ("day1", "First Friday"),
        ("day2", "Saturday"),
        ("day3", "Sunday"),
        ("day4", "Monday"),
        ("day5", "Tuesday"),
        ("day6", "Wednesday"),
        ("day7", "Thursday"),
        ("day8", "Last Friday"),
    ]
    .into_iter()
    .map(|(value, text)| json!({ "value": value, "text": text }))
    .collect();

    let questions = json!({
        "pages": [
            {
                "name": "availability",
                "elements": [
                    {
                        "type": "checkbox",
                        "name": "daysAvailable",
                        "title": "Which days are you available?",
                        "isRequired": true,
                        "choices": days,
                        "validators": [{ "type": "answercount", "minCount": 1 }]
                    },
                    {
                        "type": "radiogroup",
                        "name": "ageGroup",
                        "title": "Age group",
                        "isRequired": true,
                        "choices": ["under-18", "18-20", "21-25", "26-35", "36-55", "56-65", "66+"]
                    },
                    { "type": "boolean", "name": "camping", "title": "Will you be camping on site?" }
                ]
            },
            {
                "name": "emergency",
                "elements": [
                    {
                        "type": "panel",
                        "name": "emergencyContact",
                        "elements": [
                            {
                                "type": "text",
                                "name": "emergencyContactName",
                                "title": "Emergency contact name",
                                "isRequired": true
                            },
                            {
                                "type": "text",
                                "name": "emergencyContactTelephone",
                                "title": "Emergency contact telephone",
                                "isRequired": true,
                                "validators": [{ "type": "regex", "regex": "^[0-9 +()-]{7,20}$" }]
                            }
                        ]
                    }
                ]
            },
            {
                "name": "teams",
                "elements": [
                    { "type": "boolean", "name": "previousVolunteer", "title": "Have you volunteered before?" },
                    { "type": "text", "name": "previousTeam", "title": "Previous team" },
                    { "type": "text", "name": "teamPreference1", "title": "First team preference", "isRequired": true },
                    { "type": "text", "name": "teamPreference2", "title": "Second team preference" },
                    { "type": "text", "name": "teamPreference3", "title": "Third team preference" },
                    {
                        "type": "text",
                        "name": "dbsDisclosureNumber",
                        "title": "DBS disclosure number",
                        "validators": [{ "type": "regex", "regex": "^[0-9]{12}$" }]
                    },
                    { "type": "text", "name": "dbsDisclosureDate", "inputType": "date" },
                    { "type": "boolean", "name": "firstAidCertificate" },
                    {
                        "type": "comment",
                        "name": "occupationOrSkills",
                        "validators": [{ "type": "text", "maxLength": 500 }]
                    },
                    {
                        "type": "dropdown",
                        "name": "tShirtSize",
                        "choices": ["S", "M", "L", "XL", "XXL"]
                    },
                    { "type": "comment", "name": "otherInformation" },
                    {
                        "type": "boolean",
                        "name": "acceptedTermsAndConditions",
                        "title": "I accept the terms and conditions",
                        "isRequired": true
                    }
                ]
            }
        ]
    });

    Template {
        id: TemplateId(WORKFORCE_APPLICATION_TEMPLATE_ID.to_string()),
        provider_id: provider_id.clone(),
        version: 1,
        short_name: "WF Application".to_string(),
        full_name: "Workforce Application Form".to_string(),
        description: Some("Yearly application to join the festival workforce.".to_string()),
        questions,
        other_data_requirements: OtherDataRequirements {
            profile_requirements: ["givenName", "surname", "displayName", "address", "telephone", "email"]
                .into_iter()
                .map(str::to_string)
                .collect(),
            profile_photo_required: true,
        },
        constraints: TemplateConstraints {
            max_forms_per_profile: 1,
        },
        status: TemplateStatus::Active,
    }
}
