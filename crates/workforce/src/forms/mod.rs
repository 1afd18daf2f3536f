//! Form submission lifecycle: status verification, action gating and
//! aggregation across form providers.

pub mod actions;
pub mod aggregator;
pub mod catalog;
pub mod domain;
pub mod error;
pub mod provider;
pub mod questions;
pub mod router;
pub mod service;
pub mod validation;

#[cfg(test)]
mod tests;

pub use actions::{available_actions, ActionExecutor, ActionOutcome};
pub use aggregator::ProviderAggregator;
pub use catalog::{workforce_application_template, TemplateCatalog, WORKFORCE_APPLICATION_TEMPLATE_ID};
pub use domain::{
    AnswersModifiable, ArchiveStatus, CrudFlags, FormAction, OtherDataRequirements, ProviderId,
    ProviderSubmissionId, SubmissionDeletable, SubmissionId, SubmissionKey, SubmissionStatus,
    SubmissionWithTemplate, Template, TemplateConstraints, TemplateId, TemplateStatus,
    UnverifiedFormSubmission, VerifiedFormSubmission, VerifiedStatus,
};
pub use error::FormsError;
pub use provider::{FormProvider, ProviderError};
pub use questions::{AnswerValidator, QuestionSchemaValidator};
pub use router::forms_router;
pub use service::{AnswersUpdate, FormsService};
pub use validation::{crud_flags, other_data, SubmissionValidator};
