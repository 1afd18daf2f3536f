use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::error;

use super::domain::{FormAction, SubmissionId, TemplateId};
use super::error::FormsError;
use super::service::{AnswersUpdate, FormsService};
use crate::profiles::UserId;

/// Router exposing the user-scoped forms API.
pub fn forms_router(service: Arc<FormsService>) -> Router {
    Router::new()
        .route("/api/users/:user_id/forms", get(list_handler))
        .route(
            "/api/users/:user_id/forms/:submission_id/answers",
            put(update_answers_handler),
        )
        .route(
            "/api/users/:user_id/forms/:submission_id",
            delete(delete_handler),
        )
        .route(
            "/api/users/:user_id/forms/:submission_id/action",
            post(action_handler),
        )
        .route("/api/users/:user_id/templates", get(templates_handler))
        .route(
            "/api/users/:user_id/templates/:template_id/forms",
            post(create_handler),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreateSubmissionRequest {
    #[serde(default)]
    pub(crate) answers: Value,
}

pub(crate) fn status_for(error: &FormsError) -> StatusCode {
    match error {
        FormsError::UnknownUser(_)
        | FormsError::SubmissionNotFound(_)
        | FormsError::TemplateNotFound(_) => StatusCode::NOT_FOUND,
        FormsError::UnprocessableAction { .. }
        | FormsError::AnswersLocked(_)
        | FormsError::NotDeletable(_) => StatusCode::UNPROCESSABLE_ENTITY,
        FormsError::VersionMismatch(_) => StatusCode::CONFLICT,
        FormsError::ProviderNotMatched(_)
        | FormsError::DataConsistency(_)
        | FormsError::Unavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(error: FormsError) -> Response {
    let status = status_for(&error);
    if !error.is_user_correctable() {
        error!(%error, "forms request failed");
    }
    let payload = json!({ "error": error.to_string() });
    (status, axum::Json(payload)).into_response()
}

fn data_response<T: serde::Serialize>(status: StatusCode, data: T) -> Response {
    (status, axum::Json(json!({ "data": data }))).into_response()
}

pub(crate) async fn list_handler(
    State(service): State<Arc<FormsService>>,
    Path(user_id): Path<String>,
) -> Response {
    match service.list_submissions_for_user(&UserId(user_id)).await {
        Ok(submissions) => data_response(StatusCode::OK, submissions),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn update_answers_handler(
    State(service): State<Arc<FormsService>>,
    Path((user_id, submission_id)): Path<(String, String)>,
    axum::Json(update): axum::Json<AnswersUpdate>,
) -> Response {
    match service
        .update_submission_answers_for_user(&UserId(user_id), &SubmissionId(submission_id), update)
        .await
    {
        Ok(submission) => data_response(StatusCode::OK, submission),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn delete_handler(
    State(service): State<Arc<FormsService>>,
    Path((user_id, submission_id)): Path<(String, String)>,
) -> Response {
    match service
        .delete_submission_for_user(&UserId(user_id), &SubmissionId(submission_id))
        .await
    {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn action_handler(
    State(service): State<Arc<FormsService>>,
    Path((user_id, submission_id)): Path<(String, String)>,
    axum::Json(action): axum::Json<FormAction>,
) -> Response {
    match service
        .perform_action_for_user(&UserId(user_id), &SubmissionId(submission_id), action)
        .await
    {
        Ok(outcome) => data_response(StatusCode::OK, outcome.into_submission()),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn templates_handler(
    State(service): State<Arc<FormsService>>,
    Path(user_id): Path<String>,
) -> Response {
    match service
        .list_creatable_templates_for_user(&UserId(user_id))
        .await
    {
        Ok(templates) => data_response(StatusCode::OK, templates),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn create_handler(
    State(service): State<Arc<FormsService>>,
    Path((user_id, template_id)): Path<(String, String)>,
    axum::Json(request): axum::Json<CreateSubmissionRequest>,
) -> Response {
    match service
        .create_submission_for_user(&UserId(user_id), &TemplateId(template_id), request.answers)
        .await
    {
        Ok(submission) => data_response(StatusCode::CREATED, submission),
        Err(error) => error_response(error),
    }
}
