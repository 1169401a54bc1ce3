//! The student questionnaire: an embedded HTML form and its submit handler.

use axum::Form;
use axum::extract::State;
use axum::extract::rejection::FormRejection;
use axum::response::Html;
use tracing::{error, info, warn};
use treatorhell_core::storage::StudentAnswers;
use treatorhell_storage::SaveError;

use crate::SharedState;
use crate::error::ApiError;

const QUESTIONS_HTML: &str = include_str!("../assets/questions.html");
const SUCCESS_HTML: &str = include_str!("../assets/success.html");

pub async fn questions_form() -> Html<&'static str> {
    Html(QUESTIONS_HTML)
}

/// Missing form fields arrive as empty strings and fail validation, so the
/// store is only touched with a complete record.
pub async fn submit_questions(
    State(state): State<SharedState>,
    payload: Result<Form<StudentAnswers>, FormRejection>,
) -> Result<Html<&'static str>, ApiError> {
    info!(endpoint = "/questions/submit", "questions_submit_request_received");

    let Form(answers) = payload.map_err(|rejection| {
        warn!(endpoint = "/questions/submit", error = %rejection, "questions_submit_validation_error");
        ApiError::Validation(rejection.body_text())
    })?;

    match state.store.save(&answers).await {
        Ok(()) => {
            info!(
                endpoint = "/questions/submit",
                backend = state.store.backend_name(),
                "questions_submit_completed"
            );
            Ok(Html(SUCCESS_HTML))
        }
        Err(SaveError::Validation(e)) => {
            warn!(endpoint = "/questions/submit", error = %e, "questions_submit_validation_error");
            Err(ApiError::Validation(e.to_string()))
        }
        Err(e) => {
            error!(endpoint = "/questions/submit", error = %e, "questions_submit_failed");
            Err(e.into())
        }
    }
}
