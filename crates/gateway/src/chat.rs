//! `POST /chat/angel`.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use treatorhell_core::error::ValidationError;
use treatorhell_core::provider::Usage;

use crate::SharedState;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

pub async fn chat_angel(
    State(state): State<SharedState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        warn!(endpoint = "/chat/angel", error = %rejection, "chat_angel_validation_error");
        ApiError::Validation(rejection.body_text())
    })?;

    if request.message.is_empty() {
        let e = ValidationError::empty("message");
        warn!(endpoint = "/chat/angel", error = %e, "chat_angel_validation_error");
        return Err(ApiError::Validation(e.to_string()));
    }

    info!(
        endpoint = "/chat/angel",
        message_length = request.message.chars().count(),
        "chat_angel_request_received"
    );

    match state.persona.build_angel_reply(&request.message).await {
        Ok(completion) => {
            info!(
                endpoint = "/chat/angel",
                prompt_tokens = completion.usage.prompt_tokens,
                completion_tokens = completion.usage.completion_tokens,
                total_tokens = completion.usage.total_tokens,
                response_length = completion.text.chars().count(),
                "chat_angel_request_completed"
            );
            Ok(Json(ChatResponse {
                response: completion.text,
                usage: Some(completion.usage),
            }))
        }
        Err(e) if e.is_rate_limit() => {
            warn!(endpoint = "/chat/angel", error = %e, "chat_angel_rate_limit_exceeded");
            Err(e.into())
        }
        Err(e) if e.is_upstream() => {
            error!(endpoint = "/chat/angel", error = %e, error_type = e.kind(), "chat_angel_api_error");
            Err(e.into())
        }
        Err(e) => {
            error!(endpoint = "/chat/angel", error = %e, error_type = e.kind(), "chat_angel_unexpected_error");
            Err(e.into())
        }
    }
}
