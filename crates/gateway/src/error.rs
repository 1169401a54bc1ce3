//! HTTP error type: the one place internal errors become status codes.
//!
//! Every error body has the shape `{"error": "...", "detail": "..."}`.
//! Server-side failures carry a fixed, generic detail; the underlying cause
//! is logged by the handler and never echoed back.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use treatorhell_core::error::ProviderError;
use treatorhell_storage::SaveError;

pub const RATE_LIMIT_DETAIL: &str = "Rate limit exceeded. Please try again later.";
pub const UNEXPECTED_DETAIL: &str = "An unexpected error occurred. Please try again later.";
pub const SAVE_FAILED_DETAIL: &str = "Failed to save student responses. Please try again later.";

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Malformed or incomplete request input.
    Validation(String),
    /// The completion provider kept rate limiting us.
    RateLimited,
    /// The completion provider kept failing.
    Upstream(String),
    /// The student answers could not be stored.
    SaveFailed,
    /// Anything else.
    Internal,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub detail: Option<String>,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Upstream(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::SaveFailed | ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(self) -> ErrorBody {
        match self {
            ApiError::Validation(msg) => ErrorBody {
                error: "Invalid request",
                detail: Some(msg),
            },
            ApiError::RateLimited => ErrorBody {
                error: "Rate limit exceeded",
                detail: Some(RATE_LIMIT_DETAIL.into()),
            },
            ApiError::Upstream(msg) => ErrorBody {
                error: "Service unavailable",
                detail: Some(format!("OpenAI API error: {msg}")),
            },
            ApiError::SaveFailed => ErrorBody {
                error: "Internal server error",
                detail: Some(SAVE_FAILED_DETAIL.into()),
            },
            ApiError::Internal => ErrorBody {
                error: "Internal server error",
                detail: Some(UNEXPECTED_DETAIL.into()),
            },
        }
    }
}

impl From<ProviderError> for ApiError {
    fn from(e: ProviderError) -> Self {
        if e.is_rate_limit() {
            ApiError::RateLimited
        } else if e.is_upstream() {
            ApiError::Upstream(e.to_string())
        } else {
            ApiError::Internal
        }
    }
}

impl From<SaveError> for ApiError {
    fn from(e: SaveError) -> Self {
        match e {
            SaveError::Validation(v) => ApiError::Validation(v.to_string()),
            SaveError::Storage(_) => ApiError::SaveFailed,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(self.body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use treatorhell_core::error::{StorageError, ValidationError};

    async fn body_json(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn provider_error_classes() {
        let rate = ProviderError::RateLimited {
            retry_after_secs: Some(1),
        };
        assert!(matches!(ApiError::from(rate), ApiError::RateLimited));

        let api = ProviderError::ApiError {
            status_code: 500,
            message: "boom".into(),
        };
        assert!(matches!(ApiError::from(api), ApiError::Upstream(_)));

        let auth = ProviderError::AuthenticationFailed("bad key".into());
        assert!(matches!(ApiError::from(auth), ApiError::Upstream(_)));

        let malformed = ProviderError::MalformedResponse("garbage".into());
        assert!(matches!(ApiError::from(malformed), ApiError::Internal));
    }

    #[tokio::test]
    async fn upstream_body_names_openai() {
        let (status, body) = body_json(ApiError::Upstream("API request failed".into())).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["detail"], "OpenAI API error: API request failed");
    }

    #[tokio::test]
    async fn internal_body_is_generic() {
        let (status, body) = body_json(ApiError::Internal).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Internal server error");
        assert_eq!(body["detail"], UNEXPECTED_DETAIL);
    }

    #[tokio::test]
    async fn save_errors() {
        let (status, body) =
            body_json(SaveError::from(ValidationError::empty("q3")).into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["detail"].as_str().unwrap().starts_with("q3"));

        let (status, body) =
            body_json(SaveError::from(StorageError::Write("disk full".into())).into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["detail"], SAVE_FAILED_DETAIL);
    }
}
