//! Error types for the TreatOrHell domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum; the HTTP gateway is the only
//! place these are translated into status codes.

use thiserror::Error;

/// Failures of the upstream chat-completion API.
///
/// The variants fall into three classes that callers branch on:
/// rate limiting, the generic upstream-API class, and request/response
/// problems that retrying cannot fix.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("Rate limited by provider{}", retry_hint(.retry_after_secs))]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),
}

fn retry_hint(secs: &Option<u64>) -> String {
    match secs {
        Some(s) => format!(", retry after {s}s"),
        None => String::new(),
    }
}

impl ProviderError {
    /// Whether a completion call failing with this error may be attempted again.
    pub fn is_retryable(&self) -> bool {
        self.is_rate_limit() || self.is_upstream()
    }

    /// The transient rate-limit class.
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, ProviderError::RateLimited { .. })
    }

    /// The generic upstream-API class (bad status, auth, transport).
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            ProviderError::ApiError { .. }
                | ProviderError::AuthenticationFailed(_)
                | ProviderError::Timeout(_)
                | ProviderError::Network(_)
        )
    }

    /// Short variant name, used as the `error_type` log field.
    pub fn kind(&self) -> &'static str {
        match self {
            ProviderError::RateLimited { .. } => "RateLimited",
            ProviderError::ApiError { .. } => "ApiError",
            ProviderError::AuthenticationFailed(_) => "AuthenticationFailed",
            ProviderError::Timeout(_) => "Timeout",
            ProviderError::Network(_) => "Network",
            ProviderError::InvalidRequest(_) => "InvalidRequest",
            ProviderError::MalformedResponse(_) => "MalformedResponse",
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("Failed to write student responses: {0}")]
    Write(String),

    #[error("Failed to read student responses: {0}")]
    Read(String),

    #[error("Failed to (de)serialize student responses: {0}")]
    Serialization(String),

    #[error("Storage backend unavailable: {0}")]
    Backend(String),
}

/// A request field that failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {reason}")]
pub struct ValidationError {
    pub field: String,
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// The error for a required text field that was empty or absent.
    pub fn empty(field: impl Into<String>) -> Self {
        Self::new(field, "must be at least 1 character long")
    }
}
