//! The completion client: one logical completion call with fixed model
//! settings, bounded retry, and per-attempt usage/cost logging.

use std::sync::Arc;
use tracing::{error, info, warn};
use treatorhell_config::AppConfig;
use treatorhell_core::error::ProviderError;
use treatorhell_core::message::Message;
use treatorhell_core::provider::{Provider, ProviderRequest, Usage};
use treatorhell_telemetry::PricingTable;

use crate::openai_compat::OpenAiCompatProvider;
use crate::retry::{RetryPolicy, retry};

/// The outcome of a successful completion.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    /// Generated text; empty when the upstream returned no content.
    pub text: String,
    /// Token counts exactly as reported upstream.
    pub usage: Usage,
}

/// Wraps a [`Provider`] with the service's fixed model id, output limit,
/// temperature, and retry policy.
pub struct CompletionClient {
    provider: Arc<dyn Provider>,
    model: String,
    max_tokens: u32,
    temperature: f32,
    retry: RetryPolicy,
    pricing: PricingTable,
}

impl CompletionClient {
    pub fn new(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        max_tokens: u32,
        temperature: f32,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            max_tokens,
            temperature,
            retry: RetryPolicy::default(),
            pricing: PricingTable::with_defaults(),
        }
    }

    /// Build the OpenAI-backed client described by `config`.
    pub fn from_config(config: &AppConfig) -> Result<Self, ProviderError> {
        let api_key = config
            .openai
            .api_key
            .clone()
            .ok_or_else(|| ProviderError::InvalidRequest("OPENAI_API_KEY is not configured".into()))?;
        let provider = OpenAiCompatProvider::new("openai", &config.openai.base_url, api_key)?;

        Ok(Self::new(
            Arc::new(provider),
            &config.openai.model,
            config.openai.max_tokens,
            config.openai.temperature,
        ))
    }

    /// Override the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Send `messages` and return the generated text and usage.
    ///
    /// Retries rate-limit and upstream-API errors per the configured policy;
    /// anything else fails on the first attempt. The error returned is the
    /// provider's own, unwrapped.
    pub async fn complete(&self, messages: &[Message]) -> Result<Completion, ProviderError> {
        if messages.is_empty() {
            return Err(ProviderError::InvalidRequest(
                "At least one message is required".into(),
            ));
        }

        retry(&self.retry, move |attempt| self.attempt(messages, attempt)).await
    }

    /// USD estimate, billed by the dated model name the API reports when it
    /// sends one.
    fn estimated_cost(&self, reported_model: &str, usage: &Usage) -> f64 {
        let billed_model = if reported_model.is_empty() {
            self.model.as_str()
        } else {
            reported_model
        };
        self.pricing.cost_for(billed_model, usage.prompt_tokens, usage.completion_tokens)
    }

    async fn attempt(&self, messages: &[Message], attempt: u32) -> Result<Completion, ProviderError> {
        info!(
            model = %self.model,
            message_count = messages.len(),
            attempt,
            "chat_completion_started"
        );

        let request = ProviderRequest {
            model: self.model.clone(),
            messages: messages.to_vec(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        match self.provider.complete(request).await {
            Ok(response) => {
                let text = response.content.unwrap_or_default();
                let usage = response.usage.unwrap_or_default();
                let estimated_cost_usd = self.estimated_cost(&response.model, &usage);

                info!(
                    model = %self.model,
                    message_count = messages.len(),
                    attempt,
                    prompt_tokens = usage.prompt_tokens,
                    completion_tokens = usage.completion_tokens,
                    total_tokens = usage.total_tokens,
                    estimated_cost_usd,
                    response_length = text.chars().count(),
                    "chat_completion_completed"
                );

                Ok(Completion { text, usage })
            }
            Err(e) if e.is_retryable() => {
                warn!(
                    model = %self.model,
                    message_count = messages.len(),
                    attempt,
                    error = %e,
                    error_type = e.kind(),
                    "chat_completion_failed"
                );
                Err(e)
            }
            Err(e) => {
                error!(
                    model = %self.model,
                    message_count = messages.len(),
                    attempt,
                    error = %e,
                    error_type = e.kind(),
                    "chat_completion_unexpected_error"
                );
                Err(e)
            }
        }
    }
}
