//! Upstash Redis backend over the Upstash REST API.
//!
//! Every Redis command is a `POST` of a JSON array (`["SET", key, value]`)
//! to the database URL with a bearer token. The reply is
//! `{"result": ...}` on success or `{"error": "..."}` on failure.
//! Commands are sent one at a time; there is no pipelining.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};
use treatorhell_core::error::StorageError;
use treatorhell_core::storage::{STUDENT_RESPONSES_KEY, StorageBackend, StudentAnswers};

/// Per-command timeout. A stalled store must not hold up chat requests.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Remote key-value store reached through the Upstash REST protocol.
pub struct UpstashBackend {
    url: reqwest::Url,
    token: String,
    client: reqwest::Client,
}

impl UpstashBackend {
    /// Build a backend for the database at `url`.
    ///
    /// Fails when the URL does not parse as http(s) or the token is blank.
    pub fn new(url: &str, token: &str) -> Result<Self, StorageError> {
        Self::with_timeout(url, token, REQUEST_TIMEOUT)
    }

    fn with_timeout(url: &str, token: &str, timeout: Duration) -> Result<Self, StorageError> {
        let url = reqwest::Url::parse(url.trim())
            .map_err(|e| StorageError::Backend(format!("Invalid Upstash URL: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(StorageError::Backend(format!(
                "Invalid Upstash URL scheme: {}",
                url.scheme()
            )));
        }

        let token = token.trim();
        if token.is_empty() {
            return Err(StorageError::Backend("Upstash token is empty".into()));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StorageError::Backend(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            url,
            token: token.to_string(),
            client,
        })
    }

    /// Host of the configured database, for logs.
    pub fn host(&self) -> &str {
        self.url.host_str().unwrap_or_default()
    }

    /// Run one Redis command and return its `result`.
    pub async fn command(&self, args: &[&str]) -> Result<Value, StorageError> {
        let command = args.first().copied().unwrap_or_default();
        debug!(command, host = self.host(), "Sending Upstash command");

        let response = self
            .client
            .post(self.url.clone())
            .bearer_auth(&self.token)
            .json(args)
            .send()
            .await
            .map_err(|e| StorageError::Backend(format!("Upstash request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| StorageError::Backend(format!("Failed to read Upstash reply: {e}")))?;

        parse_reply(status.as_u16(), &body)
    }

    /// `SET key value`.
    pub async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.command(&["SET", key, value]).await.map(|_| ())
    }

    /// `GET key`; `None` when the key does not exist.
    pub async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match self.command(&["GET", key]).await? {
            Value::Null => Ok(None),
            Value::String(s) => Ok(Some(s)),
            other => Err(StorageError::Serialization(format!(
                "Unexpected GET result: {other}"
            ))),
        }
    }

    /// `DEL key`; returns how many keys were removed.
    pub async fn del(&self, key: &str) -> Result<u64, StorageError> {
        let removed = self.command(&["DEL", key]).await?;
        removed
            .as_u64()
            .ok_or_else(|| StorageError::Serialization(format!("Unexpected DEL result: {removed}")))
    }
}

#[derive(Debug, Deserialize)]
struct Reply {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<String>,
}

fn parse_reply(status: u16, body: &str) -> Result<Value, StorageError> {
    let reply: Reply = serde_json::from_str(body).map_err(|e| {
        StorageError::Backend(format!("Unreadable Upstash reply (status {status}): {e}"))
    })?;

    if let Some(error) = reply.error {
        return Err(StorageError::Backend(error));
    }
    if !(200..300).contains(&status) {
        return Err(StorageError::Backend(format!("Upstash returned status {status}")));
    }
    Ok(reply.result.unwrap_or(Value::Null))
}

#[async_trait]
impl StorageBackend for UpstashBackend {
    fn name(&self) -> &str {
        "redis"
    }

    async fn save(&self, answers: &StudentAnswers) -> Result<(), StorageError> {
        let value = serde_json::to_string(answers)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        self.set(STUDENT_RESPONSES_KEY, &value)
            .await
            .map_err(|e| StorageError::Write(e.to_string()))?;

        info!(backend = "redis", key = STUDENT_RESPONSES_KEY, "student_responses_saved");
        Ok(())
    }

    async fn load(&self) -> Result<Option<StudentAnswers>, StorageError> {
        let Some(raw) = self.get(STUDENT_RESPONSES_KEY).await? else {
            return Ok(None);
        };
        let answers = serde_json::from_str(&raw)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        debug!(backend = "redis", key = STUDENT_RESPONSES_KEY, "student_responses_loaded");
        Ok(Some(answers))
    }
}
