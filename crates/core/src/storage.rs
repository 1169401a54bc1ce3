//! Storage trait — persistence for the single student answers record.
//!
//! The store holds at most one record system-wide. Every submission replaces
//! it whole; nothing ever merges or deletes it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{StorageError, ValidationError};

/// The well-known key (or file stem) the record lives under.
pub const STUDENT_RESPONSES_KEY: &str = "student_responses";

/// The four questionnaire answers of the most recent respondent.
///
/// Missing fields deserialize as empty strings so a hand-edited or older
/// blob still loads; `validate()` is what enforces completeness on write.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentAnswers {
    #[serde(default)]
    pub q1: String,
    #[serde(default)]
    pub q2: String,
    #[serde(default)]
    pub q3: String,
    #[serde(default)]
    pub q4: String,
}

impl StudentAnswers {
    pub const FIELDS: [&'static str; 4] = ["q1", "q2", "q3", "q4"];

    pub fn new(
        q1: impl Into<String>,
        q2: impl Into<String>,
        q3: impl Into<String>,
        q4: impl Into<String>,
    ) -> Self {
        Self {
            q1: q1.into(),
            q2: q2.into(),
            q3: q3.into(),
            q4: q4.into(),
        }
    }

    /// Answer by field name (`"q1"`..`"q4"`).
    pub fn get(&self, field: &str) -> Option<&str> {
        match field {
            "q1" => Some(&self.q1),
            "q2" => Some(&self.q2),
            "q3" => Some(&self.q3),
            "q4" => Some(&self.q4),
            _ => None,
        }
    }

    /// Reject the record if any answer is empty.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for field in Self::FIELDS {
            if self.get(field).is_none_or(str::is_empty) {
                return Err(ValidationError::empty(field));
            }
        }
        Ok(())
    }
}

/// The core StorageBackend trait.
///
/// Implementations: local JSON file, Upstash Redis (REST), in-memory.
/// `load` distinguishes "never written" (`Ok(None)`) from "could not read"
/// (`Err`); degrading the latter to "no context" is the caller's decision.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// The backend name (e.g., "file", "redis", "memory").
    fn name(&self) -> &str;

    /// Replace the stored record with `answers` in a single write.
    async fn save(&self, answers: &StudentAnswers) -> Result<(), StorageError>;

    /// Fetch the stored record, if any.
    async fn load(&self) -> Result<Option<StudentAnswers>, StorageError>;
}
