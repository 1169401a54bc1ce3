//! In-memory backend — useful for testing and ephemeral sessions.

use async_trait::async_trait;
use tokio::sync::RwLock;
use treatorhell_core::error::StorageError;
use treatorhell_core::storage::{StorageBackend, StudentAnswers};

/// Holds the record in process memory; lost on restart.
#[derive(Default)]
pub struct InMemoryBackend {
    record: RwLock<Option<StudentAnswers>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend that starts out holding `answers`.
    pub fn with_record(answers: StudentAnswers) -> Self {
        Self {
            record: RwLock::new(Some(answers)),
        }
    }
}

#[async_trait]
impl StorageBackend for InMemoryBackend {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn save(&self, answers: &StudentAnswers) -> Result<(), StorageError> {
        *self.record.write().await = Some(answers.clone());
        Ok(())
    }

    async fn load(&self) -> Result<Option<StudentAnswers>, StorageError> {
        Ok(self.record.read().await.clone())
    }
}
