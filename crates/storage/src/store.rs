//! Backend selection and the context store facade used by request handlers.

use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};
use treatorhell_config::StorageConfig;
use treatorhell_core::error::{StorageError, ValidationError};
use treatorhell_core::storage::{StorageBackend, StudentAnswers};

use crate::file_backend::FileBackend;
use crate::upstash::UpstashBackend;

/// Pick the backend once at startup.
///
/// Remote credentials (URL and token) select Upstash. If the Upstash client
/// cannot be built, the file backend is used for the rest of the process.
pub fn select_backend(config: &StorageConfig) -> Arc<dyn StorageBackend> {
    if let Some((url, token)) = config.remote_credentials() {
        match UpstashBackend::new(url, token) {
            Ok(backend) => {
                info!(backend = "redis", host = backend.host(), "storage_backend_selected");
                return Arc::new(backend);
            }
            Err(e) => {
                warn!(error = %e, "redis_init_failed_falling_back_to_file");
            }
        }
    }

    info!(backend = "file", path = %config.path.display(), "storage_backend_selected");
    Arc::new(FileBackend::new(&config.path))
}

/// Why a submission was not stored.
#[derive(Debug, Error)]
pub enum SaveError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Cheap-to-clone handle over the selected backend.
///
/// Saving propagates failures. Loading never does: an unreadable store is
/// logged and reported as "no context".
#[derive(Clone)]
pub struct ContextStore {
    backend: Arc<dyn StorageBackend>,
}

impl ContextStore {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(select_backend(config))
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Validate `answers` and replace the stored record with them.
    pub async fn save(&self, answers: &StudentAnswers) -> Result<(), SaveError> {
        answers.validate()?;

        if let Err(e) = self.backend.save(answers).await {
            warn!(backend = self.backend.name(), error = %e, "student_responses_save_failed");
            return Err(e.into());
        }
        Ok(())
    }

    /// The stored record, or `None` when absent or unreadable.
    pub async fn load(&self) -> Option<StudentAnswers> {
        match self.backend.load().await {
            Ok(record) => record,
            Err(e) => {
                warn!(backend = self.backend.name(), error = %e, "student_responses_load_failed");
                None
            }
        }
    }
}
