//! File-based storage backend: the whole record as one pretty-printed JSON
//! document.
//!
//! Each save writes its own uniquely named temp file in the target directory
//! and renames it over the target, so a reader never observes a half-written
//! record and overlapping saves never share a temp file. The last rename wins.

use async_trait::async_trait;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use treatorhell_core::error::StorageError;
use treatorhell_core::storage::{StorageBackend, StudentAnswers};

/// A file-backed store holding a single [`StudentAnswers`] record.
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    /// Create a backend at `path`. Nothing touches the disk until the first save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

/// Write `content` to a fresh temp file in `dir`, then atomically move it to `path`.
fn replace_atomically(dir: &Path, path: &Path, content: &[u8]) -> Result<(), StorageError> {
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| {
        StorageError::Write(format!("Failed to create temp file in {}: {e}", dir.display()))
    })?;
    tmp.write_all(content)
        .and_then(|()| tmp.as_file().sync_all())
        .map_err(|e| StorageError::Write(format!("Failed to write {}: {e}", tmp.path().display())))?;
    tmp.persist(path)
        .map_err(|e| StorageError::Write(format!("Failed to replace {}: {e}", path.display())))?;
    Ok(())
}

#[async_trait]
impl StorageBackend for FileBackend {
    fn name(&self) -> &str {
        "file"
    }

    async fn save(&self, answers: &StudentAnswers) -> Result<(), StorageError> {
        let dir = match self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    StorageError::Write(format!("Failed to create {}: {e}", parent.display()))
                })?;
                parent.to_path_buf()
            }
            None => PathBuf::from("."),
        };

        let content = serde_json::to_string_pretty(answers)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        let path = self.path.clone();
        tokio::task::spawn_blocking(move || replace_atomically(&dir, &path, content.as_bytes()))
            .await
            .map_err(|e| StorageError::Write(format!("Save task failed: {e}")))??;

        info!(backend = "file", path = %self.path.display(), "student_responses_saved");
        Ok(())
    }

    async fn load(&self) -> Result<Option<StudentAnswers>, StorageError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No student responses file yet");
                return Ok(None);
            }
            Err(e) => {
                return Err(StorageError::Read(format!(
                    "Failed to read {}: {e}",
                    self.path.display()
                )));
            }
        };

        let answers = serde_json::from_str(&content)
            .map_err(|e| StorageError::Serialization(format!("{}: {e}", self.path.display())))?;

        debug!(backend = "file", path = %self.path.display(), "student_responses_loaded");
        Ok(Some(answers))
    }
}
