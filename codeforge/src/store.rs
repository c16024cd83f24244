use std::path::{Path, PathBuf};

use derive_more::From;
use serde::{Deserialize, Serialize};
use stylus::{Payload, ProgressSink};
use thiserror::Error;

#[derive(Debug, From, Error)]
pub enum StoreError {
    #[error("Invalid {kind} '{value}': only letters, digits, '-', '_' and '.' are allowed")]
    #[from(skip)]
    InvalidId { kind: &'static str, value: String },

    #[error("Failed to access progress files: {0}")]
    Io(std::io::Error),

    #[error("Failed to read progress record '{path}': {error}")]
    #[from(skip)]
    Deserialize {
        path: PathBuf,
        error: toml::de::Error,
    },

    #[error("Failed to write progress record: {0}")]
    Serialize(toml::ser::Error),
}

/// The stored progress of one learner on one lesson
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ProgressRecord {
    pub lesson_id: String,
    pub user_id: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl ProgressRecord {
    fn new(lesson_id: &str, user_id: &str) -> Self {
        Self {
            lesson_id: lesson_id.to_string(),
            user_id: user_id.to_string(),
            completed: false,
            code: None,
        }
    }
}

/// Progress records on disk, one file per learner and lesson
///
/// Layout: `<directory>/<user_id>/<lesson_id>.toml`
#[derive(Debug, Clone)]
pub struct ProgressStore {
    directory: PathBuf,
}

impl ProgressStore {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    /// The record for a lesson, if the learner has one
    pub fn load(&self, lesson_id: &str, user_id: &str) -> Result<Option<ProgressRecord>, StoreError> {
        let path = self.record_path(lesson_id, user_id)?;
        if !path.exists() {
            return Ok(None);
        }

        read_record(&path).map(Some)
    }

    /// Apply a payload to the record, creating it when missing
    pub fn save(&self, lesson_id: &str, user_id: &str, payload: Payload) -> Result<(), StoreError> {
        let path = self.record_path(lesson_id, user_id)?;

        let mut record = if path.exists() {
            read_record(&path)?
        } else {
            ProgressRecord::new(lesson_id, user_id)
        };

        match payload {
            Payload::Buffer(code) => record.code = Some(code),
            Payload::Completed(completed) => record.completed = completed,
        }

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(&path, toml::to_string(&record)?)?;

        tracing::debug!(lesson = lesson_id, user = user_id, completed = record.completed, "progress saved");

        Ok(())
    }

    /// Ids of every lesson the learner has completed, sorted
    pub fn completed_lessons(&self, user_id: &str) -> Result<Vec<String>, StoreError> {
        validate_id("user id", user_id)?;
        let user_dir = self.directory.join(user_id);
        if !user_dir.exists() {
            return Ok(Vec::new());
        }

        let mut completed = Vec::new();

        for entry in user_dir.read_dir()? {
            let path = entry?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "toml") {
                let record = read_record(&path)?;
                if record.completed {
                    completed.push(record.lesson_id);
                }
            }
        }

        completed.sort();

        Ok(completed)
    }

    fn record_path(&self, lesson_id: &str, user_id: &str) -> Result<PathBuf, StoreError> {
        validate_id("user id", user_id)?;
        validate_id("lesson id", lesson_id)?;

        Ok(self
            .directory
            .join(user_id)
            .join(format!("{lesson_id}.toml")))
    }
}

impl ProgressSink for ProgressStore {
    type Error = StoreError;

    fn save_progress(
        &mut self,
        lesson_id: &str,
        user_id: &str,
        payload: Payload,
    ) -> Result<(), Self::Error> {
        self.save(lesson_id, user_id, payload)
    }
}

fn read_record(path: &Path) -> Result<ProgressRecord, StoreError> {
    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content).map_err(|error| StoreError::Deserialize {
        path: path.to_path_buf(),
        error,
    })
}

/// Ids become path components, so they may not escape the store directory
fn validate_id(kind: &'static str, value: &str) -> Result<(), StoreError> {
    let valid = !value.is_empty()
        && value != "."
        && value != ".."
        && value
            .chars()
            .all(|char| char.is_ascii_alphanumeric() || matches!(char, '-' | '_' | '.'));

    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidId {
            kind,
            value: value.to_string(),
        })
    }
}
