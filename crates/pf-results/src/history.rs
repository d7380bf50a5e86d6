//! Append-only prognoser history in JSON lines.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::types::ProgData;
use crate::{ResultsError, ResultsResult};

/// One saved snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// RFC 3339 wall-clock time of the save
    pub saved_at: String,
    pub data: ProgData,
}

/// History file at `<dir>/<type>_<id>.jsonl`.
#[derive(Debug, Clone)]
pub struct HistoryFile {
    path: PathBuf,
}

impl HistoryFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn for_prognoser(dir: &Path, prognoser: &str, unique_id: &str) -> ResultsResult<Self> {
        if prognoser.is_empty() || unique_id.is_empty() {
            return Err(ResultsError::InvalidPath {
                message: "prognoser type and id must not be empty".to_string(),
            });
        }
        Ok(Self::new(dir.join(format!("{prognoser}_{unique_id}.jsonl"))))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    pub fn append(&self, data: &ProgData) -> ResultsResult<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent)?;
        }
        let entry = HistoryEntry {
            saved_at: chrono::Utc::now().to_rfc3339(),
            data: data.clone(),
        };
        let mut line = serde_json::to_string(&entry)?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;
        Ok(())
    }

    /// All readable entries; malformed lines are skipped with a warning.
    pub fn load_all(&self) -> ResultsResult<Vec<HistoryEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&self.path)?;
        let mut entries = Vec::new();
        for (number, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<HistoryEntry>(line) {
                Ok(entry) => entries.push(entry),
                Err(e) => tracing::warn!(
                    path = %self.path.display(),
                    line = number + 1,
                    error = %e,
                    "skipping malformed history entry"
                ),
            }
        }
        Ok(entries)
    }

    pub fn load_last(&self) -> ResultsResult<Option<HistoryEntry>> {
        Ok(self.load_all()?.pop())
    }

    /// Move the current file aside as `<file>_old<unix-seconds>`.
    ///
    /// Returns the new path, or `None` when there was nothing to move.
    pub fn reset(&self) -> ResultsResult<Option<PathBuf>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let mut renamed = self.path.clone().into_os_string();
        renamed.push(format!("_old{}", chrono::Utc::now().timestamp()));
        let renamed = PathBuf::from(renamed);
        fs::rename(&self.path, &renamed)?;
        tracing::debug!(from = %self.path.display(), to = %renamed.display(), "reset history");
        Ok(Some(renamed))
    }
}
