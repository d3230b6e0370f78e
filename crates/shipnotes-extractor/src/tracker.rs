//! Persisted set of already-extracted message ids
//!
//! The tracker is the only component that reads or writes the dedup
//! snapshot. It is loaded once per run and written once, after a batch has
//! completed without error. Two processes racing on the same snapshot is
//! last-writer-wins.

use crate::error::ExtractorError;
use shipnotes_domain::{Message, ProcessedState};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// File-backed dedup tracker
#[derive(Debug)]
pub struct ProcessedSetTracker {
    path: PathBuf,
    state: ProcessedState,
}

impl ProcessedSetTracker {
    /// Create a tracker for the snapshot at `path`; call [`load`](Self::load) before use
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            state: ProcessedState::default(),
        }
    }

    /// Snapshot location
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current in-memory state
    pub fn state(&self) -> &ProcessedState {
        &self.state
    }

    /// Read the persisted snapshot
    ///
    /// A missing snapshot is an empty set, not an error.
    ///
    /// # Errors
    ///
    /// [`ExtractorError::State`] if the file exists but cannot be read or decoded.
    pub fn load(&mut self) -> Result<(), ExtractorError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No processed-state snapshot at {}, starting empty", self.path.display());
                self.state = ProcessedState::default();
                return Ok(());
            }
            Err(e) => {
                return Err(ExtractorError::State(format!(
                    "Failed to read {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        self.state = serde_json::from_str(&contents).map_err(|e| {
            ExtractorError::State(format!("Failed to decode {}: {}", self.path.display(), e))
        })?;

        info!("Loaded {} processed message ids", self.state.len());
        Ok(())
    }

    /// Messages whose ids are not yet processed, in input order
    pub fn filter_unprocessed(&self, messages: &[Message]) -> Vec<Message> {
        messages
            .iter()
            .filter(|m| !self.state.contains(&m.id))
            .cloned()
            .collect()
    }

    /// Whether `id` has been processed
    pub fn is_processed(&self, id: &str) -> bool {
        self.state.contains(id)
    }

    /// Add `ids` to the set and persist the full set in one atomic write
    ///
    /// Only call this after the whole batch extracted without error.
    pub fn mark_processed<I, S>(&mut self, ids: I) -> Result<(), ExtractorError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let before = self.state.len();
        let mut next = self.state.clone();
        next.processed_ids.extend(ids.into_iter().map(Into::into));
        self.persist(&next)?;
        self.state = next;

        info!(
            "Marked {} new message ids processed ({} total)",
            self.state.len() - before,
            self.state.len()
        );
        Ok(())
    }

    /// Write the snapshot to a sibling temp file and rename it into place
    fn persist(&self, state: &ProcessedState) -> Result<(), ExtractorError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir).map_err(|e| {
            ExtractorError::State(format!("Failed to create {}: {}", dir.display(), e))
        })?;

        let json = serde_json::to_string_pretty(state)?;

        let mut tmp = NamedTempFile::new_in(&dir)
            .map_err(|e| ExtractorError::State(format!("Failed to create temp file: {}", e)))?;
        tmp.write_all(json.as_bytes())
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|e| ExtractorError::State(format!("Failed to write snapshot: {}", e)))?;
        tmp.persist(&self.path).map_err(|e| {
            ExtractorError::State(format!("Failed to replace {}: {}", self.path.display(), e))
        })?;

        debug!("Persisted processed-state snapshot to {}", self.path.display());
        Ok(())
    }
}
