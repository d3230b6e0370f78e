//! Persisted dedup state

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Set of message ids that have already been through extraction
///
/// Serialized as `{ "processedIds": [...] }`. The set only grows; pruning is
/// somebody else's job.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedState {
    /// Processed message ids, kept sorted for stable snapshots
    #[serde(default)]
    pub processed_ids: BTreeSet<String>,
}

impl ProcessedState {
    /// Whether `id` has been processed
    pub fn contains(&self, id: &str) -> bool {
        self.processed_ids.contains(id)
    }

    /// Number of processed ids
    pub fn len(&self) -> usize {
        self.processed_ids.len()
    }

    /// Whether no ids have been processed yet
    pub fn is_empty(&self) -> bool {
        self.processed_ids.is_empty()
    }
}
