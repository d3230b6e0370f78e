//! Progress reporting types

use shipnotes_domain::{Message, Release};

/// Snapshot handed to the progress callback after each message
#[derive(Debug, Clone, Copy)]
pub struct ExtractionProgress<'a> {
    /// Every release extracted so far in this batch, in message order
    pub releases: &'a [Release],
    /// Message that was just processed
    pub message: &'a Message,
    /// Zero-based index of `message` in the batch
    pub index: usize,
    /// Batch size
    pub total: usize,
}

impl ExtractionProgress<'_> {
    /// Whether this is the last message of the batch
    pub fn is_last(&self) -> bool {
        self.index + 1 == self.total
    }
}
