//! Error types for the extraction pipeline

use shipnotes_llm::LlmError;
use thiserror::Error;

/// Errors that can occur during extraction
///
/// None of these are downgraded internally: every variant aborts the current
/// batch and reaches the caller.
#[derive(Error, Debug)]
pub enum ExtractorError {
    /// Required prompt or registry entry missing, or invalid configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The completion endpoint failed or answered with a non-success status
    #[error("{}", transport_message(.status, .body))]
    Transport {
        /// HTTP status, absent when no response arrived
        status: Option<u16>,
        /// Response body text or transport failure description
        body: String,
    },

    /// Model output is not recoverable JSON
    #[error("Parse error: model output was not recoverable JSON ({0})")]
    Parse(String),

    /// Model output is prose/markdown rather than JSON
    #[error(
        "Format error: the model returned markdown/prose instead of a JSON array ({0}). \
         Fix the extraction prompt so it demands a bare JSON array; the parser cannot salvage this."
    )]
    Format(String),

    /// Progress callback failed
    #[error("Progress callback failed: {0}")]
    Progress(String),

    /// Dedup state could not be read or written
    #[error("Processed-state error: {0}")]
    State(String),

    /// JSON encoding error
    #[error("JSON error: {0}")]
    Json(String),
}

fn transport_message(status: &Option<u16>, body: &str) -> String {
    match status {
        Some(status) => format!(
            "Transport error: completion endpoint returned HTTP {}: {}",
            status, body
        ),
        None => format!("Transport error: {}", body),
    }
}

impl From<LlmError> for ExtractorError {
    fn from(e: LlmError) -> Self {
        match e {
            LlmError::Http { status, body } => ExtractorError::Transport {
                status: Some(status),
                body,
            },
            LlmError::Config(msg) => ExtractorError::Configuration(msg),
            other => ExtractorError::Transport {
                status: None,
                body: other.to_string(),
            },
        }
    }
}

impl From<serde_json::Error> for ExtractorError {
    fn from(e: serde_json::Error) -> Self {
        ExtractorError::Json(e.to_string())
    }
}
