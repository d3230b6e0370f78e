//! Observability capability for generations
//!
//! The engine always holds a [`GenerationObserver`]; "no observability" is
//! [`NoopObserver`], not an `Option`. Observers only see events and can never
//! change what an extraction returns.

use serde_json::Value;
use shipnotes_llm::TokenUsage;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{info, warn};

/// Emitted once per batch before any generation
#[derive(Debug, Clone, PartialEq)]
pub struct TraceStart {
    /// Number of messages in the batch
    pub message_count: usize,
    /// Model the batch will use
    pub model: String,
}

/// Emitted before each completion request
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationStart {
    /// Message being extracted
    pub message_id: String,
    /// Model identifier
    pub model: String,
    /// `max_tokens`, `temperature`, `top_p` as sent
    pub model_parameters: BTreeMap<String, Value>,
    /// Full user-turn content
    pub input: String,
}

/// Severity of a failed generation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationLevel {
    /// The request itself failed
    Error,
    /// The model answered but the output was unusable
    Warning,
}

impl fmt::Display for GenerationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationLevel::Error => write!(f, "ERROR"),
            GenerationLevel::Warning => write!(f, "WARNING"),
        }
    }
}

/// Emitted after each completion request
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationEnd {
    /// Request succeeded and output parsed
    Success {
        /// Message being extracted
        message_id: String,
        /// Raw model output
        output: String,
        /// Token usage, if the endpoint reported it
        usage: Option<TokenUsage>,
    },
    /// Request or parse failed
    Failure {
        /// Message being extracted
        message_id: String,
        /// Severity
        level: GenerationLevel,
        /// Human-readable cause
        status_message: String,
    },
}

impl GenerationEnd {
    /// Message this event belongs to
    pub fn message_id(&self) -> &str {
        match self {
            GenerationEnd::Success { message_id, .. }
            | GenerationEnd::Failure { message_id, .. } => message_id,
        }
    }
}

/// Side-channel receiver of trace and generation events
///
/// Every method defaults to a no-op.
pub trait GenerationObserver: Send + Sync {
    /// Whether the observer wants events at all
    fn is_enabled(&self) -> bool {
        true
    }

    /// A batch is starting
    fn trace_start(&self, _event: &TraceStart) {}

    /// A completion request is about to be sent
    fn generation_start(&self, _event: &GenerationStart) {}

    /// A completion request finished
    fn generation_end(&self, _event: &GenerationEnd) {}

    /// Deliver buffered events
    fn flush(&self) {}
}

/// Observer used when observability is absent
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl GenerationObserver for NoopObserver {
    fn is_enabled(&self) -> bool {
        false
    }
}

/// Observer that writes events as `tracing` records
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl GenerationObserver for TracingObserver {
    fn trace_start(&self, event: &TraceStart) {
        info!(
            target: "shipnotes::observability",
            message_count = event.message_count,
            model = %event.model,
            "trace start"
        );
    }

    fn generation_start(&self, event: &GenerationStart) {
        info!(
            target: "shipnotes::observability",
            message_id = %event.message_id,
            model = %event.model,
            input_chars = event.input.len(),
            "generation start"
        );
    }

    fn generation_end(&self, event: &GenerationEnd) {
        match event {
            GenerationEnd::Success { message_id, output, usage } => {
                let usage = usage.unwrap_or_default();
                info!(
                    target: "shipnotes::observability",
                    message_id = %message_id,
                    output_chars = output.len(),
                    prompt_tokens = usage.prompt_tokens,
                    completion_tokens = usage.completion_tokens,
                    total_tokens = usage.total_tokens,
                    "generation end"
                );
            }
            GenerationEnd::Failure { message_id, level, status_message } => {
                warn!(
                    target: "shipnotes::observability",
                    message_id = %message_id,
                    severity = %level,
                    status = %status_message,
                    "generation failed"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noop_is_disabled() {
        assert!(!NoopObserver.is_enabled());
        assert!(TracingObserver.is_enabled());
    }

    #[test]
    fn test_level_display() {
        assert_eq!(GenerationLevel::Error.to_string(), "ERROR");
        assert_eq!(GenerationLevel::Warning.to_string(), "WARNING");
    }

    #[test]
    fn test_generation_end_message_id() {
        let end = GenerationEnd::Failure {
            message_id: "m1".to_string(),
            level: GenerationLevel::Error,
            status_message: "HTTP 500".to_string(),
        };
        assert_eq!(end.message_id(), "m1");
    }

    #[test]
    fn test_tracing_observer_accepts_all_events() {
        let observer = TracingObserver;
        observer.trace_start(&TraceStart {
            message_count: 2,
            model: "m".to_string(),
        });
        observer.generation_end(&GenerationEnd::Success {
            message_id: "m1".to_string(),
            output: "[]".to_string(),
            usage: None,
        });
        observer.flush();
    }
}
