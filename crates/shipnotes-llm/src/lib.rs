//! Shipnotes LLM Layer
//!
//! Chat-completion plumbing for the extractor.
//!
//! # Architecture
//!
//! The [`CompletionClient`] trait is the seam between the extraction engine
//! and the network. One request carries one user message; the client returns
//! the assistant text plus token usage.
//!
//! # Clients
//!
//! - [`HttpCompletionClient`]: OpenAI/OpenRouter-compatible `/chat/completions`
//! - [`MockProvider`]: scripted responses for deterministic tests
//!
//! # Examples
//!
//! ```
//! use shipnotes_llm::{CompletionClient, CompletionRequest, MockProvider};
//!
//! # async fn example() {
//! let provider = MockProvider::new("[]");
//! let request = CompletionRequest::user_prompt("some-model", 1024, "hello");
//! let response = provider.complete(&request).await.unwrap();
//! assert_eq!(response.content, "[]");
//! # }
//! ```

#![warn(missing_docs)]

pub mod http;
mod mock;
mod types;

use async_trait::async_trait;
use thiserror::Error;

pub use http::{CompletionConfig, HttpCompletionClient};
pub use mock::MockProvider;
pub use types::{
    ChatMessage, CompletionRequest, CompletionResponse, HeaderOverrides, TokenUsage,
};

/// Errors that can occur while talking to the completion endpoint
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LlmError {
    /// The endpoint answered with a non-success status
    #[error("HTTP {status}: {body}")]
    Http {
        /// HTTP status code
        status: u16,
        /// Response body text
        body: String,
    },

    /// Network or connection failure before a response arrived
    #[error("Communication error: {0}")]
    Communication(String),

    /// A success response that does not match the wire contract
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Client could not be constructed from its configuration
    #[error("Client configuration error: {0}")]
    Config(String),
}

impl LlmError {
    /// HTTP status carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            LlmError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// A chat-completion endpoint
///
/// Implementations issue exactly one request per call and never retry.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Send one completion request and return the assistant's reply
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError>;
}

