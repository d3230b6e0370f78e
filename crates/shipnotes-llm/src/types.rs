//! Wire types for the chat-completion endpoint

use serde::{Deserialize, Serialize};

/// A single chat message in the request body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Speaker role, always `user` for extraction
    pub role: String,
    /// Message content
    pub content: String,
}

impl ChatMessage {
    /// Create a `user` message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Outbound header overrides for one request
///
/// `None` means "use the client's configured value".
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HeaderOverrides {
    /// `HTTP-Referer`
    pub http_referer: Option<String>,
    /// `X-Title`
    pub title: Option<String>,
}

/// Request body sent to `/chat/completions`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    /// Model identifier
    pub model: String,

    /// Completion token budget
    pub max_tokens: u32,

    /// Conversation, a single user turn for extraction
    pub messages: Vec<ChatMessage>,

    /// Sampling temperature
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,

    /// Nucleus sampling parameter
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,

    /// Header overrides, not part of the JSON body
    #[serde(skip)]
    pub headers: HeaderOverrides,
}

impl CompletionRequest {
    /// Build a request with a single user message and no sampling overrides
    pub fn user_prompt(
        model: impl Into<String>,
        max_tokens: u32,
        content: impl Into<String>,
    ) -> Self {
        Self {
            model: model.into(),
            max_tokens,
            messages: vec![ChatMessage::user(content)],
            temperature: None,
            top_p: None,
            headers: HeaderOverrides::default(),
        }
    }
}

/// Token accounting reported by the endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Tokens in the prompt
    #[serde(default)]
    pub prompt_tokens: u64,
    /// Tokens generated
    #[serde(default)]
    pub completion_tokens: u64,
    /// Sum of both
    #[serde(default)]
    pub total_tokens: u64,
}

/// The assistant reply extracted from a success response
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompletionResponse {
    /// Text of the first choice
    pub content: String,
    /// Usage block, when the endpoint sent one
    pub usage: Option<TokenUsage>,
}

#[derive(Deserialize)]
pub(crate) struct RawCompletionResponse {
    #[serde(default)]
    pub choices: Vec<RawChoice>,
    #[serde(default)]
    pub usage: Option<TokenUsage>,
}

#[derive(Deserialize)]
pub(crate) struct RawChoice {
    pub message: RawChoiceMessage,
}

#[derive(Deserialize)]
pub(crate) struct RawChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}
