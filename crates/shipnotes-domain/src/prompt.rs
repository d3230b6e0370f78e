//! Resolved extraction prompt and model parameters

use serde::{Deserialize, Serialize};

/// Extraction instructions plus the model parameters to send with them
///
/// Resolved once per batch and immutable for the batch's duration. `None`
/// fields fall back to the client's configured defaults.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PromptSpec {
    /// Instructions prepended to every normalized message
    pub prompt_text: String,

    /// Model identifier override
    #[serde(default)]
    pub model: Option<String>,

    /// Completion token budget override
    #[serde(default)]
    pub max_tokens: Option<u32>,

    /// Sampling temperature
    #[serde(default)]
    pub temperature: Option<f64>,

    /// Nucleus sampling parameter
    #[serde(default)]
    pub top_p: Option<f64>,

    /// `HTTP-Referer` header override for the completion call
    #[serde(default)]
    pub http_referer: Option<String>,

    /// `X-Title` header override for the completion call
    #[serde(default)]
    pub title: Option<String>,
}

impl PromptSpec {
    /// Create a spec carrying only prompt text
    pub fn new(prompt_text: impl Into<String>) -> Self {
        Self {
            prompt_text: prompt_text.into(),
            ..Self::default()
        }
    }
}
