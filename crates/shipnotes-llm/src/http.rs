//! HTTP completion client
//!
//! Talks to an OpenAI/OpenRouter-compatible `/chat/completions` endpoint.
//! The client performs exactly one POST per call with no retries. Requests are
//! unbounded unless [`CompletionConfig::timeout_secs`] is set.
//!
//! # Examples
//!
//! ```no_run
//! use shipnotes_llm::{CompletionConfig, HttpCompletionClient};
//!
//! let config = CompletionConfig {
//!     api_key: "sk-...".to_string(),
//!     ..CompletionConfig::default()
//! };
//! let client = HttpCompletionClient::new(config).unwrap();
//! ```

use crate::types::RawCompletionResponse;
use crate::{CompletionClient, CompletionRequest, CompletionResponse, LlmError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Default completion API base URL
pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// Immutable client configuration, built once per run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionConfig {
    /// Base URL; `/chat/completions` is appended
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Bearer token, omitted from the request when empty
    #[serde(default)]
    pub api_key: String,

    /// Default `HTTP-Referer` header
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_referer: Option<String>,

    /// Default `X-Title` header
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Request timeout in seconds; unset leaves requests unbounded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: String::new(),
            http_referer: None,
            title: None,
            timeout_secs: None,
        }
    }
}

impl CompletionConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.base_url.trim().is_empty() {
            return Err("base_url must not be empty".to_string());
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(format!("base_url must be an http(s) URL, got '{}'", self.base_url));
        }
        if self.timeout_secs == Some(0) {
            return Err("timeout_secs must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Full URL of the completions endpoint
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

/// Completion client backed by `reqwest`
pub struct HttpCompletionClient {
    config: CompletionConfig,
    url: String,
    client: reqwest::Client,
}

impl HttpCompletionClient {
    /// Create a client from an immutable configuration
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::Config`] if the configuration is invalid or the
    /// underlying HTTP client cannot be built.
    pub fn new(config: CompletionConfig) -> Result<Self, LlmError> {
        config.validate().map_err(LlmError::Config)?;

        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| LlmError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            url: config.completions_url(),
            config,
            client,
        })
    }

    /// The configuration this client was built with
    pub fn config(&self) -> &CompletionConfig {
        &self.config
    }
}

#[async_trait]
impl CompletionClient for HttpCompletionClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let mut builder = self.client.post(&self.url).json(request);

        if !self.config.api_key.is_empty() {
            builder = builder.bearer_auth(&self.config.api_key);
        }
        let referer = request
            .headers
            .http_referer
            .as_ref()
            .or(self.config.http_referer.as_ref());
        if let Some(referer) = referer {
            builder = builder.header("HTTP-Referer", referer);
        }
        let title = request.headers.title.as_ref().or(self.config.title.as_ref());
        if let Some(title) = title {
            builder = builder.header("X-Title", title);
        }

        debug!("POST {} (model: {})", self.url, request.model);

        let response = builder
            .send()
            .await
            .map_err(|e| LlmError::Communication(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(LlmError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let raw: RawCompletionResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        let choice = raw
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::InvalidResponse("Response contained no choices".to_string()))?;

        Ok(CompletionResponse {
            content: choice.message.content.unwrap_or_default(),
            usage: raw.usage,
        })
    }
}
