//! Scripted completion client for tests

use crate::{CompletionClient, CompletionRequest, CompletionResponse, LlmError, TokenUsage};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Mock completion client for deterministic testing
///
/// Scripted outcomes are consumed in call order; once the script is empty the
/// default response is returned. Every request is recorded so tests can
/// assert on prompt content and call count. Clones share state.
///
/// # Examples
///
/// ```
/// use shipnotes_llm::{CompletionClient, CompletionRequest, LlmError, MockProvider};
///
/// # async fn example() {
/// let provider = MockProvider::new("[]");
/// provider.push_response(r#"[{"title": "v1"}]"#);
/// provider.push_error(LlmError::Http { status: 500, body: "boom".into() });
///
/// let request = CompletionRequest::user_prompt("m", 16, "p");
/// assert!(provider.complete(&request).await.is_ok());
/// assert!(provider.complete(&request).await.is_err());
/// assert_eq!(provider.complete(&request).await.unwrap().content, "[]");
/// assert_eq!(provider.call_count(), 3);
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    default_response: String,
    script: Arc<Mutex<VecDeque<Result<String, LlmError>>>>,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl MockProvider {
    /// Create a mock that answers every request with `response`
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            script: Arc::new(Mutex::new(VecDeque::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queue a successful reply for the next unscripted call
    pub fn push_response(&self, response: impl Into<String>) {
        self.script.lock().unwrap().push_back(Ok(response.into()));
    }

    /// Queue a failure for the next unscripted call
    pub fn push_error(&self, error: LlmError) {
        self.script.lock().unwrap().push_back(Err(error));
    }

    /// Number of `complete` calls so far
    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Every request received, in call order
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("[]")
    }
}

#[async_trait]
impl CompletionClient for MockProvider {
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.requests.lock().unwrap().push(request.clone());

        let outcome = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(self.default_response.clone()));

        outcome.map(|content| {
            let completion_tokens = content.split_whitespace().count() as u64;
            let prompt_tokens = request
                .messages
                .iter()
                .map(|m| m.content.split_whitespace().count() as u64)
                .sum();
            CompletionResponse {
                content,
                usage: Some(TokenUsage {
                    prompt_tokens,
                    completion_tokens,
                    total_tokens: prompt_tokens + completion_tokens,
                }),
            }
        })
    }
}
