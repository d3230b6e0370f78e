//! Core extraction engine

use crate::config::ExtractorConfig;
use crate::error::ExtractorError;
use crate::normalize::normalize_message;
use crate::observe::{
    GenerationEnd, GenerationLevel, GenerationObserver, GenerationStart, NoopObserver, TraceStart,
};
use crate::parser::parse_llm_response;
use crate::prompt::{build_prompt, PromptResolver};
use crate::types::ExtractionProgress;
use serde_json::Value;
use shipnotes_domain::{Message, PromptSpec, Release};
use shipnotes_llm::{ChatMessage, CompletionClient, CompletionRequest, HeaderOverrides};
use std::collections::{BTreeMap, HashSet};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Drives one completion request per message and collects the releases
///
/// Messages are processed strictly one at a time, in order; the engine never
/// has two requests in flight. Any failure aborts the whole batch and nothing
/// extracted so far is returned.
pub struct ExtractionEngine<C>
where
    C: CompletionClient,
{
    client: C,
    resolver: PromptResolver,
    observer: Box<dyn GenerationObserver>,
    config: ExtractorConfig,
}

/// Model settings fixed for the duration of one batch
struct BatchSettings {
    spec: PromptSpec,
    model: String,
    max_tokens: u32,
}

impl<C> ExtractionEngine<C>
where
    C: CompletionClient,
{
    /// Create an engine without observability
    pub fn new(client: C, resolver: PromptResolver, config: ExtractorConfig) -> Self {
        Self {
            client,
            resolver,
            observer: Box::new(NoopObserver),
            config,
        }
    }

    /// Attach an observer
    pub fn with_observer(mut self, observer: impl GenerationObserver + 'static) -> Self {
        self.observer = Box::new(observer);
        self
    }

    /// Engine configuration
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Extract releases from `messages`
    pub async fn extract(&self, messages: &[Message]) -> Result<Vec<Release>, ExtractorError> {
        self.extract_with_progress(messages, |_| Ok(())).await
    }

    /// Extract releases, calling `on_progress` after every message
    ///
    /// The callback runs synchronously between requests and may do I/O such
    /// as incremental persistence. Its errors abort the batch.
    ///
    /// # Errors
    ///
    /// - [`ExtractorError::Configuration`] if the prompt cannot be resolved
    /// - [`ExtractorError::Transport`] if a completion request fails
    /// - [`ExtractorError::Parse`] / [`ExtractorError::Format`] if model output is unusable
    /// - [`ExtractorError::Progress`] if the callback fails
    pub async fn extract_with_progress<F>(
        &self,
        messages: &[Message],
        mut on_progress: F,
    ) -> Result<Vec<Release>, ExtractorError>
    where
        F: FnMut(&ExtractionProgress<'_>) -> anyhow::Result<()>,
    {
        if messages.is_empty() {
            info!("No messages to extract");
            return Ok(Vec::new());
        }

        let spec = self.resolver.resolve(&self.config.task_name).await?;
        let settings = BatchSettings {
            model: spec
                .model
                .clone()
                .unwrap_or_else(|| self.config.default_model.clone()),
            max_tokens: spec.max_tokens.unwrap_or(self.config.default_max_tokens),
            spec,
        };

        info!(
            "Starting extraction of {} messages with model '{}'",
            messages.len(),
            settings.model
        );

        let observing = self.observer.is_enabled();
        if observing {
            self.observer.trace_start(&TraceStart {
                message_count: messages.len(),
                model: settings.model.clone(),
            });
        }

        let start = Instant::now();
        let result = self
            .run_batch(messages, &settings, observing, &mut on_progress)
            .await;

        if observing {
            self.observer.flush();
        }

        match &result {
            Ok(releases) => info!(
                "Extraction complete: {} releases from {} messages in {} ms",
                releases.len(),
                messages.len(),
                start.elapsed().as_millis()
            ),
            Err(e) => warn!("Extraction aborted: {}", e),
        }

        result
    }

    async fn run_batch<F>(
        &self,
        messages: &[Message],
        settings: &BatchSettings,
        observing: bool,
        on_progress: &mut F,
    ) -> Result<Vec<Release>, ExtractorError>
    where
        F: FnMut(&ExtractionProgress<'_>) -> anyhow::Result<()>,
    {
        let mut releases: Vec<Release> = Vec::new();

        for (index, message) in messages.iter().enumerate() {
            debug!("Processing message {}/{} ({})", index + 1, messages.len(), message.id);

            let extracted = self.extract_one(message, settings, observing).await?;

            for release in unmatched_sources(&extracted, messages) {
                warn!(
                    "Release '{}' from message {} references unknown source message '{}'",
                    release.title, message.id, release.source_message_id
                );
            }
            releases.extend(extracted);

            on_progress(&ExtractionProgress {
                releases: &releases,
                message,
                index,
                total: messages.len(),
            })
            .map_err(|e| ExtractorError::Progress(format!("{:#}", e)))?;
        }

        Ok(releases)
    }

    /// One request/response cycle for a single message
    async fn extract_one(
        &self,
        message: &Message,
        settings: &BatchSettings,
        observing: bool,
    ) -> Result<Vec<Release>, ExtractorError> {
        let content = build_prompt(&settings.spec, &normalize_message(message));
        let request = CompletionRequest {
            model: settings.model.clone(),
            max_tokens: settings.max_tokens,
            messages: vec![ChatMessage::user(content)],
            temperature: settings.spec.temperature,
            top_p: settings.spec.top_p,
            headers: HeaderOverrides {
                http_referer: settings.spec.http_referer.clone(),
                title: settings.spec.title.clone(),
            },
        };

        if observing {
            self.observer.generation_start(&GenerationStart {
                message_id: message.id.clone(),
                model: request.model.clone(),
                model_parameters: model_parameters(&request),
                input: request.messages[0].content.clone(),
            });
        }

        let response = match self.client.complete(&request).await {
            Ok(response) => response,
            Err(e) => {
                if observing {
                    self.observer.generation_end(&GenerationEnd::Failure {
                        message_id: message.id.clone(),
                        level: GenerationLevel::Error,
                        status_message: e.to_string(),
                    });
                }
                return Err(e.into());
            }
        };

        debug!("LLM response length: {} chars", response.content.len());

        match parse_llm_response(&response.content) {
            Ok(releases) => {
                if observing {
                    self.observer.generation_end(&GenerationEnd::Success {
                        message_id: message.id.clone(),
                        output: response.content,
                        usage: response.usage,
                    });
                }
                debug!("Parsed {} releases from message {}", releases.len(), message.id);
                Ok(releases)
            }
            Err(e) => {
                if observing {
                    self.observer.generation_end(&GenerationEnd::Failure {
                        message_id: message.id.clone(),
                        level: GenerationLevel::Warning,
                        status_message: e.to_string(),
                    });
                }
                Err(e)
            }
        }
    }
}

fn model_parameters(request: &CompletionRequest) -> BTreeMap<String, Value> {
    let mut params = BTreeMap::new();
    params.insert("max_tokens".to_string(), Value::from(request.max_tokens));
    if let Some(temperature) = request.temperature {
        params.insert("temperature".to_string(), Value::from(temperature));
    }
    if let Some(top_p) = request.top_p {
        params.insert("top_p".to_string(), Value::from(top_p));
    }
    params
}

/// Releases whose `sourceMessageId` names no message in `messages`
pub fn unmatched_sources<'a>(releases: &'a [Release], messages: &[Message]) -> Vec<&'a Release> {
    let ids: HashSet<&str> = messages.iter().map(|m| m.id.as_str()).collect();
    releases
        .iter()
        .filter(|r| !ids.contains(r.source_message_id.as_str()))
        .collect()
}
