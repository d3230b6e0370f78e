//! Prompt resolution and request-prompt assembly

use crate::config::RegistryMode;
use crate::error::ExtractorError;
use crate::registry::{PromptRegistry, RegistryPrompt};
use serde_json::Value;
use shipnotes_domain::PromptSpec;
use tracing::{debug, info, warn};

/// Resolves the extraction prompt for a task, once per batch
///
/// In [`RegistryMode::Required`] a missing registry entry is fatal: silently
/// substituting another extraction policy would change release quality in
/// ways nobody downstream can see. [`RegistryMode::Builtin`] skips the
/// registry entirely.
pub struct PromptResolver {
    mode: RegistryMode,
    registry: Option<Box<dyn PromptRegistry>>,
}

impl PromptResolver {
    /// Resolver that must obtain prompts from `registry`
    pub fn required(registry: impl PromptRegistry + 'static) -> Self {
        Self {
            mode: RegistryMode::Required,
            registry: Some(Box::new(registry)),
        }
    }

    /// Resolver that always returns the built-in default prompt
    pub fn builtin() -> Self {
        Self {
            mode: RegistryMode::Builtin,
            registry: None,
        }
    }

    /// Resolver for `mode` with an optional registry
    ///
    /// A required-mode resolver without a registry fails on first resolve.
    pub fn from_mode(mode: RegistryMode, registry: Option<Box<dyn PromptRegistry>>) -> Self {
        Self { mode, registry }
    }

    /// The mode this resolver runs in
    pub fn mode(&self) -> RegistryMode {
        self.mode
    }

    /// Resolve `task_name` into a [`PromptSpec`]
    ///
    /// # Errors
    ///
    /// [`ExtractorError::Configuration`] when the registry is required but
    /// missing, fails, has no entry for `task_name`, or holds an empty prompt.
    pub async fn resolve(&self, task_name: &str) -> Result<PromptSpec, ExtractorError> {
        match self.mode {
            RegistryMode::Builtin => {
                debug!("Using built-in prompt for task '{}'", task_name);
                Ok(PromptSpec::new(DEFAULT_PROMPT))
            }
            RegistryMode::Required => {
                let registry = self.registry.as_ref().ok_or_else(|| {
                    ExtractorError::Configuration(
                        "Prompt registry is required but none is configured".to_string(),
                    )
                })?;

                let prompt = registry
                    .get_prompt_with_config(task_name)
                    .await?
                    .ok_or_else(|| {
                        ExtractorError::Configuration(format!(
                            "Prompt '{}' not found in registry; \
                             refusing to fall back to the built-in prompt",
                            task_name
                        ))
                    })?;

                if prompt.prompt_text.trim().is_empty() {
                    return Err(ExtractorError::Configuration(format!(
                        "Prompt '{}' in registry is empty",
                        task_name
                    )));
                }

                info!("Resolved prompt '{}' from registry", task_name);
                Ok(spec_from_registry(prompt))
            }
        }
    }
}

/// Map a registry prompt onto a [`PromptSpec`], ignoring unrecognized keys
pub fn spec_from_registry(prompt: RegistryPrompt) -> PromptSpec {
    let mut spec = PromptSpec::new(prompt.prompt_text);

    for (key, value) in &prompt.config {
        match key.as_str() {
            "model" => spec.model = config_string(key, value),
            "max_tokens" => {
                spec.max_tokens = config_number(key, value).and_then(|n| {
                    if n >= 1.0 && n.fract() == 0.0 && n <= u32::MAX as f64 {
                        Some(n as u32)
                    } else {
                        warn!(
                            "Ignoring prompt config 'max_tokens' = {}: not a positive integer",
                            n
                        );
                        None
                    }
                })
            }
            "temperature" => spec.temperature = config_number(key, value),
            "top_p" => spec.top_p = config_number(key, value),
            "http_referer" => spec.http_referer = config_string(key, value),
            "title" => spec.title = config_string(key, value),
            _ => debug!("Ignoring unrecognized prompt config key '{}'", key),
        }
    }

    spec
}

fn config_string(key: &str, value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        _ => {
            warn!("Ignoring prompt config '{}': expected a non-empty string", key);
            None
        }
    }
}

fn config_number(key: &str, value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    if number.is_none() {
        warn!("Ignoring prompt config '{}': expected a number", key);
    }
    number
}

/// Full user-turn content: instructions followed by the normalized message
pub fn build_prompt(spec: &PromptSpec, normalized_message: &str) -> String {
    let mut prompt = String::with_capacity(spec.prompt_text.len() + normalized_message.len() + 2);
    prompt.push_str(spec.prompt_text.trim_end());
    prompt.push_str("\n\n");
    prompt.push_str(normalized_message);
    prompt
}

/// Built-in extraction instructions, used only in builtin mode
pub const DEFAULT_PROMPT: &str = r#"You read messages from a team's release announcement channel
and extract shipped changes.

For the message below (and its thread replies), return every release it announces.
Each release is an object:

{
  "date": "YYYY-MM-DD",
  "title": "short name of what shipped, e.g. a product or version",
  "description": "one or two sentences on what changed",
  "sourceMessageId": "the id in square brackets of the message that announced it",
  "whyThisMatters": "optional: why users should care",
  "impact": "optional: who or what is affected"
}

Rules:
- Use the date shown next to the announcing message
- Thread replies may add detail but are not releases on their own
- Ignore chatter, questions, reminders and anything that did not ship
- If the message announces nothing, return []

Output format: a JSON array only. No markdown, no code fences, no headings, no explanations."#;
