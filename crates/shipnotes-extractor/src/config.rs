//! Configuration for the extraction engine

use serde::{Deserialize, Serialize};

/// How the extraction prompt is obtained for a run
///
/// Chosen once per run, never per message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RegistryMode {
    /// The registry must supply the prompt; a missing entry is fatal
    #[default]
    Required,
    /// Skip the registry and use the built-in default prompt
    Builtin,
}

/// Configuration for the extraction engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// Registry task name of the extraction prompt
    #[serde(default = "default_task_name")]
    pub task_name: String,

    /// Whether the registry is mandatory for this run
    #[serde(default)]
    pub registry_mode: RegistryMode,

    /// Model used when the prompt does not name one
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Completion token budget used when the prompt does not set one
    #[serde(default = "default_max_tokens")]
    pub default_max_tokens: u32,
}

fn default_task_name() -> String {
    "release-extraction".to_string()
}

fn default_model() -> String {
    "anthropic/claude-3.5-sonnet".to_string()
}

fn default_max_tokens() -> u32 {
    4096
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            task_name: default_task_name(),
            registry_mode: RegistryMode::default(),
            default_model: default_model(),
            default_max_tokens: default_max_tokens(),
        }
    }
}

impl ExtractorConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.task_name.trim().is_empty() {
            return Err("task_name must not be empty".to_string());
        }
        if self.default_model.trim().is_empty() {
            return Err("default_model must not be empty".to_string());
        }
        if self.default_max_tokens == 0 {
            return Err("default_max_tokens must be greater than 0".to_string());
        }
        Ok(())
    }
}
