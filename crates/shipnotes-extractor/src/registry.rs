//! Prompt registries
//!
//! A registry supplies versioned extraction instructions and model parameters
//! by task name. Operators edit prompts there without touching code.

use crate::error::ExtractorError;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A prompt as stored in a registry: text plus a free-form config mapping
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct RegistryPrompt {
    /// Extraction instructions
    #[serde(rename = "prompt")]
    pub prompt_text: String,

    /// Model parameters and header overrides; unknown keys are ignored
    #[serde(default)]
    pub config: Map<String, Value>,
}

impl RegistryPrompt {
    /// Create a prompt with an empty config mapping
    pub fn new(prompt_text: impl Into<String>) -> Self {
        Self {
            prompt_text: prompt_text.into(),
            config: Map::new(),
        }
    }

    /// Add a config entry
    pub fn with_config(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.config.insert(key.into(), value.into());
        self
    }
}

/// Source of extraction prompts
#[async_trait]
pub trait PromptRegistry: Send + Sync {
    /// Look up `name`; `Ok(None)` means the registry has no such prompt
    async fn get_prompt_with_config(
        &self,
        name: &str,
    ) -> Result<Option<RegistryPrompt>, ExtractorError>;
}

/// Map-backed registry for tests and embedding
#[derive(Debug, Clone, Default)]
pub struct InMemoryPromptRegistry {
    prompts: HashMap<String, RegistryPrompt>,
}

impl InMemoryPromptRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `prompt` under `name`, replacing any previous entry
    pub fn insert(&mut self, name: impl Into<String>, prompt: RegistryPrompt) {
        self.prompts.insert(name.into(), prompt);
    }

    /// Builder-style [`insert`](Self::insert)
    pub fn with_prompt(mut self, name: impl Into<String>, prompt: RegistryPrompt) -> Self {
        self.insert(name, prompt);
        self
    }
}

#[async_trait]
impl PromptRegistry for InMemoryPromptRegistry {
    async fn get_prompt_with_config(
        &self,
        name: &str,
    ) -> Result<Option<RegistryPrompt>, ExtractorError> {
        Ok(self.prompts.get(name).cloned())
    }
}

/// Directory of `<name>.toml` prompt files
///
/// ```toml
/// prompt = """
/// Extract releases from the message below...
/// """
///
/// [config]
/// model = "anthropic/claude-3.5-sonnet"
/// max_tokens = 4096
/// temperature = 0.2
/// ```
#[derive(Debug, Clone)]
pub struct FilePromptRegistry {
    dir: PathBuf,
}

impl FilePromptRegistry {
    /// Create a registry rooted at `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Registry directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, name: &str) -> Result<PathBuf, ExtractorError> {
        let valid = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
            && !name.contains("..");
        if !valid {
            return Err(ExtractorError::Configuration(format!(
                "Invalid prompt name '{}'",
                name
            )));
        }
        Ok(self.dir.join(format!("{}.toml", name)))
    }
}

#[async_trait]
impl PromptRegistry for FilePromptRegistry {
    async fn get_prompt_with_config(
        &self,
        name: &str,
    ) -> Result<Option<RegistryPrompt>, ExtractorError> {
        let path = self.path_for(name)?;

        let contents = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No prompt file at {}", path.display());
                return Ok(None);
            }
            Err(e) => {
                return Err(ExtractorError::Configuration(format!(
                    "Failed to read prompt file {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        let prompt: RegistryPrompt = toml::from_str(&contents).map_err(|e| {
            ExtractorError::Configuration(format!(
                "Failed to parse prompt file {}: {}",
                path.display(),
                e
            ))
        })?;

        debug!("Loaded prompt '{}' from {}", name, path.display());
        Ok(Some(prompt))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_in_memory_lookup() {
        let registry = InMemoryPromptRegistry::new()
            .with_prompt("release-extraction", RegistryPrompt::new("Extract releases"));

        let found = registry.get_prompt_with_config("release-extraction").await.unwrap();
        assert_eq!(found.unwrap().prompt_text, "Extract releases");
        assert!(registry.get_prompt_with_config("other").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_file_registry_reads_prompt_and_config() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("release-extraction.toml"),
            r#"
prompt = "Extract releases as JSON"

[config]
model = "openai/gpt-4o"
max_tokens = 2048
temperature = 0.3
"#,
        )
        .unwrap();

        let registry = FilePromptRegistry::new(dir.path());
        let prompt = registry
            .get_prompt_with_config("release-extraction")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(prompt.prompt_text, "Extract releases as JSON");
        assert_eq!(prompt.config["model"], "openai/gpt-4o");
        assert_eq!(prompt.config["max_tokens"], 2048);
        assert_eq!(prompt.config["temperature"], 0.3);
    }

    #[tokio::test]
    async fn test_file_registry_missing_file_is_absent() {
        let dir = TempDir::new().unwrap();
        let registry = FilePromptRegistry::new(dir.path());
        assert!(registry.get_prompt_with_config("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_file_registry_malformed_file_is_configuration_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("broken.toml"), "prompt = ").unwrap();

        let registry = FilePromptRegistry::new(dir.path());
        let result = registry.get_prompt_with_config("broken").await;
        assert!(matches!(result, Err(ExtractorError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_file_registry_rejects_path_traversal() {
        let dir = TempDir::new().unwrap();
        let registry = FilePromptRegistry::new(dir.path());
        let result = registry.get_prompt_with_config("../secrets").await;
        assert!(matches!(result, Err(ExtractorError::Configuration(_))));
    }
}
