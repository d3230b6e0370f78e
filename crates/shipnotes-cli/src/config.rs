//! Configuration management for the CLI.

use crate::error::{CliError, Result};
use serde::{Deserialize, Serialize};
use shipnotes_extractor::ExtractorConfig;
use shipnotes_llm::CompletionConfig;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable that overrides `completion.api_key`.
pub const API_KEY_ENV: &str = "SHIPNOTES_API_KEY";

/// CLI configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Completion endpoint settings
    #[serde(default)]
    pub completion: CompletionConfig,

    /// Extraction settings
    #[serde(default)]
    pub extractor: ExtractorConfig,

    /// File locations
    #[serde(default)]
    pub paths: Paths,

    /// Global settings
    #[serde(default)]
    pub settings: Settings,
}

/// File locations used by the commands.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paths {
    /// Prompt registry directory
    #[serde(default = "default_prompt_dir")]
    pub prompt_dir: PathBuf,

    /// Processed-state snapshot
    #[serde(default = "default_state_file")]
    pub state_file: PathBuf,

    /// Releases output file
    #[serde(default = "default_output")]
    pub output: PathBuf,
}

/// Global CLI settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Enable colored output
    #[serde(default = "default_true")]
    pub color: bool,

    /// Default output format
    #[serde(default = "default_format")]
    pub format: OutputFormat,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Table format
    Table,
    /// JSON format
    Json,
    /// Quiet (minimal) format
    Quiet,
}

impl From<crate::cli::CliFormat> for OutputFormat {
    fn from(format: crate::cli::CliFormat) -> Self {
        match format {
            crate::cli::CliFormat::Table => OutputFormat::Table,
            crate::cli::CliFormat::Json => OutputFormat::Json,
            crate::cli::CliFormat::Quiet => OutputFormat::Quiet,
        }
    }
}

impl Config {
    /// Get the default configuration file path.
    pub fn path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| CliError::Config("Could not find home directory".into()))?;
        Ok(home.join(".shipnotes").join("config.toml"))
    }

    /// Load configuration.
    ///
    /// An explicit path must exist; the default path falls back to defaults
    /// when absent. The API key environment variable wins over the file.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => {
                let path = Self::path()?;
                if path.exists() {
                    Self::from_file(&path)?
                } else {
                    Self::default()
                }
            }
        };

        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.trim().is_empty() {
                config.completion.api_key = key;
            }
        }

        Ok(config)
    }

    /// Parse a configuration file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            CliError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Ok(toml::from_str(&contents)?)
    }

    /// Validate every section.
    pub fn validate(&self) -> Result<()> {
        self.completion.validate().map_err(CliError::Config)?;
        self.extractor.validate().map_err(CliError::Config)?;
        Ok(())
    }
}

impl Default for Paths {
    fn default() -> Self {
        Self {
            prompt_dir: default_prompt_dir(),
            state_file: default_state_file(),
            output: default_output(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            color: true,
            format: OutputFormat::Table,
        }
    }
}

fn default_prompt_dir() -> PathBuf {
    PathBuf::from(".shipnotes/prompts")
}

fn default_state_file() -> PathBuf {
    PathBuf::from(".shipnotes/processed.json")
}

fn default_output() -> PathBuf {
    PathBuf::from("releases.json")
}

fn default_true() -> bool {
    true
}

fn default_format() -> OutputFormat {
    OutputFormat::Table
}

#[cfg(test)]
mod tests {
    use super::*;
    use shipnotes_extractor::RegistryMode;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.settings.color);
        assert_eq!(config.paths.state_file, PathBuf::from(".shipnotes/processed.json"));
        assert_eq!(config.extractor.registry_mode, RegistryMode::Required);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_sections() {
        let config: Config = toml::from_str(
            r#"
            [completion]
            base_url = "http://localhost:4000/v1"
            title = "Release Bot"

            [extractor]
            registry_mode = "builtin"
            default_model = "openai/gpt-4o-mini"

            [paths]
            state_file = "state/processed.json"

            [settings]
            format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.completion.base_url, "http://localhost:4000/v1");
        assert_eq!(config.completion.title.as_deref(), Some("Release Bot"));
        assert_eq!(config.extractor.registry_mode, RegistryMode::Builtin);
        assert_eq!(config.paths.state_file, PathBuf::from("state/processed.json"));
        assert_eq!(config.paths.output, PathBuf::from("releases.json"));
        assert_eq!(config.settings.format, OutputFormat::Json);
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let dir = TempDir::new().unwrap();
        let result = Config::from_file(&dir.path().join("missing.toml"));
        assert!(matches!(result, Err(CliError::Config(_))));
    }

    #[test]
    fn test_invalid_section_fails_validation() {
        let mut config = Config::default();
        config.completion.timeout_secs = Some(0);
        assert!(config.validate().is_err());
    }
}
