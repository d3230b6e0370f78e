//! Shipnotes Extractor
//!
//! Converts chat messages into structured, deduplicated release records
//! using an LLM.
//!
//! # Architecture
//!
//! ```text
//! Messages → ProcessedSetTracker (filter) → ExtractionEngine
//!              ├─ normalize_message
//!              ├─ PromptResolver (once per batch)
//!              ├─ CompletionClient (one request per message)
//!              └─ parse_llm_response (fence strip → parse → repair → classify)
//!          → Releases → caller persists → ProcessedSetTracker (mark)
//! ```
//!
//! # Example Usage
//!
//! ```no_run
//! use shipnotes_extractor::{
//!     ExtractionEngine, ExtractorConfig, ProcessedSetTracker, PromptResolver,
//! };
//! use shipnotes_llm::MockProvider;
//!
//! # use shipnotes_domain::Message;
//! # async fn example(messages: Vec<Message>) -> Result<(), Box<dyn std::error::Error>> {
//! let mut tracker = ProcessedSetTracker::new(".shipnotes/processed.json");
//! tracker.load()?;
//!
//! let engine = ExtractionEngine::new(
//!     MockProvider::new("[]"),
//!     PromptResolver::builtin(),
//!     ExtractorConfig::default(),
//! );
//!
//! let pending = tracker.filter_unprocessed(&messages);
//! let releases = engine.extract(&pending).await?;
//! // ... persist `releases` somewhere ...
//! tracker.mark_processed(pending.iter().map(|m| m.id.clone()))?;
//! println!("Extracted {} releases", releases.len());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod extractor;
mod normalize;
pub mod observe;
mod parser;
mod prompt;
mod registry;
mod repair;
mod tracker;
mod types;

#[cfg(test)]
mod tests;

pub use config::{ExtractorConfig, RegistryMode};
pub use error::ExtractorError;
pub use extractor::{unmatched_sources, ExtractionEngine};
pub use normalize::normalize_message;
pub use observe::{GenerationObserver, NoopObserver, TracingObserver};
pub use parser::{parse_llm_response, strip_code_fence};
pub use prompt::{build_prompt, spec_from_registry, PromptResolver, DEFAULT_PROMPT};
pub use registry::{FilePromptRegistry, InMemoryPromptRegistry, PromptRegistry, RegistryPrompt};
pub use repair::repair_json;
pub use tracker::ProcessedSetTracker;
pub use types::ExtractionProgress;
