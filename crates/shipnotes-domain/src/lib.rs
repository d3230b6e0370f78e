//! Shipnotes Domain Layer
//!
//! Core data model shared by every other crate in the workspace. Nothing in
//! here performs I/O; the types are plain values that the extractor reads,
//! produces and persists.
//!
//! ## Key Concepts
//!
//! - **Message**: a chat message (with optional thread replies) fetched by an
//!   external message source
//! - **Release**: one shipped change extracted from a message by the LLM
//! - **PromptSpec**: extraction instructions plus model parameters, resolved
//!   once per batch
//! - **ProcessedState**: the persisted set of message ids already extracted

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod message;
pub mod prompt;
pub mod release;
pub mod state;

// Re-exports for convenience
pub use message::{epoch_to_date, Message};
pub use prompt::PromptSpec;
pub use release::Release;
pub use state::ProcessedState;
