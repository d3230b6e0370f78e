//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Shipnotes - Extract release records from chat messages with an LLM.
#[derive(Debug, Parser)]
#[command(name = "shipnotes")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true, env = "SHIPNOTES_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log at debug level (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Quiet format (titles only)
    Quiet,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Extract releases from unprocessed messages
    Extract(ExtractArgs),

    /// Show dedup state and pending message count
    Status(StatusArgs),
}

/// Arguments for the extract command.
#[derive(Debug, Parser)]
pub struct ExtractArgs {
    /// JSON file holding an array of messages
    #[arg(short, long)]
    pub messages: PathBuf,

    /// Releases file to append to (defaults to the configured path)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Processed-state snapshot (defaults to the configured path)
    #[arg(long)]
    pub state: Option<PathBuf>,

    /// Prompt registry directory (defaults to the configured path)
    #[arg(long)]
    pub prompt_dir: Option<PathBuf>,

    /// Use the built-in prompt instead of requiring the registry
    #[arg(long)]
    pub builtin_prompt: bool,

    /// Emit generation trace events to the log
    #[arg(long)]
    pub trace: bool,

    /// List pending messages without calling the model
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the status command.
#[derive(Debug, Parser)]
pub struct StatusArgs {
    /// JSON file of messages to check against the processed set
    #[arg(short, long)]
    pub messages: Option<PathBuf>,

    /// Processed-state snapshot (defaults to the configured path)
    #[arg(long)]
    pub state: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_extract() {
        let cli = Cli::try_parse_from([
            "shipnotes",
            "extract",
            "--messages",
            "msgs.json",
            "--builtin-prompt",
            "--dry-run",
        ])
        .unwrap();

        match cli.command {
            Command::Extract(args) => {
                assert_eq!(args.messages, PathBuf::from("msgs.json"));
                assert!(args.builtin_prompt);
                assert!(args.dry_run);
                assert!(!args.trace);
                assert!(args.output.is_none());
            }
            other => panic!("expected extract, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_status_with_global_flags() {
        let cli = Cli::try_parse_from(["shipnotes", "status", "--format", "json", "-v"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.format, Some(CliFormat::Json)));
        assert!(matches!(cli.command, Command::Status(_)));
    }

    #[test]
    fn test_extract_requires_messages() {
        assert!(Cli::try_parse_from(["shipnotes", "extract"]).is_err());
    }
}
