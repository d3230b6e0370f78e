//! Status command implementation.

use super::read_messages;
use crate::cli::StatusArgs;
use crate::config::{Config, OutputFormat};
use crate::error::Result;
use crate::output::Formatter;
use serde::Serialize;
use shipnotes_extractor::ProcessedSetTracker;
use std::path::PathBuf;

/// Snapshot of dedup progress.
#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    /// Snapshot location
    pub state_file: PathBuf,
    /// Ids already extracted
    pub processed: usize,
    /// Messages in the file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<usize>,
    /// Messages in the file not yet extracted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending: Option<usize>,
}

/// Execute the status command.
pub async fn execute_status(
    args: StatusArgs,
    config: &Config,
    formatter: &Formatter,
) -> Result<()> {
    let report = build_report(&args, config)?;

    match formatter.format() {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Quiet => println!("{}", report.pending.unwrap_or(report.processed)),
        OutputFormat::Table => {
            println!(
                "{}",
                formatter.info(&format!(
                    "{} processed ids in {}",
                    report.processed,
                    report.state_file.display()
                ))
            );
            if let (Some(total), Some(pending)) = (report.total, report.pending) {
                let line = format!("{} of {} messages pending", pending, total);
                if pending == 0 {
                    println!("{}", formatter.success(&line));
                } else {
                    println!("{}", formatter.warning(&line));
                }
            }
        }
    }

    Ok(())
}

/// Load the tracker and count pending messages.
pub fn build_report(args: &StatusArgs, config: &Config) -> Result<StatusReport> {
    let state_file = args
        .state
        .clone()
        .unwrap_or_else(|| config.paths.state_file.clone());
    let mut tracker = ProcessedSetTracker::new(&state_file);
    tracker.load()?;

    let (total, pending) = match &args.messages {
        Some(path) => {
            let messages = read_messages(path)?;
            let pending = tracker.filter_unprocessed(&messages).len();
            (Some(messages.len()), Some(pending))
        }
        None => (None, None),
    };

    Ok(StatusReport {
        state_file,
        processed: tracker.state().len(),
        total,
        pending,
    })
}
