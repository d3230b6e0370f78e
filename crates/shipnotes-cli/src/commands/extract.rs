//! Extract command implementation.

use super::{read_messages, read_releases, write_json_atomic};
use crate::cli::ExtractArgs;
use crate::config::{Config, OutputFormat};
use crate::error::Result;
use crate::output::Formatter;
use anyhow::Context;
use shipnotes_domain::{Message, Release};
use shipnotes_extractor::{
    ExtractionEngine, FilePromptRegistry, ProcessedSetTracker, PromptResolver, RegistryMode,
    TracingObserver,
};
use shipnotes_llm::{CompletionClient, HttpCompletionClient};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Execute the extract command.
pub async fn execute_extract(
    args: ExtractArgs,
    config: &Config,
    formatter: &Formatter,
) -> Result<()> {
    let messages = read_messages(&args.messages)?;

    let state_path = args.state.unwrap_or_else(|| config.paths.state_file.clone());
    let mut tracker = ProcessedSetTracker::new(state_path);
    tracker.load()?;

    let pending = tracker.filter_unprocessed(&messages);
    info!(
        "{} of {} messages pending extraction",
        pending.len(),
        messages.len()
    );

    if pending.is_empty() {
        println!("{}", formatter.info("No unprocessed messages."));
        return Ok(());
    }

    if args.dry_run {
        for message in &pending {
            println!("{}", message.id);
        }
        println!(
            "{}",
            formatter.info(&format!("{} messages would be extracted", pending.len()))
        );
        return Ok(());
    }

    config.validate()?;

    let mut extractor_config = config.extractor.clone();
    if args.builtin_prompt {
        extractor_config.registry_mode = RegistryMode::Builtin;
    }

    let resolver = match extractor_config.registry_mode {
        RegistryMode::Required => {
            let dir = args
                .prompt_dir
                .unwrap_or_else(|| config.paths.prompt_dir.clone());
            debug!("Using prompt registry at {}", dir.display());
            PromptResolver::required(FilePromptRegistry::new(dir))
        }
        RegistryMode::Builtin => PromptResolver::builtin(),
    };

    let client = HttpCompletionClient::new(config.completion.clone())?;

    let mut engine = ExtractionEngine::new(client, resolver, extractor_config);
    if args.trace {
        engine = engine.with_observer(TracingObserver);
    }

    let output = args.output.unwrap_or_else(|| config.paths.output.clone());
    let releases = run_extraction(&engine, &pending, &mut tracker, &output).await?;

    if formatter.format() != OutputFormat::Quiet {
        println!("{}", formatter.format_releases(&releases)?);
    }
    println!(
        "{}",
        formatter.success(&format!(
            "Extracted {} releases from {} messages into {}",
            releases.len(),
            pending.len(),
            output.display()
        ))
    );

    Ok(())
}

/// Run the batch, keep a partial snapshot current, then commit.
///
/// Output is appended and the partial file removed before the tracker marks
/// anything, so a failed batch leaves the processed set untouched.
pub async fn run_extraction<C: CompletionClient>(
    engine: &ExtractionEngine<C>,
    pending: &[Message],
    tracker: &mut ProcessedSetTracker,
    output: &Path,
) -> Result<Vec<Release>> {
    let existing = read_releases(output)?;
    let partial = partial_path(output);

    let releases = engine
        .extract_with_progress(pending, |progress| {
            let mut snapshot = existing.clone();
            snapshot.extend_from_slice(progress.releases);
            write_json_atomic(&partial, &snapshot)
                .with_context(|| format!("Failed to write {}", partial.display()))?;
            debug!(
                "Progress {}/{}: {} releases so far",
                progress.index + 1,
                progress.total,
                progress.releases.len()
            );
            Ok(())
        })
        .await?;

    let mut combined = existing;
    combined.extend(releases.iter().cloned());
    write_json_atomic(output, &combined)?;
    remove_if_exists(&partial)?;

    tracker.mark_processed(pending.iter().map(|m| m.id.as_str()))?;

    Ok(releases)
}

/// Sibling of `output` holding in-flight results.
pub fn partial_path(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "releases".to_string());
    output.with_file_name(format!("{}.partial.json", stem))
}

fn remove_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
