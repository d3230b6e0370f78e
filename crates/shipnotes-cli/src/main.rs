//! Shipnotes CLI - extract release records from chat messages.

use clap::Parser;
use shipnotes_cli::commands;
use shipnotes_cli::config::OutputFormat;
use shipnotes_cli::{Cli, Command, Config, Formatter};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing (log to stderr, RUST_LOG wins over --verbose)
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();

    let color_enabled = !cli.no_color;
    if let Err(e) = run(cli).await {
        let formatter = Formatter::new(OutputFormat::Quiet, color_enabled);
        eprintln!("{}", formatter.error(&format!("Error: {}", e)));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> shipnotes_cli::Result<()> {
    let config = Config::load(cli.config.as_deref())?;

    // Determine output format
    let format = cli
        .format
        .map(Into::into)
        .unwrap_or(config.settings.format);

    // Determine color setting
    let color_enabled = !cli.no_color && config.settings.color;

    let formatter = Formatter::new(format, color_enabled);

    match cli.command {
        Command::Extract(args) => commands::execute_extract(args, &config, &formatter).await?,
        Command::Status(args) => commands::execute_status(args, &config, &formatter).await?,
    }

    Ok(())
}
