// ABOUTME: Entry point for the cutover CLI application.
// ABOUTME: Parses arguments, sets up logging, and dispatches to command handlers.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use cutover::config::Settings;
use cutover::error::Result;
use cutover::output::{Output, OutputMode};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // -v forces debug; otherwise RUST_LOG wins over the crate default
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("cutover=info,warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let mode = OutputMode::from_flags(cli.quiet, cli.json);

    if let Err(e) = run(cli, mode).await {
        tracing::debug!(error = ?e, "command failed");
        Output::new(mode).error(&e.to_string());
        std::process::exit(1);
    }
}

async fn run(cli: Cli, mode: OutputMode) -> Result<()> {
    let settings = Settings::load(cli.config.as_deref())?;
    let output = Output::new(mode);

    match cli.command {
        Commands::Deploy {
            tag,
            no_promote,
            force,
        } => commands::deploy(settings, tag, !no_promote, force, output).await,
        Commands::Render {
            tag,
            production,
            ip,
        } => commands::render(&settings, &tag, production, ip),
        Commands::Status => commands::status(settings, output).await,
    }
}
