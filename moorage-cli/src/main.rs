//! Moorage CLI entry point.

mod cli;
mod commands;
mod error;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::error::CliError;
use crate::output::OutputWriter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.log_level.as_deref().unwrap_or("info"));

    let writer = OutputWriter::new(cli.output);
    if let Err(err) = run(cli, &writer).await {
        eprintln!("error: {err}");
        std::process::exit(err.exit_code());
    }
}

async fn run(cli: Cli, writer: &OutputWriter) -> Result<(), CliError> {
    match cli.command {
        Commands::Up(args) => commands::up::execute(args, &cli.config, writer).await,
        Commands::Wait(args) => commands::wait::execute(args, &cli.config, writer).await,
        Commands::Status(args) => commands::status::execute(args, &cli.config, writer).await,
        Commands::Logs(args) => commands::logs::execute(args, &cli.config).await,
        Commands::Down(args) => commands::down::execute(args, &cli.config, writer).await,
        Commands::Config(args) => {
            commands::config::execute(args.action, &cli.config, writer).await
        }
    }
}

/// Logs go to stderr so command output on stdout stays parseable.
fn init_tracing(level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .with_writer(std::io::stderr)
        .init();
}
