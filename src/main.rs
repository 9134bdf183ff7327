//! teleingest CLI entry point.

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod cli;

/// teleingest - ingest remote container environments and mounts
#[derive(Parser, Debug)]
#[command(name = "teleingest")]
#[command(about = "Ingest a cluster workload's environment and volumes locally")]
#[command(
    long_about = "teleingest makes a remote workload container's environment \
variables, filesystem mounts, and pod address available on the local machine, \
optionally feeding a locally spawned process or container.\n\n\
Quick start:\n  \
teleingest ingest echo-easy -- env\n  \
teleingest ingest echo-easy --env-file echo.env\n\n\
For programmatic access:\n  \
teleingest serve"
)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ingest a workload container's environment and mounts
    Ingest(cli::ingest::IngestCmd),

    /// Leave an active ingest
    Leave(cli::leave::LeaveCmd),

    /// Start the HTTP API server for programmatic control
    Serve(cli::serve::ServeCmd),
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging based on RUST_LOG or default to warn
    init_logging();

    tracing::debug!(version = teleingest::VERSION, "starting teleingest");

    let result = match cli.command {
        Commands::Ingest(cmd) => cmd.run(),
        Commands::Leave(cmd) => cmd.run(),
        Commands::Serve(cmd) => cmd.run(),
    };

    if let Err(e) = result {
        tracing::error!(error = %e, "command failed");
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Initialize the tracing subscriber.
fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("teleingest=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
