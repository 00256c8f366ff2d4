//! Action dispatch CLI entry point.

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use dispatch_cli::cli::Cli;
use dispatch_cli::commands;

fn main() {
    // Load .env.local if it exists (for DISPATCH_WORKERS etc.)
    let _ = dotenvy::from_filename(".env.local");

    let cli = Cli::parse();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_level().to_string()));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = commands::execute(cli.command, cli.workers) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
