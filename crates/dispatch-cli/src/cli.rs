//! Command-line interface definition using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Action dispatch - priority-ordered workflow action processing
#[derive(Parser, Debug)]
#[command(name = "action-dispatch")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Number of worker threads
    #[arg(short, long, env = "DISPATCH_WORKERS", global = true)]
    pub workers: Option<usize>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate workflow actions and drain them through the worker pool
    Simulate {
        /// Number of actions to generate
        #[arg(short, long, default_value_t = 30)]
        count: usize,

        /// Seed for the generated mix of actions
        #[arg(short, long, default_value_t = 1)]
        seed: u64,

        /// Tenant the actions belong to
        #[arg(short, long, default_value = "tenant-demo")]
        tenant: String,
    },

    /// Print the dispatch order of actions read as JSON lines
    Order {
        /// Input file, or '-' for stdin
        #[arg(short, long, default_value = "-")]
        file: PathBuf,

        /// Output format
        #[arg(long, default_value = "json")]
        format: OutputFormat,
    },
}

/// Output format for the order command
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// One JSON object per line
    #[default]
    Json,
    /// Aligned columns with a header
    Table,
}

impl Cli {
    /// Returns the log level based on verbosity.
    pub fn log_level(&self) -> tracing::Level {
        match self.verbose {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        }
    }
}
