//! Callmap CLI - Command-line driver for the call graph engine
//!
//! This binary stands in for the editor-side collaborator: it feeds the
//! engine from an already-decoded snapshot of symbol and call-hierarchy
//! data and writes the resulting DOT description. It never talks to a
//! language server itself.

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod snapshot;

#[derive(Parser)]
#[command(name = "callmap")]
#[command(author = "Callmap Contributors")]
#[command(version)]
#[command(about = "Clustered call graphs from symbol snapshots", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Repair malformed symbol forests instead of rejecting them
    #[arg(long, global = true)]
    clip: bool,

    /// Attempts per provider query while the source is initializing
    #[arg(long, global = true, default_value = "5")]
    retries: u32,

    /// Delay between attempts, in milliseconds
    #[arg(long, global = true, default_value = "600")]
    retry_delay_ms: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a DOT call graph from a snapshot
    Render {
        /// Snapshot file with decoded symbol and call data
        snapshot: PathBuf,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show graph statistics for a snapshot
    Stats {
        /// Snapshot file with decoded symbol and call data
        snapshot: PathBuf,

        /// Output as JSON instead of formatted text
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(tracing_subscriber::EnvFilter::new(filter))
        .init();

    let options = commands::Options {
        clip: cli.clip,
        retries: cli.retries,
        retry_delay_ms: cli.retry_delay_ms,
    };

    let result = match cli.command {
        Commands::Render { snapshot, output } => {
            commands::render(&snapshot, output.as_deref(), &options)
        }
        Commands::Stats { snapshot, json } => commands::stats(&snapshot, json, &options),
    };

    if let Err(e) = result {
        eprintln!("{} {}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}
