//! CLI command implementations.

use callmap_core::RetryPolicy;
use callmap_graph::{to_dot, CallGraph, Generator, ValidationMode};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::snapshot::JsonProvider;

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

/// Knobs shared by all commands.
pub struct Options {
    pub clip: bool,
    pub retries: u32,
    pub retry_delay_ms: u64,
}

impl Options {
    fn validation(&self) -> ValidationMode {
        if self.clip {
            ValidationMode::Clip
        } else {
            ValidationMode::Strict
        }
    }

    fn retry(&self) -> RetryPolicy {
        RetryPolicy::new(self.retries, Duration::from_millis(self.retry_delay_ms))
    }
}

/// Generate the DOT description for a snapshot.
pub fn render(snapshot: &Path, output: Option<&Path>, options: &Options) -> Result<()> {
    let graph = generate(snapshot, options)?;
    let dot = to_dot(&graph);

    match output {
        Some(path) => {
            fs::write(path, &dot)?;
            let stats = graph.stats();
            println!(
                "{} Wrote {} ({} files, {} calls, {} implementations)",
                "✓".green(),
                path.display().to_string().cyan(),
                stats.files,
                stats.call_edges,
                stats.implements_edges,
            );
        }
        None => print!("{dot}"),
    }

    Ok(())
}

/// Print graph statistics for a snapshot.
pub fn stats(snapshot: &Path, json: bool, options: &Options) -> Result<()> {
    let graph = generate(snapshot, options)?;
    let stats = graph.stats();

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("{}", "Call graph".cyan());
    println!("  files          {}", stats.files.to_string().cyan());
    println!("  symbols        {}", stats.symbols.to_string().cyan());
    println!(
        "  calls          {} ({} sites)",
        stats.call_edges.to_string().cyan(),
        stats.call_sites,
    );
    println!(
        "  implementations {}",
        stats.implements_edges.to_string().cyan()
    );
    if stats.external_files > 0 {
        println!(
            "  {} edges into {} untracked files",
            "⚠".yellow(),
            stats.external_files,
        );
    }

    Ok(())
}

fn generate(snapshot: &Path, options: &Options) -> Result<CallGraph> {
    let (provider, files) = JsonProvider::load(snapshot)?;
    tracing::debug!("loaded snapshot with {} files", files.len());

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner.set_message(format!("Resolving {} files...", files.len()));

    let graph = Generator::new(&provider)
        .with_retry(options.retry())
        .with_validation(options.validation())
        .generate(&files);

    spinner.finish_and_clear();
    Ok(graph)
}
