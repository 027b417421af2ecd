// src/lib.rs

pub mod cli;
pub mod config;
pub mod discover;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod notebook;
pub mod runner;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use tracing::debug;

use crate::cli::CliArgs;
use crate::config::{loader::load_or_default, RunConfig};
use crate::discover::{Discovery, GlobDiscovery};
use crate::exec::KernelBackend;
use crate::fs::{FileSystem, RealFileSystem};
use crate::runner::BatchRunner;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and CLI precedence
/// - discovery over the real filesystem
/// - the kernel executor backend
/// - the batch runner
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let file = load_or_default(&config_path)?;
    let config = RunConfig::resolve(&args, &file);

    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let discovery = GlobDiscovery::new(Arc::clone(&fs), ".")?;

    if args.dry_run {
        print_dry_run(&config, &discovery);
        return Ok(());
    }

    let executor = KernelBackend::new(config.kernel.clone());
    let runner = BatchRunner::new(config.clone(), Box::new(discovery), fs, executor);
    let report = runner.run().await;

    // The sweep itself always completes; a non-zero exit is strictly
    // opt-in via --fail-on-error / [config].fail_on_error.
    if config.fail_on_error && report.has_failures() {
        return Err(anyhow!(
            "{} of {} notebooks failed",
            report.failed_count(),
            report.processed_count() + report.failed_projects.len()
        ));
    }

    Ok(())
}

/// Simple dry-run output: list the notebooks each project would execute.
fn print_dry_run(config: &RunConfig, discovery: &dyn Discovery) {
    println!("nbrun dry-run");
    println!("  timeout = {}s per cell", config.timeout_secs());
    println!("  kernel = {}", config.kernel.command);
    println!();

    for project in &config.projects {
        println!("{project}:");
        match discovery.find_documents(project) {
            Ok(documents) if documents.is_empty() => println!("  (no notebooks)"),
            Ok(documents) => {
                for document in documents {
                    println!("  {document}");
                }
            }
            Err(e) => println!("  discovery failed: {e:#}"),
        }
    }

    debug!("dry-run complete (no execution)");
}
