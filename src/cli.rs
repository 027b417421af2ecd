// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `nbrun`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "nbrun",
    version,
    about = "Re-execute all notebooks under one or more project folders.",
    long_about = None
)]
pub struct CliArgs {
    /// Project subfolder(s) to process.
    ///
    /// When empty, the project list from the config file (or the built-in
    /// default set) is processed.
    #[arg(value_name = "PROJECT")]
    pub projects: Vec<String>,

    /// Per-cell timeout in seconds before execution is interrupted.
    ///
    /// Overrides the config file value; the built-in default is 600.
    #[arg(long, value_name = "SECONDS", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,

    /// Path to the config file (TOML).
    ///
    /// Default: `Nbrun.toml` in the current working directory. A missing
    /// file at the default location is not an error.
    #[arg(long, value_name = "PATH", default_value = "Nbrun.toml")]
    pub config: String,

    /// Exit with a non-zero status if any notebook failed.
    ///
    /// By default the sweep always exits 0 and failures are only visible
    /// in the printed output.
    #[arg(long)]
    pub fail_on_error: bool,

    /// List the notebooks that would be executed, without running anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `NBRUN_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
