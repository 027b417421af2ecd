// src/config/model.rs

use std::time::Duration;

use serde::Deserialize;

use crate::cli::CliArgs;

/// Projects swept when neither the CLI nor the config file names any.
pub const DEFAULT_PROJECTS: &[&str] = &["menpo", "menpofit", "menpo3d", "menpowidgets"];

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// projects = ["menpo", "menpofit"]
///
/// [config]
/// timeout = 600
/// fail_on_error = false
///
/// [kernel]
/// command = "python3"
/// ```
///
/// All sections are optional and have reasonable defaults; running without
/// a config file at all is fine.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ConfigFile {
    /// Default project set processed when no projects are given on the
    /// command line.
    ///
    /// If absent, the built-in [`DEFAULT_PROJECTS`] list is used.
    #[serde(default)]
    pub projects: Option<Vec<String>>,

    /// Global behaviour config from `[config]`.
    #[serde(default)]
    pub config: ConfigSection,

    /// Interpreter settings from `[kernel]`.
    #[serde(default)]
    pub kernel: KernelSection,
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// Per-cell timeout in seconds before execution is interrupted.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Whether a notebook failure should turn into a non-zero exit status.
    #[serde(default)]
    pub fail_on_error: bool,
}

fn default_timeout() -> u64 {
    600
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            fail_on_error: false,
        }
    }
}

/// `[kernel]` section: the interpreter spawned once per notebook.
#[derive(Debug, Clone, Deserialize)]
pub struct KernelSection {
    /// Interpreter binary.
    #[serde(default = "default_kernel_command")]
    pub command: String,

    /// Arguments passed to the interpreter.
    ///
    /// The defaults put CPython into quiet, unbuffered interactive mode,
    /// which is what the session wire protocol expects.
    #[serde(default = "default_kernel_args")]
    pub args: Vec<String>,
}

fn default_kernel_command() -> String {
    "python3".to_string()
}

fn default_kernel_args() -> Vec<String> {
    vec!["-i".to_string(), "-q".to_string(), "-u".to_string()]
}

impl Default for KernelSection {
    fn default() -> Self {
        Self {
            command: default_kernel_command(),
            args: default_kernel_args(),
        }
    }
}

/// Resolved, immutable per-invocation configuration.
///
/// Built once from CLI arguments plus the config file, then threaded
/// explicitly into the batch runner. Precedence for every knob:
/// CLI flag > config file > built-in default.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Projects to sweep, in processing order.
    pub projects: Vec<String>,

    /// Per-cell execution budget.
    pub timeout: Duration,

    /// Whether `RunReport` failures should produce exit status 1.
    pub fail_on_error: bool,

    /// Interpreter to spawn per notebook.
    pub kernel: KernelSection,
}

impl RunConfig {
    /// Resolve the effective configuration from CLI args and a loaded
    /// config file.
    pub fn resolve(args: &CliArgs, file: &ConfigFile) -> Self {
        let projects = if !args.projects.is_empty() {
            args.projects.clone()
        } else if let Some(ref projects) = file.projects {
            projects.clone()
        } else {
            DEFAULT_PROJECTS.iter().map(|s| s.to_string()).collect()
        };

        let timeout_secs = args.timeout.unwrap_or(file.config.timeout);

        Self {
            projects,
            timeout: Duration::from_secs(timeout_secs),
            fail_on_error: args.fail_on_error || file.config.fail_on_error,
            kernel: file.kernel.clone(),
        }
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout.as_secs()
    }
}
