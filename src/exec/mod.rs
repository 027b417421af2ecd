// src/exec/mod.rs

//! Notebook execution layer.
//!
//! This module is responsible for actually running a notebook's code cells
//! against a fresh interpreter session, using `tokio::process::Command`.
//!
//! - [`session`] owns one kernel child process and the per-cell wire
//!   protocol, including the per-cell timeout.
//! - [`backend`] defines the `ExecutorBackend` seam the batch runner talks
//!   to, and the production `KernelBackend` implementation.

pub mod backend;
pub mod session;

pub use backend::{ExecutorBackend, KernelBackend};
pub use session::KernelSession;

use thiserror::Error;

/// Why a notebook's execution did not complete.
///
/// This is a reportable value, not an unrecoverable fault: the batch runner
/// branches on it, reports it, and moves on to the next notebook.
#[derive(Debug, Error)]
pub enum ExecutionFailure {
    /// A cell raised; `details` carries the captured output including the
    /// traceback.
    #[error("cell {index} failed:\n{details}")]
    CellFailed { index: usize, details: String },

    /// A single cell exceeded the per-cell execution budget.
    #[error("cell {index} did not finish within {timeout_secs}s")]
    CellTimedOut { index: usize, timeout_secs: u64 },

    /// The kernel process itself could not be spawned, died unexpectedly,
    /// or its pipes broke.
    #[error("kernel session error: {0}")]
    Session(#[source] anyhow::Error),
}
