// src/exec/backend.rs

//! Pluggable executor backend abstraction.
//!
//! The batch runner talks to an `ExecutorBackend` instead of a concrete
//! kernel implementation. This makes it easy to swap in a fake executor in
//! tests while keeping the production kernel implementation in [`session`].
//!
//! [`session`]: crate::exec::session

use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::time::Duration;

use tracing::{debug, info};

use crate::config::KernelSection;
use crate::exec::{ExecutionFailure, KernelSession};
use crate::notebook::Notebook;

/// Trait abstracting how one notebook's code cells are executed.
///
/// Production code uses [`KernelBackend`]; tests can provide their own
/// implementation that doesn't spawn real processes.
///
/// Contract:
/// - The notebook's cells are mutated in place with fresh outputs.
/// - `timeout` bounds each individual cell, not the whole document.
/// - Any failure is returned as an [`ExecutionFailure`] value; the caller
///   decides what to do with partially-mutated in-memory state (it is
///   never persisted).
pub trait ExecutorBackend: Send {
    fn execute<'a>(
        &'a mut self,
        doc: &'a mut Notebook,
        workdir: &'a Path,
        timeout: Duration,
    ) -> Pin<Box<dyn Future<Output = std::result::Result<(), ExecutionFailure>> + Send + 'a>>;
}

/// Real executor backend: one fresh interpreter session per notebook.
///
/// The session lives exactly as long as one `execute` call. State persists
/// across cells within the call; nothing survives into the next call, so a
/// notebook can never observe another notebook's side effects in the
/// interpreter.
#[derive(Debug, Clone)]
pub struct KernelBackend {
    kernel: KernelSection,
}

impl KernelBackend {
    pub fn new(kernel: KernelSection) -> Self {
        Self { kernel }
    }
}

impl ExecutorBackend for KernelBackend {
    fn execute<'a>(
        &'a mut self,
        doc: &'a mut Notebook,
        workdir: &'a Path,
        timeout: Duration,
    ) -> Pin<Box<dyn Future<Output = std::result::Result<(), ExecutionFailure>> + Send + 'a>> {
        let kernel = self.kernel.clone();

        Box::pin(async move {
            let mut session = KernelSession::spawn(&kernel, workdir)
                .await
                .map_err(ExecutionFailure::Session)?;

            let mut executed = 0u64;
            for index in 0..doc.cells.len() {
                if !doc.cells[index].is_code() {
                    continue;
                }
                let source = doc.cells[index].source_text();
                debug!(cell = index, "executing cell");

                match session.run_cell(index, &source, timeout).await {
                    Ok(stdout_text) => {
                        executed += 1;
                        doc.cells[index].record_execution(executed, &stdout_text);
                    }
                    Err(failure) => {
                        session.shutdown().await;
                        return Err(failure);
                    }
                }
            }

            session.shutdown().await;
            info!(cells = executed, "notebook executed");
            Ok(())
        })
    }
}
