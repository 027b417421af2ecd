// src/runner.rs

//! Batch orchestration across projects and notebooks.
//!
//! The runner is strictly sequential: one notebook executes at a time, and
//! one project's notebooks all finish before the next project begins.
//! Failure in one notebook never aborts the loop; every error kind
//! (discovery, load, execution, persist) is caught at its granularity,
//! reported, and the sweep continues.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, warn};

use crate::config::RunConfig;
use crate::discover::{Discovery, DocumentPath};
use crate::errors::NbrunError;
use crate::exec::ExecutorBackend;
use crate::fs::FileSystem;
use crate::notebook::Notebook;

/// One failed notebook (or project) and the reported reason.
#[derive(Debug, Clone)]
pub struct FailedDocument {
    pub path: PathBuf,
    pub description: String,
}

/// Outcome of one whole sweep, observable by tests and by the
/// `fail_on_error` exit-status option. Nothing is printed from this; the
/// contractual reporting happens line by line as the sweep progresses.
#[derive(Debug, Default)]
pub struct RunReport {
    pub succeeded: Vec<PathBuf>,
    pub failed: Vec<FailedDocument>,
    /// Projects whose discovery failed outright (missing directory etc.).
    pub failed_projects: Vec<FailedDocument>,
}

impl RunReport {
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty() || !self.failed_projects.is_empty()
    }

    pub fn failed_count(&self) -> usize {
        self.failed.len() + self.failed_projects.len()
    }

    pub fn processed_count(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }
}

/// Drives the whole invocation: for each project, discover notebooks, and
/// execute + persist each one in turn through an [`ExecutorBackend`].
pub struct BatchRunner<E: ExecutorBackend> {
    config: RunConfig,
    discovery: Box<dyn Discovery>,
    fs: Arc<dyn FileSystem>,
    executor: E,
}

impl<E: ExecutorBackend> fmt::Debug for BatchRunner<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchRunner")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<E: ExecutorBackend> BatchRunner<E> {
    pub fn new(
        config: RunConfig,
        discovery: Box<dyn Discovery>,
        fs: Arc<dyn FileSystem>,
        executor: E,
    ) -> Self {
        Self {
            config,
            discovery,
            fs,
            executor,
        }
    }

    /// Run the full sweep. Never fails as a whole: per-document and
    /// per-project errors end up in the returned report.
    pub async fn run(mut self) -> RunReport {
        let mut report = RunReport::default();
        let projects = self.config.projects.clone();

        for project in &projects {
            println!("{:*^80}", format!(" Executing {project} notebooks "));
            info!(project = %project, "processing project");

            let documents = match self.discovery.find_documents(project) {
                Ok(documents) => documents,
                Err(source) => {
                    let err = NbrunError::Discovery {
                        project: project.clone(),
                        source,
                    };
                    println!("{err}");
                    warn!(project = %project, "discovery failed; skipping project");
                    report.failed_projects.push(FailedDocument {
                        path: PathBuf::from(project),
                        description: err.to_string(),
                    });
                    continue;
                }
            };

            for document in documents {
                println!("Executing {document}");

                match self.process_document(&document).await {
                    Ok(()) => {
                        report.succeeded.push(document.path().to_path_buf());
                    }
                    Err(err) => {
                        println!("{err}");
                        warn!(notebook = %document, "notebook failed; continuing");
                        report.failed.push(FailedDocument {
                            path: document.path().to_path_buf(),
                            description: err.to_string(),
                        });
                    }
                }
            }
        }

        report
    }

    /// Load, execute and persist one notebook.
    ///
    /// Write-back happens only after the whole notebook executed cleanly;
    /// on any failure the on-disk file is left exactly as it was.
    async fn process_document(&mut self, document: &DocumentPath) -> crate::errors::Result<()> {
        let path = document.path();

        let mut notebook =
            Notebook::load(self.fs.as_ref(), path).map_err(|source| NbrunError::Load {
                path: path.to_path_buf(),
                source,
            })?;

        self.executor
            .execute(&mut notebook, &document.parent_dir(), self.config.timeout)
            .await?;

        notebook
            .save(self.fs.as_ref(), path)
            .map_err(|source| NbrunError::Persist {
                path: path.to_path_buf(),
                source,
            })?;

        Ok(())
    }
}
