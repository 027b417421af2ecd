// src/errors.rs

//! Crate-wide error aliases and helpers.

use std::path::PathBuf;

use thiserror::Error;

use crate::exec::ExecutionFailure;

#[derive(Error, Debug)]
pub enum NbrunError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Discovering notebooks for project '{project}' failed: {source}")]
    Discovery {
        project: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Loading notebook {path:?} failed: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("{0}")]
    Execution(#[from] ExecutionFailure),

    #[error("Writing notebook {path:?} back failed: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, NbrunError>;
