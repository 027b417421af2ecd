// src/discover/mod.rs

//! Notebook discovery.
//!
//! Given a project subfolder name, find every notebook under it, at any
//! depth, excluding editor checkpoint copies. Discovery is behind a trait
//! so the batch runner can be driven from a canned path list in tests.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::fs::FileSystem;
use crate::notebook::NOTEBOOK_EXTENSION;

/// Reserved backup directory name; notebooks directly under one of these
/// are tool-generated copies, not documents to execute.
pub const CHECKPOINT_DIR_NAME: &str = ".ipynb_checkpoints";

/// Location of one discovered notebook.
///
/// The parent directory doubles as the working directory for execution, so
/// relative resource references inside the notebook resolve correctly.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct DocumentPath(PathBuf);

impl DocumentPath {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }

    /// Directory the notebook lives in; execution runs with this as cwd.
    pub fn parent_dir(&self) -> PathBuf {
        match self.0.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    /// True if the immediate parent directory is a checkpoint directory.
    pub fn is_checkpoint_copy(&self) -> bool {
        self.0
            .parent()
            .and_then(|p| p.file_name())
            .map(|name| name == CHECKPOINT_DIR_NAME)
            .unwrap_or(false)
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// Enumerates the notebooks belonging to a named project.
pub trait Discovery: Send + Sync {
    /// All notebook paths under `project`, sorted lexicographically,
    /// checkpoint copies excluded. An empty result is not an error; a
    /// missing or unreadable project root is.
    fn find_documents(&self, project: &str) -> Result<Vec<DocumentPath>>;
}

/// `Discovery` over a real (or mocked) filesystem tree using glob matching.
pub struct GlobDiscovery {
    fs: Arc<dyn FileSystem>,
    root: PathBuf,
    matcher: GlobSet,
}

impl fmt::Debug for GlobDiscovery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlobDiscovery")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

impl GlobDiscovery {
    /// Create a discovery rooted at `root` (usually the current working
    /// directory), matching `**/*.ipynb` under each project subtree.
    pub fn new(fs: Arc<dyn FileSystem>, root: impl Into<PathBuf>) -> Result<Self> {
        let pattern = format!("**/*.{NOTEBOOK_EXTENSION}");
        let matcher = build_globset(&[pattern])?;
        Ok(Self {
            fs,
            root: root.into(),
            matcher,
        })
    }

    fn project_root(&self, project: &str) -> PathBuf {
        if self.root.as_os_str() == "." {
            PathBuf::from(project)
        } else {
            self.root.join(project)
        }
    }

    fn walk_files(&self, dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
        for entry in self
            .fs
            .read_dir(dir)
            .with_context(|| format!("listing directory {:?}", dir))?
        {
            if self.fs.is_dir(&entry) {
                self.walk_files(&entry, out)?;
            } else if self.fs.is_file(&entry) {
                out.push(entry);
            }
        }
        Ok(())
    }
}

impl Discovery for GlobDiscovery {
    fn find_documents(&self, project: &str) -> Result<Vec<DocumentPath>> {
        let project_root = self.project_root(project);
        if !self.fs.is_dir(&project_root) {
            return Err(anyhow!(
                "project directory {:?} does not exist or is not a directory",
                project_root
            ));
        }

        let mut files = Vec::new();
        self.walk_files(&project_root, &mut files)?;

        // Checkpoint copies are filtered after matching, not during the
        // walk, so checkpoint directories never affect sibling paths.
        let mut documents: Vec<DocumentPath> = files
            .into_iter()
            .filter(|path| {
                path.strip_prefix(&project_root)
                    .map(|rel| self.matcher.is_match(rel))
                    .unwrap_or(false)
            })
            .map(DocumentPath::new)
            .filter(|doc| !doc.is_checkpoint_copy())
            .collect();

        documents.sort();
        Ok(documents)
    }
}

/// Build a GlobSet from simple string patterns.
fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = Glob::new(pat).with_context(|| format!("invalid glob pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}
