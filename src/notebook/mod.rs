// src/notebook/mod.rs

//! Minimal notebook document model.
//!
//! The notebook format itself is not this tool's business: we only need to
//! find the code cells, replace their outputs after a run, and write the
//! document back without disturbing anything else. Everything we do not
//! interpret (document metadata, format version fields, per-cell metadata)
//! is carried through untouched in flattened `serde_json` maps.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::fs::FileSystem;

/// File extension of executable documents.
pub const NOTEBOOK_EXTENSION: &str = "ipynb";

/// An in-memory notebook: a sequence of cells plus whatever other
/// top-level fields the file carried.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notebook {
    #[serde(default)]
    pub cells: Vec<Cell>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One cell of a notebook.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cell {
    pub cell_type: String,

    #[serde(default)]
    pub source: SourceText,

    /// Present on code cells only; replaced wholesale after execution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outputs: Option<Vec<Value>>,

    /// Present on code cells only; may be JSON null for never-run cells.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_count: Option<Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Cell source as the format allows it: a single string or a list of lines.
///
/// Serialized back in whichever form it arrived.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SourceText {
    Text(String),
    Lines(Vec<String>),
}

impl Default for SourceText {
    fn default() -> Self {
        SourceText::Text(String::new())
    }
}

impl SourceText {
    /// The full source as one string.
    pub fn text(&self) -> String {
        match self {
            SourceText::Text(s) => s.clone(),
            SourceText::Lines(lines) => lines.concat(),
        }
    }
}

impl Cell {
    pub fn is_code(&self) -> bool {
        self.cell_type == "code"
    }

    pub fn source_text(&self) -> String {
        self.source.text()
    }

    /// Record a fresh, successful execution of this cell: the captured
    /// stdout replaces any previous outputs.
    pub fn record_execution(&mut self, count: u64, stdout_text: &str) {
        let outputs = if stdout_text.is_empty() {
            Vec::new()
        } else {
            vec![stream_output(stdout_text)]
        };
        self.outputs = Some(outputs);
        self.execution_count = Some(json!(count));
    }
}

/// A `stream` output entry carrying captured stdout text.
pub fn stream_output(text: &str) -> Value {
    json!({
        "output_type": "stream",
        "name": "stdout",
        "text": text,
    })
}

impl Notebook {
    pub fn from_json_str(contents: &str) -> Result<Self> {
        serde_json::from_str(contents).context("parsing notebook JSON")
    }

    pub fn to_json_string(&self) -> Result<String> {
        let mut out = serde_json::to_string_pretty(self).context("serializing notebook JSON")?;
        out.push('\n');
        Ok(out)
    }

    /// Read and parse a notebook from `path`.
    pub fn load(fs: &dyn FileSystem, path: &Path) -> Result<Self> {
        let contents = fs
            .read_to_string(path)
            .with_context(|| format!("reading notebook {:?}", path))?;
        Self::from_json_str(&contents).with_context(|| format!("parsing notebook {:?}", path))
    }

    /// Serialize and write this notebook back to `path`.
    pub fn save(&self, fs: &dyn FileSystem, path: &Path) -> Result<()> {
        let contents = self.to_json_string()?;
        fs.write(path, contents.as_bytes())
            .with_context(|| format!("writing notebook {:?}", path))
    }

    /// Indices and sources of the code cells, in document order.
    pub fn code_cells(&self) -> impl Iterator<Item = (usize, &Cell)> {
        self.cells.iter().enumerate().filter(|(_, c)| c.is_code())
    }
}
