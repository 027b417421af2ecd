#![allow(dead_code)]

use nbrun::notebook::Notebook;
use serde_json::{json, Value};

/// Builder for notebook JSON documents to simplify test setup.
///
/// Produces minimal but well-formed nbformat-4 content; the compact JSON
/// from [`NotebookBuilder::json_string`] deliberately differs from the
/// pretty-printed form `nbrun` writes back, so tests can tell a persisted
/// notebook from a seeded one by its bytes.
pub struct NotebookBuilder {
    cells: Vec<Value>,
}

impl NotebookBuilder {
    pub fn new() -> Self {
        Self { cells: Vec::new() }
    }

    pub fn code(mut self, source: &str) -> Self {
        self.cells.push(json!({
            "cell_type": "code",
            "source": source,
            "outputs": [],
            "execution_count": null,
            "metadata": {},
        }));
        self
    }

    pub fn markdown(mut self, source: &str) -> Self {
        self.cells.push(json!({
            "cell_type": "markdown",
            "source": source,
            "metadata": {},
        }));
        self
    }

    pub fn to_value(&self) -> Value {
        json!({
            "cells": self.cells,
            "metadata": {
                "kernelspec": {"name": "python3", "display_name": "Python 3", "language": "python"},
            },
            "nbformat": 4,
            "nbformat_minor": 5,
        })
    }

    /// Compact JSON, as seeded on disk by tests.
    pub fn json_string(&self) -> String {
        self.to_value().to_string()
    }

    pub fn build(&self) -> Notebook {
        serde_json::from_value(self.to_value()).expect("builder produced invalid notebook JSON")
    }
}

impl Default for NotebookBuilder {
    fn default() -> Self {
        Self::new()
    }
}
