use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use nbrun::exec::{ExecutionFailure, ExecutorBackend};
use nbrun::notebook::Notebook;

/// A fake executor that:
/// - records the working directory of every notebook it is asked to "run"
/// - stamps visible outputs onto each code cell, so persistence is
///   observable on disk
/// - fails any notebook whose source contains the configured token,
///   mimicking a cell error without spawning a real interpreter.
pub struct FakeExecutor {
    executed: Arc<Mutex<Vec<PathBuf>>>,
    fail_token: Option<String>,
}

impl FakeExecutor {
    pub fn new(executed: Arc<Mutex<Vec<PathBuf>>>) -> Self {
        Self {
            executed,
            fail_token: None,
        }
    }

    /// Any notebook with a code cell containing `token` fails on that cell.
    pub fn failing_on(mut self, token: &str) -> Self {
        self.fail_token = Some(token.to_string());
        self
    }
}

impl ExecutorBackend for FakeExecutor {
    fn execute<'a>(
        &'a mut self,
        doc: &'a mut Notebook,
        workdir: &'a Path,
        _timeout: Duration,
    ) -> Pin<Box<dyn Future<Output = Result<(), ExecutionFailure>> + Send + 'a>> {
        let executed = Arc::clone(&self.executed);
        let fail_token = self.fail_token.clone();

        Box::pin(async move {
            {
                let mut guard = executed.lock().unwrap();
                guard.push(workdir.to_path_buf());
            }

            let mut count = 0u64;
            for index in 0..doc.cells.len() {
                if !doc.cells[index].is_code() {
                    continue;
                }
                let source = doc.cells[index].source_text();

                if let Some(ref token) = fail_token {
                    if source.contains(token.as_str()) {
                        return Err(ExecutionFailure::CellFailed {
                            index,
                            details: format!("fake failure triggered by '{token}'"),
                        });
                    }
                }

                count += 1;
                doc.cells[index].record_execution(count, "fake output\n");
            }

            Ok(())
        })
    }
}
