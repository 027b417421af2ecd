// src/exec/session.rs

//! One interpreter session per notebook.
//!
//! The session holds a single interactive interpreter child process.
//! Every code cell of one notebook runs in this same process, so state
//! (variables, imports) accumulates across cells exactly as it would for a
//! user running the notebook top to bottom. The session is never shared
//! between notebooks.
//!
//! Wire protocol: each cell is shipped as one self-contained interactive
//! statement. The cell source travels base64-encoded so arbitrary content
//! (quotes, blank lines, indentation) cannot break out of the statement.
//! The statement executes the cell, then prints a unique end-marker line
//! tagged `ok` or `err`; tracebacks are redirected to stdout so the
//! failure cause arrives in-band before the marker.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::{debug, info, warn};

use crate::config::KernelSection;
use crate::exec::ExecutionFailure;

/// A live interpreter child process executing cells for one notebook.
pub struct KernelSession {
    child: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
}

impl KernelSession {
    /// Spawn a fresh interpreter with `workdir` as its working directory.
    pub async fn spawn(kernel: &KernelSection, workdir: &Path) -> Result<Self> {
        info!(
            command = %kernel.command,
            workdir = %workdir.display(),
            "starting kernel session"
        );

        let mut cmd = Command::new(&kernel.command);
        cmd.args(&kernel.args)
            .current_dir(workdir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd
            .spawn()
            .with_context(|| format!("spawning kernel process '{}'", kernel.command))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| anyhow!("kernel child has no stdin pipe"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| anyhow!("kernel child has no stdout pipe"))?;
        let stderr = child.stderr.take();

        // Always consume stderr so buffers don't fill; the interactive
        // prompt noise lands there too. Log at debug.
        if let Some(stderr) = stderr {
            tokio::spawn(async move {
                let reader = BufReader::new(stderr);
                let mut lines = reader.lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!("kernel stderr: {}", line);
                }
            });
        }

        // The cell wrapper below relies on these being importable.
        stdin
            .write_all(b"import sys, base64, traceback\n")
            .await
            .context("writing kernel prelude")?;
        stdin.flush().await.context("flushing kernel prelude")?;

        Ok(Self {
            child,
            stdin,
            stdout: BufReader::new(stdout).lines(),
        })
    }

    /// Run one cell's source, waiting at most `timeout` for it to finish.
    ///
    /// Returns the captured stdout text on success. On failure the session
    /// must not be reused; the caller tears it down.
    pub async fn run_cell(
        &mut self,
        index: usize,
        source: &str,
        timeout: Duration,
    ) -> std::result::Result<String, ExecutionFailure> {
        let marker = format!("--nbrun-cell-{index}-done--");
        let statement = cell_statement(index, source, &marker);

        self.send_statement(&statement, index)
            .await
            .map_err(ExecutionFailure::Session)?;

        let collect = async {
            let mut captured = String::new();
            loop {
                match self.stdout.next_line().await {
                    Ok(Some(line)) => {
                        if let Some(tag) = line.strip_prefix(marker.as_str()) {
                            return Ok((tag.trim() == "ok", captured));
                        }
                        captured.push_str(&line);
                        captured.push('\n');
                    }
                    Ok(None) => {
                        return Err(anyhow!("kernel exited while running cell {index}"));
                    }
                    Err(e) => {
                        return Err(anyhow::Error::from(e)
                            .context(format!("reading kernel stdout for cell {index}")));
                    }
                }
            }
        };

        match tokio::time::timeout(timeout, collect).await {
            Ok(Ok((true, captured))) => Ok(captured),
            Ok(Ok((false, captured))) => Err(ExecutionFailure::CellFailed {
                index,
                details: captured,
            }),
            Ok(Err(e)) => Err(ExecutionFailure::Session(e)),
            Err(_elapsed) => {
                // Stop the runaway cell right away; the session is dead to
                // the caller from here on.
                if let Err(e) = self.child.start_kill() {
                    warn!(error = %e, "failed to kill kernel after cell timeout");
                }
                Err(ExecutionFailure::CellTimedOut {
                    index,
                    timeout_secs: timeout.as_secs(),
                })
            }
        }
    }

    async fn send_statement(&mut self, statement: &str, index: usize) -> Result<()> {
        self.stdin
            .write_all(statement.as_bytes())
            .await
            .with_context(|| format!("sending cell {index} to kernel"))?;
        self.stdin
            .flush()
            .await
            .with_context(|| format!("flushing cell {index} to kernel"))?;
        Ok(())
    }

    /// Tear the session down. Called after each notebook regardless of
    /// outcome; no session ever survives into the next notebook.
    pub async fn shutdown(mut self) {
        if let Err(e) = self.child.kill().await {
            warn!(error = %e, "failed to kill kernel process on shutdown");
        }
        debug!("kernel session shut down");
    }
}

/// Build the single interactive statement that runs one cell.
fn cell_statement(index: usize, source: &str, marker: &str) -> String {
    let encoded = BASE64.encode(source);
    format!(
        "exec(\"try:\\n    exec(compile(base64.b64decode('{encoded}'), '<cell {index}>', 'exec'), globals())\\n    print('{marker} ok')\\nexcept BaseException:\\n    traceback.print_exc(file=sys.stdout)\\n    print('{marker} err')\\n\")\n"
    )
}
