// tests/kernel_end_to_end.rs
//
// End-to-end tests against the real kernel backend. These spawn actual
// `python3` processes; on machines without python3 they skip themselves.

mod common;
use crate::common::init_tracing;

use std::error::Error;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;

use nbrun::config::{KernelSection, RunConfig};
use nbrun::discover::GlobDiscovery;
use nbrun::exec::KernelBackend;
use nbrun::fs::{FileSystem, RealFileSystem};
use nbrun::notebook::Notebook;
use nbrun::runner::{BatchRunner, RunReport};
use nbrun_test_utils::builders::NotebookBuilder;

type TestResult<T = ()> = Result<T, Box<dyn Error>>;

fn python3_available() -> bool {
    std::process::Command::new("python3")
        .arg("-c")
        .arg("pass")
        .output()
        .map(|out| out.status.success())
        .unwrap_or(false)
}

fn seed_notebook(dir: &Path, name: &str, builder: &NotebookBuilder) -> TestResult {
    std::fs::create_dir_all(dir)?;
    std::fs::write(dir.join(name), builder.json_string())?;
    Ok(())
}

async fn sweep(root: &Path, timeout_secs: u64) -> TestResult<RunReport> {
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let discovery = GlobDiscovery::new(Arc::clone(&fs), root)?;
    let config = RunConfig {
        projects: vec!["proj".to_string()],
        timeout: Duration::from_secs(timeout_secs),
        fail_on_error: false,
        kernel: KernelSection::default(),
    };
    let executor = KernelBackend::new(config.kernel.clone());
    let runner = BatchRunner::new(config, Box::new(discovery), fs, executor);

    Ok(timeout(Duration::from_secs(60), runner.run()).await?)
}

#[tokio::test]
async fn state_persists_across_cells_and_outputs_are_written() -> TestResult {
    init_tracing();
    if !python3_available() {
        eprintln!("python3 not available; skipping");
        return Ok(());
    }

    let dir = tempfile::tempdir()?;
    let proj = dir.path().join("proj");
    seed_notebook(
        &proj,
        "calc.ipynb",
        &NotebookBuilder::new()
            .markdown("# scratch")
            .code("x = 40 + 2")
            .code("print(x)"),
    )?;

    let report = sweep(dir.path(), 30).await?;
    assert!(report.failed.is_empty(), "failures: {:?}", report.failed);
    assert_eq!(report.succeeded.len(), 1);

    let persisted =
        Notebook::from_json_str(&std::fs::read_to_string(proj.join("calc.ipynb"))?)?;
    let outputs = persisted.cells[2].outputs.as_ref().expect("outputs written");
    assert_eq!(outputs[0]["text"], serde_json::json!("42\n"));
    // The silent cell got an execution count but no output entries.
    assert_eq!(persisted.cells[1].execution_count, Some(serde_json::json!(1)));
    assert!(persisted.cells[1]
        .outputs
        .as_ref()
        .is_some_and(|outputs| outputs.is_empty()));
    Ok(())
}

#[tokio::test]
async fn sessions_are_isolated_between_notebooks() -> TestResult {
    init_tracing();
    if !python3_available() {
        eprintln!("python3 not available; skipping");
        return Ok(());
    }

    let dir = tempfile::tempdir()?;
    let proj = dir.path().join("proj");
    seed_notebook(
        &proj,
        "a_defines.ipynb",
        &NotebookBuilder::new().code("leak = 1"),
    )?;
    let b_seed = NotebookBuilder::new().code("print(leak)");
    seed_notebook(&proj, "b_reads.ipynb", &b_seed)?;

    let report = sweep(dir.path(), 30).await?;

    // The first notebook runs clean; the second cannot see its state and
    // fails with a NameError, leaving its file untouched.
    assert_eq!(report.succeeded.len(), 1);
    assert!(report.succeeded[0].ends_with("a_defines.ipynb"));
    assert_eq!(report.failed.len(), 1);
    assert!(report.failed[0].path.ends_with("b_reads.ipynb"));
    assert!(
        report.failed[0].description.contains("NameError"),
        "unexpected failure: {}",
        report.failed[0].description
    );

    let on_disk = std::fs::read_to_string(proj.join("b_reads.ipynb"))?;
    assert_eq!(on_disk, b_seed.json_string());
    Ok(())
}

#[tokio::test]
async fn runaway_cell_times_out_and_the_batch_continues() -> TestResult {
    init_tracing();
    if !python3_available() {
        eprintln!("python3 not available; skipping");
        return Ok(());
    }

    let dir = tempfile::tempdir()?;
    let proj = dir.path().join("proj");
    seed_notebook(
        &proj,
        "sleepy.ipynb",
        &NotebookBuilder::new().code("import time\ntime.sleep(30)"),
    )?;
    seed_notebook(
        &proj,
        "z_after.ipynb",
        &NotebookBuilder::new().code("print('still here')"),
    )?;

    let report = sweep(dir.path(), 1).await?;

    assert_eq!(report.failed.len(), 1);
    assert!(report.failed[0].path.ends_with("sleepy.ipynb"));
    assert!(
        report.failed[0].description.contains("did not finish within 1s"),
        "unexpected failure: {}",
        report.failed[0].description
    );

    // The notebook after the timeout still ran and was persisted.
    assert_eq!(report.succeeded.len(), 1);
    assert!(report.succeeded[0].ends_with("z_after.ipynb"));
    let persisted =
        Notebook::from_json_str(&std::fs::read_to_string(proj.join("z_after.ipynb"))?)?;
    let outputs = persisted.cells[0].outputs.as_ref().expect("outputs written");
    assert_eq!(outputs[0]["text"], serde_json::json!("still here\n"));
    Ok(())
}

#[tokio::test]
async fn cell_errors_carry_the_traceback() -> TestResult {
    init_tracing();
    if !python3_available() {
        eprintln!("python3 not available; skipping");
        return Ok(());
    }

    let dir = tempfile::tempdir()?;
    let proj = dir.path().join("proj");
    seed_notebook(
        &proj,
        "raises.ipynb",
        &NotebookBuilder::new().code("raise RuntimeError('wat')"),
    )?;

    let report = sweep(dir.path(), 30).await?;
    assert_eq!(report.failed.len(), 1);
    let description = &report.failed[0].description;
    assert!(description.contains("cell 0"), "got: {description}");
    assert!(description.contains("RuntimeError"), "got: {description}");
    assert!(description.contains("wat"), "got: {description}");
    Ok(())
}
