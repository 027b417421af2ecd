// tests/runner_isolation.rs

mod common;
use crate::common::init_tracing;

use std::error::Error;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::timeout;

use nbrun::config::{KernelSection, RunConfig};
use nbrun::discover::GlobDiscovery;
use nbrun::fs::mock::MockFileSystem;
use nbrun::fs::FileSystem;
use nbrun::notebook::Notebook;
use nbrun::runner::BatchRunner;
use nbrun_test_utils::builders::NotebookBuilder;
use nbrun_test_utils::fake_executor::FakeExecutor;

type TestResult = Result<(), Box<dyn Error>>;

fn run_config(projects: &[&str]) -> RunConfig {
    RunConfig {
        projects: projects.iter().map(|s| s.to_string()).collect(),
        timeout: Duration::from_secs(5),
        fail_on_error: false,
        kernel: KernelSection::default(),
    }
}

fn runner_over(
    fs: &MockFileSystem,
    projects: &[&str],
    executor: FakeExecutor,
) -> BatchRunner<FakeExecutor> {
    let fs: Arc<dyn FileSystem> = Arc::new(fs.clone());
    let discovery = GlobDiscovery::new(Arc::clone(&fs), ".").expect("building discovery");
    BatchRunner::new(run_config(projects), Box::new(discovery), fs, executor)
}

#[tokio::test]
async fn one_failing_notebook_does_not_stop_the_batch() -> TestResult {
    init_tracing();

    let fs = MockFileSystem::new();
    fs.add_file(
        "menpo/a.ipynb",
        NotebookBuilder::new().code("print('a')").json_string(),
    );
    fs.add_file(
        "menpo/b.ipynb",
        NotebookBuilder::new().code("boom()").json_string(),
    );
    fs.add_file(
        "menpo/c.ipynb",
        NotebookBuilder::new().code("print('c')").json_string(),
    );

    let executed = Arc::new(Mutex::new(Vec::new()));
    let executor = FakeExecutor::new(executed.clone()).failing_on("boom");

    let runner = runner_over(&fs, &["menpo"], executor);
    let report = timeout(Duration::from_secs(3), runner.run()).await?;

    // Every notebook was handed to the executor, failure or not.
    assert_eq!(executed.lock().unwrap().len(), 3);

    let succeeded: Vec<PathBuf> = report.succeeded.clone();
    assert_eq!(
        succeeded,
        vec![
            PathBuf::from("menpo/a.ipynb"),
            PathBuf::from("menpo/c.ipynb"),
        ]
    );
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].path, PathBuf::from("menpo/b.ipynb"));
    assert!(report.failed[0].description.contains("cell 0"));
    Ok(())
}

#[tokio::test]
async fn write_back_happens_only_on_success() -> TestResult {
    init_tracing();

    let good_seed = NotebookBuilder::new().code("print('ok')").json_string();
    let bad_seed = NotebookBuilder::new().code("boom()").json_string();

    let fs = MockFileSystem::new();
    fs.add_file("menpo/good.ipynb", good_seed.clone());
    fs.add_file("menpo/wrong.ipynb", bad_seed.clone());

    let executed = Arc::new(Mutex::new(Vec::new()));
    let executor = FakeExecutor::new(executed).failing_on("boom");

    let runner = runner_over(&fs, &["menpo"], executor);
    let report = timeout(Duration::from_secs(3), runner.run()).await?;
    assert_eq!(report.succeeded.len(), 1);
    assert_eq!(report.failed.len(), 1);

    // The failed notebook is byte-for-byte what was seeded.
    let wrong_bytes = fs.file_contents("menpo/wrong.ipynb").expect("file exists");
    assert_eq!(wrong_bytes, bad_seed.into_bytes());

    // The successful one was rewritten with fresh outputs.
    let good_bytes = fs.file_contents("menpo/good.ipynb").expect("file exists");
    assert_ne!(good_bytes, good_seed.clone().into_bytes());

    let persisted = Notebook::from_json_str(std::str::from_utf8(&good_bytes)?)?;
    let outputs = persisted.cells[0].outputs.as_ref().expect("outputs written");
    assert_eq!(outputs[0]["text"], serde_json::json!("fake output\n"));
    Ok(())
}

#[tokio::test]
async fn unparseable_notebook_is_skipped_and_left_untouched() -> TestResult {
    init_tracing();

    let fs = MockFileSystem::new();
    fs.add_file("menpo/broken.ipynb", "this is not json");
    fs.add_file(
        "menpo/fine.ipynb",
        NotebookBuilder::new().code("print(1)").json_string(),
    );

    let executed = Arc::new(Mutex::new(Vec::new()));
    let executor = FakeExecutor::new(executed.clone());

    let runner = runner_over(&fs, &["menpo"], executor);
    let report = timeout(Duration::from_secs(3), runner.run()).await?;

    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].path, PathBuf::from("menpo/broken.ipynb"));
    assert_eq!(report.succeeded, vec![PathBuf::from("menpo/fine.ipynb")]);

    // The broken notebook never reached the executor and was not rewritten.
    assert_eq!(executed.lock().unwrap().len(), 1);
    let bytes = fs.file_contents("menpo/broken.ipynb").expect("file exists");
    assert_eq!(bytes, b"this is not json".to_vec());
    Ok(())
}

#[tokio::test]
async fn missing_project_is_isolated_from_other_projects() -> TestResult {
    init_tracing();

    let fs = MockFileSystem::new();
    fs.add_file(
        "menpo/a.ipynb",
        NotebookBuilder::new().code("print('a')").json_string(),
    );

    let executed = Arc::new(Mutex::new(Vec::new()));
    let executor = FakeExecutor::new(executed);

    let runner = runner_over(&fs, &["no-such-project", "menpo"], executor);
    let report = timeout(Duration::from_secs(3), runner.run()).await?;

    assert_eq!(report.failed_projects.len(), 1);
    assert_eq!(report.failed_projects[0].path, PathBuf::from("no-such-project"));
    assert_eq!(report.succeeded, vec![PathBuf::from("menpo/a.ipynb")]);
    assert!(report.has_failures());
    Ok(())
}

#[tokio::test]
async fn notebooks_run_in_discovery_order_one_at_a_time() -> TestResult {
    init_tracing();

    let fs = MockFileSystem::new();
    for name in ["menpo/b.ipynb", "menpo/a.ipynb", "menpo/sub/c.ipynb"] {
        fs.add_file(name, NotebookBuilder::new().code("pass").json_string());
    }

    let executed = Arc::new(Mutex::new(Vec::new()));
    let executor = FakeExecutor::new(executed.clone());

    let runner = runner_over(&fs, &["menpo"], executor);
    let report = timeout(Duration::from_secs(3), runner.run()).await?;

    assert_eq!(
        report.succeeded,
        vec![
            PathBuf::from("menpo/a.ipynb"),
            PathBuf::from("menpo/b.ipynb"),
            PathBuf::from("menpo/sub/c.ipynb"),
        ]
    );

    // The executor saw each notebook's parent directory as its workdir, in
    // the same order.
    let workdirs = executed.lock().unwrap().clone();
    assert_eq!(
        workdirs,
        vec![
            PathBuf::from("menpo"),
            PathBuf::from("menpo"),
            PathBuf::from("menpo/sub"),
        ]
    );
    Ok(())
}
