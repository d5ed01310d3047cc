//! Runner tests against a scripted stand-in for the browser

#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use jstap_runner::{JsRunner, Outcome, RunnerConfig, RunnerError, Suite, SuiteTarget};
use tempfile::TempDir;

const PASSING: &str = "\
# module: urls
# test: reverse
ok 1
ok 2
# test: context
ok 3
";

const FAILING: &str = "\
# module: urls
# test: reverse
ok 1
not ok 2 - expected: 'a', got: 'b'
#   at http://localhost:8000/static/js/test/libs/qunit.js:435
#   at http://localhost:8000/static/js/urls.js:12
";

/// Fake browser: records its arguments, prints `output` on stdout (or on
/// stderr with `on_stderr`), prints noise on the other pipe, runs `tail` last
fn fake_browser(dir: &Path, output: &str, tail: &str, on_stderr: bool) -> PathBuf {
    let path = dir.join("phantomjs");
    let (output_redirect, noise_redirect) = if on_stderr { (" >&2", "") } else { ("", " >&2") };
    let script = format!(
        "#!/bin/sh\necho \"$@\" > \"$(dirname \"$0\")/args.txt\"\ncat{} <<'EOF'\n{}EOF\necho 'console noise'{}\n{}\n",
        output_redirect, output, noise_redirect, tail
    );
    std::fs::write(&path, script).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn setup(output: &str, tail: &str) -> (TempDir, JsRunner, Suite) {
    setup_with(output, tail, false)
}

fn setup_with(output: &str, tail: &str, on_stderr: bool) -> (TempDir, JsRunner, Suite) {
    let dir = tempfile::tempdir().unwrap();
    let phantomjs = fake_browser(dir.path(), output, tail, on_stderr);
    let launcher = dir.path().join("qunit-runner.js");
    std::fs::write(&launcher, "// launcher").unwrap();

    let config = RunnerConfig {
        phantomjs,
        launchers_dir: dir.path().to_path_buf(),
        process_timeout_secs: 10,
        verbosity: 2,
        ..Default::default()
    };
    let suite = Suite::qunit(SuiteTarget::Url("http://localhost:8000/qunit".into()));
    (dir, JsRunner::with_config(config), suite)
}

#[tokio::test]
async fn test_passing_suite() {
    let (dir, runner, suite) = setup(PASSING, "exit 0");

    let report = runner.run(&suite).await.unwrap();
    assert_eq!(report.outcome(), Outcome::Passed);
    assert_eq!(report.summary.tests, 2);
    assert_eq!(report.summary.passed, 3);
    assert_eq!(report.exit_code, Some(0));

    let args = std::fs::read_to_string(dir.path().join("args.txt")).unwrap();
    let args: Vec<&str> = args.split_whitespace().collect();
    assert!(args[0].starts_with("--cookies-file="));
    assert_eq!(args[1], dir.path().join("qunit-runner.js").to_str().unwrap());
    assert_eq!(args[2], "http://localhost:8000/qunit");
    assert_eq!(args[3], "3");
}

#[tokio::test]
async fn test_failed_assertions() {
    let (_dir, runner, suite) = setup(FAILING, "exit 0");

    let report = runner.run(&suite).await.unwrap();
    assert_eq!(report.outcome(), Outcome::AssertionsFailed);
    assert_eq!(report.failures.len(), 1);

    let failure = &report.failures[0];
    assert_eq!(failure.test.as_deref(), Some("reverse"));
    assert_eq!(failure.expected.as_deref(), Some("a"));
    assert_eq!(failure.stack.len(), 2);

    let err = runner.run_checked(&suite).await.unwrap_err();
    assert_eq!(err.exit_code(), 1);
    let message = err.to_string();
    assert!(message.contains(" + reverse - 2: failed\n\texpected: 'a', got: 'b'"));
    assert!(message.contains("urls.js:12"));
    assert!(!message.contains("qunit.js:435"));
}

#[tokio::test]
async fn test_output_on_stderr_is_parsed() {
    let (_dir, runner, suite) = setup_with(FAILING, "exit 0", true);

    let report = runner.run(&suite).await.unwrap();
    assert_eq!(report.summary.tests, 1);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].got.as_deref(), Some("b"));
    assert_eq!(report.failures[0].stack.len(), 2);
}

#[tokio::test]
async fn test_non_zero_exit() {
    let (_dir, runner, suite) = setup(PASSING, "exit 3");

    let report = runner.run(&suite).await.unwrap();
    assert_eq!(report.outcome(), Outcome::ProcessFailed);
    assert_eq!(report.exit_code, Some(3));

    let err = runner.run_checked(&suite).await.unwrap_err();
    assert!(matches!(err, RunnerError::ProcessExit { code: Some(3) }));
}

#[tokio::test]
async fn test_failures_and_bad_exit_are_both_reported() {
    let (_dir, runner, suite) = setup(FAILING, "exit 1");

    let report = runner.run(&suite).await.unwrap();
    assert_eq!(report.outcome(), Outcome::Both);
}

#[tokio::test]
async fn test_timeout_stops_the_browser() {
    let (dir, runner, suite) = setup(PASSING, "exec sleep 30");
    let config = RunnerConfig {
        process_timeout_secs: 1,
        ..runner.config().clone()
    };
    let runner = JsRunner::with_config(config);

    let err = runner.run(&suite).await.unwrap_err();
    assert!(matches!(err, RunnerError::Timeout(1)));
    assert_eq!(err.exit_code(), 2);
    drop(dir);
}

#[tokio::test]
async fn test_missing_browser() {
    let (dir, runner, suite) = setup(PASSING, "exit 0");
    let config = RunnerConfig {
        phantomjs: dir.path().join("does-not-exist"),
        ..runner.config().clone()
    };

    let err = JsRunner::with_config(config).run(&suite).await.unwrap_err();
    assert!(matches!(err, RunnerError::Spawn(_)));
    assert_eq!(err.exit_code(), 3);
}

#[tokio::test]
async fn test_report_file() {
    let (dir, runner, suite) = setup(FAILING, "exit 0");
    let output = dir.path().join("reports");
    let config = RunnerConfig {
        output_dir: Some(output.clone()),
        ..runner.config().clone()
    };

    JsRunner::with_config(config).run(&suite).await.unwrap();
    assert!(output.join(jstap_runner::runner::REPORT_FILE).exists());
}
