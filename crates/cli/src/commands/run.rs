//! Run Command

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use jstap_runner::{JsRunner, RunnerConfig, Suite, SuiteKind, SuiteTarget};
use tracing::debug;

use crate::output::{self, OutputFormat};

#[derive(Args)]
pub struct RunArgs {
    /// Framework the suite is written for (jasmine or qunit)
    #[arg(short, long, default_value = "qunit")]
    pub kind: SuiteKind,

    /// URL of the runner page
    #[arg(long, required_unless_present = "file", conflicts_with = "file")]
    pub url: Option<String>,

    /// Runner page on disk
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Title shown in verbose output
    #[arg(long)]
    pub title: Option<String>,

    /// Launcher script overriding the configured one
    #[arg(long)]
    pub launcher: Option<PathBuf>,

    /// Headless browser binary
    #[arg(long, env = "PHANTOMJS")]
    pub phantomjs: Option<PathBuf>,

    /// Seconds before the browser is stopped
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Directory for the JSON report
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl RunArgs {
    pub fn suite(&self) -> Suite {
        let target = match (&self.url, &self.file) {
            (Some(url), _) => SuiteTarget::Url(url.clone()),
            (None, Some(file)) => SuiteTarget::File(file.clone()),
            (None, None) => SuiteTarget::Url(String::new()),
        };

        let mut suite = Suite::new(self.kind, target);
        if let Some(title) = &self.title {
            suite = suite.with_title(title.clone());
        }
        if let Some(launcher) = &self.launcher {
            suite = suite.with_launcher(launcher);
        }
        suite
    }

    /// Apply flag overrides on top of the file configuration
    pub fn configure(&self, mut config: RunnerConfig, verbosity: Option<u8>) -> RunnerConfig {
        if let Some(phantomjs) = &self.phantomjs {
            config.phantomjs = phantomjs.clone();
        }
        if let Some(timeout) = self.timeout {
            config.process_timeout_secs = timeout;
        }
        if let Some(output) = &self.output {
            config.output_dir = Some(output.clone());
        }
        if let Some(verbosity) = verbosity {
            config.verbosity = verbosity;
        }
        config
    }
}

pub async fn execute(
    args: RunArgs,
    config_path: &Path,
    verbosity: Option<u8>,
    format: OutputFormat,
) -> Result<i32> {
    let config = RunnerConfig::load(config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    let config = args.configure(config, verbosity);
    config.validate()?;
    debug!(?config, "Effective configuration");

    let runner = JsRunner::with_config(config);
    match runner.run(&args.suite()).await {
        Ok(report) => {
            output::print_report(&report, &runner.config().ignore_stack_patterns, format)?;
            Ok(report.outcome().exit_code())
        }
        Err(e) => {
            output::print_error(&e.to_string());
            Ok(e.exit_code())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Wrapper {
        #[command(flatten)]
        args: RunArgs,
    }

    #[test]
    fn test_url_suite() {
        let args = Wrapper::parse_from(["run", "--kind", "jasmine", "--url", "http://localhost/jasmine"]).args;
        let suite = args.suite();
        assert_eq!(suite.kind, SuiteKind::Jasmine);
        assert_eq!(suite.target, SuiteTarget::Url("http://localhost/jasmine".into()));
        assert_eq!(suite.title(), "Jasmine test suite");
    }

    #[test]
    fn test_title_and_launcher_flags() {
        let args = Wrapper::parse_from([
            "run",
            "--url",
            "http://localhost/qunit",
            "--title",
            "Django JS",
            "--launcher",
            "js/qunit-runner.js",
        ])
        .args;
        let suite = args.suite();
        assert_eq!(suite.title(), "Django JS");
        assert_eq!(suite.launcher, Some(PathBuf::from("js/qunit-runner.js")));
    }

    #[test]
    fn test_url_or_file_is_required() {
        assert!(Wrapper::try_parse_from(["run"]).is_err());
        assert!(Wrapper::try_parse_from(["run", "--url", "u", "--file", "f"]).is_err());
    }

    #[test]
    fn test_overrides() {
        let args = Wrapper::parse_from([
            "run",
            "--file",
            "runner.html",
            "--phantomjs",
            "/opt/phantomjs",
            "--timeout",
            "5",
        ])
        .args;
        let config = args.configure(RunnerConfig::default(), Some(2));

        assert_eq!(config.phantomjs, PathBuf::from("/opt/phantomjs"));
        assert_eq!(config.process_timeout_secs, 5);
        assert_eq!(config.verbosity, 2);
        assert_eq!(config.launch_timeout_secs, 3);
    }
}
