//! Suite runner that drives the browser and parses its output

use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::{DateTime, Utc};
use jstap_core::{Failure, NodeId, NodeKind, ParserOptions, Summary, TapParser, Tree};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::RunnerConfig;
use crate::error::{FailureList, RunnerError, RunnerResult};
use crate::process::BrowserProcess;
use crate::suite::{Suite, SuiteKind};

/// Width of the verbose output separators
pub const LINE_SIZE: usize = 70;

/// File name of the JSON report written to `output_dir`
pub const REPORT_FILE: &str = "jstap-report.json";

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Passed,
    AssertionsFailed,
    ProcessFailed,
    /// Assertions failed and the browser exited abnormally
    Both,
}

impl Outcome {
    /// Same codes as [`RunnerError::exit_code`]
    pub fn exit_code(self) -> i32 {
        match self {
            Outcome::Passed => 0,
            Outcome::AssertionsFailed | Outcome::Both => 1,
            Outcome::ProcessFailed => 2,
        }
    }
}

/// Result of running one suite
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteReport {
    pub title: String,
    pub kind: SuiteKind,
    pub url: String,
    pub summary: Summary,
    pub failures: Vec<Failure>,
    /// `None` when the browser was killed by a signal
    pub exit_code: Option<i32>,
    pub duration_ms: u64,
    pub finished_at: DateTime<Utc>,
}

impl SuiteReport {
    pub fn process_failed(&self) -> bool {
        self.exit_code != Some(0)
    }

    pub fn outcome(&self) -> Outcome {
        match (self.failures.is_empty(), self.process_failed()) {
            (true, false) => Outcome::Passed,
            (false, false) => Outcome::AssertionsFailed,
            (true, true) => Outcome::ProcessFailed,
            (false, true) => Outcome::Both,
        }
    }

    pub fn success(&self) -> bool {
        self.outcome() == Outcome::Passed
    }

    /// Turn a failed run into an error. Failed assertions take precedence
    /// over the browser exit status.
    pub fn into_result(self, ignored_frames: &[String]) -> RunnerResult<Self> {
        if !self.failures.is_empty() {
            if self.process_failed() {
                warn!(exit_code = ?self.exit_code, "Browser also exited abnormally");
            }
            return Err(RunnerError::Assertions(FailureList::new(
                self.failures,
                ignored_frames.to_vec(),
            )));
        }
        if self.process_failed() {
            return Err(RunnerError::ProcessExit {
                code: self.exit_code,
            });
        }
        Ok(self)
    }

    /// Write the report as pretty JSON into `dir`
    pub fn write_json(&self, dir: &Path) -> RunnerResult<PathBuf> {
        std::fs::create_dir_all(dir)?;

        let path = dir.join(REPORT_FILE);
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json)?;

        info!("Report written to: {}", path.display());
        Ok(path)
    }
}

/// Runs javascript suites in the headless browser
pub struct JsRunner {
    config: RunnerConfig,
}

impl JsRunner {
    pub fn new() -> Self {
        Self::with_config(RunnerConfig::default())
    }

    pub fn with_config(config: RunnerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Run a suite and report what happened. Failed assertions and a
    /// non-zero exit are part of the report, not errors.
    pub async fn run(&self, suite: &Suite) -> RunnerResult<SuiteReport> {
        let url = suite.target.to_url()?;
        let launcher = suite.launcher_path(&self.config)?;
        let verbose = self.config.verbose();
        let start = Instant::now();

        info!("Running {} at {}", suite.kind, url);
        if verbose {
            println!("{}", banner(suite.title()));
        }

        let options = ParserOptions::new(NodeKind::Test)
            .announce_enclosing(true)
            .debug(self.config.debug());
        let mut parser = TapParser::new(options);
        let mut process = BrowserProcess::spawn(&self.config, &launcher, &url)?;

        let collected = tokio::time::timeout(self.config.process_timeout(), async {
            while let Some(line) = process.next_line().await {
                for id in parser.feed(&line) {
                    self.show(parser.tree(), id);
                }
            }
            process.wait().await
        })
        .await;

        let exit_code = match collected {
            Ok(status) => status?,
            Err(_) => {
                warn!(
                    "Browser did not finish within {}s, stopping it",
                    self.config.process_timeout_secs
                );
                process.terminate().await;
                return Err(RunnerError::Timeout(self.config.process_timeout_secs));
            }
        };

        for id in parser.finish() {
            self.show(parser.tree(), id);
        }
        if verbose {
            println!("{}", "=".repeat(LINE_SIZE));
        }

        let tree = parser.into_tree();
        let report = SuiteReport {
            title: suite.title().to_string(),
            kind: suite.kind,
            url,
            summary: tree.summary(),
            failures: Failure::collect(&tree),
            exit_code,
            duration_ms: start.elapsed().as_millis() as u64,
            finished_at: Utc::now(),
        };

        info!(
            "{}: {} ({} ms)",
            report.title, report.summary, report.duration_ms
        );
        if report.process_failed() {
            warn!(exit_code = ?report.exit_code, "Browser exited abnormally");
        }

        if let Some(dir) = &self.config.output_dir {
            report.write_json(dir)?;
        }
        Ok(report)
    }

    /// Run a suite and fail on assertion failures or a bad browser exit
    pub async fn run_checked(&self, suite: &Suite) -> RunnerResult<SuiteReport> {
        self.run(suite)
            .await?
            .into_result(&self.config.ignore_stack_patterns)
    }

    fn show(&self, tree: &Tree, id: NodeId) {
        if self.config.verbose() {
            println!("{}", tree.display(id));
        }
    }
}

impl Default for JsRunner {
    fn default() -> Self {
        Self::new()
    }
}

/// Separator, centered title, separator
pub fn banner(title: &str) -> String {
    let separator = "=".repeat(LINE_SIZE);
    let padding = " ".repeat(LINE_SIZE.saturating_sub(title.chars().count()) / 2);
    format!("{}\n{}{}\n{}", separator, padding, title, separator)
}
