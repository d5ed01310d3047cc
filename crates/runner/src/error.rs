//! Error types for suite runs

use std::fmt;
use std::path::PathBuf;

use jstap_core::Failure;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("Failed javascript assertions\n{0}")]
    Assertions(FailureList),

    #[error("Browser returned with non-zero exit code ({})", exit_label(.code))]
    ProcessExit { code: Option<i32> },

    #[error("Browser timed out after {0}s")]
    Timeout(u64),

    #[error("Browser could not be started: {0}")]
    Spawn(String),

    #[error("Launcher script not found: {}", .0.display())]
    LauncherNotFound(PathBuf),

    #[error("Invalid suite: {0}")]
    InvalidSuite(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("TOML write error: {0}")]
    TomlSer(#[from] toml::ser::Error),
}

impl RunnerError {
    /// The javascript tests ran and some assertion failed
    pub fn is_test_failure(&self) -> bool {
        matches!(self, RunnerError::Assertions(_))
    }

    /// The browser itself misbehaved
    pub fn is_process_failure(&self) -> bool {
        matches!(self, RunnerError::ProcessExit { .. } | RunnerError::Timeout(_))
    }

    /// Process exit code for command-line front ends:
    /// 1 for failed assertions, 2 for a failed browser, 3 for anything else
    pub fn exit_code(&self) -> i32 {
        if self.is_test_failure() {
            1
        } else if self.is_process_failure() {
            2
        } else {
            3
        }
    }
}

fn exit_label(code: &Option<i32>) -> String {
    code.map_or_else(|| "killed by signal".to_string(), |c| c.to_string())
}

pub type RunnerResult<T> = Result<T, RunnerError>;

/// Failed assertions, rendered with framework stack frames filtered out
#[derive(Debug, Clone, Default)]
pub struct FailureList {
    pub failures: Vec<Failure>,
    pub ignored_frames: Vec<String>,
}

impl FailureList {
    pub fn new(failures: Vec<Failure>, ignored_frames: Vec<String>) -> Self {
        Self {
            failures,
            ignored_frames,
        }
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }
}

impl fmt::Display for FailureList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self
            .failures
            .iter()
            .map(|failure| failure.render(&self.ignored_frames))
            .collect();
        f.write_str(&rendered.join("\n"))
    }
}
