//! Suite definitions

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::RunnerConfig;
use crate::error::{RunnerError, RunnerResult};

/// Javascript test framework a suite is written for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuiteKind {
    Jasmine,
    Qunit,
}

impl SuiteKind {
    pub fn default_title(self) -> &'static str {
        match self {
            SuiteKind::Jasmine => "Jasmine test suite",
            SuiteKind::Qunit => "QUnit test suite",
        }
    }

    /// Launcher script shipped for this framework
    pub fn launcher_file(self) -> &'static str {
        match self {
            SuiteKind::Jasmine => "jasmine-runner.js",
            SuiteKind::Qunit => "qunit-runner.js",
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            SuiteKind::Jasmine => "jasmine",
            SuiteKind::Qunit => "qunit",
        }
    }
}

impl fmt::Display for SuiteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SuiteKind {
    type Err = RunnerError;

    fn from_str(s: &str) -> RunnerResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "jasmine" => Ok(SuiteKind::Jasmine),
            "qunit" => Ok(SuiteKind::Qunit),
            other => Err(RunnerError::InvalidSuite(format!("unknown suite kind '{}'", other))),
        }
    }
}

/// Page the browser should open
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuiteTarget {
    /// Absolute URL, typically served by a running web server
    Url(String),
    /// Runner page on the local filesystem
    File(PathBuf),
}

impl SuiteTarget {
    /// URL handed to the launcher script
    pub fn to_url(&self) -> RunnerResult<String> {
        match self {
            SuiteTarget::Url(url) if url.trim().is_empty() => {
                Err(RunnerError::InvalidSuite("url needs to be defined".to_string()))
            }
            SuiteTarget::Url(url) => Ok(url.trim().to_string()),
            SuiteTarget::File(path) if path.as_os_str().is_empty() => {
                Err(RunnerError::InvalidSuite("filename needs to be defined".to_string()))
            }
            SuiteTarget::File(path) => {
                let absolute = if path.is_absolute() {
                    path.clone()
                } else {
                    std::env::current_dir()?.join(path)
                };
                Ok(format!("file://{}", absolute.display()))
            }
        }
    }
}

/// A javascript suite to run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suite {
    pub kind: SuiteKind,
    pub target: SuiteTarget,

    /// Header for verbose output; the framework's default when unset
    #[serde(default)]
    pub title: Option<String>,

    /// Launcher script overriding the configured one
    #[serde(default)]
    pub launcher: Option<PathBuf>,
}

impl Suite {
    pub fn new(kind: SuiteKind, target: SuiteTarget) -> Self {
        Self {
            kind,
            target,
            title: None,
            launcher: None,
        }
    }

    pub fn jasmine(target: SuiteTarget) -> Self {
        Self::new(SuiteKind::Jasmine, target)
    }

    pub fn qunit(target: SuiteTarget) -> Self {
        Self::new(SuiteKind::Qunit, target)
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_launcher(mut self, launcher: impl AsRef<Path>) -> Self {
        self.launcher = Some(launcher.as_ref().to_path_buf());
        self
    }

    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or_else(|| self.kind.default_title())
    }

    /// Launcher script to run: the suite override, else the configured one
    pub fn launcher_path(&self, config: &RunnerConfig) -> RunnerResult<PathBuf> {
        let path = self
            .launcher
            .clone()
            .unwrap_or_else(|| config.launcher_path(self.kind.launcher_file()));
        if path.exists() {
            Ok(path)
        } else {
            Err(RunnerError::LauncherNotFound(path))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("jasmine", SuiteKind::Jasmine ; "jasmine")]
    #[test_case("QUnit", SuiteKind::Qunit ; "qunit mixed case")]
    fn test_kind_from_str(input: &str, expected: SuiteKind) {
        assert_eq!(input.parse::<SuiteKind>().unwrap(), expected);
    }

    #[test]
    fn test_unknown_kind() {
        assert!("mocha".parse::<SuiteKind>().is_err());
    }

    #[test]
    fn test_titles() {
        let suite = Suite::qunit(SuiteTarget::Url("http://localhost:8000/qunit".into()));
        assert_eq!(suite.title(), "QUnit test suite");
        assert_eq!(suite.with_title("Django JS").title(), "Django JS");
    }

    #[test]
    fn test_target_urls() {
        let url = SuiteTarget::Url(" http://localhost:8000/jasmine ".into());
        assert_eq!(url.to_url().unwrap(), "http://localhost:8000/jasmine");

        let file = SuiteTarget::File(PathBuf::from("/tmp/runner.html"));
        assert_eq!(file.to_url().unwrap(), "file:///tmp/runner.html");

        assert!(SuiteTarget::Url(String::new()).to_url().is_err());
        assert!(SuiteTarget::File(PathBuf::new()).to_url().is_err());
    }

    #[test]
    fn test_launcher_resolution() {
        let dir = tempfile::tempdir().unwrap();
        let config = RunnerConfig {
            launchers_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        let suite = Suite::jasmine(SuiteTarget::Url("http://localhost/".into()));

        let err = suite.launcher_path(&config).unwrap_err();
        assert!(matches!(err, RunnerError::LauncherNotFound(_)));

        std::fs::write(dir.path().join("jasmine-runner.js"), "// launcher").unwrap();
        assert_eq!(
            suite.launcher_path(&config).unwrap(),
            dir.path().join("jasmine-runner.js")
        );
    }
}
