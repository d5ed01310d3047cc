//! Runner configuration

use std::path::{Path, PathBuf};
use std::time::Duration;

use jstap_core::report::DEFAULT_IGNORED_FRAMES;
use serde::{Deserialize, Serialize};

use crate::error::{RunnerError, RunnerResult};

/// Runner configuration, stored as TOML
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Headless browser binary
    pub phantomjs: PathBuf,

    /// Directory holding `jasmine-runner.js` and `qunit-runner.js`
    pub launchers_dir: PathBuf,

    /// Seconds the launcher script waits for the suite (0 = launcher default)
    pub launch_timeout_secs: u64,

    /// Hard limit on the browser process, in seconds
    pub process_timeout_secs: u64,

    /// 0 quiet, 1 normal, 2 verbose display, 3 parser diagnostics
    pub verbosity: u8,

    /// Stack frames containing one of these are left out of failure reports
    pub ignore_stack_patterns: Vec<String>,

    /// Where to write JSON reports (none = no report file)
    pub output_dir: Option<PathBuf>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            phantomjs: PathBuf::from("phantomjs"),
            launchers_dir: PathBuf::from("launchers"),
            launch_timeout_secs: 3,
            process_timeout_secs: 60,
            verbosity: 1,
            ignore_stack_patterns: DEFAULT_IGNORED_FRAMES.iter().map(|s| s.to_string()).collect(),
            output_dir: None,
        }
    }
}

impl RunnerConfig {
    /// Load configuration from file, falling back to defaults when it does not exist
    pub fn load(path: &Path) -> RunnerResult<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = toml::from_str(&content)?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> RunnerResult<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> RunnerResult<()> {
        if self.phantomjs.as_os_str().is_empty() {
            return Err(RunnerError::InvalidConfig("phantomjs path is empty".to_string()));
        }
        if self.process_timeout_secs == 0 {
            return Err(RunnerError::InvalidConfig(
                "process_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.verbosity > 3 {
            return Err(RunnerError::InvalidConfig(format!(
                "verbosity must be between 0 and 3, got {}",
                self.verbosity
            )));
        }
        Ok(())
    }

    pub fn process_timeout(&self) -> Duration {
        Duration::from_secs(self.process_timeout_secs)
    }

    /// Print tests as they complete
    pub fn verbose(&self) -> bool {
        self.verbosity > 1
    }

    /// Log lines the parser drops
    pub fn debug(&self) -> bool {
        self.verbosity > 2
    }

    pub fn launcher_path(&self, file_name: &str) -> PathBuf {
        self.launchers_dir.join(file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = RunnerConfig::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, RunnerConfig::default());
        assert_eq!(config.ignore_stack_patterns.len(), 2);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("jstap.toml");

        let config = RunnerConfig {
            phantomjs: PathBuf::from("/opt/phantomjs/bin/phantomjs"),
            verbosity: 2,
            output_dir: Some(PathBuf::from("reports")),
            ..Default::default()
        };
        config.save(&path).unwrap();

        let loaded = RunnerConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
        assert!(loaded.verbose());
        assert!(!loaded.debug());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jstap.toml");
        std::fs::write(&path, "process_timeout_secs = 5\n").unwrap();

        let config = RunnerConfig::load(&path).unwrap();
        assert_eq!(config.process_timeout(), Duration::from_secs(5));
        assert_eq!(config.phantomjs, PathBuf::from("phantomjs"));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jstap.toml");
        std::fs::write(&path, "verbosity = 9\n").unwrap();

        let err = RunnerConfig::load(&path).unwrap_err();
        assert!(matches!(err, RunnerError::InvalidConfig(_)));
    }
}
