//! Headless browser process
//!
//! The browser is started with a fresh cookie store and its stdout and stderr
//! are merged into one stream of lines by a single reader task. Lines keep
//! their order within each pipe; across the two pipes they are interleaved in
//! the order they become readable.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tempfile::NamedTempFile;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::RunnerConfig;
use crate::error::{RunnerError, RunnerResult};

/// Lines buffered between the pipe readers and the parser
const LINE_BUFFER: usize = 256;

/// Handle to a running browser
pub struct BrowserProcess {
    child: Child,
    lines: mpsc::Receiver<String>,
    /// Removed from disk when the handle is dropped
    _cookies: NamedTempFile,
}

impl BrowserProcess {
    /// Build the browser command line
    pub fn command(config: &RunnerConfig, cookies: &Path, launcher: &Path, url: &str) -> Command {
        let mut cmd = Command::new(&config.phantomjs);
        cmd.arg(format!("--cookies-file={}", cookies.display()))
            .arg(launcher)
            .arg(url);
        if config.launch_timeout_secs > 0 {
            cmd.arg(config.launch_timeout_secs.to_string());
        }
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    /// Spawn the browser against `url` using `launcher`
    pub fn spawn(config: &RunnerConfig, launcher: &Path, url: &str) -> RunnerResult<Self> {
        let cookies = tempfile::Builder::new()
            .prefix("jstap-cookies-")
            .suffix(".txt")
            .tempfile()?;

        let mut child = Self::command(config, cookies.path(), launcher, url)
            .spawn()
            .map_err(|e| {
                RunnerError::Spawn(format!("Failed to spawn {}: {}", config.phantomjs.display(), e))
            })?;

        info!(
            pid = child.id(),
            "Spawned {} {} {}",
            config.phantomjs.display(),
            launcher.display(),
            url
        );

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| RunnerError::Spawn("stdout was not captured".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| RunnerError::Spawn("stderr was not captured".to_string()))?;

        let (tx, rx) = mpsc::channel(LINE_BUFFER);
        tokio::spawn(forward_output(stdout, stderr, tx));

        Ok(Self {
            child,
            lines: rx,
            _cookies: cookies,
        })
    }

    /// Next output line, `None` once both streams are closed
    pub async fn next_line(&mut self) -> Option<String> {
        self.lines.recv().await
    }

    /// Wait for exit. `None` means the process was killed by a signal.
    pub async fn wait(&mut self) -> RunnerResult<Option<i32>> {
        let status = self.child.wait().await?;
        debug!(%status, "Browser exited");
        Ok(status.code())
    }

    /// Stop the browser, gracefully first
    pub async fn terminate(&mut self) {
        #[cfg(unix)]
        if let Some(pid) = self.child.id() {
            use nix::sys::signal::{kill, Signal};
            use nix::unistd::Pid;

            info!("Stopping browser (pid: {})", pid);
            if kill(Pid::from_raw(pid as i32), Signal::SIGTERM).is_ok()
                && tokio::time::timeout(Duration::from_millis(500), self.child.wait())
                    .await
                    .is_ok()
            {
                return;
            }
        }

        if let Err(e) = self.child.kill().await {
            warn!("Failed to kill browser: {}", e);
        }
    }
}

#[derive(Clone, Copy)]
enum Pipe {
    Stdout,
    Stderr,
}

/// Forward both pipes, line by line, until both are closed.
///
/// `read_until` keeps partial reads in its buffer when the other pipe wins
/// the select, so no bytes are lost between iterations.
async fn forward_output<O, E>(stdout: O, stderr: E, tx: mpsc::Sender<String>)
where
    O: AsyncRead + Unpin,
    E: AsyncRead + Unpin,
{
    let mut stdout = BufReader::new(stdout);
    let mut stderr = BufReader::new(stderr);
    let (mut out_buf, mut err_buf) = (Vec::new(), Vec::new());
    let (mut out_open, mut err_open) = (true, true);

    while out_open || err_open {
        let (pipe, read) = tokio::select! {
            read = stdout.read_until(b'\n', &mut out_buf), if out_open => (Pipe::Stdout, read),
            read = stderr.read_until(b'\n', &mut err_buf), if err_open => (Pipe::Stderr, read),
        };
        let (buf, open) = match pipe {
            Pipe::Stdout => (&mut out_buf, &mut out_open),
            Pipe::Stderr => (&mut err_buf, &mut err_open),
        };

        match read {
            Ok(0) => *open = false,
            Ok(_) => {}
            Err(e) => {
                warn!("Error reading browser output: {}", e);
                *open = false;
            }
        }

        // A full line, or what is left of a pipe once it closes
        if buf.ends_with(b"\n") || (!*open && !buf.is_empty()) {
            let line = String::from_utf8_lossy(buf)
                .trim_end_matches(&['\r', '\n'][..])
                .to_string();
            buf.clear();
            if tx.send(line).await.is_err() {
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_command_line() {
        let config = RunnerConfig {
            phantomjs: PathBuf::from("/usr/local/bin/phantomjs"),
            launch_timeout_secs: 7,
            ..Default::default()
        };
        let cmd = BrowserProcess::command(
            &config,
            Path::new("/tmp/cookies.txt"),
            Path::new("launchers/qunit-runner.js"),
            "http://localhost:8000/qunit",
        );
        let std_cmd = cmd.as_std();
        let args: Vec<_> = std_cmd.get_args().map(|a| a.to_string_lossy().to_string()).collect();

        assert_eq!(std_cmd.get_program(), "/usr/local/bin/phantomjs");
        assert_eq!(
            args,
            vec![
                "--cookies-file=/tmp/cookies.txt",
                "launchers/qunit-runner.js",
                "http://localhost:8000/qunit",
                "7",
            ]
        );
    }

    #[tokio::test]
    async fn test_both_pipes_are_forwarded_in_order() {
        let (tx, mut rx) = mpsc::channel(16);
        let stdout: &[u8] = b"# test: T\nok 1\nnot ok 2\n";
        let stderr: &[u8] = b"#   at app.js:1\r\n#   at app.js:2";
        forward_output(stdout, stderr, tx).await;

        let mut lines = Vec::new();
        while let Some(line) = rx.recv().await {
            lines.push(line);
        }
        assert_eq!(lines.len(), 5);

        let from_stdout: Vec<&str> = lines
            .iter()
            .map(String::as_str)
            .filter(|l| !l.contains("app.js"))
            .collect();
        assert_eq!(from_stdout, vec!["# test: T", "ok 1", "not ok 2"]);

        let from_stderr: Vec<&str> = lines
            .iter()
            .map(String::as_str)
            .filter(|l| l.contains("app.js"))
            .collect();
        assert_eq!(from_stderr, vec!["#   at app.js:1", "#   at app.js:2"]);
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_replaced() {
        let (tx, mut rx) = mpsc::channel(4);
        let stdout: &[u8] = b"ok \xff1\n";
        forward_output(stdout, tokio::io::empty(), tx).await;

        assert_eq!(rx.recv().await.as_deref(), Some("ok \u{fffd}1"));
        assert_eq!(rx.recv().await, None);
    }

    #[test]
    fn test_command_without_launch_timeout() {
        let config = RunnerConfig {
            launch_timeout_secs: 0,
            ..Default::default()
        };
        let cmd = BrowserProcess::command(&config, Path::new("c"), Path::new("l"), "u");
        assert_eq!(cmd.as_std().get_args().count(), 3);
    }
}
