//! jstap runner
//!
//! Drives a headless browser over a Jasmine or QUnit runner page and turns
//! its console output into a pass/fail verdict:
//!
//! - Spawns the browser binary with an isolated cookie store
//! - Streams stdout and stderr, line by line, into the TAP parser
//! - Prints tests as they complete when running verbosely
//! - Collects failed assertions and the process exit status into a report
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  JsRunner::run(&Suite) -> SuiteReport                    │
//! │    ├── BrowserProcess::spawn(config, launcher, url)      │
//! │    │     └── merged stdout/stderr line channel           │
//! │    ├── TapParser (granularity: test, modules announced)  │
//! │    └── SuiteReport { summary, failures, exit_code }      │
//! │          └── into_result() -> Assertions | ProcessExit   │
//! └──────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod process;
pub mod runner;
pub mod suite;

pub use config::RunnerConfig;
pub use error::{FailureList, RunnerError, RunnerResult};
pub use runner::{JsRunner, Outcome, SuiteReport};
pub use suite::{Suite, SuiteKind, SuiteTarget};
