//! Output formatting for CLI

use anyhow::Result;
use clap::ValueEnum;
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use jstap_core::{Failure, Summary};
use jstap_runner::{Outcome, SuiteReport};
use serde::Serialize;

/// Output format
#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Plain text, one failure per block
    #[default]
    Plain,
    /// JSON format
    Json,
    /// Human-readable table format
    Table,
}

/// Trait for items that can be displayed in a table
pub trait TableDisplay {
    fn headers() -> Vec<&'static str>;
    fn row(&self) -> Vec<String>;
}

/// Failure row with framework frames already filtered out
#[derive(Serialize)]
pub struct FailureRow {
    pub num: u32,
    pub test: String,
    pub message: String,
    pub location: String,
}

impl FailureRow {
    pub fn new(failure: &Failure, ignored_frames: &[String]) -> Self {
        Self {
            num: failure.num,
            test: failure.test.clone().unwrap_or_else(|| "<no test>".to_string()),
            message: match (&failure.message, failure.expectation()) {
                (Some(message), Some(expectation)) => format!("{} ({})", message, expectation),
                _ => failure.headline(),
            },
            location: failure
                .filtered_stack(ignored_frames)
                .next()
                .unwrap_or_default()
                .to_string(),
        }
    }
}

impl TableDisplay for FailureRow {
    fn headers() -> Vec<&'static str> {
        vec!["#", "Test", "Message", "Location"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.num.to_string(),
            self.test.clone(),
            self.message.clone(),
            self.location.clone(),
        ]
    }
}

/// Render rows as a table
pub fn table<T: TableDisplay>(items: &[T]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(T::headers());
    for item in items {
        table.add_row(item.row());
    }
    table
}

/// Print a value as pretty JSON
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print the failures of a tree or a run
pub fn print_failures(
    failures: &[Failure],
    ignored_frames: &[String],
    format: OutputFormat,
) -> Result<()> {
    if failures.is_empty() {
        return Ok(());
    }

    match format {
        OutputFormat::Table => {
            let rows: Vec<FailureRow> = failures
                .iter()
                .map(|failure| FailureRow::new(failure, ignored_frames))
                .collect();
            println!("{}", table(&rows));
        }
        OutputFormat::Json => print_json(failures)?,
        OutputFormat::Plain => {
            println!("{}", "Failed javascript assertions".red().bold());
            for failure in failures {
                println!("{}", failure.render(ignored_frames));
            }
        }
    }
    Ok(())
}

/// One-line verdict for a summary
pub fn summary_line(summary: &Summary) -> String {
    if summary.success() {
        format!("{} {}", "PASSED".green().bold(), summary)
    } else {
        format!("{} {}", "FAILED".red().bold(), summary)
    }
}

/// Print the result of a suite run
pub fn print_report(
    report: &SuiteReport,
    ignored_frames: &[String],
    format: OutputFormat,
) -> Result<()> {
    if format == OutputFormat::Json {
        return print_json(report);
    }

    println!("{}: {} ({} ms)", report.title, summary_line(&report.summary), report.duration_ms);
    print_failures(&report.failures, ignored_frames, format)?;

    if matches!(report.outcome(), Outcome::ProcessFailed | Outcome::Both) {
        let code = report
            .exit_code
            .map_or_else(|| "killed by signal".to_string(), |c| c.to_string());
        print_error(&format!("Browser returned with non-zero exit code ({})", code));
    }
    Ok(())
}

/// Print success message
pub fn print_success(message: &str) {
    println!("✅ {}", message);
}

/// Print error message
pub fn print_error(message: &str) {
    eprintln!("❌ {}", message);
}
