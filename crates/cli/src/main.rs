//! jstap CLI - Main Entry Point
//!
//! Runs Jasmine and QUnit suites in a headless browser, or parses a captured
//! reporter stream, and exits with a code describing the result.

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

mod commands;
mod output;

use commands::{config, parse, run};

/// jstap - Jasmine/QUnit results from a headless browser
#[derive(Parser)]
#[command(name = "jstap")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file
    #[arg(long, env = "JSTAP_CONFIG", default_value = "jstap.toml", global = true)]
    config: PathBuf,

    /// Output format
    #[arg(long, default_value = "plain", global = true)]
    format: output::OutputFormat,

    /// Increase verbosity (-v shows tests as they run, -vv adds parser diagnostics)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Only report the final result
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a suite in the headless browser
    Run(run::RunArgs),

    /// Parse a captured reporter stream
    Parse(parse::ParseArgs),

    /// Print the effective configuration
    Config(config::ConfigArgs),

    /// Show version information
    Version,
}

impl Cli {
    /// Verbosity from flags, `None` to keep the configured one
    fn verbosity(&self) -> Option<u8> {
        if self.quiet {
            Some(0)
        } else if self.verbose > 0 {
            Some((1 + self.verbose).min(3))
        } else {
            None
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose > 1 { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let verbosity = cli.verbosity();
    let result = match cli.command {
        Commands::Run(args) => run::execute(args, &cli.config, verbosity, cli.format).await,
        Commands::Parse(args) => parse::execute(args, cli.format),
        Commands::Config(args) => config::execute(args, &cli.config),
        Commands::Version => {
            println!("jstap v{}", env!("CARGO_PKG_VERSION"));
            println!("TAP runner for Jasmine and QUnit suites");
            Ok(0)
        }
    };

    let code = match result {
        Ok(code) => code,
        Err(e) => {
            output::print_error(&format!("{:#}", e));
            3
        }
    };
    std::process::exit(code);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_verbosity_flags() {
        let cli = Cli::parse_from(["jstap", "parse", "-vv"]);
        assert_eq!(cli.verbosity(), Some(3));

        let cli = Cli::parse_from(["jstap", "parse", "--quiet"]);
        assert_eq!(cli.verbosity(), Some(0));

        let cli = Cli::parse_from(["jstap", "parse"]);
        assert_eq!(cli.verbosity(), None);
    }
}
