//! Config Command

use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::Args;
use jstap_runner::RunnerConfig;

use crate::output::print_success;

#[derive(Args)]
pub struct ConfigArgs {
    /// Write the default configuration to the config path
    #[arg(long)]
    pub init: bool,

    /// Overwrite an existing file with --init
    #[arg(long, requires = "init")]
    pub force: bool,
}

pub fn execute(args: ConfigArgs, path: &Path) -> Result<i32> {
    if args.init {
        if path.exists() && !args.force {
            bail!("{} already exists, use --force to overwrite", path.display());
        }
        RunnerConfig::default()
            .save(path)
            .with_context(|| format!("writing {}", path.display()))?;
        print_success(&format!("Configuration written to {}", path.display()));
        return Ok(0);
    }

    let config =
        RunnerConfig::load(path).with_context(|| format!("loading {}", path.display()))?;
    println!("# {}", path.display());
    print!("{}", toml::to_string_pretty(&config)?);
    Ok(0)
}
