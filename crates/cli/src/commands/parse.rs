//! Parse Command

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use jstap_core::report::DEFAULT_IGNORED_FRAMES;
use jstap_core::{Failure, Item, NodeKind, ParserOptions, Summary, TapParser};
use serde::Serialize;

use crate::output::{self, OutputFormat};

#[derive(Args)]
pub struct ParseArgs {
    /// Captured reporter output, `-` for stdin
    #[arg(default_value = "-")]
    pub input: PathBuf,

    /// Node kind to report as it completes (module, test or assertion)
    #[arg(short, long, default_value = "test")]
    pub granularity: NodeKind,

    /// Also show enclosing modules and tests as they open
    #[arg(long)]
    pub announce: bool,

    /// Log lines the parser drops
    #[arg(long)]
    pub debug: bool,
}

#[derive(Serialize)]
struct ParseOutput<'a> {
    summary: Summary,
    nodes: Vec<&'a Item>,
    failures: Vec<Failure>,
}

fn open(input: &Path) -> Result<Box<dyn BufRead>> {
    if input.as_os_str() == "-" {
        Ok(Box::new(BufReader::new(io::stdin())))
    } else {
        let file = File::open(input).with_context(|| format!("opening {}", input.display()))?;
        Ok(Box::new(BufReader::new(file)))
    }
}

pub fn execute(args: ParseArgs, format: OutputFormat) -> Result<i32> {
    let reader = open(&args.input)?;
    let options = ParserOptions::new(args.granularity)
        .announce_enclosing(args.announce)
        .debug(args.debug);

    let mut lines_error = None;
    let lines = reader.lines().map_while(|line| match line {
        Ok(line) => Some(line),
        Err(e) => {
            lines_error = Some(e);
            None
        }
    });

    let mut parse = TapParser::new(options).parse(lines);
    let mut emitted = Vec::new();
    while let Some(id) = parse.next() {
        if format != OutputFormat::Json {
            println!("{}", parse.tree().display(id));
        }
        emitted.push(id);
    }
    let tree = parse.into_tree();

    if let Some(e) = lines_error {
        return Err(e).with_context(|| format!("reading {}", args.input.display()));
    }

    let failures = Failure::collect(&tree);
    let summary = tree.summary();
    let ignored: Vec<String> = DEFAULT_IGNORED_FRAMES.iter().map(|s| s.to_string()).collect();

    match format {
        OutputFormat::Json => output::print_json(&ParseOutput {
            summary,
            nodes: emitted.iter().filter_map(|&id| tree.item(id)).collect(),
            failures,
        })?,
        _ => {
            println!("{}", output::summary_line(&summary));
            output::print_failures(&failures, &ignored, format)?;
        }
    }

    Ok(if summary.success() { 0 } else { 1 })
}
