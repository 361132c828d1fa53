// SPDX-License-Identifier: MIT

use std::io::{self, Write as _};
use std::path::PathBuf;
use std::process;

use anyhow::{Context as _, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use rcorder::resolve::KeywordFilters;
use rcorder::scan::DEFAULT_LEADER;

#[derive(Parser)]
#[command(
    name = "rcorder",
    about = "Print a dependency-respecting execution order for a set of scripts",
    version
)]
struct Args {
    /// Comment leader introducing directive lines, applied to every file.
    ///
    /// Directives are matched only when a line starts with this leader
    /// immediately followed by REQUIRE:, PROVIDE:, BEFORE:, KEYWORD: (or
    /// their plural forms). An empty value falls back to the default.
    #[arg(short = 'c', long = "comment", env = "RCORDER_COMMENT")]
    comment: Option<String>,

    /// Print only units tagged with this keyword (repeatable).
    ///
    /// With no --keep flags every resolved unit is printed. Filtering never
    /// affects resolution: a kept-out unit still satisfies its dependents.
    #[arg(short = 'k', long = "keep", value_name = "KEYWORD")]
    keep: Vec<String>,

    /// Do not print units tagged with this keyword (repeatable).
    #[arg(short = 's', long = "skip", value_name = "KEYWORD")]
    skip: Vec<String>,

    /// Trace graph construction and traversal on stderr.
    #[arg(short = 'd', long = "debug")]
    debug: bool,

    /// Unit files, in the order that seeds the traversal tie-breaks.
    #[arg(value_name = "FILE")]
    files: Vec<PathBuf>,
}

fn init_logging(debug: bool) {
    let default_level = if debug { "rcorder=debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run(args: &Args) -> Result<i32> {
    let leader = match args.comment.as_deref() {
        Some(leader) if !leader.is_empty() => leader,
        _ => DEFAULT_LEADER,
    };
    let filters = KeywordFilters::new(args.skip.clone(), args.keep.clone());

    let (order, report) = rcorder::order_paths(&args.files, leader, &filters);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for name in &order {
        writeln!(out, "{name}").context("writing ordered list to stdout")?;
    }
    out.flush().context("flushing stdout")?;

    Ok(report.exit_code())
}

fn main() {
    let args = Args::parse();
    init_logging(args.debug);

    match run(&args) {
        Ok(code) => process::exit(code),
        Err(err) => {
            // Unrecoverable conditions get a distinct status and no report.
            eprintln!("rcorder: {err:#}");
            process::exit(2);
        }
    }
}
