#![warn(clippy::expect_used)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::panic)]

//! Thin CLI front-end over the instrumentation engine.
//!
//! This is *not* a `build`/`run`/`test` dispatcher -- it is a single
//! `instrument` pass-through command for manual smoke-testing the engine
//! against a directory of Go sources.

use anyhow::{bail, Context, Result};
use clap::Parser;
use go_race_instrument::{instrument_dir, render_report, Config};
use log::info;
use std::fs::{create_dir_all, write};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "go-race-instrument", about = "Insert race-detection barriers into Go source")]
struct Opts {
    /// Directory of `.go` sources to instrument.
    input: PathBuf,

    /// Directory to write instrumented sources into. Mirrors `input`'s
    /// relative layout, the way a `build`/`run`/`test` driver's temporary
    /// workspace overlay would.
    #[arg(long)]
    output: PathBuf,

    /// Disable the coalescing pass.
    #[arg(long)]
    no_coalesce: bool,

    /// Also instrument `_test.go` files.
    #[arg(long)]
    instrument_tests: bool,

    /// Print a per-file instrumentation report.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let opts = Opts::parse();

    if !opts.input.is_dir() {
        bail!("{}: not a directory", opts.input.display());
    }

    let config = Config {
        coalescing_enabled: !opts.no_coalesce,
        instrument_test_files: opts.instrument_tests,
        verbose: opts.verbose,
    };

    let summary = instrument_dir(&opts.input, &config)
        .with_context(|| format!("failed to instrument {}", opts.input.display()))?;

    for (path, instrumented) in &summary.files {
        let relative = path.strip_prefix(&opts.input).unwrap_or(path);
        let dest = opts.output.join(relative);
        if let Some(parent) = dest.parent() {
            create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        write(&dest, &instrumented.source)
            .with_context(|| format!("failed to write {}", dest.display()))?;

        if config.verbose {
            print!(
                "{}",
                render_report(&path.display().to_string(), &instrumented.stats, &instrumented.coalescing)
            );
        }
    }

    info!(
        "instrumented {} file(s): {} reads, {} writes, {} barriers removed by coalescing",
        summary.files.len(),
        summary.total.reads,
        summary.total.writes,
        summary.total_coalescing.barriers_removed
    );

    Ok(())
}
