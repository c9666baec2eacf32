// Copyright 2023 Viktor Reusch
//
// This file is part of gpx_kml_batch.
//
// gpx_kml_batch is free software: you can redistribute it and/or modify it
// under the terms of the GNU Affero General Public License as published by the
// Free Software Foundation, either version 3 of the License, or (at your
// option) any later version.
//
// gpx_kml_batch is distributed in the hope that it will be useful, but
// WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or
// FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License
// for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with gpx_kml_batch. If not, see <https://www.gnu.org/licenses/>.

//! Command-line interface converting a directory of GPX tracks to KML.

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use gpx_kml_batch::BatchConfig;
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

/// Convert every GPX track in a directory to KML
#[derive(Parser, Debug)]
#[command(name = "gpx2kml", version)]
struct Args {
    /// Input directory containing GPX files
    #[arg(value_name = "INPUT_DIR")]
    input_dir: PathBuf,

    /// Output directory for KML results [default: INPUT_DIR]
    #[arg(value_name = "OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// Number of conversion threads [default: number of CPUs]
    #[arg(short, long, value_name = "NUM")]
    jobs: Option<usize>,

    /// Log skipped files and pool setup
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

/// Per-file failures are logged and counted but still exit successfully.
fn run(args: Args) -> Result<()> {
    setup_logging(args.verbose)?;

    let mut config = BatchConfig::new(args.input_dir, args.output_dir);
    if let Some(jobs) = args.jobs {
        config = config.with_workers(jobs);
    }

    let tally = gpx_kml_batch::run(&config).context("Conversion aborted")?;
    println!("{tally}");

    Ok(())
}

/// Errors go to STDERR, everything else to STDOUT.
fn setup_logging(verbose: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("gpx_kml_batch=debug,warn")
        } else {
            EnvFilter::new("gpx_kml_batch=info,warn")
        }
    });
    let writer = io::stderr.with_max_level(Level::WARN).or_else(io::stdout);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_target(false)
        .without_time()
        .try_init()
        .map_err(|err| anyhow!("failed to set up logging: {err}"))
}
