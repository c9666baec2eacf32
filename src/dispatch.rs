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

//! Concurrent conversion of a whole directory.
//!
//! The calling thread scans the input directory and submits each GPX file to
//! a fixed pool of worker threads. Submission blocks once
//! [`BatchConfig::backlog_capacity`] conversions are in flight. Workers report
//! every [`ConversionOutcome`] back over a channel, and the calling thread is
//! the only one folding outcomes into the [`RunTally`].

use std::any::Any;
use std::fmt;
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use tracing::{debug, error, info};

use crate::config::BatchConfig;
use crate::convert::{convert_file, ConversionError, ConversionOutcome};
use crate::Error;

/// Extension of eligible input files, compared case-insensitively.
const TRACK_EXTENSION: &str = "gpx";

/// Aggregate counts of one run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunTally {
    pub succeeded: usize,
    pub failed: usize,
    /// Largest number of conversions that were in flight at once.
    pub peak_in_flight: usize,
}

impl RunTally {
    fn record(&mut self, outcome: &ConversionOutcome) {
        match outcome {
            Ok(_) => self.succeeded += 1,
            Err(_) => self.failed += 1,
        }
    }

    fn record_all(&mut self, outcomes: impl IntoIterator<Item = ConversionOutcome>) {
        for outcome in outcomes {
            self.record(&outcome);
        }
    }
}

impl fmt::Display for RunTally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Succeeded: {} Failed: {}", self.succeeded, self.failed)
    }
}

/// Counting gate bounding the number of in-flight conversions.
///
/// Each submission holds one slot of a bounded channel until its conversion
/// finishes.
struct Backlog {
    slots: Sender<()>,
    finished: Receiver<()>,
    peak: AtomicUsize,
}

impl Backlog {
    fn new(capacity: usize) -> Self {
        let (slots, finished) = bounded(capacity);
        Self {
            slots,
            finished,
            peak: AtomicUsize::new(0),
        }
    }

    /// Take a slot, blocking while all slots are taken.
    fn acquire(&self) {
        // Cannot fail: `self` owns the receiving end.
        if self.slots.send(()).is_ok() {
            self.peak.fetch_max(self.in_flight(), Ordering::Relaxed);
        }
    }

    /// Give back the slot of a finished conversion and wake one submitter.
    fn release(&self) {
        let _ = self.finished.try_recv();
    }

    fn in_flight(&self) -> usize {
        self.slots.len()
    }

    fn peak(&self) -> usize {
        self.peak.load(Ordering::Relaxed)
    }
}

/// Whether `path` has the GPX extension.
pub fn is_track_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| ext.eq_ignore_ascii_case(TRACK_EXTENSION))
}

/// Convert every GPX file directly inside the input directory of `config`.
///
/// Fails only if the run cannot start. Failed conversions are logged as they
/// happen and counted in the returned tally.
pub fn run(config: &BatchConfig) -> Result<RunTally, Error> {
    config.validate()?;
    let entries = fs::read_dir(&config.input_dir).map_err(|err| {
        Error::InvalidArgument(format!(
            "Cannot read directory \"{}\": {err}",
            config.input_dir.display()
        ))
    })?;

    let inputs = entries.filter_map(|entry| {
        let path = match entry {
            Ok(entry) => entry.path(),
            Err(err) => {
                error!("Failed reading directory entry: {err}");
                return None;
            }
        };
        if !is_track_file(&path) || !path.is_file() {
            debug!("Skipping: {}", path.display());
            return None;
        }
        info!("Reading: {}", path.display());
        Some(path)
    });

    let output_dir = config.output_dir.as_path();
    run_pool(config.workers, inputs, |input| convert_file(input, output_dir))
}

/// Run `convert` on every path of `inputs` with a pool of `workers` threads.
///
/// At most `2 * workers` conversions are in flight: `inputs` is not advanced
/// while the backlog is full.
fn run_pool<F>(
    workers: usize,
    inputs: impl IntoIterator<Item = PathBuf>,
    convert: F,
) -> Result<RunTally, Error>
where
    F: Fn(&Path) -> ConversionOutcome + Sync,
{
    let workers = workers.max(1);
    let backlog = Backlog::new(workers * 2);
    debug!(workers, backlog = workers * 2, "starting worker pool");

    thread::scope(|scope| -> Result<RunTally, Error> {
        let (job_tx, job_rx) = unbounded::<PathBuf>();
        let (outcome_tx, outcome_rx) = unbounded::<ConversionOutcome>();

        for id in 0..workers {
            let jobs = job_rx.clone();
            let outcomes = outcome_tx.clone();
            let backlog = &backlog;
            let convert = &convert;
            thread::Builder::new()
                .name(format!("convert-{id}"))
                .spawn_scoped(scope, move || worker_loop(jobs, outcomes, backlog, convert))
                .map_err(|err| {
                    Error::InvalidArgument(format!("Failed to start worker {id}: {err}"))
                })?;
        }
        drop(outcome_tx);

        let mut tally = RunTally::default();
        for path in inputs {
            backlog.acquire();
            if job_tx.send(path).is_err() {
                backlog.release();
                break;
            }
            tally.record_all(outcome_rx.try_iter());
        }

        // Workers exit once the queue is drained, closing the outcome channel.
        drop(job_tx);
        tally.record_all(outcome_rx.iter());
        tally.peak_in_flight = backlog.peak();
        Ok(tally)
    })
}

/// Convert queued files until the queue closes. A slot of `backlog` is held
/// until the conversion of its file has finished.
fn worker_loop<F>(
    jobs: Receiver<PathBuf>,
    outcomes: Sender<ConversionOutcome>,
    backlog: &Backlog,
    convert: &F,
) where
    F: Fn(&Path) -> ConversionOutcome,
{
    for input in jobs {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| convert(&input)))
            .unwrap_or_else(|payload| {
                Err(ConversionError {
                    input: input.clone(),
                    source: Error::Panicked(panic_message(payload.as_ref())),
                })
            });
        if let Err(err) = &outcome {
            error!("{err}");
        }

        let _ = outcomes.send(outcome);
        backlog.release();
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic".to_string()
    }
}
