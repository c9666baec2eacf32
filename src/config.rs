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

//! Configuration of a batch run.

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::thread;

use crate::Error;

/// Number of worker threads when none is configured: one per hardware thread.
pub fn default_workers() -> usize {
    thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

/// Directories and pool size for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchConfig {
    /// Directory scanned for GPX files (not recursively).
    pub input_dir: PathBuf,
    /// Directory receiving the KML files.
    pub output_dir: PathBuf,
    /// Size of the worker pool, at least 1.
    pub workers: usize,
}

impl BatchConfig {
    /// Create a configuration writing to `output_dir`, or next to the input
    /// files if it is `None`.
    pub fn new(input_dir: impl Into<PathBuf>, output_dir: Option<PathBuf>) -> Self {
        let input_dir = input_dir.into();
        let output_dir = output_dir.unwrap_or_else(|| input_dir.clone());
        Self {
            input_dir,
            output_dir,
            workers: default_workers(),
        }
    }

    /// Override the worker count. Zero is raised to 1.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Maximum number of conversions submitted but not yet finished.
    pub fn backlog_capacity(&self) -> usize {
        self.workers.max(1) * 2
    }

    /// Check that both directories exist.
    pub fn validate(&self) -> Result<(), Error> {
        ensure_dir(&self.input_dir)?;
        ensure_dir(&self.output_dir)
    }
}

fn ensure_dir(path: &Path) -> Result<(), Error> {
    if path.is_dir() {
        Ok(())
    } else {
        Err(Error::InvalidArgument(format!(
            "Not a directory: \"{}\"",
            path.display()
        )))
    }
}
