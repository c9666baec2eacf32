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

//! Error kinds shared by all stages of a batch run.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Error returned from reading, writing, or dispatching tracks.
///
/// Only [`Error::InvalidArgument`] aborts a run. Every other kind is scoped to
/// a single input file.
#[derive(Error, Debug)]
pub enum Error {
    /// The run cannot start, e.g. a directory does not exist.
    #[error("{0}")]
    InvalidArgument(String),
    /// An element, attribute, or value needed for the track is missing or
    /// unparseable.
    #[error("{0}")]
    MalformedInput(String),
    /// The input file could not be opened.
    #[error("Failed reading \"{}\": {source}", .path.display())]
    ReadFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The input file is not well-formed XML.
    #[error("Failed reading XML file: {0}")]
    Xml(#[from] xmltree::ParseError),
    /// The output file exists already and is never overwritten.
    #[error("Output file already exists, skipping \"{}\"", .0.display())]
    OutputAlreadyExists(PathBuf),
    /// Serializing the output file failed.
    #[error("Failed writing to: \"{}\": {source}", .path.display())]
    WriteFailure {
        path: PathBuf,
        #[source]
        source: Box<Error>,
    },
    /// KML serialization failed.
    #[error("writing KML failed: {0}")]
    Kml(#[from] kml::Error),
    /// I/O on the output sink failed.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// A conversion panicked.
    #[error("unexpected failure: {0}")]
    Panicked(String),
}

impl Error {
    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedInput(message.into())
    }

    /// Whether this error stops the whole run instead of a single file.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }
}
