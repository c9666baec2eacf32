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

//! Conversion of one GPX file into one KML file.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::track::read_track;
use crate::writer::write_file;
use crate::Error;

/// A failed conversion, attributed to its input file.
#[derive(Error, Debug)]
#[error("{source} while parsing: \"{}\"", .input.display())]
pub struct ConversionError {
    pub input: PathBuf,
    #[source]
    pub source: Error,
}

/// Result of converting one file: the written path or the failure.
pub type ConversionOutcome = Result<PathBuf, ConversionError>;

/// Read the GPX file at `input` and write its track as KML into `output_dir`.
///
/// Every failure is returned as a [`ConversionError`] naming `input`.
pub fn convert_file(input: &Path, output_dir: &Path) -> ConversionOutcome {
    let convert = || -> Result<PathBuf, Error> {
        let file = File::open(input).map_err(|source| Error::ReadFailure {
            path: input.to_path_buf(),
            source,
        })?;
        let track = read_track(BufReader::new(file))?;
        write_file(&track, output_dir)
    };

    convert().map_err(|source| ConversionError {
        input: input.to_path_buf(),
        source,
    })
}
