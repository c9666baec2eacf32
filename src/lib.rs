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

//! Library for converting whole directories of
//! [GPX](https://www.topografix.com/gpx.asp) tracks to
//! [KML](https://developers.google.com/kml).
//!
//! Each GPX file yields one KML file named after the recording date and the
//! track name. Files are converted concurrently by a fixed pool of worker
//! threads.
//!
//! See [`run`] for converting a directory and [`convert_file`] for a single
//! file.

pub mod config;
pub mod convert;
pub mod dispatch;
mod error;
pub mod filename;
pub mod track;
pub mod writer;

pub use config::BatchConfig;
pub use convert::{convert_file, ConversionError, ConversionOutcome};
pub use dispatch::{run, RunTally};
pub use error::Error;
