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

//! Reading a single GPX track.
//!
//! Only the parts of a [GPX](https://www.topografix.com/gpx.asp) file needed
//! to draw a line are read: the metadata timestamp, the name of the first
//! track, and the points of its first segment.

use std::io::Read;

use chrono::{DateTime, NaiveDateTime, Utc};
use xmltree::{Element, XMLNode};

use crate::Error;

/// The only accepted format of `metadata/time`.
const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// One sample along a track.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
}

/// A named, timestamped path read from one GPX file.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub name: String,
    pub recorded_at: DateTime<Utc>,
    /// Points in document order.
    pub points: Vec<Coordinate>,
}

impl Track {
    /// Extract a track from the `<gpx>` element `root`.
    ///
    /// Sibling `trk` and `trkseg` elements after the first are ignored.
    pub fn parse(root: &Element) -> Result<Self, Error> {
        let recorded_at = parse_time(root)?;
        let track = child(root, "trk", "Missing trk element")?;
        let name = child(track, "name", "Missing name element")?
            .get_text()
            .unwrap_or_default()
            .into_owned();
        let points = parse_points(track)?;

        Ok(Self {
            name,
            recorded_at,
            points,
        })
    }
}

/// Read a complete GPX document from `source` and extract its track.
pub fn read_track(source: impl Read) -> Result<Track, Error> {
    let root = Element::parse(source)?;
    if root.name != "gpx" {
        return Err(Error::malformed("Missing root element"));
    }
    Track::parse(&root)
}

/// Find the first child of `parent` called `name`.
fn child<'a>(parent: &'a Element, name: &str, missing: &str) -> Result<&'a Element, Error> {
    parent
        .get_child(name)
        .ok_or_else(|| Error::malformed(missing))
}

fn parse_time(root: &Element) -> Result<DateTime<Utc>, Error> {
    let metadata = child(root, "metadata", "Missing metadata element")?;
    let time = child(metadata, "time", "Missing metadata time element")?;
    let text = time.get_text().unwrap_or_default();
    NaiveDateTime::parse_from_str(&text, TIME_FORMAT)
        .map(|time| time.and_utc())
        .map_err(|_| Error::malformed(format!("Invalid time \"{text}\"")))
}

fn parse_points(track: &Element) -> Result<Vec<Coordinate>, Error> {
    let segment = child(track, "trkseg", "Missing trkseg element")?;
    segment
        .children
        .iter()
        .filter_map(|node| match node {
            XMLNode::Element(element) if element.name == "trkpt" => Some(element),
            _ => None,
        })
        .map(parse_point)
        .collect()
}

fn parse_point(point: &Element) -> Result<Coordinate, Error> {
    let (Some(lat), Some(lon)) = (point.attributes.get("lat"), point.attributes.get("lon")) else {
        return Err(Error::malformed("Missing lat/lon attributes"));
    };
    let elevation = child(point, "ele", "Missing ele element")?;

    Ok(Coordinate {
        latitude: parse_number(lat)?,
        longitude: parse_number(lon)?,
        altitude: parse_number(&elevation.get_text().unwrap_or_default())?,
    })
}

fn parse_number(text: &str) -> Result<f64, Error> {
    text.trim()
        .parse()
        .map_err(|_| Error::malformed(format!("Invalid number \"{text}\"")))
}
