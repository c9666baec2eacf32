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

//! Writing a [`Track`] as a [KML](https://developers.google.com/kml) file.
//!
//! The output is a single _Document_ with one line style and one _Placemark_
//! drawing the track as a _LineString_.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use kml::types::Element;
use kml::{Kml, KmlDocument, KmlVersion, KmlWriter};
use tracing::info;

use crate::filename::normalize;
use crate::track::{Coordinate, Track};
use crate::Error;

/// This line needs to be prepended to the KML output.
const XML_HEAD: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;
/// Namespace attributes for the `<kml>` tag.
const NAMESPACES: &[(&str, &str)] = &[
    ("xmlns", "http://www.opengis.net/kml/2.2"),
    ("xmlns:gx", "http://www.google.com/kml/ext/2.2"),
    ("xmlns:kml", "http://www.opengis.net/kml/2.2"),
    ("xmlns:atom", "http://www.w3.org/2005/Atom"),
];
const STYLE_ID: &str = "style1";
const STYLE_MAP_ID: &str = "stylemap_id00";
/// Opaque red in KML's `aabbggrr` notation.
const LINE_COLOR: &str = "ff0000ff";
const LINE_WIDTH: &str = "4";

/// Use double precision for coordinate values.
type CoordValue = f64;

/// Name of the output without extension: the UTC recording date followed by
/// the track name.
pub fn base_name(track: &Track) -> String {
    format!("{} {}", track.recorded_at.format("%Y-%m-%d"), track.name)
}

/// Write `track` as a new KML file into `output_dir`.
///
/// The file name is derived from [`base_name`] and passed through
/// [`normalize`]. An existing file is never overwritten. The existence check
/// happens before the file is created, so two concurrent writers of the same
/// name may both pass it.
///
/// Returns the path of the written file.
pub fn write_file(track: &Track, output_dir: &Path) -> Result<PathBuf, Error> {
    let path = output_dir.join(normalize(&format!("{}.kml", base_name(track))));
    if path.exists() {
        return Err(Error::OutputAlreadyExists(path));
    }

    info!("Writing: {}", path.display());
    let result = File::create(&path)
        .map_err(Error::from)
        .and_then(|file| write_kml(track, BufWriter::new(file)));
    match result {
        Ok(()) => Ok(path),
        Err(err) => Err(Error::WriteFailure {
            path,
            source: Box::new(err),
        }),
    }
}

/// Write `track` as a complete KML document to `sink`.
///
/// # Example
/// ```
/// # use chrono::{TimeZone, Utc};
/// # use gpx_kml_batch::track::{Coordinate, Track};
/// # use gpx_kml_batch::writer::write_kml;
/// #
/// let track = Track {
///     name: "Eiffel Tower".to_string(),
///     recorded_at: Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap(),
///     points: vec![Coordinate { latitude: 48.858222, longitude: 2.2945, altitude: 35.0 }],
/// };
/// let mut sink = vec![];
///
/// write_kml(&track, &mut sink).expect("writing failed");
///
/// let kml = String::from_utf8(sink).expect("KML data is not valid UTF-8");
/// assert!(kml.contains("<kml"));
/// assert!(kml.contains("2.2945000,48.8582220,35.0000000 "));
/// assert!(kml.contains("2024-05-01 Eiffel Tower"));
/// ```
pub fn write_kml(track: &Track, mut sink: impl Write) -> Result<(), Error> {
    let base_name = base_name(track);
    let elements = vec![
        simple_kelem("name", format!("{base_name}.kml")),
        Kml::Element(line_style()),
        Kml::Element(style_map()),
        Kml::Element(placemark(&base_name, &track.points)),
    ];

    let document = Kml::Document {
        elements,
        attrs: Default::default(),
    };
    let namespaces = NAMESPACES
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    let kml = Kml::<CoordValue>::KmlDocument(KmlDocument {
        version: KmlVersion::V22,
        attrs: namespaces,
        elements: vec![document],
    });

    writeln!(&mut sink, "{XML_HEAD}")?;
    let mut writer = KmlWriter::from_writer(&mut sink);
    writer.write(&kml)?;
    writeln!(&mut sink)?;
    sink.flush()?;

    Ok(())
}

/// The single _Style_ used for every line.
fn line_style() -> Element {
    Element {
        name: "Style".to_string(),
        attrs: id_attr(STYLE_ID),
        children: vec![Element {
            name: "LineStyle".to_string(),
            children: vec![
                simple_element("color", LINE_COLOR),
                simple_element("width", LINE_WIDTH),
            ],
            ..Default::default()
        }],
        ..Default::default()
    }
}

/// A _StyleMap_ whose normal and highlight variants both use [`line_style`].
fn style_map() -> Element {
    let pair = |key: &str| Element {
        name: "Pair".to_string(),
        children: vec![
            simple_element("key", key),
            simple_element("styleUrl", STYLE_ID),
        ],
        ..Default::default()
    };

    Element {
        name: "StyleMap".to_string(),
        attrs: id_attr(STYLE_MAP_ID),
        children: vec![pair("normal"), pair("highlight")],
        ..Default::default()
    }
}

/// The _Placemark_ drawing all `points` as one line.
///
/// The geometry is assembled by hand so that every value keeps exactly seven
/// decimal places.
fn placemark(name: &str, points: &[Coordinate]) -> Element {
    let line = Element {
        name: "LineString".to_string(),
        children: vec![simple_element("coordinates", coordinates(points))],
        ..Default::default()
    };

    Element {
        name: "Placemark".to_string(),
        children: vec![
            simple_element("name", name),
            simple_element("styleUrl", format!("#{STYLE_MAP_ID}")),
            Element {
                name: "MultiGeometry".to_string(),
                children: vec![line],
                ..Default::default()
            },
        ],
        ..Default::default()
    }
}

/// Render `points` as `lon,lat,alt` triples, each followed by a space.
fn coordinates(points: &[Coordinate]) -> String {
    let mut text = String::new();
    for point in points {
        write!(
            text,
            "{:.7},{:.7},{:.7} ",
            point.longitude, point.latitude, point.altitude
        )
        .unwrap();
    }
    text
}

fn id_attr(id: &str) -> HashMap<String, String> {
    HashMap::from([("id".to_string(), id.to_string())])
}

/// Create a simple KML element with `name` and `content`.
fn simple_kelem(name: impl Into<String>, content: impl Into<String>) -> Kml<CoordValue> {
    Kml::Element(simple_element(name, content))
}

/// Create a simple KML element with `name` and `content`.
fn simple_element(name: impl Into<String>, content: impl Into<String>) -> Element {
    Element {
        name: name.into(),
        content: Some(content.into()),
        ..Default::default()
    }
}
