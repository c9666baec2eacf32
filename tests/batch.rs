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

//! Batch runs over scratch directories.

use std::fs;
use std::path::Path;

use gpx_kml_batch::{run, BatchConfig, Error};
use tempfile::tempdir;

fn gpx(name: &str, time: &str, points: &[(f64, f64, f64)]) -> String {
    let points: String = points
        .iter()
        .map(|(lat, lon, ele)| format!(r#"<trkpt lat="{lat}" lon="{lon}"><ele>{ele}</ele></trkpt>"#))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx xmlns="http://www.topografix.com/GPX/1/1" version="1.1" creator="test">
    <metadata><time>{time}</time></metadata>
    <trk><name>{name}</name><trkseg>{points}</trkseg></trk>
</gpx>
"#
    )
}

fn morning_ride() -> String {
    gpx(
        "Morning Ride",
        "2024-05-01T08:00:00Z",
        &[(47.3769, 8.5417, 408.0), (47.3780, 8.5402, 410.25)],
    )
}

fn kml_files(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().into_string().unwrap())
        .filter(|name| name.ends_with(".kml"))
        .collect();
    names.sort();
    names
}

/// Everything from the `<Document>` element on.
fn document(kml: &str) -> &str {
    &kml[kml.find("<Document>").unwrap()..]
}

fn coordinates(kml: &str) -> &str {
    let start = kml.find("<coordinates>").unwrap() + "<coordinates>".len();
    let end = kml.find("</coordinates>").unwrap();
    &kml[start..end]
}

#[test]
fn converts_valid_and_counts_failures() {
    let input = tempdir().unwrap();
    fs::write(input.path().join("ride.gpx"), morning_ride()).unwrap();
    fs::write(
        input.path().join("broken.GPX"),
        gpx("Broken", "2024-05-01T08:00:00.500Z", &[(1.0, 2.0, 3.0)]),
    )
    .unwrap();
    fs::write(input.path().join("readme.txt"), "not a track").unwrap();

    let tally = run(&BatchConfig::new(input.path(), None)).unwrap();

    assert_eq!((tally.succeeded, tally.failed), (1, 1));
    assert_eq!(kml_files(input.path()), ["2024-05-01 Morning Ride.kml"]);
    let kml = fs::read_to_string(input.path().join("2024-05-01 Morning Ride.kml")).unwrap();
    assert_eq!(
        coordinates(&kml),
        "8.5417000,47.3769000,408.0000000 8.5402000,47.3780000,410.2500000 "
    );
}

#[test]
fn writes_to_separate_output_dir() {
    let input = tempdir().unwrap();
    let output = tempdir().unwrap();
    fs::write(
        input.path().join("trail.gpx"),
        gpx("Trail: North/South", "2024-05-01T06:30:00Z", &[(1.0, 2.0, 3.0)]),
    )
    .unwrap();

    let tally = run(&BatchConfig::new(input.path(), Some(output.path().into()))).unwrap();

    assert_eq!((tally.succeeded, tally.failed), (1, 0));
    assert!(kml_files(input.path()).is_empty());
    assert_eq!(
        kml_files(output.path()),
        ["2024-05-01 Trail_ North_South.kml"]
    );
}

#[test]
fn existing_output_fails_only_that_file() {
    let input = tempdir().unwrap();
    fs::write(input.path().join("ride.gpx"), morning_ride()).unwrap();
    fs::write(
        input.path().join("evening.gpx"),
        gpx("Evening Ride", "2024-05-01T18:00:00Z", &[]),
    )
    .unwrap();
    fs::write(input.path().join("2024-05-01 Morning Ride.kml"), "old").unwrap();

    let tally = run(&BatchConfig::new(input.path(), None)).unwrap();

    assert_eq!((tally.succeeded, tally.failed), (1, 1));
    assert_eq!(
        fs::read_to_string(input.path().join("2024-05-01 Morning Ride.kml")).unwrap(),
        "old"
    );
    assert!(input.path().join("2024-05-01 Evening Ride.kml").exists());
}

#[test]
fn malformed_files_do_not_stop_the_run() {
    let input = tempdir().unwrap();
    let valid_points = "<trkseg><trkpt lat=\"1\" lon=\"2\"><ele>3</ele></trkpt></trkseg>";
    let time = "<metadata><time>2024-05-01T08:00:00Z</time></metadata>";
    let broken = [
        format!("<gpx><trk><name>a</name>{valid_points}</trk></gpx>"),
        format!("<gpx>{time}<trk>{valid_points}</trk></gpx>"),
        format!("<gpx>{time}<trk><name>c</name></trk></gpx>"),
        format!(
            "<gpx>{time}<trk><name>d</name><trkseg><trkpt lat=\"1\"><ele>3</ele></trkpt></trkseg></trk></gpx>"
        ),
        format!(
            "<gpx>{time}<trk><name>e</name><trkseg><trkpt lat=\"1\" lon=\"2\"/></trkseg></trk></gpx>"
        ),
        "this is not xml".to_string(),
    ];
    for (i, source) in broken.iter().enumerate() {
        fs::write(input.path().join(format!("broken{i}.gpx")), source).unwrap();
    }
    fs::write(input.path().join("ride.gpx"), morning_ride()).unwrap();

    let tally = run(&BatchConfig::new(input.path(), None).with_workers(2)).unwrap();

    assert_eq!((tally.succeeded, tally.failed), (1, broken.len()));
    assert_eq!(kml_files(input.path()), ["2024-05-01 Morning Ride.kml"]);
}

#[test]
fn converts_many_files_with_small_pools() {
    let input = tempdir().unwrap();
    let output = tempdir().unwrap();
    for i in 0..40 {
        fs::write(
            input.path().join(format!("track{i}.gpx")),
            gpx(&format!("Track {i}"), "2024-05-01T08:00:00Z", &[(1.0, 2.0, 3.0)]),
        )
        .unwrap();
    }

    for workers in [1, 3] {
        let output = tempfile::tempdir_in(output.path()).unwrap();
        let config = BatchConfig::new(input.path(), Some(output.path().into())).with_workers(workers);

        let tally = run(&config).unwrap();

        assert_eq!((tally.succeeded, tally.failed), (40, 0));
        assert_eq!(kml_files(output.path()).len(), 40);
    }
}

#[test]
fn zero_workers_still_converts() {
    let input = tempdir().unwrap();
    fs::write(input.path().join("ride.gpx"), morning_ride()).unwrap();
    let config = BatchConfig {
        workers: 0,
        ..BatchConfig::new(input.path(), None)
    };

    let tally = run(&config).unwrap();

    assert_eq!((tally.succeeded, tally.failed), (1, 0));
    assert_eq!(kml_files(input.path()), ["2024-05-01 Morning Ride.kml"]);
}

#[test]
fn rerun_produces_same_content() {
    let input = tempdir().unwrap();
    fs::write(input.path().join("ride.gpx"), morning_ride()).unwrap();
    let first = tempdir().unwrap();
    let second = tempdir().unwrap();

    run(&BatchConfig::new(input.path(), Some(first.path().into()))).unwrap();
    run(&BatchConfig::new(input.path(), Some(second.path().into()))).unwrap();

    let name = "2024-05-01 Morning Ride.kml";
    let first = fs::read_to_string(first.path().join(name)).unwrap();
    let second = fs::read_to_string(second.path().join(name)).unwrap();
    assert_eq!(coordinates(&first), coordinates(&second));
    // Namespace attributes on `<kml>` may come in any order; the document
    // below them must match exactly.
    assert_eq!(document(&first), document(&second));
    for part in ["<Style id=\"style1\">", "<StyleMap id=\"stylemap_id00\">", "<Placemark>"] {
        assert!(document(&first).contains(part), "{part}");
    }
}

#[test]
fn subdirectories_are_not_scanned() {
    let input = tempdir().unwrap();
    fs::create_dir(input.path().join("nested.gpx")).unwrap();
    fs::write(input.path().join("nested.gpx").join("ride.gpx"), morning_ride()).unwrap();

    let tally = run(&BatchConfig::new(input.path(), None)).unwrap();

    assert_eq!((tally.succeeded, tally.failed), (0, 0));
}

#[test]
fn invalid_directories_abort() {
    let input = tempdir().unwrap();
    fs::write(input.path().join("ride.gpx"), morning_ride()).unwrap();

    let err = run(&BatchConfig::new(
        input.path(),
        Some(input.path().join("missing")),
    ))
    .unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));

    let err = run(&BatchConfig::new(input.path().join("ride.gpx"), None)).unwrap_err();
    assert!(err.is_fatal());
    assert!(kml_files(input.path()).is_empty());
}
