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

//! Filesystem-safe output names.

/// Characters that are illegal in file names on at least one common platform.
const ILLEGAL_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Replace every illegal character in `name` with `_` and trim surrounding
/// whitespace.
///
/// Normalizing an already normalized name returns it unchanged.
pub fn normalize(name: &str) -> String {
    name.replace(ILLEGAL_CHARS, "_").trim().to_string()
}
