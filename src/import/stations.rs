//! Station mapping: Hebrew column label → canonical station key.
//!
//! A fixed lookup table. Several source labels collapse onto one canonical
//! station — schedules have been consolidated over the years and old sheets
//! still carry the old column headings. Labels with no table entry are
//! dropped silently: unmapped columns are informational-only.

use std::collections::BTreeMap;

use crate::types::{ImportRow, Station, StationAssignment};

/// Source-language labels and their canonical stations. Many-to-one.
const STATION_LABELS: &[(&str, Station)] = &[
    ("מיון", Station::Er),
    ("תורן מיון", Station::Er),
    ("טיפול נמרץ", Station::Icu),
    ("טנ\"ץ", Station::Icu),
    ("פנימית א", Station::WardA),
    ("מחלקה א", Station::WardA),
    ("פנימית ב", Station::WardB),
    ("מחלקה ב", Station::WardB),
    ("ילדים", Station::Pediatrics),
    ("תורן ילדים", Station::Pediatrics),
    ("כונן", Station::Senior),
    ("כונן בכיר", Station::Senior),
];

/// Canonical station for a source column label, if the table knows it.
pub fn station_for_label(label: &str) -> Option<Station> {
    let trimmed = label.trim();
    STATION_LABELS
        .iter()
        .find(|(src, _)| *src == trimmed)
        .map(|(_, station)| *station)
}

/// Build the canonical station map for one row.
///
/// Empty occupant text never produces an assignment. When two source
/// columns collapse onto the same station in a single row, the later
/// column wins.
pub fn map_stations(row: &ImportRow) -> BTreeMap<Station, StationAssignment> {
    let mut stations = BTreeMap::new();
    for (label, occupant) in &row.station_raw {
        let Some(station) = station_for_label(label) else {
            continue;
        };
        if occupant.trim().is_empty() {
            continue;
        }
        stations.insert(station, StationAssignment::unresolved(occupant.trim()));
    }
    stations
}
