//! Core data model for the roster engine.
//!
//! A `ScheduleDay` is the unit of persistence: one document per calendar
//! date, keyed by its `dateKey` (`YYYY-MM-DD`). The key is always derived
//! from the date — constructors enforce it so the two can never disagree.

use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Canonical station keys — the closed set of on-call slots.
///
/// Source spreadsheets label these in Hebrew; `import::stations` maps the
/// labels onto this enum. Station keys double as JSON map keys in the
/// persisted document, so unit variants serialize as plain strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Station {
    /// Emergency department duty.
    Er,
    /// Intensive care duty.
    Icu,
    /// Internal medicine ward A.
    WardA,
    /// Internal medicine ward B.
    WardB,
    /// Pediatrics duty.
    Pediatrics,
    /// Senior physician on home call.
    Senior,
}

impl Station {
    pub fn as_str(&self) -> &'static str {
        match self {
            Station::Er => "er",
            Station::Icu => "icu",
            Station::WardA => "wardA",
            Station::WardB => "wardB",
            Station::Pediatrics => "pediatrics",
            Station::Senior => "senior",
        }
    }
}

/// One occupant of one station on one day.
///
/// `occupant_ref` is either a stable user id (after reconciliation) or the
/// raw display name the importer found in the spreadsheet. Telling the two
/// apart requires a directory lookup — that ambiguity is exactly what
/// `reconcile::backfill` exists to clean up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StationAssignment {
    pub occupant_ref: String,
    pub display_name: String,
}

impl StationAssignment {
    /// Assignment as written by the importer: both fields hold the raw name.
    pub fn unresolved(name: &str) -> Self {
        Self {
            occupant_ref: name.to_string(),
            display_name: name.to_string(),
        }
    }
}

/// One persisted schedule document: a calendar date and its station map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleDay {
    /// Persistence key, always `date.format("%Y-%m-%d")`.
    pub date_key: String,
    pub date: NaiveDate,
    pub stations: BTreeMap<Station, StationAssignment>,
    /// RFC 3339 timestamp of the import run that created this document.
    pub created_at: String,
}

impl ScheduleDay {
    pub fn new(date: NaiveDate, stations: BTreeMap<Station, StationAssignment>) -> Self {
        Self {
            date_key: date_key(date),
            date,
            stations,
            created_at: Utc::now().to_rfc3339(),
        }
    }

    /// Copy of this day moved to `date + delta` days, key re-derived.
    pub fn shifted(&self, delta_days: i64) -> Self {
        let date = self.date + Duration::days(delta_days);
        Self {
            date_key: date_key(date),
            date,
            stations: self.stations.clone(),
            created_at: self.created_at.clone(),
        }
    }
}

/// A directory user, read-only to this subsystem.
///
/// Display names come in two variants (Hebrew and English); both feed the
/// match-key index. Role and status are free-form directory strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdentity {
    pub id: String,
    pub name_he: String,
    #[serde(default)]
    pub name_en: String,
    pub role: String,
    pub status: String,
}

impl UserIdentity {
    /// Preferred display name: the Hebrew variant, falling back to English.
    pub fn display_name(&self) -> &str {
        if self.name_he.trim().is_empty() {
            &self.name_en
        } else {
            &self.name_he
        }
    }
}

/// One decoded spreadsheet row. Transient — consumed by the station mapper
/// and discarded once a `ScheduleDay` is derived.
#[derive(Debug, Clone)]
pub struct ImportRow {
    pub date: NaiveDate,
    pub day_of_week_label: Option<String>,
    /// Source column label → trimmed occupant text, in column order.
    pub station_raw: Vec<(String, String)>,
}

/// A row-level import error. Collected and reported, never fatal to the batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowError {
    /// 1-based spreadsheet row number.
    pub row_number: usize,
    pub message: String,
}

/// Canonical `YYYY-MM-DD` key for a date.
pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Parse a `YYYY-MM-DD` key back into a date.
pub fn parse_date_key(key: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(key, "%Y-%m-%d").ok()
}

/// First and last calendar day of a month. `None` for an invalid month.
pub fn month_bounds(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let start = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((start, next - Duration::days(1)))
}

/// `YYYY-MM` label for a (year, month) pair.
pub fn month_label(year: i32, month: u32) -> String {
    format!("{:04}-{:02}", year, month)
}

/// (year, month) of a date.
pub fn year_month(date: NaiveDate) -> (i32, u32) {
    (date.year(), date.month())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_key_round_trip() {
        let d = NaiveDate::from_ymd_opt(2025, 11, 1).unwrap();
        assert_eq!(date_key(d), "2025-11-01");
        assert_eq!(parse_date_key("2025-11-01"), Some(d));
        assert_eq!(parse_date_key("2025-13-01"), None);
        assert_eq!(parse_date_key("garbage"), None);
    }

    #[test]
    fn test_schedule_day_key_derived_from_date() {
        let d = NaiveDate::from_ymd_opt(2025, 2, 9).unwrap();
        let day = ScheduleDay::new(d, BTreeMap::new());
        assert_eq!(day.date_key, "2025-02-09");
        assert_eq!(parse_date_key(&day.date_key), Some(day.date));
    }

    #[test]
    fn test_shifted_rederives_key() {
        let d = NaiveDate::from_ymd_opt(2025, 10, 31).unwrap();
        let day = ScheduleDay::new(d, BTreeMap::new());
        let moved = day.shifted(1);
        assert_eq!(moved.date_key, "2025-11-01");
        assert_eq!(moved.created_at, day.created_at);
        assert_eq!(moved.stations, day.stations);
    }

    #[test]
    fn test_month_bounds() {
        let (start, end) = month_bounds(2025, 11).unwrap();
        assert_eq!(date_key(start), "2025-11-01");
        assert_eq!(date_key(end), "2025-11-30");

        let (start, end) = month_bounds(2024, 2).unwrap();
        assert_eq!(date_key(start), "2024-02-01");
        assert_eq!(date_key(end), "2024-02-29");

        let (start, end) = month_bounds(2025, 12).unwrap();
        assert_eq!(date_key(start), "2025-12-01");
        assert_eq!(date_key(end), "2025-12-31");

        assert!(month_bounds(2025, 13).is_none());
    }

    #[test]
    fn test_station_serializes_as_map_key() {
        let mut stations = BTreeMap::new();
        stations.insert(Station::Er, StationAssignment::unresolved("משה כהן"));
        stations.insert(Station::WardA, StationAssignment::unresolved("דנה לוי"));
        let day = ScheduleDay::new(NaiveDate::from_ymd_opt(2025, 11, 1).unwrap(), stations);

        let json = serde_json::to_string(&day).unwrap();
        assert!(json.contains("\"er\""));
        assert!(json.contains("\"wardA\""));

        let back: ScheduleDay = serde_json::from_str(&json).unwrap();
        assert_eq!(back, day);
    }

    #[test]
    fn test_display_name_prefers_hebrew() {
        let u = UserIdentity {
            id: "u1".to_string(),
            name_he: "משה כהן".to_string(),
            name_en: "Moshe Cohen".to_string(),
            role: "resident".to_string(),
            status: "active".to_string(),
        };
        assert_eq!(u.display_name(), "משה כהן");

        let u2 = UserIdentity { name_he: String::new(), ..u };
        assert_eq!(u2.display_name(), "Moshe Cohen");
    }
}
