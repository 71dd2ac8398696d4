//! Request-scoped entry points — the endpoint contract.
//!
//! The HTTP transport and the authentication layer live outside this
//! crate; callers hand in a verified `Actor` and the raw request
//! parameters. Both operations require the admin role and refuse before
//! touching any business data. All work is strictly sequential within one
//! request; there is no cross-request locking, so concurrent imports of
//! the same month can interleave (documented limitation).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::RosterDb;
use crate::error::RosterError;
use crate::import::rows::normalize_rows;
use crate::import::writer::replace_months;
use crate::reconcile::backfill::{reconcile_names, BackfillReport};
use crate::reconcile::date_shift::{shift_dates, DateShiftReport};
use crate::sheet::decode_workbook;
use crate::types::RowError;

pub const ROLE_ADMIN: &str = "admin";

/// Verified caller identity, supplied by the external auth layer.
#[derive(Debug, Clone)]
pub struct Actor {
    pub id: String,
    pub role: String,
}

impl Actor {
    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }
}

fn ensure_admin(actor: &Actor) -> Result<(), RosterError> {
    if actor.is_admin() {
        Ok(())
    } else {
        log::warn!("actor {} (role {}) denied", actor.id, actor.role);
        Err(RosterError::Forbidden(format!(
            "role {} may not run roster operations",
            actor.role
        )))
    }
}

/// Response body of the import endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub run_id: Uuid,
    pub dry_run: bool,
    pub months: Vec<String>,
    pub days_deleted: usize,
    pub days_created: usize,
    pub days_updated: usize,
    pub row_errors: Vec<RowError>,
}

/// Import endpoint: spreadsheet payload → whole-month replacement.
///
/// Row-level errors are collected into the report, never thrown. Whole-file
/// errors and store errors abort with a `RosterError`.
pub fn import_schedule(
    db: &RosterDb,
    actor: &Actor,
    payload: &[u8],
    dry_run: bool,
) -> Result<ImportReport, RosterError> {
    ensure_admin(actor)?;

    let grid = decode_workbook(payload)?;
    let (rows, row_errors) = normalize_rows(&grid);
    let outcome = replace_months(db, &rows, dry_run)?;

    Ok(ImportReport {
        run_id: Uuid::new_v4(),
        dry_run,
        months: outcome.months,
        days_deleted: outcome.days_deleted,
        days_created: outcome.days_created,
        days_updated: outcome.days_updated,
        row_errors,
    })
}

/// Backfill endpoint mode selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackfillMode {
    /// Resolve raw occupant names to user ids (the default).
    ResolveNames,
    /// Shift a month's days by a signed day offset.
    DateShift {
        year: i32,
        month: u32,
        delta_days: i64,
    },
}

/// Parameters of one backfill request.
#[derive(Debug, Clone)]
pub struct BackfillRequest {
    pub mode: BackfillMode,
    pub dry_run: bool,
}

impl BackfillRequest {
    /// Build a request from the endpoint's query parameters.
    ///
    /// `mode` is `resolveNames` (default when absent) or `dateShift`;
    /// `dateShift` requires `month=YYYY-MM` and an integer `delta`.
    pub fn from_query(
        mode: Option<&str>,
        month: Option<&str>,
        delta: Option<&str>,
        dry_run: bool,
    ) -> Result<Self, RosterError> {
        let mode = match mode.unwrap_or("resolveNames") {
            "resolveNames" => BackfillMode::ResolveNames,
            "dateShift" => {
                let month = month.ok_or_else(|| {
                    RosterError::InvalidRequest("dateShift requires a month".to_string())
                })?;
                let (year, month) = parse_month(month)?;
                let delta = delta.ok_or_else(|| {
                    RosterError::InvalidRequest("dateShift requires a day delta".to_string())
                })?;
                let delta_days: i64 = delta.parse().map_err(|_| {
                    RosterError::InvalidRequest(format!("bad day delta: {}", delta))
                })?;
                BackfillMode::DateShift {
                    year,
                    month,
                    delta_days,
                }
            }
            other => {
                return Err(RosterError::InvalidRequest(format!(
                    "unknown backfill mode: {}",
                    other
                )))
            }
        };
        Ok(Self { mode, dry_run })
    }
}

/// Parse a `YYYY-MM` month parameter.
pub fn parse_month(s: &str) -> Result<(i32, u32), RosterError> {
    let bad = || RosterError::InvalidRequest(format!("bad month, expected YYYY-MM: {}", s));
    let (y, m) = s.split_once('-').ok_or_else(bad)?;
    let year: i32 = y.parse().map_err(|_| bad())?;
    let month: u32 = m.parse().map_err(|_| bad())?;
    if !(1..=12).contains(&month) || !(1900..=9999).contains(&year) {
        return Err(bad());
    }
    Ok((year, month))
}

/// Response body of the backfill endpoint, one variant per mode.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum BackfillOutcome {
    ResolveNames(BackfillReport),
    DateShift(DateShiftReport),
}

/// Backfill endpoint: name resolution or date-shift correction.
pub fn run_backfill(
    db: &RosterDb,
    actor: &Actor,
    request: &BackfillRequest,
) -> Result<BackfillOutcome, RosterError> {
    ensure_admin(actor)?;

    match request.mode {
        BackfillMode::ResolveNames => {
            Ok(BackfillOutcome::ResolveNames(reconcile_names(db, request.dry_run)?))
        }
        BackfillMode::DateShift {
            year,
            month,
            delta_days,
        } => Ok(BackfillOutcome::DateShift(shift_dates(
            db,
            year,
            month,
            delta_days,
            request.dry_run,
        )?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ScheduleDay, Station, StationAssignment, UserIdentity};
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    fn admin() -> Actor {
        Actor {
            id: "admin-1".to_string(),
            role: "admin".to_string(),
        }
    }

    fn resident() -> Actor {
        Actor {
            id: "res-1".to_string(),
            role: "resident".to_string(),
        }
    }

    #[test]
    fn test_non_admin_rejected_before_payload_is_touched() {
        let db = RosterDb::open_in_memory().unwrap();
        // Garbage payload: if auth ran after decoding this would be a
        // Workbook error instead of Forbidden
        let err = import_schedule(&db, &resident(), b"garbage", false).unwrap_err();
        assert!(matches!(err, RosterError::Forbidden(_)));

        let req = BackfillRequest {
            mode: BackfillMode::ResolveNames,
            dry_run: true,
        };
        let err = run_backfill(&db, &resident(), &req).unwrap_err();
        assert!(matches!(err, RosterError::Forbidden(_)));
    }

    #[test]
    fn test_admin_with_bad_payload_gets_workbook_error() {
        let db = RosterDb::open_in_memory().unwrap();
        let err = import_schedule(&db, &admin(), b"garbage", false).unwrap_err();
        assert!(matches!(err, RosterError::Workbook(_)));

        let err = import_schedule(&db, &admin(), &[], false).unwrap_err();
        assert!(matches!(err, RosterError::EmptyFile));
    }

    #[test]
    fn test_backfill_request_parsing() {
        let req = BackfillRequest::from_query(None, None, None, true).unwrap();
        assert_eq!(req.mode, BackfillMode::ResolveNames);
        assert!(req.dry_run);

        let req =
            BackfillRequest::from_query(Some("dateShift"), Some("2025-11"), Some("+1"), false)
                .unwrap();
        assert_eq!(
            req.mode,
            BackfillMode::DateShift {
                year: 2025,
                month: 11,
                delta_days: 1
            }
        );

        let req =
            BackfillRequest::from_query(Some("dateShift"), Some("2025-03"), Some("-2"), true)
                .unwrap();
        assert_eq!(
            req.mode,
            BackfillMode::DateShift {
                year: 2025,
                month: 3,
                delta_days: -2
            }
        );
    }

    #[test]
    fn test_backfill_request_rejects_bad_parameters() {
        for (mode, month, delta) in [
            (Some("dateShift"), None, Some("1")),
            (Some("dateShift"), Some("2025-11"), None),
            (Some("dateShift"), Some("2025-13"), Some("1")),
            (Some("dateShift"), Some("november"), Some("1")),
            (Some("dateShift"), Some("2025-11"), Some("soon")),
            (Some("fixEverything"), None, None),
        ] {
            let result = BackfillRequest::from_query(mode, month, delta, true);
            assert!(
                matches!(result, Err(RosterError::InvalidRequest(_))),
                "should reject mode={:?} month={:?} delta={:?}",
                mode,
                month,
                delta
            );
        }
    }

    #[test]
    fn test_parse_month() {
        assert_eq!(parse_month("2025-11").unwrap(), (2025, 11));
        assert!(parse_month("2025-00").is_err());
        assert!(parse_month("2025").is_err());
        assert!(parse_month("25-11").is_err());
    }

    #[test]
    fn test_run_backfill_resolve_names_end_to_end() {
        let db = RosterDb::open_in_memory().unwrap();
        db.upsert_user(&UserIdentity {
            id: "u-cohen".to_string(),
            name_he: "משה כהן".to_string(),
            name_en: String::new(),
            role: "resident".to_string(),
            status: "active".to_string(),
        })
        .unwrap();

        let mut stations = BTreeMap::new();
        stations.insert(Station::Er, StationAssignment::unresolved("משה כהן"));
        db.set_day(&ScheduleDay::new(
            NaiveDate::from_ymd_opt(2025, 11, 1).unwrap(),
            stations,
        ))
        .unwrap();

        let req = BackfillRequest {
            mode: BackfillMode::ResolveNames,
            dry_run: false,
        };
        let outcome = run_backfill(&db, &admin(), &req).unwrap();
        match outcome {
            BackfillOutcome::ResolveNames(report) => {
                assert_eq!(report.entries_updated, 1);
                assert!(report.unknown.is_empty());
            }
            BackfillOutcome::DateShift(_) => panic!("wrong outcome variant"),
        }

        let day = db.get_day("2025-11-01").unwrap().unwrap();
        assert_eq!(day.stations[&Station::Er].occupant_ref, "u-cohen");
    }

    #[test]
    fn test_run_backfill_date_shift_end_to_end() {
        let db = RosterDb::open_in_memory().unwrap();
        let mut stations = BTreeMap::new();
        stations.insert(Station::Er, StationAssignment::unresolved("משה כהן"));
        db.set_day(&ScheduleDay::new(
            NaiveDate::from_ymd_opt(2025, 11, 1).unwrap(),
            stations,
        ))
        .unwrap();

        let req = BackfillRequest::from_query(
            Some("dateShift"),
            Some("2025-11"),
            Some("1"),
            false,
        )
        .unwrap();
        let outcome = run_backfill(&db, &admin(), &req).unwrap();
        match outcome {
            BackfillOutcome::DateShift(report) => {
                assert_eq!(report.days_shifted, 1);
                assert_eq!(report.range_start, "2025-10-31");
                assert_eq!(report.range_end, "2025-11-28");
            }
            BackfillOutcome::ResolveNames(_) => panic!("wrong outcome variant"),
        }

        assert!(db.get_day("2025-11-01").unwrap().is_none());
        assert!(db.get_day("2025-11-02").unwrap().is_some());
    }
}
