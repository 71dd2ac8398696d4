//! Schedule replacement writer: "replace the month", not "merge".
//!
//! For every distinct (year, month) touched by the batch, every currently
//! persisted day in that month is deleted — including days the batch does
//! not cover — and then one document is written per incoming row. Stale
//! days must be purged; downstream consumers depend on it.
//!
//! The delete-then-write sequence is separate store calls with no
//! cross-call transaction or lock. A mid-batch store error propagates to
//! the caller and may leave the month partially replaced; concurrent
//! imports of the same month can interleave. Accepted limitation under
//! single-admin usage.

use std::collections::{BTreeMap, BTreeSet};

use crate::db::{DbError, RosterDb};
use crate::import::stations::map_stations;
use crate::types::{date_key, month_bounds, month_label, year_month, ImportRow, ScheduleDay};

/// Counts from one replacement run. Dry-run and live runs over the same
/// starting state report identical counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplaceOutcome {
    /// `YYYY-MM` labels of every month the batch touched.
    pub months: Vec<String>,
    /// Persisted days purged across those months.
    pub days_deleted: usize,
    /// Incoming days whose key did not exist before the run.
    pub days_created: usize,
    /// Incoming days whose key already existed (and was replaced).
    pub days_updated: usize,
}

/// Replace every month touched by `rows` with the batch's days.
///
/// In dry-run mode the same counts are computed from read-only range
/// queries and nothing is mutated.
pub fn replace_months(
    db: &RosterDb,
    rows: &[ImportRow],
    dry_run: bool,
) -> Result<ReplaceOutcome, DbError> {
    // Later rows for the same date win, matching the sheet's reading order
    let mut days: BTreeMap<String, ScheduleDay> = BTreeMap::new();
    for row in rows {
        let day = ScheduleDay::new(row.date, map_stations(row));
        days.insert(day.date_key.clone(), day);
    }

    let months: BTreeSet<(i32, u32)> = days.values().map(|d| year_month(d.date)).collect();

    // Snapshot what exists before any delete, for the created/updated split
    let mut existing: BTreeSet<String> = BTreeSet::new();
    for (year, month) in &months {
        // Months come from valid dates, so bounds always exist
        let Some((start, end)) = month_bounds(*year, *month) else {
            continue;
        };
        for key in db.day_keys_in_range(&date_key(start), &date_key(end))? {
            existing.insert(key);
        }
    }

    let days_deleted = existing.len();
    let days_updated = days.keys().filter(|k| existing.contains(*k)).count();
    let days_created = days.len() - days_updated;

    if !dry_run {
        for key in &existing {
            db.delete_day(key)?;
        }
        for day in days.values() {
            db.set_day(day)?;
        }
    }

    let month_labels: Vec<String> = months.iter().map(|(y, m)| month_label(*y, *m)).collect();
    log::info!(
        "{}replaced months {:?}: {} purged, {} created, {} updated",
        if dry_run { "[dry-run] would have " } else { "" },
        month_labels,
        days_deleted,
        days_created,
        days_updated
    );

    Ok(ReplaceOutcome {
        months: month_labels,
        days_deleted,
        days_created,
        days_updated,
    })
}
