//! Date-shift corrector: bulk migration for off-by-N import errors.
//!
//! When a whole month was imported against the wrong dates, this shifts
//! every persisted day in a fixed window by a signed day offset. The
//! window is (month start − 1 day) through (month end − 2 days) inclusive,
//! matching the known class of off-by-one errors this tool exists to fix;
//! days outside the window are never touched.
//!
//! Live mode performs write-then-delete per day as two separate store
//! calls. A crash between them leaves both source and destination present;
//! a crashed run needs manual inspection, not automatic retry.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::RosterDb;
use crate::error::RosterError;
use crate::types::{date_key, month_bounds, month_label};

/// One planned (or applied) day move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftMove {
    pub from: String,
    pub to: String,
}

/// Structured summary of one date-shift run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateShiftReport {
    pub run_id: Uuid,
    pub dry_run: bool,
    pub month: String,
    pub delta_days: i64,
    pub range_start: String,
    pub range_end: String,
    pub days_examined: usize,
    /// Days moved (live) or that would move (dry-run).
    pub days_shifted: usize,
    /// Destination keys that already held a document. Counted, not
    /// blocking — live mode overwrites them.
    pub collisions: usize,
    pub moves: Vec<ShiftMove>,
}

/// The shiftable window for a month: one day before it starts through two
/// days before it ends, inclusive.
pub fn shift_range(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let (start, end) = month_bounds(year, month)?;
    Some((start - Duration::days(1), end - Duration::days(2)))
}

/// Shift every persisted day in the month's window by `delta_days`.
pub fn shift_dates(
    db: &RosterDb,
    year: i32,
    month: u32,
    delta_days: i64,
    dry_run: bool,
) -> Result<DateShiftReport, RosterError> {
    if delta_days == 0 {
        return Err(RosterError::InvalidRequest(
            "day delta must be non-zero".to_string(),
        ));
    }
    let (range_start, range_end) = shift_range(year, month).ok_or_else(|| {
        RosterError::InvalidRequest(format!("invalid month: {}-{}", year, month))
    })?;

    let days = db.days_in_range(&date_key(range_start), &date_key(range_end))?;
    let source_keys: Vec<&str> = days.iter().map(|d| d.date_key.as_str()).collect();

    // Classify collisions before mutating anything so dry-run and live
    // runs see the same store state.
    let mut moves = Vec::with_capacity(days.len());
    let mut collisions = 0;
    for day in &days {
        let dest_key = date_key(day.date + Duration::days(delta_days));
        let occupied = if source_keys.contains(&dest_key.as_str()) {
            true
        } else {
            db.get_day(&dest_key)?.is_some()
        };
        if occupied {
            collisions += 1;
        }
        moves.push(ShiftMove {
            from: day.date_key.clone(),
            to: dest_key,
        });
    }

    if !dry_run {
        // Order so a destination is never a source we still have to move:
        // shifting forward walks the window backwards, and vice versa.
        let mut ordered: Vec<_> = days.iter().collect();
        if delta_days > 0 {
            ordered.reverse();
        }
        for day in ordered {
            let moved = day.shifted(delta_days);
            db.set_day(&moved)?;
            db.delete_day(&day.date_key)?;
        }
    }

    let report = DateShiftReport {
        run_id: Uuid::new_v4(),
        dry_run,
        month: month_label(year, month),
        delta_days,
        range_start: date_key(range_start),
        range_end: date_key(range_end),
        days_examined: days.len(),
        days_shifted: days.len(),
        collisions,
        moves,
    };

    log::info!(
        "date shift {} ({}): month {} delta {:+}, {} days in [{}, {}], {} collisions",
        report.run_id,
        if dry_run { "dry-run" } else { "live" },
        report.month,
        delta_days,
        report.days_examined,
        report.range_start,
        report.range_end,
        report.collisions
    );
    Ok(report)
}
