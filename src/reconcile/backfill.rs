//! Backfill reconciler: rewrite raw occupant names to stable user ids.
//!
//! Historic imports stored the spreadsheet name in `occupant_ref`. For
//! every persisted day, every assignment whose ref is not a known user id
//! is treated as a raw name and resolved through the match index. Resolved
//! entries are rewritten in place; unknown and ambiguous entries are left
//! untouched and surfaced for manual review.
//!
//! One directory read builds the index, then per-day reads and conditional
//! writes follow with no spanning transaction. A day modified by another
//! actor mid-run may be written from a stale read; accepted limitation.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::RosterDb;
use crate::error::RosterError;
use crate::reconcile::normalize::match_key;
use crate::reconcile::resolver::{MatchIndex, Resolution};
use crate::types::Station;

/// An entry the reconciler could not resolve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnresolvedEntry {
    pub date_key: String,
    pub station: Station,
    pub display_name: String,
}

/// An entry with multiple surviving candidates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AmbiguousEntry {
    pub date_key: String,
    pub station: Station,
    pub display_name: String,
    pub candidates: usize,
}

/// Structured summary of one reconciliation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackfillReport {
    pub run_id: Uuid,
    pub dry_run: bool,
    pub days_examined: usize,
    pub entries_examined: usize,
    /// Entries rewritten (live) or that would be rewritten (dry-run).
    pub entries_updated: usize,
    /// Entries whose ref was already a valid user id.
    pub entries_already_resolved: usize,
    pub unknown: Vec<UnresolvedEntry>,
    pub ambiguous: Vec<AmbiguousEntry>,
}

/// Resolve raw names across every persisted day.
///
/// Dry-run performs identical classification and reports identical counts
/// without persisting writes — that parity is the core invariant here.
pub fn reconcile_names(db: &RosterDb, dry_run: bool) -> Result<BackfillReport, RosterError> {
    let users = db.list_users()?;
    let index = MatchIndex::build(&users);

    let mut report = BackfillReport {
        run_id: Uuid::new_v4(),
        dry_run,
        days_examined: 0,
        entries_examined: 0,
        entries_updated: 0,
        entries_already_resolved: 0,
        unknown: Vec::new(),
        ambiguous: Vec::new(),
    };

    for mut day in db.all_days()? {
        report.days_examined += 1;
        let mut changed = false;

        for (station, assignment) in day.stations.iter_mut() {
            report.entries_examined += 1;

            if index.contains_id(&assignment.occupant_ref) {
                report.entries_already_resolved += 1;
                continue;
            }

            // Ref is not a known id — evidence it holds a raw name
            match index.resolve(&match_key(&assignment.display_name)) {
                Resolution::Resolved(user) => {
                    report.entries_updated += 1;
                    if !dry_run {
                        log::info!(
                            "{} {}: '{}' -> {}",
                            day.date_key,
                            station.as_str(),
                            assignment.display_name,
                            user.id
                        );
                        assignment.occupant_ref = user.id.clone();
                        assignment.display_name = user.display_name().to_string();
                        changed = true;
                    }
                }
                Resolution::Unknown => report.unknown.push(UnresolvedEntry {
                    date_key: day.date_key.clone(),
                    station: *station,
                    display_name: assignment.display_name.clone(),
                }),
                Resolution::Ambiguous { candidates } => report.ambiguous.push(AmbiguousEntry {
                    date_key: day.date_key.clone(),
                    station: *station,
                    display_name: assignment.display_name.clone(),
                    candidates,
                }),
            }
        }

        if changed {
            db.set_day(&day)?;
        }
    }

    log::info!(
        "backfill {} ({}): {} days, {} entries, {} updated, {} unknown, {} ambiguous",
        report.run_id,
        if dry_run { "dry-run" } else { "live" },
        report.days_examined,
        report.entries_examined,
        report.entries_updated,
        report.unknown.len(),
        report.ambiguous.len()
    );
    Ok(report)
}
