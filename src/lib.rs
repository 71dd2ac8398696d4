//! On-call schedule ingestion and reconciliation engine.
//!
//! Three independent paths over one document store:
//!
//! - **Import** ([`service::import_schedule`]): spreadsheet bytes →
//!   typed cell grid → normalized per-day rows → canonical station map →
//!   whole-month replacement of persisted [`types::ScheduleDay`] documents.
//! - **Name backfill** ([`reconcile::backfill`]): resolve raw occupant
//!   names left by old imports to stable directory ids via a normalized
//!   match-key index, classifying entries as resolved / unknown / ambiguous.
//! - **Date-shift correction** ([`reconcile::date_shift`]): move a bounded
//!   window of persisted days by a fixed day offset, with collision
//!   detection and dry-run preview.
//!
//! Spreadsheet decoding (calamine) and authentication are external; the
//! engine consumes a typed cell grid and a verified [`service::Actor`].

pub mod db;
pub mod error;
pub mod import;
pub mod reconcile;
pub mod service;
pub mod sheet;
pub mod types;
