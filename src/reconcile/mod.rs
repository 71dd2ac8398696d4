//! Reconciliation path: resolving raw occupant names in persisted schedule
//! days against the user directory, and correcting systematic date shifts.

pub mod backfill;
pub mod date_shift;
pub mod normalize;
pub mod resolver;
