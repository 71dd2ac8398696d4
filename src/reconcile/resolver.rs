//! Identity resolution: match key → directory user.
//!
//! The index is built once per reconciliation run from both display-name
//! variants of every directory user. Multiple candidates for one key are
//! narrowed by (role == resident && status == active); when narrowing does
//! not isolate a single candidate the entry is classified ambiguous and
//! left for a human. Narrowing is a heuristic — a wrong-but-unique survivor
//! still resolves, which is an accepted trade-off.

use std::collections::{HashMap, HashSet};

use crate::reconcile::normalize::match_key;
use crate::types::UserIdentity;

pub const ROLE_RESIDENT: &str = "resident";
pub const STATUS_ACTIVE: &str = "active";

/// Outcome of resolving one match key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved(UserIdentity),
    Unknown,
    Ambiguous { candidates: usize },
}

/// In-memory index over the user directory, built fresh per run.
pub struct MatchIndex {
    by_key: HashMap<String, Vec<UserIdentity>>,
    ids: HashSet<String>,
}

impl MatchIndex {
    /// Index every user under the match keys of both display-name variants.
    pub fn build(users: &[UserIdentity]) -> Self {
        let mut by_key: HashMap<String, Vec<UserIdentity>> = HashMap::new();
        let mut ids = HashSet::new();

        for user in users {
            ids.insert(user.id.clone());

            let mut keys: Vec<String> = Vec::new();
            for name in [&user.name_he, &user.name_en] {
                let key = match_key(name);
                if !key.is_empty() && !keys.contains(&key) {
                    keys.push(key);
                }
            }
            for key in keys {
                by_key.entry(key).or_default().push(user.clone());
            }
        }

        log::debug!("match index: {} keys over {} users", by_key.len(), ids.len());
        Self { by_key, ids }
    }

    /// Whether `id` is a known directory user id.
    pub fn contains_id(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Resolve a match key to a user.
    pub fn resolve(&self, key: &str) -> Resolution {
        let candidates = match self.by_key.get(key) {
            Some(c) if !c.is_empty() => c,
            _ => return Resolution::Unknown,
        };

        if candidates.len() == 1 {
            return Resolution::Resolved(candidates[0].clone());
        }

        let narrowed: Vec<&UserIdentity> = candidates
            .iter()
            .filter(|u| u.role == ROLE_RESIDENT && u.status == STATUS_ACTIVE)
            .collect();

        if narrowed.len() == 1 {
            Resolution::Resolved(narrowed[0].clone())
        } else {
            Resolution::Ambiguous {
                candidates: candidates.len(),
            }
        }
    }
}
