//! In-memory session store.
//!
//! The store owns the authoritative client-side copy of the analysis session.
//! It is pure and synchronous: every remote confirmation replaces the session
//! wholesale instead of patching units in place, so the set of unit ids is
//! always exactly what the server last returned.

use super::model::{MetricsPatch, Session, Unit};
use crate::error::{Result, SiftError};

/// Holds the current analysis session, if one is loaded.
#[derive(Debug, Default)]
pub struct SessionStore {
    session: Option<Session>,
}

impl SessionStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Unconditionally replaces the held session.
    ///
    /// This is the only way the unit list changes after a remote
    /// confirmation; the previous session is discarded without any merging.
    pub fn replace_session(&mut self, session: Session) {
        self.session = Some(session);
    }

    /// Drops the held session.
    pub fn clear(&mut self) {
        self.session = None;
    }

    /// Returns the held session, if any.
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Returns the held session's id, if any.
    pub fn session_id(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.session_id.as_str())
    }

    /// Returns the held session's topic, if any.
    pub fn topic(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.topic.as_str())
    }

    /// Returns the units in canonical order (empty when no session is loaded).
    pub fn current_units(&self) -> &[Unit] {
        self.session.as_ref().map(|s| s.units.as_slice()).unwrap_or(&[])
    }

    /// Concatenates all unit texts in canonical order.
    pub fn joined_text(&self) -> String {
        self.session
            .as_ref()
            .map(|s| s.joined_text())
            .unwrap_or_default()
    }

    /// Applies a partial metrics update to a single unit in place.
    ///
    /// Never changes `text`, `id`, or ordering. Returns `false` when no
    /// session is loaded or the unit does not exist, which is the signal the
    /// staleness guard relies on.
    pub fn apply_metrics_patch(&mut self, unit_id: u64, patch: &MetricsPatch) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        match session.units.iter_mut().find(|u| u.id == unit_id) {
            Some(unit) => {
                patch.apply_to(&mut unit.metrics);
                true
            }
            None => false,
        }
    }

    /// Applies a local permutation of the unit order.
    ///
    /// Used for the optimistic reorder guess before the remote call confirms.
    /// The store is left untouched when `ordered_ids` is not a permutation of
    /// the current unit ids.
    pub fn apply_order(&mut self, ordered_ids: &[u64]) -> Result<()> {
        let Some(session) = self.session.as_mut() else {
            return Err(SiftError::validation("no session loaded"));
        };

        let mut current: Vec<u64> = session.units.iter().map(|u| u.id).collect();
        let mut requested: Vec<u64> = ordered_ids.to_vec();
        current.sort_unstable();
        requested.sort_unstable();
        if current != requested {
            return Err(SiftError::validation(
                "reorder ids are not a permutation of the current units",
            ));
        }

        let mut reordered = Vec::with_capacity(ordered_ids.len());
        for id in ordered_ids {
            if let Some(index) = session.units.iter().position(|u| u.id == *id) {
                reordered.push(session.units.remove(index));
            }
        }
        session.units = reordered;
        Ok(())
    }
}
