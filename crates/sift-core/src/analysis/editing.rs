//! Edit-mode state types.

use crate::boundary::Position;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which kind of edit is in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum EditMode {
    /// No active edit
    #[default]
    None,
    /// Editing the concatenation of all units
    WholeText,
    /// Editing exactly one unit's text in place
    SingleUnit,
}

/// The in-progress local edit: mode, buffer, and derived paragraph spans.
///
/// `positions` is always the pure re-derivation of `buffer`; it is recomputed
/// on every buffer change, never incrementally patched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EditingState {
    pub mode: EditMode,
    /// Target unit when `mode` is `SingleUnit`
    pub active_unit_id: Option<u64>,
    pub buffer: String,
    pub last_change_at: Option<DateTime<Utc>>,
    pub positions: Vec<Position>,
}

impl EditingState {
    /// Returns whether any edit is in progress.
    pub fn is_editing(&self) -> bool {
        self.mode != EditMode::None
    }

    /// Discards the buffer and returns to `EditMode::None`.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
