//! Shared engine state.
//!
//! The original design hung the session, the saving flag, and the last error
//! off a process-wide singleton store. Here the same state is an explicitly
//! owned object, injected into the editing session manager and the
//! reconciliation engine, with a lifecycle of one open document session.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::RwLock;

use crate::analysis::{MetricsPatch, Session, SessionStore, Unit};
use crate::error::{Result, SiftError};

/// Shared state for one open document session.
///
/// Holds the session store (single source of truth), the single-flight
/// structural-save flag, and the last error message surfaced to consumers.
///
/// # Thread Safety
///
/// Interior mutability via `RwLock` and an atomic flag; intended to be shared
/// behind an `Arc`.
#[derive(Debug, Default)]
pub struct AppState {
    store: RwLock<SessionStore>,
    saving: AtomicBool,
    last_error: RwLock<Option<String>>,
}

impl AppState {
    /// Creates state with no session loaded.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates state holding an initial session.
    pub fn with_session(session: Session) -> Self {
        let mut store = SessionStore::new();
        store.replace_session(session);
        Self {
            store: RwLock::new(store),
            saving: AtomicBool::new(false),
            last_error: RwLock::new(None),
        }
    }

    // ========================================================================
    // Session store access
    // ========================================================================

    /// Returns a cloned snapshot of the current session, if any.
    pub async fn session(&self) -> Option<Session> {
        self.store.read().await.session().cloned()
    }

    /// Returns the current session id, if any.
    pub async fn session_id(&self) -> Option<String> {
        self.store.read().await.session_id().map(str::to_string)
    }

    /// Returns the current session topic, if any.
    pub async fn topic(&self) -> Option<String> {
        self.store.read().await.topic().map(str::to_string)
    }

    /// Returns a cloned snapshot of the units in canonical order.
    pub async fn current_units(&self) -> Vec<Unit> {
        self.store.read().await.current_units().to_vec()
    }

    /// Returns the unit ids in canonical order.
    pub async fn unit_ids(&self) -> Vec<u64> {
        self.store
            .read()
            .await
            .current_units()
            .iter()
            .map(|u| u.id)
            .collect()
    }

    /// Returns one unit's text, if the unit exists.
    pub async fn unit_text(&self, unit_id: u64) -> Option<String> {
        self.store
            .read()
            .await
            .session()
            .and_then(|s| s.unit(unit_id))
            .map(|u| u.text.clone())
    }

    /// Concatenates all unit texts in canonical order.
    pub async fn joined_text(&self) -> String {
        self.store.read().await.joined_text()
    }

    /// Replaces the session wholesale with a server-confirmed snapshot.
    pub async fn replace_session(&self, session: Session) {
        tracing::debug!(
            "replacing session {} ({} units)",
            session.session_id,
            session.units.len()
        );
        self.store.write().await.replace_session(session);
    }

    /// Applies the optimistic local permutation for a reorder.
    pub async fn apply_order(&self, ordered_ids: &[u64]) -> Result<()> {
        self.store.write().await.apply_order(ordered_ids)
    }

    /// Applies a background metrics patch only when the store still holds the
    /// same session and the unit still exists.
    ///
    /// This is the staleness guard: a structural operation may have replaced
    /// the session while the metrics request was in flight, in which case the
    /// response is discarded. Returns whether the patch was applied.
    pub async fn apply_metrics_patch_if_current(
        &self,
        session_id: &str,
        unit_id: u64,
        patch: &MetricsPatch,
    ) -> bool {
        let mut store = self.store.write().await;
        if store.session_id() != Some(session_id) {
            return false;
        }
        store.apply_metrics_patch(unit_id, patch)
    }

    // ========================================================================
    // Single-flight structural save gate
    // ========================================================================

    /// Begins a structural save window.
    ///
    /// At most one structural remote call (reorder, merge, delete, or a
    /// structural commit, including its recovery fetch) may be in flight at a
    /// time. Returns a guard that clears the flag when dropped.
    ///
    /// # Errors
    ///
    /// Returns a validation error when another structural operation is
    /// already in flight; the caller must not retry until it finishes.
    pub fn try_begin_save(&self) -> Result<SaveGuard<'_>> {
        if self
            .saving
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(SiftError::validation(
                "another structural operation is already in flight",
            ));
        }
        Ok(SaveGuard { state: self })
    }

    /// Returns whether a structural operation is currently in flight.
    ///
    /// Consumers disable their structural edit controls while this is true.
    pub fn is_saving(&self) -> bool {
        self.saving.load(Ordering::SeqCst)
    }

    // ========================================================================
    // Last error
    // ========================================================================

    /// Returns the last surfaced error message, if any.
    pub async fn last_error(&self) -> Option<String> {
        self.last_error.read().await.clone()
    }

    /// Records an error message; displayed until a later operation succeeds.
    pub async fn set_last_error(&self, message: impl Into<String>) {
        *self.last_error.write().await = Some(message.into());
    }

    /// Clears the last error after a successful operation.
    pub async fn clear_last_error(&self) {
        *self.last_error.write().await = None;
    }
}

/// RAII guard for the structural save window.
///
/// Clears the saving flag on drop, so every exit path of a structural
/// operation (success, rejection, recovery) releases the gate.
#[derive(Debug)]
pub struct SaveGuard<'a> {
    state: &'a AppState,
}

impl Drop for SaveGuard<'_> {
    fn drop(&mut self) {
        self.state.saving.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::UnitMetrics;

    fn session(id: &str, unit_ids: &[u64]) -> Session {
        Session {
            session_id: id.to_string(),
            topic: "topic".to_string(),
            units: unit_ids
                .iter()
                .map(|unit_id| Unit {
                    id: *unit_id,
                    text: format!("unit {unit_id}"),
                    metrics: UnitMetrics::default(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_save_gate_is_single_flight() {
        let state = AppState::new();

        let guard = state.try_begin_save().unwrap();
        assert!(state.is_saving());
        assert!(state.try_begin_save().unwrap_err().is_validation());

        drop(guard);
        assert!(!state.is_saving());
        assert!(state.try_begin_save().is_ok());
    }

    #[tokio::test]
    async fn test_last_error_set_and_clear() {
        let state = AppState::new();
        assert_eq!(state.last_error().await, None);

        state.set_last_error("boom").await;
        assert_eq!(state.last_error().await.as_deref(), Some("boom"));

        state.clear_last_error().await;
        assert_eq!(state.last_error().await, None);
    }

    #[tokio::test]
    async fn test_metrics_patch_discarded_for_stale_session() {
        let state = AppState::with_session(session("s-1", &[1, 2]));
        let patch = MetricsPatch {
            signal_strength: Some(0.5),
            ..Default::default()
        };

        // Session replaced while the request was in flight
        state.replace_session(session("s-2", &[1, 2])).await;

        assert!(!state.apply_metrics_patch_if_current("s-1", 1, &patch).await);
        assert!(state.apply_metrics_patch_if_current("s-2", 1, &patch).await);
    }

    #[tokio::test]
    async fn test_metrics_patch_discarded_for_missing_unit() {
        let state = AppState::with_session(session("s-1", &[1, 2]));
        let patch = MetricsPatch::default();

        state.replace_session(session("s-1", &[1])).await;

        assert!(!state.apply_metrics_patch_if_current("s-1", 2, &patch).await);
    }
}
