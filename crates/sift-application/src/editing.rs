//! Editing session manager.
//!
//! The edit-mode state machine: tracks what is being edited, keeps the
//! buffer's derived paragraph spans current, debounces the lightweight
//! background re-score, and commits the buffer through the structural
//! endpoints when the edit finishes.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use sift_core::AppState;
use sift_core::analysis::{EditMode, EditingState};
use sift_core::boundary;
use sift_core::error::{Result, SiftError};
use sift_core::service::AnalysisService;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;

/// Quiet period after the last keystroke before the background re-score fires.
pub const QUIET_PERIOD: Duration = Duration::from_millis(2000);

/// Manages the lifecycle of one local edit at a time.
///
/// # Responsibilities
///
/// - Starting and cancelling whole-text and single-unit edits
/// - Keeping `EditingState.positions` the pure re-derivation of the buffer
/// - Debouncing the background metrics refresh (cancel-and-reschedule on
///   every buffer change)
/// - Committing the buffer through the structural endpoint for the current
///   mode and replacing the session with the server's response
///
/// # Thread Safety
///
/// All internal state uses interior mutability (`RwLock`, `Mutex`) so the
/// manager can be shared behind an `Arc`.
pub struct EditingSessionManager {
    /// Shared engine state (session store, save gate, last error)
    state: Arc<AppState>,
    /// Remote analysis service client
    service: Arc<dyn AnalysisService>,
    /// The in-progress edit, if any
    editing: RwLock<EditingState>,
    /// Handle of the scheduled background re-score, if any
    debounce: Mutex<Option<JoinHandle<()>>>,
}

impl EditingSessionManager {
    /// Creates a new manager over the shared state and service client.
    pub fn new(state: Arc<AppState>, service: Arc<dyn AnalysisService>) -> Self {
        Self {
            state,
            service,
            editing: RwLock::new(EditingState::default()),
            debounce: Mutex::new(None),
        }
    }

    /// Returns a snapshot of the current editing state.
    pub async fn editing_state(&self) -> EditingState {
        self.editing.read().await.clone()
    }

    /// Begins an edit.
    ///
    /// `WholeText` buffers the concatenation of all units; `SingleUnit`
    /// buffers the target unit's text. Starting while another edit is in
    /// progress is rejected; callers must finish or cancel first.
    ///
    /// # Errors
    ///
    /// Returns a validation error when an edit is already in progress, no
    /// session is loaded, `mode` is `None`, or the target unit is missing.
    pub async fn start_editing(&self, mode: EditMode, target_unit_id: Option<u64>) -> Result<()> {
        let mut editing = self.editing.write().await;
        if editing.is_editing() {
            return Err(SiftError::validation("an edit is already in progress"));
        }
        if self.state.session_id().await.is_none() {
            return Err(SiftError::validation("no session loaded"));
        }

        let buffer = match mode {
            EditMode::None => {
                return Err(SiftError::validation("cannot start editing in mode None"));
            }
            EditMode::WholeText => self.state.joined_text().await,
            EditMode::SingleUnit => {
                let unit_id = target_unit_id.ok_or_else(|| {
                    SiftError::validation("single-unit editing requires a target unit id")
                })?;
                self.state.unit_text(unit_id).await.ok_or_else(|| {
                    SiftError::validation(format!("unknown unit id {unit_id}"))
                })?
            }
        };

        tracing::debug!("[EditingSessionManager] starting {mode:?} edit");
        editing.positions = boundary::derive_positions(&buffer);
        editing.buffer = buffer;
        editing.mode = mode;
        editing.active_unit_id = match mode {
            EditMode::SingleUnit => target_unit_id,
            _ => None,
        };
        editing.last_change_at = None;
        Ok(())
    }

    /// Replaces the buffer with `new_text`.
    ///
    /// Recomputes the derived positions, stamps the change time, and
    /// cancels-and-reschedules the debounced background re-score: the
    /// metrics call fires only once no further change occurs for the full
    /// quiet period.
    ///
    /// # Errors
    ///
    /// Returns a validation error when no edit is in progress.
    pub async fn update_text(&self, new_text: impl Into<String>) -> Result<()> {
        let plan = {
            let mut editing = self.editing.write().await;
            if !editing.is_editing() {
                return Err(SiftError::validation("no edit in progress"));
            }
            editing.buffer = new_text.into();
            editing.positions = boundary::derive_positions(&editing.buffer);
            editing.last_change_at = Some(Utc::now());
            self.rescore_plan(&editing).await
        };
        self.reschedule_rescore(plan).await;
        Ok(())
    }

    /// Commits the buffer through the structural endpoint for the current
    /// mode and replaces the session with the server's response.
    ///
    /// `WholeText` reanalyzes the whole buffer against the session's topic;
    /// `SingleUnit` commits the unit's text and lets the server decide
    /// whether it stays one unit, splits, or is removed. On success the
    /// editing state resets and any pending background re-score is
    /// cancelled; on failure the buffer is kept so the edit can be retried.
    ///
    /// # Errors
    ///
    /// Returns a validation error when no edit is in progress or another
    /// structural operation is in flight, or the remote call's failure.
    pub async fn finish_editing(&self) -> Result<()> {
        let (mode, active_unit_id, buffer) = {
            let editing = self.editing.read().await;
            if !editing.is_editing() {
                return Err(SiftError::validation("no edit in progress"));
            }
            (editing.mode, editing.active_unit_id, editing.buffer.clone())
        };

        let _guard = self.state.try_begin_save()?;
        let session_id = self
            .state
            .session_id()
            .await
            .ok_or_else(|| SiftError::validation("no session loaded"))?;

        let result = match mode {
            EditMode::None => return Err(SiftError::validation("no edit in progress")),
            EditMode::WholeText => {
                let topic = self.state.topic().await.unwrap_or_default();
                tracing::debug!("[EditingSessionManager] committing whole-text edit");
                self.service.initialize_analysis(&buffer, &topic).await
            }
            EditMode::SingleUnit => {
                let unit_id = active_unit_id.ok_or_else(|| {
                    SiftError::validation("single-unit edit without an active unit")
                })?;
                tracing::debug!(
                    "[EditingSessionManager] committing single-unit edit for unit {unit_id}"
                );
                self.service
                    .update_text_and_restructure_paragraph(&session_id, unit_id, &buffer)
                    .await
            }
        };

        match result {
            Ok(session) => {
                self.state.replace_session(session).await;
                self.state.clear_last_error().await;
                // The authoritative commit supersedes any pending quiet refresh.
                self.abort_rescore().await;
                self.editing.write().await.reset();
                Ok(())
            }
            Err(err) => {
                tracing::warn!("[EditingSessionManager] commit failed: {err}");
                self.state.set_last_error(err.to_string()).await;
                Err(err)
            }
        }
    }

    /// Discards the buffer without committing.
    ///
    /// Resets to `EditMode::None` and cancels any pending background
    /// re-score. No-op when no edit is in progress.
    pub async fn cancel_editing(&self) {
        let mut editing = self.editing.write().await;
        if !editing.is_editing() {
            return;
        }
        tracing::debug!("[EditingSessionManager] cancelling {:?} edit", editing.mode);
        editing.reset();
        drop(editing);
        self.abort_rescore().await;
    }

    /// Resolves which units the next quiet refresh should re-score.
    ///
    /// `SingleUnit` re-scores the active unit with the full buffer. For a
    /// whole-text edit the derived spans carry no unit identity, so spans
    /// pair with stored units by index; when the counts differ the structure
    /// has changed mid-edit and the refresh is skipped entirely (only a
    /// commit can resolve identity).
    async fn rescore_plan(&self, editing: &EditingState) -> Vec<(u64, String)> {
        match editing.mode {
            EditMode::None => Vec::new(),
            EditMode::SingleUnit => match editing.active_unit_id {
                Some(unit_id) => vec![(unit_id, editing.buffer.clone())],
                None => Vec::new(),
            },
            EditMode::WholeText => {
                let units = self.state.current_units().await;
                if units.len() != editing.positions.len() {
                    return Vec::new();
                }
                units
                    .iter()
                    .zip(editing.positions.iter())
                    .filter(|(unit, position)| unit.text != position.slice(&editing.buffer))
                    .map(|(unit, position)| (unit.id, position.slice(&editing.buffer).to_string()))
                    .collect()
            }
        }
    }

    /// Cancels the scheduled re-score and schedules a new one for `plan`.
    async fn reschedule_rescore(&self, plan: Vec<(u64, String)>) {
        let mut debounce = self.debounce.lock().await;
        if let Some(handle) = debounce.take() {
            handle.abort();
        }
        if plan.is_empty() {
            return;
        }
        let Some(session_id) = self.state.session_id().await else {
            return;
        };

        let state = Arc::clone(&self.state);
        let service = Arc::clone(&self.service);
        *debounce = Some(tokio::spawn(async move {
            tokio::time::sleep(QUIET_PERIOD).await;
            for (unit_id, text) in plan {
                match service
                    .calculate_paragraph_metrics(&session_id, unit_id, &text)
                    .await
                {
                    Ok(patch) => {
                        let applied = state
                            .apply_metrics_patch_if_current(&session_id, unit_id, &patch)
                            .await;
                        if !applied {
                            tracing::debug!(
                                "[EditingSessionManager] discarding stale metrics for unit {unit_id}"
                            );
                        }
                    }
                    // The quiet refresh is best-effort; a failure here never
                    // surfaces as the last error.
                    Err(err) => {
                        tracing::warn!(
                            "[EditingSessionManager] background re-score failed for unit {unit_id}: {err}"
                        );
                    }
                }
            }
        }));
    }

    /// Aborts the scheduled re-score, if one is pending.
    async fn abort_rescore(&self) {
        if let Some(handle) = self.debounce.lock().await.take() {
            handle.abort();
        }
    }
}
