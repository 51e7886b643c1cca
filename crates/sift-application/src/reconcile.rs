//! Reconciliation engine.
//!
//! Maps structural operations onto remote calls. Reorder applies an
//! optimistic local guess and falls back to an authoritative fetch when the
//! remote call fails; merge and delete wait for server confirmation before
//! touching local state. Every operation runs inside the single-flight save
//! window, recovery included.

use std::sync::Arc;

use sift_core::AppState;
use sift_core::error::{Result, SiftError};
use sift_core::service::AnalysisService;

/// Executes structural operations against the remote analysis service.
pub struct ReconciliationEngine {
    /// Shared engine state (session store, save gate, last error)
    state: Arc<AppState>,
    /// Remote analysis service client
    service: Arc<dyn AnalysisService>,
}

impl ReconciliationEngine {
    /// Creates a new engine over the shared state and service client.
    pub fn new(state: Arc<AppState>, service: Arc<dyn AnalysisService>) -> Self {
        Self { state, service }
    }

    /// Reorders the units to `new_order`.
    ///
    /// The permutation is applied to the local store immediately (optimistic
    /// apply), then confirmed remotely. On success the session is replaced
    /// with the server's response; the server stays authoritative even when
    /// the guess was right. On failure an authoritative snapshot is fetched
    /// so the displayed order does not silently stay wrong; the original
    /// failure is still surfaced. When that recovery fetch also fails the
    /// optimistic order remains displayed and is known-unreconciled.
    ///
    /// # Errors
    ///
    /// Returns a validation error when the save gate is busy, no session is
    /// loaded, or `new_order` is not a permutation of the current unit ids;
    /// otherwise the remote failure (or a recovery error wrapping both
    /// failures).
    pub async fn reorder(&self, new_order: Vec<u64>) -> Result<()> {
        let _guard = self.state.try_begin_save()?;
        let session_id = self
            .state
            .session_id()
            .await
            .ok_or_else(|| SiftError::validation("no session loaded"))?;

        // Optimistic local apply; validates the permutation and leaves the
        // store untouched when it is rejected.
        self.state.apply_order(&new_order).await?;
        tracing::debug!("[ReconciliationEngine] reordering {} units", new_order.len());

        match self.service.reorder_paragraphs(&session_id, &new_order).await {
            Ok(session) => {
                self.state.replace_session(session).await;
                self.state.clear_last_error().await;
                Ok(())
            }
            Err(original) => {
                tracing::warn!(
                    "[ReconciliationEngine] reorder failed, fetching authoritative snapshot: {original}"
                );
                match self.service.fetch_analysis(&session_id).await {
                    Ok(session) => {
                        self.state.replace_session(session).await;
                        self.state.set_last_error(original.to_string()).await;
                        Err(original)
                    }
                    Err(fetch) => {
                        let err =
                            SiftError::recovery(original.to_string(), fetch.to_string());
                        tracing::warn!(
                            "[ReconciliationEngine] recovery fetch failed, local order is unreconciled: {fetch}"
                        );
                        self.state.set_last_error(err.to_string()).await;
                        Err(err)
                    }
                }
            }
        }
    }

    /// Merges two adjacent units; `first_id` must immediately precede
    /// `second_id` in the current order.
    ///
    /// Not optimistic: local state is only touched once the server confirms.
    /// The server computes the merged unit's text and metrics.
    ///
    /// # Errors
    ///
    /// Returns a validation error when the save gate is busy or the units
    /// are not adjacent in that order; otherwise the remote failure.
    pub async fn merge(&self, first_id: u64, second_id: u64) -> Result<()> {
        let _guard = self.state.try_begin_save()?;
        let session_id = self
            .state
            .session_id()
            .await
            .ok_or_else(|| SiftError::validation("no session loaded"))?;

        let ids = self.state.unit_ids().await;
        let adjacent = ids
            .windows(2)
            .any(|pair| pair[0] == first_id && pair[1] == second_id);
        if !adjacent {
            return Err(SiftError::validation(format!(
                "unit {first_id} does not immediately precede unit {second_id}"
            )));
        }

        tracing::debug!("[ReconciliationEngine] merging units {first_id} and {second_id}");
        match self
            .service
            .merge_paragraphs(&session_id, first_id, second_id)
            .await
        {
            Ok(session) => {
                self.state.replace_session(session).await;
                self.state.clear_last_error().await;
                Ok(())
            }
            Err(err) => {
                tracing::warn!("[ReconciliationEngine] merge failed: {err}");
                self.state.set_last_error(err.to_string()).await;
                Err(err)
            }
        }
    }

    /// Deletes one unit.
    ///
    /// Not optimistic: local state is only touched once the server confirms.
    ///
    /// # Errors
    ///
    /// Returns a validation error when the save gate is busy or no session
    /// is loaded; otherwise the remote failure.
    pub async fn delete(&self, unit_id: u64) -> Result<()> {
        let _guard = self.state.try_begin_save()?;
        let session_id = self
            .state
            .session_id()
            .await
            .ok_or_else(|| SiftError::validation("no session loaded"))?;

        tracing::debug!("[ReconciliationEngine] deleting unit {unit_id}");
        match self.service.delete_paragraph(&session_id, unit_id).await {
            Ok(session) => {
                self.state.replace_session(session).await;
                self.state.clear_last_error().await;
                Ok(())
            }
            Err(err) => {
                tracing::warn!("[ReconciliationEngine] delete failed: {err}");
                self.state.set_last_error(err.to_string()).await;
                Err(err)
            }
        }
    }
}
