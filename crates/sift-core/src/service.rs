//! Analysis service interface.
//!
//! Defines the contract with the remote analysis service, decoupling the
//! engine from the transport. All operations are request/response (no
//! streaming); every response carries a full authoritative session snapshot
//! except the lightweight metrics re-score.

use crate::analysis::{MetricsPatch, Session};
use crate::error::Result;
use async_trait::async_trait;

/// An abstract client for the remote analysis service.
///
/// Implementations are expected to be cheap to share (`Arc<dyn
/// AnalysisService>`) and must not retry on their own; retry and recovery
/// policy belongs to the engine.
#[async_trait]
pub trait AnalysisService: Send + Sync {
    /// Runs full segmentation and scoring of `text` against `topic` from
    /// scratch.
    ///
    /// Also used to commit a whole-text edit: the buffer is reanalyzed
    /// against the session's existing topic and the result replaces the
    /// session.
    async fn initialize_analysis(&self, text: &str, topic: &str) -> Result<Session>;

    /// Fetches the authoritative session snapshot.
    ///
    /// Used to recover after a failed optimistic operation.
    async fn fetch_analysis(&self, session_id: &str) -> Result<Session>;

    /// Commits one unit's edited text.
    ///
    /// The server decides whether the committed text stays one unit, splits
    /// into several (when it still contains a paragraph separator), or
    /// removes the unit (when it is empty after trimming).
    async fn update_text_and_restructure_paragraph(
        &self,
        session_id: &str,
        unit_id: u64,
        text: &str,
    ) -> Result<Session>;

    /// Merges two adjacent units; `first_id` immediately precedes
    /// `second_id` in canonical order.
    async fn merge_paragraphs(
        &self,
        session_id: &str,
        first_id: u64,
        second_id: u64,
    ) -> Result<Session>;

    /// Reorders the units to the given full id list.
    async fn reorder_paragraphs(
        &self,
        session_id: &str,
        ordered_unit_ids: &[u64],
    ) -> Result<Session>;

    /// Deletes one unit.
    async fn delete_paragraph(&self, session_id: &str, unit_id: u64) -> Result<Session>;

    /// Lightweight, structure-preserving re-score of a single unit's text.
    ///
    /// Used by the debounced background refresh; never changes segmentation.
    async fn calculate_paragraph_metrics(
        &self,
        session_id: &str,
        unit_id: u64,
        text: &str,
    ) -> Result<MetricsPatch>;
}
