//! Analysis session domain models.
//!
//! This module contains the core entities returned by the remote analysis
//! service: a session holding the ordered paragraph units of one document,
//! each unit carrying the server-computed metrics for its text.

use crate::boundary::PARAGRAPH_SEPARATOR;
use serde::{Deserialize, Serialize};

/// Server-computed metrics for a single unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct UnitMetrics {
    /// How strongly the unit's text carries the session's topic
    pub signal_strength: f32,
    /// Structural/linguistic complexity of the unit's text
    pub complexity: f32,
    /// Semantic role label assigned by the service, if any
    #[serde(default)]
    pub semantic_function: Option<String>,
    /// Scoring error reported by the service for this unit, if any
    #[serde(default)]
    pub semantic_error: Option<String>,
}

/// One server-identified, independently scored span of document text.
///
/// `id` is server-assigned and unique within a session. Local code never
/// invents ids for units it intends to persist; provisional span ids from
/// boundary derivation are a separate, short-lived concept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    pub id: u64,
    pub text: String,
    pub metrics: UnitMetrics,
}

/// The full server-held analysis state for one document.
///
/// The order of `units` is the canonical document order: joining the unit
/// texts with the paragraph separator reproduces the document text the server
/// last confirmed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    pub topic: String,
    pub units: Vec<Unit>,
}

impl Session {
    /// Returns the unit with the given id, if present.
    pub fn unit(&self, unit_id: u64) -> Option<&Unit> {
        self.units.iter().find(|u| u.id == unit_id)
    }

    /// Returns whether a unit with the given id exists.
    pub fn contains_unit(&self, unit_id: u64) -> bool {
        self.unit(unit_id).is_some()
    }

    /// Returns the unit ids in canonical order.
    pub fn unit_ids(&self) -> Vec<u64> {
        self.units.iter().map(|u| u.id).collect()
    }

    /// Concatenates all unit texts in canonical order.
    pub fn joined_text(&self) -> String {
        self.units
            .iter()
            .map(|u| u.text.as_str())
            .collect::<Vec<_>>()
            .join(PARAGRAPH_SEPARATOR)
    }
}

/// Partial metric update from the lightweight re-score endpoint.
///
/// `None` fields leave the stored value untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct MetricsPatch {
    #[serde(default)]
    pub signal_strength: Option<f32>,
    #[serde(default)]
    pub complexity: Option<f32>,
    #[serde(default)]
    pub semantic_function: Option<String>,
    #[serde(default)]
    pub semantic_error: Option<String>,
}

impl MetricsPatch {
    /// Applies the present fields to `metrics`, leaving the rest untouched.
    pub fn apply_to(&self, metrics: &mut UnitMetrics) {
        if let Some(signal_strength) = self.signal_strength {
            metrics.signal_strength = signal_strength;
        }
        if let Some(complexity) = self.complexity {
            metrics.complexity = complexity;
        }
        if let Some(semantic_function) = &self.semantic_function {
            metrics.semantic_function = Some(semantic_function.clone());
        }
        if let Some(semantic_error) = &self.semantic_error {
            metrics.semantic_error = Some(semantic_error.clone());
        }
    }
}
