//! Application layer for sift.
//!
//! This crate provides the use cases that coordinate the shared engine state
//! and the remote analysis service: the editing session manager (edit-mode
//! state machine, buffer, debounced background re-scoring) and the
//! reconciliation engine (structural operations with optimistic apply and
//! recovery).

pub mod editing;
pub mod reconcile;

#[cfg(test)]
mod test_support;

pub use editing::EditingSessionManager;
pub use reconcile::ReconciliationEngine;
