//! Analysis domain module.
//!
//! Contains the domain models for a server-held analysis session, the
//! in-memory store that owns the client-side copy of it, and the state of an
//! in-progress local edit.
//!
//! # Module Structure
//!
//! - `model`: Core domain models (`Session`, `Unit`, `UnitMetrics`, `MetricsPatch`)
//! - `store`: The authoritative in-memory session store (`SessionStore`)
//! - `editing`: Edit-mode state types (`EditMode`, `EditingState`)

mod editing;
mod model;
mod store;

// Re-export public API
pub use editing::{EditMode, EditingState};
pub use model::{MetricsPatch, Session, Unit, UnitMetrics};
pub use store::SessionStore;
