pub mod analysis;
pub mod app_state;
pub mod boundary;
pub mod config;
pub mod error;
pub mod service;

// Re-export the shared state and error types
pub use app_state::{AppState, SaveGuard};
pub use error::{Result, SiftError};
