//! Error types for the sift engine.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for the whole engine.
///
/// This provides typed, structured error variants matching the failure modes
/// the engine can surface to its consumers: local misuse, transport failure,
/// a server-side rejection, and a failed recovery after a failed optimistic
/// operation.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum SiftError {
    /// Local misuse of the engine API. No remote call was made.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Transport-level failure reaching the analysis service.
    #[error("Network failure: {message}")]
    Network { message: String },

    /// The analysis service rejected the request (4xx/5xx with a message).
    #[error("Server rejected the request: {message}")]
    Server {
        status: Option<u16>,
        message: String,
    },

    /// The recovery fetch after a failed optimistic operation also failed.
    /// Local state is known-divergent until a later operation succeeds.
    #[error("Recovery failed: {original}; recovery fetch: {fetch}")]
    Recovery { original: String, fetch: String },

    /// Configuration error (file access or parse failure).
    #[error("Configuration error: {0}")]
    Config(String),
}

impl SiftError {
    /// Creates a Validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Creates a Network error
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Creates a Server error
    pub fn server(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Server {
            status,
            message: message.into(),
        }
    }

    /// Creates a Recovery error
    pub fn recovery(original: impl Into<String>, fetch: impl Into<String>) -> Self {
        Self::Recovery {
            original: original.into(),
            fetch: fetch.into(),
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Check if this is a Validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this is a Network error
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network { .. })
    }

    /// Check if this is a Server error
    pub fn is_server(&self) -> bool {
        matches!(self, Self::Server { .. })
    }

    /// Check if this is a Recovery error
    pub fn is_recovery(&self) -> bool {
        matches!(self, Self::Recovery { .. })
    }

    /// Check if this error involved a remote call.
    ///
    /// Validation and configuration errors are purely local; everything else
    /// crossed the service boundary and is recorded as the last error.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            Self::Network { .. } | Self::Server { .. } | Self::Recovery { .. }
        )
    }
}

impl From<toml::de::Error> for SiftError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}

/// A type alias for `Result<T, SiftError>`.
pub type Result<T> = std::result::Result<T, SiftError>;
