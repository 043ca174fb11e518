use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type shared by the travel-buddy crates.
///
/// Subsystem crates either return this directly (storage, model backends)
/// or wrap it in their own error type with a `From` conversion so `?`
/// works across crate boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BuddyError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Memory store at {path} is corrupt: {reason}")]
    CorruptStore { path: PathBuf, reason: String },

    #[error("Model backend error: {0}")]
    Backend(String),

    #[error("Model backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl BuddyError {
    /// Whether the error originated in the model backend.
    pub fn is_backend(&self) -> bool {
        matches!(
            self,
            BuddyError::Backend(_) | BuddyError::BackendUnavailable(_)
        )
    }
}

impl From<toml::de::Error> for BuddyError {
    fn from(err: toml::de::Error) -> Self {
        BuddyError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for BuddyError {
    fn from(err: toml::ser::Error) -> Self {
        BuddyError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for BuddyError {
    fn from(err: serde_json::Error) -> Self {
        BuddyError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for travel-buddy operations.
pub type Result<T> = std::result::Result<T, BuddyError>;
