//! Error types for routing and conversation handling.

use travel_buddy_core::error::BuddyError;
use travel_buddy_core::types::TaskType;

/// Errors from the chat engine.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("query cannot be empty")]
    EmptyQuery,
    #[error("backend error: {0}")]
    Backend(String),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("invalid classification rule: {0}")]
    InvalidRule(String),
    #[error("handler already registered for task type: {0}")]
    DuplicateHandler(TaskType),
    #[error("handler for task type {0} cannot be removed")]
    ProtectedHandler(TaskType),
}

impl ChatError {
    /// The model backend failed; the current query is lost but the
    /// session remains usable.
    pub fn is_backend(&self) -> bool {
        matches!(self, ChatError::Backend(_))
    }

    /// The session store failed; further queries are unlikely to persist.
    pub fn is_storage(&self) -> bool {
        matches!(self, ChatError::Storage(_))
    }
}

/// Plain `Backend` and `Storage` messages are unwrapped so the variant
/// prefix is not repeated; other kinds keep their own description.
impl From<BuddyError> for ChatError {
    fn from(err: BuddyError) -> Self {
        match err {
            BuddyError::Backend(msg) => ChatError::Backend(msg),
            BuddyError::Storage(msg) => ChatError::Storage(msg),
            other if other.is_backend() => ChatError::Backend(other.to_string()),
            other => ChatError::Storage(other.to_string()),
        }
    }
}

impl From<regex::Error> for ChatError {
    fn from(err: regex::Error) -> Self {
        ChatError::InvalidRule(err.to_string())
    }
}
