//! Error types for store operations.

use thiserror::Error;

/// Reasons a state update or store construction can be refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("expected a key/value object, got {kind}")]
    NotAnObject { kind: &'static str },

    #[error("re-entrant update dropped: cascade exceeded {limit} notification cycles")]
    CascadeLimit { limit: usize },

    #[error("re-entrant update rejected: dispatch depth exceeded {limit}")]
    DepthLimit { limit: usize },

    #[error("invalid store configuration: {0}")]
    InvalidConfig(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::InvalidConfig(e.to_string())
    }
}

/// Result alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
