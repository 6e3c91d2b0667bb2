//! Shared store error types

use thiserror::Error;

/// Error type for shared store operations
#[derive(Debug, Error)]
pub enum StoreError {
    /// Store cannot be read or written (disabled storage, quota, I/O failure)
    #[error("Shared store unavailable: {0}")]
    Unavailable(#[from] std::io::Error),

    /// Stored value does not parse as a roster
    #[error("Stored roster is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    /// Stored bytes are not text at all
    #[error("Stored value is not valid UTF-8: {0}")]
    Undecodable(#[from] std::string::FromUtf8Error),
}

impl StoreError {
    /// Whether the store itself is unreachable, as opposed to holding bad data
    pub fn is_unavailable(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }

    /// Whether the store was reachable but held unusable data
    pub fn is_corrupt(&self) -> bool {
        matches!(self, StoreError::Corrupt(_) | StoreError::Undecodable(_))
    }
}
