//! Registry error types
//!
//! Store failures are not here: the registry absorbs them and degrades to a
//! single-window roster instead of reporting them to the host.

use thiserror::Error;

/// Error type for registry operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The registry was closed and cannot rejoin
    #[error("Registry is closed")]
    Closed,

    /// Configuration rejected by validation
    #[error("Invalid registry config: {0}")]
    InvalidConfig(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(RegistryError::Closed.to_string(), "Registry is closed");

        let err = RegistryError::InvalidConfig("tick interval is zero".into());
        assert!(err.to_string().contains("tick interval is zero"));
    }
}
