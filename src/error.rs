//! Crate-level error type

use thiserror::Error;

use crate::registry::RegistryError;
use crate::shared::StoreError;

/// Result alias for fallible crate operations
pub type Result<T> = std::result::Result<T, Error>;

/// Any error surfaced by this crate
#[derive(Debug, Error)]
pub enum Error {
    /// Registry lifecycle or configuration error
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Shared store error
    #[error(transparent)]
    Store(#[from] StoreError),
}
