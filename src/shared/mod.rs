//! Shared storage visible to every window
//!
//! [`StorageBackend`] is the platform service: a synchronous key/value store with
//! best-effort change events. [`RegistryStore`] layers the roster's JSON encoding
//! on top of it and is the only thing the registry talks to.

pub mod backend;
pub mod error;
pub mod file;
pub mod memory;
pub mod roster_store;

pub use backend::{ChangeListener, StorageBackend, Subscription};
pub use error::StoreError;
pub use file::FileBackend;
pub use memory::MemoryBackend;
pub use roster_store::RegistryStore;
