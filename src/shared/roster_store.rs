//! Roster serialization on top of a storage backend

use std::sync::Arc;

use crate::registry::Roster;

use super::backend::{StorageBackend, Subscription};
use super::error::StoreError;

/// The roster as one serialized value under one key
///
/// Best-effort infrastructure: [`read`](Self::read) never fails, it reports
/// absent, corrupt or unreachable data as an empty roster.
#[derive(Clone)]
pub struct RegistryStore {
    backend: Arc<dyn StorageBackend>,
    key: String,
}

impl RegistryStore {
    /// Wrap `backend`, storing the roster under `key`
    pub fn new(backend: Arc<dyn StorageBackend>, key: impl Into<String>) -> Self {
        Self {
            backend,
            key: key.into(),
        }
    }

    /// Key the roster lives under
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Read the roster, distinguishing an unreachable store from bad data
    pub fn try_read(&self) -> Result<Roster, StoreError> {
        match self.backend.get(&self.key)? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Roster::new()),
        }
    }

    /// Read the roster, treating any failure as empty
    pub fn read(&self) -> Roster {
        match self.try_read() {
            Ok(roster) => roster,
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "Roster read failed, using empty roster");
                Roster::new()
            }
        }
    }

    /// Overwrite the stored roster
    pub fn write(&self, roster: &Roster) -> Result<(), StoreError> {
        let raw = serde_json::to_string(roster)?;
        self.backend.set(&self.key, &raw)
    }

    /// Delete the stored roster
    pub fn clear(&self) -> Result<(), StoreError> {
        self.backend.remove(&self.key)
    }

    /// Get notified when another context rewrites the roster
    ///
    /// Returns an inert subscription if the backend cannot watch.
    pub fn subscribe(&self, on_change: impl Fn() + Send + Sync + 'static) -> Subscription {
        match self.backend.subscribe(&self.key, Arc::new(on_change)) {
            Ok(sub) => sub,
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "Roster change subscription failed");
                Subscription::noop()
            }
        }
    }
}

impl std::fmt::Debug for RegistryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryStore")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use uuid::Uuid;

    use super::*;
    use crate::registry::{WindowId, WindowRecord, WindowShape};
    use crate::shared::MemoryBackend;

    fn sample_roster() -> Roster {
        Roster::from(vec![
            WindowRecord::new(
                WindowId(0),
                Uuid::new_v4(),
                WindowShape::new(10.0, 20.0, 300.5, 200.25),
                serde_json::json!({ "foo": "bar" }),
                1_000,
            ),
            WindowRecord::new(
                WindowId(1),
                Uuid::new_v4(),
                WindowShape::new(-400.0, 0.0, 640.0, 480.0),
                serde_json::json!([1, 2, 3]),
                1_050,
            ),
        ])
    }

    #[test]
    fn test_write_then_read() {
        let store = RegistryStore::new(Arc::new(MemoryBackend::new()), "windows");
        let roster = sample_roster();

        store.write(&roster).unwrap();
        assert_eq!(store.read(), roster);
    }

    #[test]
    fn test_absent_is_empty() {
        let store = RegistryStore::new(Arc::new(MemoryBackend::new()), "windows");
        assert!(store.try_read().unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_is_empty() {
        let backend = MemoryBackend::new();
        backend.set("windows", "{definitely not a roster").unwrap();
        let store = RegistryStore::new(Arc::new(backend), "windows");

        assert!(matches!(store.try_read(), Err(StoreError::Corrupt(_))));
        assert!(store.read().is_empty());
    }

    #[test]
    fn test_unavailable_is_empty() {
        let backend = MemoryBackend::new();
        let store = RegistryStore::new(Arc::new(backend.clone()), "windows");
        store.write(&sample_roster()).unwrap();

        backend.set_available(false);
        assert!(store.try_read().unwrap_err().is_unavailable());
        assert!(store.read().is_empty());
        assert!(store.write(&sample_roster()).is_err());
    }

    #[test]
    fn test_clear() {
        let store = RegistryStore::new(Arc::new(MemoryBackend::new()), "windows");
        store.write(&sample_roster()).unwrap();

        store.clear().unwrap();
        assert!(store.read().is_empty());
    }

    #[test]
    fn test_subscribe_sees_other_context() {
        let backend = MemoryBackend::new();
        let mine = RegistryStore::new(Arc::new(backend.clone()), "windows");
        let theirs = RegistryStore::new(Arc::new(backend.context()), "windows");

        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let _sub = mine.subscribe(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        mine.write(&sample_roster()).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        theirs.write(&Roster::new()).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
