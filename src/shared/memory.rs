//! In-process shared store
//!
//! A [`MemoryBackend`] hub stands in for an origin-scoped browser store. Each
//! handle returned by [`MemoryBackend::context`] plays one window: writes through
//! a handle notify listeners registered by every *other* handle, and never the
//! writer itself.

use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use super::backend::{ChangeListener, StorageBackend, Subscription};
use super::error::StoreError;

struct Listener {
    token: u64,
    context: u64,
    key: String,
    callback: ChangeListener,
}

#[derive(Default)]
struct Hub {
    values: Mutex<HashMap<String, String>>,
    listeners: Mutex<Vec<Listener>>,
    unavailable: AtomicBool,
    next_context: AtomicU64,
    next_token: AtomicU64,
}

impl Hub {
    fn notify(&self, writer: u64, key: &str) {
        let callbacks: Vec<ChangeListener> = self
            .listeners
            .lock()
            .iter()
            .filter(|l| l.context != writer && l.key == key)
            .map(|l| Arc::clone(&l.callback))
            .collect();

        for callback in callbacks {
            callback();
        }
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(io::Error::other("storage disabled").into());
        }
        Ok(())
    }
}

/// Handle to an in-process shared store
#[derive(Clone)]
pub struct MemoryBackend {
    hub: Arc<Hub>,
    context: u64,
}

impl MemoryBackend {
    /// Create a fresh, empty store and its first context
    pub fn new() -> Self {
        let hub = Arc::new(Hub::default());
        let context = hub.next_context.fetch_add(1, Ordering::Relaxed);
        Self { hub, context }
    }

    /// New handle on the same store, acting as a separate window
    pub fn context(&self) -> Self {
        Self {
            hub: Arc::clone(&self.hub),
            context: self.hub.next_context.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// Simulate the store being disabled (or back)
    ///
    /// Affects every context of this store.
    pub fn set_available(&self, available: bool) {
        self.hub.unavailable.store(!available, Ordering::SeqCst);
    }

    /// Number of live listeners across all contexts
    pub fn listener_count(&self) -> usize {
        self.hub.listeners.lock().len()
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageBackend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.hub.check_available()?;
        Ok(self.hub.values.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.hub.check_available()?;
        self.hub
            .values
            .lock()
            .insert(key.to_string(), value.to_string());
        self.hub.notify(self.context, key);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.hub.check_available()?;
        let existed = self.hub.values.lock().remove(key).is_some();
        if existed {
            self.hub.notify(self.context, key);
        }
        Ok(())
    }

    fn subscribe(&self, key: &str, listener: ChangeListener) -> Result<Subscription, StoreError> {
        let token = self.hub.next_token.fetch_add(1, Ordering::Relaxed);
        self.hub.listeners.lock().push(Listener {
            token,
            context: self.context,
            key: key.to_string(),
            callback: listener,
        });

        let hub: Weak<Hub> = Arc::downgrade(&self.hub);
        Ok(Subscription::new(move || {
            if let Some(hub) = hub.upgrade() {
                hub.listeners.lock().retain(|l| l.token != token);
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;

    fn counter() -> (Arc<AtomicUsize>, ChangeListener) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        (
            count,
            Arc::new(move || {
                c.fetch_add(1, Ordering::SeqCst);
            }),
        )
    }

    #[test]
    fn test_contexts_share_values() {
        let a = MemoryBackend::new();
        let b = a.context();

        a.set("windows", "[]").unwrap();
        assert_eq!(b.get("windows").unwrap().as_deref(), Some("[]"));
        assert_eq!(b.get("other").unwrap(), None);

        b.remove("windows").unwrap();
        assert_eq!(a.get("windows").unwrap(), None);
        // Absent key
        b.remove("windows").unwrap();
    }

    #[test]
    fn test_only_other_contexts_are_notified() {
        let a = MemoryBackend::new();
        let b = a.context();
        let (a_count, a_listener) = counter();
        let (b_count, b_listener) = counter();

        let _sa = a.subscribe("windows", a_listener).unwrap();
        let _sb = b.subscribe("windows", b_listener).unwrap();

        a.set("windows", "[1]").unwrap();
        assert_eq!(a_count.load(Ordering::SeqCst), 0);
        assert_eq!(b_count.load(Ordering::SeqCst), 1);

        b.set("windows", "[2]").unwrap();
        assert_eq!(a_count.load(Ordering::SeqCst), 1);

        // Different key
        b.set("count", "3").unwrap();
        assert_eq!(a_count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unsubscribe_on_drop() {
        let a = MemoryBackend::new();
        let b = a.context();
        let (count, listener) = counter();

        let sub = b.subscribe("windows", listener).unwrap();
        assert_eq!(a.listener_count(), 1);
        drop(sub);
        assert_eq!(a.listener_count(), 0);

        a.set("windows", "[]").unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_unavailable() {
        let a = MemoryBackend::new();
        let b = a.context();
        a.set("windows", "[]").unwrap();

        a.set_available(false);
        assert!(b.get("windows").unwrap_err().is_unavailable());
        assert!(b.set("windows", "[1]").is_err());

        a.set_available(true);
        assert_eq!(b.get("windows").unwrap().as_deref(), Some("[]"));
    }
}
