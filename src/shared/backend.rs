//! Key/value backend seen by every window

use std::sync::Arc;

use super::error::StoreError;

/// Callback fired when another context changes a watched key
pub type ChangeListener = Arc<dyn Fn() + Send + Sync>;

/// Synchronous, whole-value key/value store shared by all windows
///
/// Every call returns immediately. Change notifications are best-effort: writes
/// made through the same handle are not reported, and rapid successive writes
/// may be coalesced or missed, so callers must still poll.
pub trait StorageBackend: Send + Sync {
    /// Read the value under `key`
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Overwrite the value under `key`
    ///
    /// Readers observe either the old or the new value, never a mix.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Delete `key`; deleting an absent key succeeds
    fn remove(&self, key: &str) -> Result<(), StoreError>;

    /// Watch `key` for changes made by other contexts
    fn subscribe(&self, key: &str, listener: ChangeListener) -> Result<Subscription, StoreError>;
}

/// Handle to an active change subscription
///
/// Dropping the handle cancels the subscription.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    /// Create a subscription that runs `cancel` when dropped
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Subscription with nothing to cancel
    pub fn noop() -> Self {
        Self { cancel: None }
    }

    /// Cancel now
    pub fn unsubscribe(mut self) {
        self.run_cancel();
    }

    fn run_cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.run_cancel();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn test_cancel_runs_once() {
        let cancelled = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&cancelled);

        let sub = Subscription::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        sub.unsubscribe();

        assert_eq!(cancelled.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_drop_cancels() {
        let cancelled = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&cancelled);

        {
            let _sub = Subscription::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }

        assert_eq!(cancelled.load(Ordering::SeqCst), 1);
        drop(Subscription::noop());
    }
}
