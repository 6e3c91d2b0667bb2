//! Window registry implementation
//!
//! The per-window state machine that joins the shared roster, keeps its own
//! record fresh, prunes records of vanished windows and notifies the host.

use std::collections::BTreeSet;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::time::MissedTickBehavior;
use uuid::Uuid;

use crate::clock::{Clock, SystemClock};
use crate::shared::{RegistryStore, StorageBackend, Subscription};
use crate::stats::{RegistryCounters, RegistryStats};

use super::config::RegistryConfig;
use super::entry::{WindowId, WindowRecord, WindowShape};
use super::error::RegistryError;
use super::roster::Roster;
use super::shape::ShapeProvider;

/// Host callback, invoked synchronously from a tick
pub type Callback = Arc<dyn Fn() + Send + Sync>;

/// Lifecycle of the local window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryPhase {
    /// `init` not called yet, no store interaction
    Uninitialized,
    /// Joining the roster (only observable from inside `init`)
    Joining,
    /// In the roster, ticking
    Active,
    /// Left the roster
    Closed,
}

/// What a single tick observed and did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickOutcome {
    /// Set of ids differs from the previous tick
    pub roster_changed: bool,
    /// Local shape differs from the previous tick
    pub shape_changed: bool,
    /// Roster was written back to the store
    pub wrote: bool,
    /// Stale ids removed by this tick
    pub pruned: Vec<WindowId>,
    /// This window had to put its record back (lost an id race or was pruned)
    pub rejoined: bool,
}

struct RegistryState {
    phase: RegistryPhase,
    /// Own id once joined
    id: Option<WindowId>,
    metadata: serde_json::Value,
    /// Roster as of the last tick
    roster: Roster,
    members: BTreeSet<WindowId>,
    last_shape: Option<WindowShape>,
    /// Store unreachable, rendering alone
    degraded: bool,
    on_shape_change: Option<Callback>,
    on_roster_change: Option<Callback>,
    subscription: Option<Subscription>,
    /// Polling task started by `spawn_tick_task`
    ticker: Option<tokio::task::AbortHandle>,
}

/// Registry for the local window's place in the shared roster
///
/// All operations are synchronous and never block on other windows. Windows
/// coordinate only through whole-roster reads and writes, with last-write-wins
/// semantics; each window mutates only its own record, plus any record whose
/// heartbeat is older than the staleness threshold.
pub struct WindowRegistry {
    state: Mutex<RegistryState>,
    store: RegistryStore,
    shape: Box<dyn ShapeProvider>,
    clock: Arc<dyn Clock>,
    config: RegistryConfig,
    /// Distinguishes our record from another window's record with the same id
    instance: Uuid,
    counters: RegistryCounters,
    wake: Arc<Notify>,
}

impl WindowRegistry {
    /// Create a registry with default configuration
    pub fn new(backend: Arc<dyn StorageBackend>, shape: impl ShapeProvider + 'static) -> Self {
        Self::with_config(backend, shape, RegistryConfig::default())
    }

    /// Create a registry with custom configuration
    pub fn with_config(
        backend: Arc<dyn StorageBackend>,
        shape: impl ShapeProvider + 'static,
        config: RegistryConfig,
    ) -> Self {
        Self::with_clock(backend, shape, config, Arc::new(SystemClock))
    }

    /// Create a registry with a custom time source
    pub fn with_clock(
        backend: Arc<dyn StorageBackend>,
        shape: impl ShapeProvider + 'static,
        config: RegistryConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let store = RegistryStore::new(backend, config.storage_key.clone());

        Self {
            state: Mutex::new(RegistryState {
                phase: RegistryPhase::Uninitialized,
                id: None,
                metadata: serde_json::Value::Null,
                roster: Roster::new(),
                members: BTreeSet::new(),
                last_shape: None,
                degraded: false,
                on_shape_change: None,
                on_roster_change: None,
                subscription: None,
                ticker: None,
            }),
            store,
            shape: Box::new(shape),
            clock,
            config,
            instance: Uuid::new_v4(),
            counters: RegistryCounters::new(),
            wake: Arc::new(Notify::new()),
        }
    }

    /// Get the registry configuration
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Token identifying this registry instance in stored records
    pub fn instance(&self) -> Uuid {
        self.instance
    }

    /// Current lifecycle phase
    pub fn phase(&self) -> RegistryPhase {
        self.state.lock().phase
    }

    /// Own roster id, once joined
    pub fn local_id(&self) -> Option<WindowId> {
        self.state.lock().id
    }

    /// Whether the store was unreachable on the last read
    pub fn is_degraded(&self) -> bool {
        self.state.lock().degraded
    }

    /// Activity counters
    pub fn stats(&self) -> RegistryStats {
        self.counters.snapshot()
    }

    /// Snapshot of the roster in store order
    pub fn get_windows(&self) -> Vec<WindowRecord> {
        self.state.lock().roster.records().to_vec()
    }

    /// Register the handler for local shape changes, replacing any previous one
    pub fn set_win_shape_change_callback(&self, callback: impl Fn() + Send + Sync + 'static) {
        self.state.lock().on_shape_change = Some(Arc::new(callback));
    }

    /// Register the handler for roster membership changes, replacing any previous one
    pub fn set_win_change_callback(&self, callback: impl Fn() + Send + Sync + 'static) {
        self.state.lock().on_roster_change = Some(Arc::new(callback));
    }

    /// Join the shared roster
    ///
    /// Takes an id one past the highest id in the roster (0 when empty) and
    /// writes the local record. Calling again after a successful join returns
    /// the existing id. Store failures do not fail the join: the window then
    /// renders alone until the store comes back.
    pub fn init(&self, metadata: serde_json::Value) -> Result<WindowId, RegistryError> {
        self.config.validate()?;

        let mut state = self.state.lock();
        match (state.phase, state.id) {
            (RegistryPhase::Active, Some(id)) => {
                tracing::debug!(window_id = %id, "Registry already initialized");
                return Ok(id);
            }
            (RegistryPhase::Closed, _) => return Err(RegistryError::Closed),
            _ => {}
        }

        state.phase = RegistryPhase::Joining;

        let now = self.clock.now_millis();
        let shape = self.shape.shape();
        let mut roster = self.load_roster(&mut state).unwrap_or_default();

        let id = roster.next_id();
        roster.push(WindowRecord::new(
            id,
            self.instance,
            shape,
            metadata.clone(),
            now,
        ));
        self.persist(&state, &roster);

        tracing::info!(
            window_id = %id,
            roster_len = roster.len(),
            degraded = state.degraded,
            "Window joined"
        );

        state.id = Some(id);
        state.metadata = metadata;
        state.members = roster.membership();
        state.roster = roster;
        state.last_shape = Some(shape);
        state.phase = RegistryPhase::Active;

        Ok(id)
    }

    /// Run one polling step
    ///
    /// Re-reads the roster, publishes shape changes and heartbeats, prunes stale
    /// records, writes back only when something changed and fires the host
    /// callbacks. Does nothing unless the registry is active.
    pub fn tick(&self) -> TickOutcome {
        let mut outcome = TickOutcome::default();

        let mut state = self.state.lock();
        let mut id = match (state.phase, state.id) {
            (RegistryPhase::Active, Some(id)) => id,
            _ => return outcome,
        };
        RegistryCounters::bump(&self.counters.ticks);

        let now = self.clock.now_millis();
        let shape = self.shape.shape();
        let loaded = self.load_roster(&mut state);
        let degraded = loaded.is_none();
        let mut roster = loaded.unwrap_or_default();

        // Leftovers of ours under an id we already gave up
        let mut dirty = roster.remove_where(|r| r.instance == self.instance && r.id != id) > 0;

        let contested = roster
            .iter()
            .any(|r| r.id == id && r.instance != self.instance);
        let mut owned = roster.position(|r| r.is_owned_by(id, self.instance));

        // Two records under one id: the greater instance token gives way
        if contested
            && owned.is_some()
            && roster
                .iter()
                .any(|r| r.id == id && r.instance < self.instance)
        {
            roster.remove_where(|r| r.is_owned_by(id, self.instance));
            owned = None;
        }

        let index = match owned {
            Some(index) => index,
            None => {
                if contested {
                    let taken = id;
                    id = roster.next_id();
                    tracing::info!(
                        taken_id = %taken,
                        window_id = %id,
                        "Window id held by another window, rejoining"
                    );
                } else if !degraded {
                    tracing::info!(window_id = %id, "Own record missing from roster, re-adding");
                }
                if !degraded {
                    RegistryCounters::bump(&self.counters.rejoins);
                    outcome.rejoined = true;
                }

                roster.push(WindowRecord::new(
                    id,
                    self.instance,
                    shape,
                    state.metadata.clone(),
                    now,
                ));
                dirty = true;
                roster.len() - 1
            }
        };

        if let Some(record) = roster.get_mut(index) {
            if record.shape != shape {
                record.shape = shape;
                dirty = true;
            } else if record.age(now) >= self.config.heartbeat_millis() {
                dirty = true;
            }
            record.last_seen = now;
        }

        let pruned = roster.prune_stale(now, self.config.staleness_millis());
        if !pruned.is_empty() {
            RegistryCounters::add(&self.counters.pruned, pruned.len() as u64);
            tracing::info!(window_id = %id, pruned = ?pruned, "Pruned stale windows");
            dirty = true;
        }

        if dirty {
            outcome.wrote = self.persist(&state, &roster);
        }

        let members = roster.membership();
        outcome.roster_changed = members != state.members;
        outcome.shape_changed = state.last_shape != Some(shape);
        outcome.pruned = pruned;

        state.id = Some(id);
        state.members = members;
        state.last_shape = Some(shape);
        state.roster = roster;

        let on_roster_change = if outcome.roster_changed {
            state.on_roster_change.clone()
        } else {
            None
        };
        let on_shape_change = if outcome.shape_changed {
            state.on_shape_change.clone()
        } else {
            None
        };
        drop(state);

        if let Some(callback) = on_roster_change {
            RegistryCounters::bump(&self.counters.roster_callbacks);
            tracing::debug!(window_id = %id, "Roster changed");
            callback();
        }
        if let Some(callback) = on_shape_change {
            RegistryCounters::bump(&self.counters.shape_callbacks);
            tracing::debug!(window_id = %id, ?shape, "Window shape changed");
            callback();
        }

        outcome
    }

    /// Manual tick, e.g. once per rendered frame
    pub fn update(&self) {
        self.tick();
    }

    /// Leave the roster
    ///
    /// Removes the local record so peers need not wait for it to go stale.
    /// Best-effort: a failing store is logged and the registry closes anyway.
    pub fn close(&self) {
        let mut state = self.state.lock();
        let was_active = state.phase == RegistryPhase::Active;
        state.phase = RegistryPhase::Closed;
        state.subscription = None;

        if was_active {
            match self.store.try_read() {
                Ok(mut roster) => {
                    if roster.remove_where(|r| r.instance == self.instance) > 0 {
                        self.persist(&state, &roster);
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Could not remove own record on close");
                }
            }

            tracing::info!(window_id = ?state.id, "Window closed");
        }

        state.roster = Roster::new();
        state.members.clear();
        drop(state);

        self.wake.notify_one();
    }

    /// Spawn the background polling task
    ///
    /// Ticks every `tick_interval`, and early whenever another window rewrites
    /// the roster. The task ends after [`close`](Self::close). Calling this
    /// again aborts the previous task, so a window never runs two loops.
    pub fn spawn_tick_task(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let registry = Arc::clone(self);
        let interval = registry.config.tick_interval;

        let wake = Arc::clone(&self.wake);
        let subscription = self.store.subscribe(move || wake.notify_one());

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = registry.wake.notified() => {}
                }

                if registry.phase() == RegistryPhase::Closed {
                    break;
                }
                registry.tick();
            }

            tracing::debug!(window_id = ?registry.local_id(), "Tick task stopped");
        });

        let mut state = self.state.lock();
        if let Some(previous) = state.ticker.replace(handle.abort_handle()) {
            tracing::debug!(window_id = ?state.id, "Replacing running tick task");
            previous.abort();
        }
        state.subscription = Some(subscription);

        handle
    }

    /// Read the roster, or `None` when the store is unreachable
    fn load_roster(&self, state: &mut RegistryState) -> Option<Roster> {
        match self.store.try_read() {
            Ok(roster) => {
                if state.degraded {
                    state.degraded = false;
                    tracing::info!(window_id = ?state.id, "Shared store reachable again");
                }
                Some(roster)
            }
            Err(e) if e.is_corrupt() => {
                RegistryCounters::bump(&self.counters.corrupt_reads);
                tracing::warn!(error = %e, "Stored roster is corrupt, starting over");
                Some(Roster::new())
            }
            Err(e) => {
                RegistryCounters::bump(&self.counters.read_failures);
                if !state.degraded {
                    state.degraded = true;
                    tracing::warn!(
                        window_id = ?state.id,
                        error = %e,
                        "Shared store unavailable, rendering alone"
                    );
                }
                None
            }
        }
    }

    /// Write the roster, reporting whether it landed
    fn persist(&self, state: &RegistryState, roster: &Roster) -> bool {
        match self.store.write(roster) {
            Ok(()) => {
                RegistryCounters::bump(&self.counters.writes);
                tracing::debug!(roster_len = roster.len(), "Roster written");
                true
            }
            Err(e) => {
                RegistryCounters::bump(&self.counters.write_failures);
                if !state.degraded {
                    tracing::warn!(error = %e, "Roster write failed");
                }
                false
            }
        }
    }
}

impl std::fmt::Debug for WindowRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("WindowRegistry")
            .field("id", &state.id)
            .field("phase", &state.phase)
            .field("instance", &self.instance)
            .field("roster_len", &state.roster.len())
            .finish_non_exhaustive()
    }
}
