//! Counters for registry activity

use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of registry activity since creation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryStats {
    /// Ticks run while active
    pub ticks: u64,
    /// Successful roster writes
    pub writes: u64,
    /// Roster writes the store rejected
    pub write_failures: u64,
    /// Reads that found the store unreachable
    pub read_failures: u64,
    /// Reads that found unparseable data
    pub corrupt_reads: u64,
    /// Stale records this window removed
    pub pruned: u64,
    /// Times this window had to put itself back into the roster
    pub rejoins: u64,
    /// Roster-changed callbacks fired
    pub roster_callbacks: u64,
    /// Shape-changed callbacks fired
    pub shape_callbacks: u64,
}

/// Live counters behind [`RegistryStats`]
#[derive(Debug, Default)]
pub struct RegistryCounters {
    pub(crate) ticks: AtomicU64,
    pub(crate) writes: AtomicU64,
    pub(crate) write_failures: AtomicU64,
    pub(crate) read_failures: AtomicU64,
    pub(crate) corrupt_reads: AtomicU64,
    pub(crate) pruned: AtomicU64,
    pub(crate) rejoins: AtomicU64,
    pub(crate) roster_callbacks: AtomicU64,
    pub(crate) shape_callbacks: AtomicU64,
}

impl RegistryCounters {
    /// Create zeroed counters
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn bump(counter: &AtomicU64) {
        Self::add(counter, 1);
    }

    pub(crate) fn add(counter: &AtomicU64, n: u64) {
        counter.fetch_add(n, Ordering::Relaxed);
    }

    /// Take a snapshot
    pub fn snapshot(&self) -> RegistryStats {
        RegistryStats {
            ticks: self.ticks.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            write_failures: self.write_failures.load(Ordering::Relaxed),
            read_failures: self.read_failures.load(Ordering::Relaxed),
            corrupt_reads: self.corrupt_reads.load(Ordering::Relaxed),
            pruned: self.pruned.load(Ordering::Relaxed),
            rejoins: self.rejoins.load(Ordering::Relaxed),
            roster_callbacks: self.roster_callbacks.load(Ordering::Relaxed),
            shape_callbacks: self.shape_callbacks.load(Ordering::Relaxed),
        }
    }
}
