//! Shared window roster
//!
//! The registry keeps the local window's record in a roster that every window
//! reads and rewrites as a whole. There is no lock and no compare-and-swap: each
//! window only touches its own record, plus records whose heartbeat has gone
//! stale, and the last write wins.
//!
//! # Tick
//!
//! ```text
//!            ┌──────────────── every tick_interval ─────────────────┐
//!            ▼                                                      │
//!   read roster ──▶ find own (id, instance) ──▶ shape / heartbeat ──▶ prune stale
//!                        │ missing or id taken                           │
//!                        ▼                                               ▼
//!                   re-add (same id if free,              write if changed ──▶ callbacks
//!                   else max id + 1)
//! ```
//!
//! # Convergence
//!
//! Two windows joining at the same moment can both read the same roster and pick
//! the same id; one write overwrites the other. The loser notices on its next
//! tick that its `(id, instance)` pair is gone while the id is held by someone
//! else, and rejoins under a fresh id. Ids are therefore unique eventually, not
//! immediately.

pub mod config;
pub mod entry;
pub mod error;
pub mod roster;
pub mod shape;
pub mod store;

pub use config::RegistryConfig;
pub use entry::{WindowId, WindowRecord, WindowShape};
pub use error::RegistryError;
pub use roster::Roster;
pub use shape::{ShapeProvider, SharedShape};
pub use store::{Callback, RegistryPhase, TickOutcome, WindowRegistry};
