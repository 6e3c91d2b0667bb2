//! Window record types
//!
//! This module defines the per-window record stored in the shared roster.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of a window within the shared roster
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindowId(pub u64);

impl WindowId {
    /// First id handed out in an empty roster
    pub const FIRST: WindowId = WindowId(0);

    /// Id following this one
    pub fn next(self) -> WindowId {
        WindowId(self.0.saturating_add(1))
    }
}

impl std::fmt::Display for WindowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Position and size of a window in shared screen coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WindowShape {
    /// Left edge
    pub x: f64,
    /// Top edge
    pub y: f64,
    /// Width
    pub w: f64,
    /// Height
    pub h: f64,
}

impl WindowShape {
    /// Create a new shape
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    /// Center of the window in shared coordinates
    ///
    /// This is where a host places the window's mesh.
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.w * 0.5, self.y + self.h * 0.5)
    }

    /// Translation that maps shared coordinates into this window's viewport
    pub fn scene_offset(&self) -> (f64, f64) {
        (-self.x, -self.y)
    }
}

/// One participant in the shared roster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowRecord {
    /// Roster id
    pub id: WindowId,

    /// Last shape published by the owning window
    pub shape: WindowShape,

    /// Host-supplied payload, never interpreted by the registry
    #[serde(default)]
    pub metadata: serde_json::Value,

    /// Last heartbeat, milliseconds since the UNIX epoch
    pub last_seen: u64,

    /// Token of the registry instance that owns this record
    ///
    /// Two windows that raced for the same id can tell their records apart by it.
    #[serde(default = "Uuid::nil")]
    pub instance: Uuid,
}

impl WindowRecord {
    /// Create a record owned by `instance`
    pub fn new(
        id: WindowId,
        instance: Uuid,
        shape: WindowShape,
        metadata: serde_json::Value,
        now: u64,
    ) -> Self {
        Self {
            id,
            shape,
            metadata,
            last_seen: now,
            instance,
        }
    }

    /// Milliseconds since the last heartbeat
    ///
    /// Timestamps from the future (clock skew between windows) count as fresh.
    pub fn age(&self, now: u64) -> u64 {
        now.saturating_sub(self.last_seen)
    }

    /// Whether the owner has been silent for longer than `threshold_ms`
    pub fn is_stale(&self, now: u64, threshold_ms: u64) -> bool {
        self.age(now) > threshold_ms
    }

    /// Whether this record belongs to the given identity
    pub fn is_owned_by(&self, id: WindowId, instance: Uuid) -> bool {
        self.id == id && self.instance == instance
    }
}
