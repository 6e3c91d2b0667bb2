//! Shared window roster for multi-window scenes
//!
//! Independently running windows (browser tabs, OS processes, anything with its own
//! event loop) discover each other through a shared key/value store that only
//! supports whole-value reads and writes. Each window runs a [`WindowRegistry`] that
//! joins the roster, heartbeats its own record, prunes records of windows that went
//! away without cleaning up, and tells the host when membership or its own shape
//! changes.
//!
//! ```text
//!     window A               shared store                window B
//!  ┌────────────────┐    ┌──────────────────┐    ┌────────────────┐
//!  │ WindowRegistry │───▶│ "windows": [     │◀───│ WindowRegistry │
//!  │                │◀───│   {id, shape,    │───▶│                │
//!  │ get_windows()  │    │    lastSeen, ..} │    │ get_windows()  │
//!  └────────────────┘    │ ]                │    └────────────────┘
//!                        └──────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use window_mesh::shared::FileBackend;
//! use window_mesh::{RegistryConfig, SharedShape, WindowRegistry, WindowShape};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = Arc::new(FileBackend::open("/tmp/window-mesh")?);
//! let shape = SharedShape::new(WindowShape::new(0.0, 0.0, 800.0, 600.0));
//!
//! let registry = Arc::new(WindowRegistry::with_config(
//!     backend,
//!     shape.clone(),
//!     RegistryConfig::default(),
//! ));
//! registry.set_win_change_callback(|| println!("roster changed"));
//! registry.init(serde_json::json!({ "foo": "bar" }))?;
//! let _ticker = registry.spawn_tick_task();
//!
//! for window in registry.get_windows() {
//!     println!("{} at {:?}", window.id, window.shape.center());
//! }
//! # Ok(())
//! # }
//! ```

pub mod clock;
pub mod error;
pub mod registry;
pub mod shared;
pub mod stats;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{Error, Result};
pub use registry::{
    RegistryConfig, RegistryError, RegistryPhase, Roster, ShapeProvider, SharedShape,
    TickOutcome, WindowId, WindowRecord, WindowRegistry, WindowShape,
};
pub use stats::RegistryStats;
