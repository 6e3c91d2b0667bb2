//! Sources of the local window's current shape

use std::sync::Arc;

use parking_lot::RwLock;

use super::entry::WindowShape;

/// Reports where the local window currently sits on screen
pub trait ShapeProvider: Send + Sync {
    /// Current shape of the local window
    fn shape(&self) -> WindowShape;
}

impl<F> ShapeProvider for F
where
    F: Fn() -> WindowShape + Send + Sync,
{
    fn shape(&self) -> WindowShape {
        self()
    }
}

/// Shape cell the host updates from its move/resize hook
///
/// Clones share the same cell.
#[derive(Debug, Clone, Default)]
pub struct SharedShape {
    inner: Arc<RwLock<WindowShape>>,
}

impl SharedShape {
    /// Create a cell holding `shape`
    pub fn new(shape: WindowShape) -> Self {
        Self {
            inner: Arc::new(RwLock::new(shape)),
        }
    }

    /// Replace the current shape
    pub fn set(&self, shape: WindowShape) {
        *self.inner.write() = shape;
    }

    /// Move the window without resizing it
    pub fn move_to(&self, x: f64, y: f64) {
        let mut shape = self.inner.write();
        shape.x = x;
        shape.y = y;
    }

    /// Current shape
    pub fn get(&self) -> WindowShape {
        *self.inner.read()
    }
}

impl ShapeProvider for SharedShape {
    fn shape(&self) -> WindowShape {
        self.get()
    }
}
