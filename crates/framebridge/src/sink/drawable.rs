use std::sync::Arc;

use raw_window_handle::{HasDisplayHandle, HasWindowHandle};

use crate::coords::Size;

/// An on-screen destination supplied by the caller.
///
/// The bridge keeps an `Arc` to it for as long as the sink is registered and
/// identifies sinks by the `Arc`'s address.
pub trait Drawable: HasWindowHandle + HasDisplayHandle + Send + Sync {
    /// Current drawable size in physical pixels.
    fn surface_size(&self) -> Size;

    /// `false` once the native window is gone. Invalid sinks are dropped at
    /// the next draw.
    fn is_valid(&self) -> bool {
        true
    }
}

impl Drawable for winit::window::Window {
    fn surface_size(&self) -> Size {
        self.inner_size().into()
    }
}

/// Identity key of a drawable.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct DrawableId(usize);

impl DrawableId {
    pub fn of(drawable: &Arc<dyn Drawable>) -> Self {
        DrawableId(Arc::as_ptr(drawable) as *const () as usize)
    }
}
