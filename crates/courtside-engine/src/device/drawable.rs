use std::sync::{Arc, Weak};

use raw_window_handle::{
    DisplayHandle, HandleError, HasDisplayHandle, HasWindowHandle, WindowHandle,
};

/// A platform-native presentable surface exposed by the host view.
///
/// Anything that can produce raw window/display handles qualifies: a winit
/// window, a CALayer wrapper, an ANativeWindow wrapper. The host owns the
/// drawable; this crate only ever holds it weakly (see [`DrawableHandle`])
/// except while a surface is actually bound to it.
pub trait Drawable: HasWindowHandle + HasDisplayHandle + Send + Sync {}

impl<T: HasWindowHandle + HasDisplayHandle + Send + Sync> Drawable for T {}

/// Non-owning reference to a host-owned drawable.
///
/// The handle upgrades to a strong reference only for the duration of a
/// surface bind. Once the host drops its drawable, `is_alive` turns false
/// and bind attempts fail with `InvalidDrawable` instead of touching a dead
/// native handle.
#[derive(Clone)]
pub struct DrawableHandle {
    inner: Weak<dyn Drawable>,
}

impl DrawableHandle {
    /// Creates a handle from the host's owning reference.
    pub fn new<D: Drawable + 'static>(drawable: &Arc<D>) -> Self {
        let drawable: Arc<dyn Drawable> = drawable.clone();
        let inner: Weak<dyn Drawable> = Arc::downgrade(&drawable);
        Self { inner }
    }

    /// Whether the underlying drawable still exists.
    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }

    /// Upgrades to a bind-scoped strong reference.
    pub(crate) fn acquire(&self) -> Option<BoundTarget> {
        self.inner.upgrade().map(BoundTarget)
    }
}

impl std::fmt::Debug for DrawableHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DrawableHandle")
            .field("alive", &self.is_alive())
            .finish()
    }
}

/// Strong drawable reference held by a bound surface.
///
/// wgpu keeps the surface target alive for the surface's lifetime; routing
/// that ownership through this wrapper means unbinding the surface is what
/// releases the drawable back to the host.
pub(crate) struct BoundTarget(Arc<dyn Drawable>);

impl HasWindowHandle for BoundTarget {
    fn window_handle(&self) -> Result<WindowHandle<'_>, HandleError> {
        self.0.window_handle()
    }
}

impl HasDisplayHandle for BoundTarget {
    fn display_handle(&self) -> Result<DisplayHandle<'_>, HandleError> {
        self.0.display_handle()
    }
}
