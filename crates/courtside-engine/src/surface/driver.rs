use crate::device::{
    ContextOptions, DrawableHandle, GpuContext, GpuContextHandle, StartError, SurfaceBinding,
    SurfaceOptions,
};
use crate::render::{FrameExecutor, FrameStatus, SkipReason};
use crate::scene::SceneSnapshot;

/// The GPU side of one render surface.
///
/// All four methods run on the rendering thread, strictly serialized by the
/// owning controller: `open` before the first `render`, `resize` between
/// frames (never mid-present), `close` after the last. `close` must be
/// idempotent and safe to call even when `open` never succeeded.
pub trait SurfaceDriver: Send {
    /// Acquires the GPU context and binds the surface at the given drawable
    /// size. A zero size is not an error — the driver stays unbound and
    /// frames skip until a nonzero resize arrives.
    fn open(&mut self, width: u32, height: u32) -> Result<(), StartError>;

    /// Applies a new drawable size before the next frame.
    fn resize(&mut self, width: u32, height: u32);

    /// Renders and presents one frame of `scene`.
    fn render(&mut self, scene: &SceneSnapshot) -> FrameStatus;

    /// Releases the surface and the GPU context reference.
    fn close(&mut self);
}

/// Production [`SurfaceDriver`]: shared [`GpuContext`] + [`SurfaceBinding`]
/// + [`FrameExecutor`], bound to one host drawable.
pub struct WgpuDriver {
    drawable: DrawableHandle,
    context_options: ContextOptions,
    surface_options: SurfaceOptions,

    context: Option<GpuContextHandle>,
    binding: SurfaceBinding,
    executor: FrameExecutor,
}

impl WgpuDriver {
    pub fn new(drawable: DrawableHandle) -> Self {
        Self::with_options(drawable, ContextOptions::default(), SurfaceOptions::default())
    }

    pub fn with_options(
        drawable: DrawableHandle,
        context_options: ContextOptions,
        surface_options: SurfaceOptions,
    ) -> Self {
        Self {
            drawable,
            context_options,
            surface_options,
            context: None,
            binding: SurfaceBinding::new(),
            executor: FrameExecutor::new(),
        }
    }
}

impl SurfaceDriver for WgpuDriver {
    fn open(&mut self, width: u32, height: u32) -> Result<(), StartError> {
        let ctx = GpuContext::acquire(&self.context_options)?;

        if width > 0 && height > 0 {
            self.binding
                .bind(&ctx, &self.drawable, &self.surface_options, width, height)?;
        } else {
            // View currently hidden: hold the context, defer the bind.
            log::debug!("opening with zero-sized drawable; bind deferred");
        }

        self.context = Some(ctx);
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        let Some(ctx) = &self.context else { return };

        if !self.binding.is_bound() && width > 0 && height > 0 {
            // A deferred bind (zero-sized open, or a drawable that went away
            // and came back) completes on the first real size.
            if let Err(e) =
                self.binding
                    .bind(ctx, &self.drawable, &self.surface_options, width, height)
            {
                log::warn!("surface bind on resize failed: {e}");
            }
            return;
        }

        self.binding.resize(ctx, width, height);
    }

    fn render(&mut self, scene: &SceneSnapshot) -> FrameStatus {
        let Some(ctx) = &self.context else {
            return FrameStatus::Skipped(SkipReason::SurfaceNotReady);
        };

        if !self.drawable.is_alive() {
            // The host dropped the drawable under us. Release the stale
            // surface and skip; never touch a dead native handle.
            self.binding.unbind();
            return FrameStatus::Skipped(SkipReason::SurfaceNotReady);
        }

        self.executor.render_frame(ctx, &mut self.binding, scene)
    }

    fn close(&mut self) {
        self.binding.unbind();
        self.executor.reset();

        if let Some(ctx) = self.context.take() {
            // Drain submitted work before the context reference goes away,
            // so the host can destroy the drawable immediately after stop.
            let _ = ctx.device().poll(wgpu::PollType::wait_indefinitely());
        }
    }
}
