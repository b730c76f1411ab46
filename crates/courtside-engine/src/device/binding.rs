use super::context::GpuContext;
use super::drawable::DrawableHandle;
use super::error::StartError;

/// Presentation parameters for a swap surface.
#[derive(Debug, Clone)]
pub struct SurfaceOptions {
    /// Prefer an sRGB surface format when available.
    pub prefer_srgb: bool,

    /// Present mode (swap behavior).
    ///
    /// FIFO is broadly supported and provides display-refresh backpressure,
    /// which is what paces the render loop in steady state.
    pub present_mode: wgpu::PresentMode,

    /// Optional alpha mode preference for the surface.
    ///
    /// If provided but unsupported, a supported mode is selected.
    pub alpha_mode: Option<wgpu::CompositeAlphaMode>,

    /// Desired maximum frame latency for the surface (a hint).
    pub desired_maximum_frame_latency: u32,
}

impl Default for SurfaceOptions {
    fn default() -> Self {
        Self {
            prefer_srgb: true,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: None,
            desired_maximum_frame_latency: 2,
        }
    }
}

/// A presentable target bound to a specific drawable.
///
/// The binding is valid only while a surface is bound and the recorded size
/// is nonzero. Resizing to zero (view hidden / backgrounded) transitions it
/// to invalid without touching the GPU; render attempts must check
/// [`SurfaceBinding::is_valid`] and skip instead of acquiring.
///
/// While bound, the underlying wgpu surface holds the only strong reference
/// this crate ever takes on the host's drawable; `unbind` releases it.
#[derive(Default)]
pub struct SurfaceBinding {
    surface: Option<wgpu::Surface<'static>>,
    config: Option<wgpu::SurfaceConfiguration>,
    width: u32,
    height: u32,
}

impl SurfaceBinding {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates (or recreates) the presentable target for `drawable`.
    ///
    /// Fails with `InvalidDrawable` when the drawable is dead or the
    /// dimensions are zero. Callers that can tolerate a not-yet-presentable
    /// view should leave the binding unbound and skip frames rather than
    /// treating this as fatal.
    pub fn bind(
        &mut self,
        ctx: &GpuContext,
        drawable: &DrawableHandle,
        options: &SurfaceOptions,
        width: u32,
        height: u32,
    ) -> Result<(), StartError> {
        self.unbind();
        self.width = width;
        self.height = height;

        if width == 0 || height == 0 {
            return Err(StartError::InvalidDrawable);
        }

        let Some(target) = drawable.acquire() else {
            return Err(StartError::InvalidDrawable);
        };

        let surface = match ctx.instance().create_surface(target) {
            Ok(surface) => surface,
            Err(e) => {
                log::warn!("surface creation failed: {e}");
                return Err(StartError::InvalidDrawable);
            }
        };

        let caps = surface.get_capabilities(ctx.adapter());
        let Some(format) = choose_surface_format(&caps.formats, options.prefer_srgb) else {
            return Err(StartError::DeviceUnavailable(
                "no supported surface formats".into(),
            ));
        };

        let present_mode = if caps.present_modes.contains(&options.present_mode) {
            options.present_mode
        } else {
            wgpu::PresentMode::Fifo
        };

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width,
            height,
            present_mode,
            alpha_mode: choose_alpha_mode(&caps.alpha_modes, options.alpha_mode),
            view_formats: vec![],
            desired_maximum_frame_latency: options.desired_maximum_frame_latency,
        };

        surface.configure(ctx.device(), &config);

        log::debug!("surface bound: {width}x{height}, {format:?}, {present_mode:?}");

        self.surface = Some(surface);
        self.config = Some(config);
        Ok(())
    }

    /// Reconfigures the existing target in place for a new size.
    ///
    /// Safe between frames, never during an in-flight present — callers
    /// serialize this onto the rendering thread. A zero size transitions the
    /// binding to invalid; wgpu cannot configure a 0x0 surface, so only the
    /// recorded size changes and presentation pauses until a nonzero resize.
    pub fn resize(&mut self, ctx: &GpuContext, width: u32, height: u32) {
        self.width = width;
        self.height = height;

        if width == 0 || height == 0 {
            log::debug!("surface resized to zero; presentation paused");
            return;
        }

        if let (Some(surface), Some(config)) = (&self.surface, &mut self.config) {
            config.width = width;
            config.height = height;
            surface.configure(ctx.device(), config);
        }
    }

    /// Re-applies the current configuration after a lost/outdated acquire.
    pub(crate) fn reconfigure(&self, ctx: &GpuContext) {
        if self.width == 0 || self.height == 0 {
            return;
        }
        if let (Some(surface), Some(config)) = (&self.surface, &self.config) {
            surface.configure(ctx.device(), config);
        }
    }

    /// Releases the presentable target (and with it the strong drawable
    /// reference). Idempotent.
    pub fn unbind(&mut self) {
        self.surface = None;
        self.config = None;
    }

    /// Whether a surface is currently bound, irrespective of size.
    pub fn is_bound(&self) -> bool {
        self.surface.is_some()
    }

    /// Whether presentation is currently possible.
    pub fn is_valid(&self) -> bool {
        self.surface.is_some() && self.width > 0 && self.height > 0
    }

    /// Last recorded drawable size in physical pixels.
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Active surface format, if bound.
    pub fn format(&self) -> Option<wgpu::TextureFormat> {
        self.config.as_ref().map(|c| c.format)
    }

    pub(crate) fn surface(&self) -> Option<&wgpu::Surface<'static>> {
        self.surface.as_ref()
    }
}

/// Picks a surface format, preferring sRGB when requested.
pub fn choose_surface_format(
    formats: &[wgpu::TextureFormat],
    prefer_srgb: bool,
) -> Option<wgpu::TextureFormat> {
    if formats.is_empty() {
        return None;
    }

    if prefer_srgb {
        let preferred = [
            wgpu::TextureFormat::Bgra8UnormSrgb,
            wgpu::TextureFormat::Rgba8UnormSrgb,
        ];
        for f in preferred {
            if formats.contains(&f) {
                return Some(f);
            }
        }
    }

    Some(formats[0])
}

/// Picks an alpha mode, falling back to the first supported one.
pub fn choose_alpha_mode(
    modes: &[wgpu::CompositeAlphaMode],
    requested: Option<wgpu::CompositeAlphaMode>,
) -> wgpu::CompositeAlphaMode {
    requested
        .filter(|m| modes.contains(m))
        .or_else(|| modes.first().copied())
        .unwrap_or(wgpu::CompositeAlphaMode::Auto)
}
