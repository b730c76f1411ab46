use std::ops::Deref;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};

use super::error::StartError;

/// Device-level acquisition parameters.
///
/// Keep this structure stable and minimal. Add flags only when a concrete
/// backend requirement exists.
#[derive(Debug, Clone)]
pub struct ContextOptions {
    /// Adapter selection preference.
    pub power_preference: wgpu::PowerPreference,

    /// Required wgpu features.
    ///
    /// Favor an empty set for portability unless a feature is strictly
    /// necessary.
    pub required_features: wgpu::Features,

    /// Limits requested from the adapter/device.
    pub required_limits: wgpu::Limits,
}

impl Default for ContextOptions {
    fn default() -> Self {
        Self {
            power_preference: wgpu::PowerPreference::HighPerformance,
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
        }
    }
}

/// The process-wide connection to the GPU.
///
/// Owns the wgpu Instance/Adapter/Device/Queue. At most one live context
/// exists per process; independent render surfaces share it through
/// reference-counted [`GpuContextHandle`]s handed out by
/// [`GpuContext::acquire`]. GPU commands must be issued from whichever
/// thread drives rendering — acquisition is expected to happen there too.
pub struct GpuContext {
    instance: wgpu::Instance,
    adapter: wgpu::Adapter,
    device: wgpu::Device,
    queue: wgpu::Queue,

    /// Features actually enabled on the device.
    features: wgpu::Features,

    /// Set from wgpu's device-lost callback. Once true the context is
    /// unusable; [`GpuContext::acquire`] evicts it and builds a fresh one.
    lost: Arc<AtomicBool>,
}

/// Reference-counted handle to the shared [`GpuContext`].
///
/// Cloning acquires another reference; dropping releases one. The context
/// is torn down when the last handle drops.
#[derive(Clone)]
pub struct GpuContextHandle(Arc<GpuContext>);

impl Deref for GpuContextHandle {
    type Target = GpuContext;

    fn deref(&self) -> &GpuContext {
        &self.0
    }
}

/// Process-wide registry slot. Weak so the context is torn down when the
/// last handle drops, not when the process exits.
static SHARED: Mutex<Weak<GpuContext>> = Mutex::new(Weak::new());

impl GpuContext {
    /// Returns a handle to the shared context, creating it on first call.
    ///
    /// Subsequent calls reuse the live context regardless of `options` — the
    /// first acquirer decides device parameters. A context flagged as lost
    /// is evicted, so a host retrying after `DeviceLost` gets a fresh one.
    ///
    /// Blocks on adapter/device acquisition, which is asynchronous under
    /// wgpu; call from the rendering thread.
    pub fn acquire(options: &ContextOptions) -> Result<GpuContextHandle, StartError> {
        let mut slot = SHARED.lock().unwrap();

        if let Some(existing) = slot.upgrade() {
            if !existing.is_lost() {
                return Ok(GpuContextHandle(existing));
            }
            log::warn!("evicting lost GPU context; creating a new one");
        }

        let context = Arc::new(Self::create(options)?);
        *slot = Arc::downgrade(&context);
        Ok(GpuContextHandle(context))
    }

    fn create(options: &ContextOptions) -> Result<GpuContext, StartError> {
        // All backends so wgpu selects the optimal platform backend.
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: options.power_preference,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .map_err(|e| StartError::DeviceUnavailable(e.to_string()))?;

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("courtside device"),
            required_features: options.required_features,
            required_limits: options.required_limits.clone(),
            experimental_features: wgpu::ExperimentalFeatures::disabled(),
            memory_hints: wgpu::MemoryHints::Performance,
            trace: wgpu::Trace::Off,
        }))
        .map_err(|e| StartError::DeviceUnavailable(e.to_string()))?;

        let features = device.features();

        let lost = Arc::new(AtomicBool::new(false));
        {
            let lost = lost.clone();
            device.set_device_lost_callback(move |reason, message| {
                log::error!("GPU device lost ({reason:?}): {message}");
                lost.store(true, Ordering::Release);
            });
        }

        log::info!("GPU context created: {}", adapter.get_info().name);

        Ok(GpuContext {
            instance,
            adapter,
            device,
            queue,
            features,
            lost,
        })
    }

    /// Returns the wgpu instance (surface creation goes through it).
    pub fn instance(&self) -> &wgpu::Instance {
        &self.instance
    }

    /// Returns the selected adapter.
    pub fn adapter(&self) -> &wgpu::Adapter {
        &self.adapter
    }

    /// Returns the logical device.
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    /// Returns the command queue.
    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Features enabled on the device.
    pub fn features(&self) -> wgpu::Features {
        self.features
    }

    /// Whether the device has been lost. A lost context must not receive
    /// further GPU commands; tear down and re-acquire instead.
    pub fn is_lost(&self) -> bool {
        self.lost.load(Ordering::Acquire)
    }
}

impl Drop for GpuContext {
    fn drop(&mut self) {
        log::info!("GPU context released");
    }
}
