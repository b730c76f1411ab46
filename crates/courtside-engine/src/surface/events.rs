use crate::device::StartError;

/// Lifecycle states of a [`super::SurfaceController`].
///
/// `Idle → Starting → Running → Stopping → Idle`, re-enterable. `Starting`
/// and `Stopping` are transient: the rendering thread is bringing the GPU
/// side up or tearing it down.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum LifecycleState {
    Idle,
    Starting,
    Running,
    Stopping,
}

/// Out-of-band notifications delivered to the host.
///
/// `start_rendering` is fire-and-forget; anything it needs to tell the host
/// arrives here instead of as a return value. Only `StartFailed` (device
/// unavailable / invalid drawable) and `DeviceLost` represent errors — every
/// other frame-level condition is absorbed as a skipped frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceEvent {
    /// The loop is up: GPU context acquired, surface bound, first tick due.
    Started,
    /// A requested stop completed; all GPU resources for the surface are
    /// released.
    Stopped,
    /// `start_rendering` could not bring the surface up; the controller is
    /// back in `Idle`.
    StartFailed(StartError),
    /// The GPU device was lost mid-session. The controller has torn down
    /// and settled in `Idle`; the host may retry `start_rendering`.
    DeviceLost,
}

/// Host-side observer for [`SurfaceEvent`]s.
///
/// Invoked on the rendering thread. Implementations must return promptly
/// and must not call back into the controller (the thread emitting the
/// event is the one a stop would join).
pub trait SurfaceObserver: Send + Sync {
    fn on_event(&self, event: &SurfaceEvent);
}
