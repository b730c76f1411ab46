//! Render-surface lifecycle.
//!
//! [`SurfaceController`] is the façade a host view embeds: it owns the
//! frame scheduler and the GPU side of one surface, exposes idempotent
//! `start_rendering`/`stop_rendering`, routes resize across threads, and
//! forces a synchronous stop on host-view destruction.
//!
//! The GPU side sits behind [`SurfaceDriver`] so lifecycle behavior is
//! testable without a device; [`WgpuDriver`] is the production
//! implementation.

mod controller;
mod driver;
mod events;

pub use controller::SurfaceController;
pub use driver::{SurfaceDriver, WgpuDriver};
pub use events::{LifecycleState, SurfaceEvent, SurfaceObserver};
