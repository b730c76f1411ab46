//! GPU device + swap surface management.
//!
//! This module is responsible for:
//! - the process-wide, reference-counted GPU context (Instance/Adapter/Device/Queue)
//! - binding a host-owned drawable to a presentable surface
//! - surface reconfiguration on resize, including the zero-size invalid state

mod binding;
mod context;
mod drawable;
mod error;

pub use binding::{SurfaceBinding, SurfaceOptions, choose_alpha_mode, choose_surface_format};
pub use context::{ContextOptions, GpuContext, GpuContextHandle};
pub use drawable::{Drawable, DrawableHandle};
pub use error::StartError;
