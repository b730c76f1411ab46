//! Courtside engine crate.
//!
//! This crate owns the render-surface lifecycle: binding a host-owned
//! drawable to a GPU context, driving a paced render loop on a dedicated
//! thread, and starting/stopping/tearing that loop down safely in response
//! to host-view events. Scene content is supplied by an external
//! [`scene::SceneSource`]; host embedding is a thin adapter that calls
//! plain methods on [`surface::SurfaceController`].

pub mod device;
pub mod logging;
pub mod render;
pub mod sched;
pub mod scene;
pub mod surface;
pub mod time;
