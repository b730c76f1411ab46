//! Frame scheduling.
//!
//! [`FrameScheduler`] owns the dedicated rendering thread and delivers
//! strictly sequential ticks to a [`TickHandler`]. The fixed cadence is the
//! portable fallback clock; when a surface is attached, FIFO presentation
//! inside the tick provides the actual display-refresh pacing.

mod frame_scheduler;

pub use frame_scheduler::{FrameScheduler, SchedulerConfig, TickControl, TickHandler};
