use std::fmt;

/// An error that prevents a render surface from starting.
///
/// Only start-fatal conditions live here. Per-frame conditions (surface not
/// ready, device lost mid-session) are reported through
/// [`crate::render::FrameStatus`] instead, because they are expected states
/// of a running loop rather than failures of a call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartError {
    /// No usable GPU adapter or device on this system.
    DeviceUnavailable(String),
    /// The drawable handle is dead, zero-sized, or rejected by the backend.
    InvalidDrawable,
}

impl fmt::Display for StartError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StartError::DeviceUnavailable(reason) => {
                write!(f, "no usable GPU device: {reason}")
            }
            StartError::InvalidDrawable => {
                write!(f, "drawable is invalid or zero-sized")
            }
        }
    }
}

impl std::error::Error for StartError {}
