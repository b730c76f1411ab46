//! Logging utilities.
//!
//! Centralizes logger initialization so every binary embedding a render
//! surface gets the same defaults. Only the standard `log` facade is imposed
//! on library code.

mod init;

pub use init::{LoggingConfig, init_logging};
