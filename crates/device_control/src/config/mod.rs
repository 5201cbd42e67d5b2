//! Configuration module for device_control
//!
//! This module contains:
//! - `timing`: Timing bounds for idle waits and shell commands

mod timing;

pub use timing::TimingConfig;
