//! ADB (Android Debug Bridge) backend
//!
//! This module provides:
//! - `connection`: Device listing and TCP/IP connection management
//! - `transport`: The shell transport a `DeviceHandle` talks through
//! - `dumpsys`: Parsers for the `dumpsys` sections that expose device state

mod connection;
pub mod dumpsys;
mod transport;

pub use connection::{parse_device_list, AdbConnection, ConnectionType, DeviceInfo};
pub use transport::{AdbTransport, DeviceTransport, ShellOutput};
