//! device_control: a device control facade for Android automation
//!
//! This library provides:
//! - `DeviceHandle`: rotation, power state and input injection on one device,
//!   with wait-for-idle semantics
//! - ADB (Android Debug Bridge) transport and device listing
//! - Battery, Wi-Fi and cellular data status reads
//! - Typed gestures and parameters validated before anything reaches the device
//! - Named actions mirroring instrumentation test methods
//!
//! # Example
//!
//! ```no_run
//! use device_control::{DeviceHandle, Rotation, TimingConfig};
//!
//! #[tokio::main]
//! async fn main() -> device_control::Result<()> {
//!     let device = DeviceHandle::adb(Some("emulator-5554".to_string()), TimingConfig::new())?;
//!
//!     device.set_rotation(Rotation::Left).await?;
//!     device.wait_for_idle().await?;
//!     assert_eq!(device.rotation().await?, Rotation::Left);
//!
//!     device.click(50, 100).await?;
//!     Ok(())
//! }
//! ```

// Core modules
pub mod error;

// Configuration module
pub mod config;

// Device backend
pub mod adb;

// Core functionality
pub mod actions;
pub mod gesture;
pub mod handle;
pub mod params;
pub mod rotation;
pub mod status;

#[cfg(test)]
mod fake;

// Re-export commonly used types and functions
pub use error::{DeviceError, Result};

pub use config::TimingConfig;

pub use adb::{
    AdbConnection, AdbTransport, ConnectionType, DeviceInfo, DeviceTransport, ShellOutput,
};

pub use actions::{ActionHandler, ActionResult, DeviceAction};
pub use gesture::{Point, PointerGesture};
pub use handle::DeviceHandle;
pub use params::{ClickParams, DragParams, RawParams};
pub use rotation::{Rotation, RotationLock};
pub use status::{DataConnection, WifiStatus};
