//! Error types for device control operations

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeviceError {
    /// Malformed input, rejected before anything is sent to the device
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The transport to the device was lost or returned something unusable
    #[error("Device communication error: {0}")]
    Communication(String),

    /// The device did not settle within the configured bound
    #[error("Device timeout: {0}")]
    Timeout(String),
}

impl DeviceError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn communication(msg: impl Into<String>) -> Self {
        Self::Communication(msg.into())
    }

    /// Whether the error means the device can no longer be reached
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Communication(_))
    }
}

impl From<std::io::Error> for DeviceError {
    fn from(e: std::io::Error) -> Self {
        Self::Communication(format!("IO error: {}", e))
    }
}

pub type Result<T> = std::result::Result<T, DeviceError>;
