//! Shell transport to a device

use async_trait::async_trait;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

use crate::error::{DeviceError, Result};

/// Markers adb prints when the device itself is unreachable
const TRANSPORT_LOST_MARKERS: &[&str] = &[
    "error: device",
    "error: no devices",
    "error: closed",
    "error: more than one device",
    "device offline",
    "device unauthorized",
    "cannot connect to daemon",
];

/// The marker in `stderr` showing adb lost the device, if any
pub fn lost_device_marker(stderr: &str) -> Option<&'static str> {
    TRANSPORT_LOST_MARKERS
        .iter()
        .copied()
        .find(|m| stderr.contains(m))
}

/// Result of one shell command on the device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellOutput {
    /// Combined stdout and stderr
    pub output: String,
    /// Whether the remote command exited successfully
    pub success: bool,
}

impl ShellOutput {
    pub fn ok(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            success: true,
        }
    }

    pub fn failed(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            success: false,
        }
    }

    /// Whether an injected input event was accepted by the device
    pub fn dispatched(&self) -> bool {
        self.success
            && !self.output.contains("Exception")
            && !self.output.lines().any(|l| l.trim_start().starts_with("Error:"))
    }
}

/// Runs shell commands on one device
///
/// Implementations must report a lost device as
/// `DeviceError::Communication`; a remote command that ran and failed is an
/// `Ok` with `success == false`.
#[async_trait]
pub trait DeviceTransport: Send + Sync {
    async fn shell(&self, args: &[&str]) -> Result<ShellOutput>;

    /// Serial of the device this transport talks to, if pinned
    fn serial(&self) -> Option<&str>;
}

/// Transport that shells out to the `adb` binary
#[derive(Debug, Clone)]
pub struct AdbTransport {
    adb_path: String,
    serial: Option<String>,
    command_timeout: Duration,
}

impl AdbTransport {
    /// Create a transport for `serial`, or for the only attached device
    pub fn new(serial: Option<String>) -> Self {
        Self {
            adb_path: "adb".to_string(),
            serial,
            command_timeout: Duration::from_secs(10),
        }
    }

    /// Use a custom adb binary
    pub fn with_path(mut self, adb_path: impl Into<String>) -> Self {
        self.adb_path = adb_path.into();
        self
    }

    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new(&self.adb_path);
        if let Some(serial) = &self.serial {
            cmd.arg("-s").arg(serial);
        }
        cmd.arg("shell").args(args);
        cmd.kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl DeviceTransport for AdbTransport {
    async fn shell(&self, args: &[&str]) -> Result<ShellOutput> {
        debug!("adb shell {:?} (serial: {:?})", args, self.serial);

        let output = tokio::time::timeout(self.command_timeout, self.command(args).output())
            .await
            .map_err(|_| {
                DeviceError::communication(format!(
                    "No response to `{}` after {:?}",
                    args.join(" "),
                    self.command_timeout
                ))
            })??;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        let combined = format!("{}{}", stdout, stderr);

        if let Some(marker) = lost_device_marker(&stderr) {
            return Err(DeviceError::communication(format!(
                "adb reported `{}`: {}",
                marker,
                stderr.trim()
            )));
        }

        debug!("adb shell output: {}", combined.trim());

        Ok(ShellOutput {
            output: combined,
            success: output.status.success(),
        })
    }

    fn serial(&self) -> Option<&str> {
        self.serial.as_deref()
    }
}
