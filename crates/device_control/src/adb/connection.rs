//! ADB connection management for local and remote devices

use std::time::Duration;
use tokio::process::Command;
use tracing::info;

use crate::error::{DeviceError, Result};

/// Type of ADB connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionType {
    Usb,
    Emulator,
    Remote,
}

/// Information about an attached device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub serial: String,
    pub status: String,
    pub connection_type: ConnectionType,
    pub model: Option<String>,
}

impl DeviceInfo {
    /// Whether adb can talk to the device
    pub fn is_online(&self) -> bool {
        self.status == "device"
    }
}

/// Parse the output of `adb devices -l`
pub fn parse_device_list(stdout: &str) -> Vec<DeviceInfo> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| {
            !line.is_empty() && !line.starts_with("List of devices") && !line.starts_with('*')
        })
        .filter_map(|line| {
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() < 2 {
                return None;
            }
            let serial = parts[0].to_string();
            let connection_type = if serial.contains(':') {
                ConnectionType::Remote
            } else if serial.starts_with("emulator-") {
                ConnectionType::Emulator
            } else {
                ConnectionType::Usb
            };
            let model = parts[2..]
                .iter()
                .find_map(|p| p.strip_prefix("model:"))
                .map(str::to_string);

            Some(DeviceInfo {
                serial,
                status: parts[1].to_string(),
                connection_type,
                model,
            })
        })
        .collect()
}

/// Manages ADB connections to Android devices
#[derive(Debug, Clone)]
pub struct AdbConnection {
    adb_path: String,
    timeout: Duration,
}

impl AdbConnection {
    /// Create a new ADB connection manager
    pub fn new() -> Self {
        Self {
            adb_path: "adb".to_string(),
            timeout: Duration::from_secs(10),
        }
    }

    /// Create a new ADB connection manager with custom ADB path
    pub fn with_path(adb_path: impl Into<String>) -> Self {
        Self {
            adb_path: adb_path.into(),
            ..Self::new()
        }
    }

    async fn run(&self, args: &[&str]) -> Result<String> {
        let output = tokio::time::timeout(
            self.timeout,
            Command::new(&self.adb_path).args(args).output(),
        )
        .await
        .map_err(|_| {
            DeviceError::communication(format!(
                "adb {} timed out after {:?}",
                args.join(" "),
                self.timeout
            ))
        })??;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        Ok(format!("{}{}", stdout, stderr))
    }

    /// Connect to a remote device via TCP/IP
    pub async fn connect(&self, address: &str) -> Result<String> {
        let address = if address.contains(':') {
            address.to_string()
        } else {
            format!("{}:5555", address)
        };

        let combined = self.run(&["connect", &address]).await?;
        let lower = combined.to_lowercase();

        if lower.contains("already connected") {
            Ok(format!("Already connected to {}", address))
        } else if lower.contains("connected") && !lower.contains("cannot") {
            info!("Connected to {}", address);
            Ok(format!("Connected to {}", address))
        } else {
            Err(DeviceError::communication(combined.trim().to_string()))
        }
    }

    /// Disconnect from a remote device, or from all of them
    pub async fn disconnect(&self, address: Option<&str>) -> Result<String> {
        let mut args = vec!["disconnect"];
        if let Some(addr) = address {
            args.push(addr);
        }
        let combined = self.run(&args).await?;
        let result = combined.trim();
        Ok(if result.is_empty() {
            "Disconnected".to_string()
        } else {
            result.to_string()
        })
    }

    /// List all attached devices
    pub async fn list_devices(&self) -> Result<Vec<DeviceInfo>> {
        let stdout = self.run(&["devices", "-l"]).await?;
        Ok(parse_device_list(&stdout))
    }

    /// Check if a device is attached and online
    pub async fn is_connected(&self, serial: Option<&str>) -> Result<bool> {
        let devices = self.list_devices().await?;
        Ok(match serial {
            Some(id) => devices.iter().any(|d| d.serial == id && d.is_online()),
            None => devices.iter().any(DeviceInfo::is_online),
        })
    }
}

impl Default for AdbConnection {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_device_list() {
        let stdout = "List of devices attached\n\
            emulator-5554          device product:sdk_gphone model:sdk_gphone64 device:emu64\n\
            192.168.1.20:5555      offline\n\
            R58M12ABCDE            unauthorized usb:1-1\n\n";
        let devices = parse_device_list(stdout);

        assert_eq!(devices.len(), 3);
        assert_eq!(devices[0].connection_type, ConnectionType::Emulator);
        assert_eq!(devices[0].model.as_deref(), Some("sdk_gphone64"));
        assert!(devices[0].is_online());
        assert_eq!(devices[1].connection_type, ConnectionType::Remote);
        assert!(!devices[1].is_online());
        assert_eq!(devices[2].connection_type, ConnectionType::Usb);
    }

    #[test]
    fn test_parse_device_list_skips_daemon_banner() {
        let stdout = "* daemon not running; starting now at tcp:5037\n\
            * daemon started successfully\n\
            List of devices attached\n";
        assert!(parse_device_list(stdout).is_empty());
    }
}
