//! Read-only connectivity states reported by the device

use serde::Serialize;
use std::fmt;

/// Wi-Fi state as printed on the first line of `dumpsys wifi`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum WifiStatus {
    Disabled,
    Enabled,
    Connected,
    Disconnected,
}

impl WifiStatus {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "disabled" => Some(Self::Disabled),
            "enabled" => Some(Self::Enabled),
            "connected" => Some(Self::Connected),
            "disconnected" => Some(Self::Disconnected),
            _ => None,
        }
    }

    /// Whether the radio is switched on
    pub fn is_on(&self) -> bool {
        !matches!(self, Self::Disabled)
    }
}

impl fmt::Display for WifiStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Disabled => "disabled",
            Self::Enabled => "enabled",
            Self::Connected => "connected",
            Self::Disconnected => "disconnected",
        };
        write!(f, "{}", name)
    }
}

/// Cellular data state, `TelephonyManager.DATA_*` encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DataConnection {
    /// IP traffic not available
    Disconnected = 0,
    Connecting = 1,
    Connected = 2,
    /// Link is up but traffic is paused, e.g. during a 2G voice call
    Suspended = 3,
}

impl DataConnection {
    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Self::Disconnected),
            1 => Some(Self::Connecting),
            2 => Some(Self::Connected),
            3 => Some(Self::Suspended),
            _ => None,
        }
    }
}

impl fmt::Display for DataConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Suspended => "suspended",
        };
        write!(f, "{}", name)
    }
}
