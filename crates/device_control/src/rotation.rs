//! Display rotation and rotation lock

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DeviceError;

/// Display orientation of a device, in 90° increments
///
/// Discriminants follow Android's `Surface.ROTATION_*` values, which is also
/// what `dumpsys display` reports as `mCurrentOrientation`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Rotation {
    /// Portrait, 0°
    Natural = 0,
    /// Landscape with the left side down, 90°
    Left = 1,
    /// Portrait upside down, 180°
    UpsideDown = 2,
    /// Landscape with the right side down, 270°
    Right = 3,
}

impl Rotation {
    pub const ALL: [Rotation; 4] = [
        Rotation::Natural,
        Rotation::Left,
        Rotation::UpsideDown,
        Rotation::Right,
    ];

    /// Decode the device-side rotation index
    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Self::Natural),
            1 => Some(Self::Left),
            2 => Some(Self::UpsideDown),
            3 => Some(Self::Right),
            _ => None,
        }
    }

    /// Device-side rotation index, as written to `user_rotation`
    pub fn index(self) -> u8 {
        self as u8
    }

    pub fn degrees(self) -> u16 {
        self.index() as u16 * 90
    }

    pub fn is_portrait(self) -> bool {
        matches!(self, Self::Natural | Self::UpsideDown)
    }

    /// Target requested by `DeviceHandle::set_rotation_opposite`.
    ///
    /// Portrait orientations map to `Left` and landscape orientations map to
    /// `Natural`. This is not a 180° flip and not a quarter-turn pair: an
    /// upside-down device goes to `Left`, and both landscapes go back to
    /// `Natural`. Existing test expectations depend on this exact mapping.
    pub fn opposite_quirk(self) -> Self {
        if self.is_portrait() {
            Self::Left
        } else {
            Self::Natural
        }
    }
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Natural => "natural",
            Self::Left => "left",
            Self::UpsideDown => "upside-down",
            Self::Right => "right",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for Rotation {
    type Err = DeviceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "natural" | "0" => Ok(Self::Natural),
            "left" | "90" => Ok(Self::Left),
            "upside-down" | "upside_down" | "180" => Ok(Self::UpsideDown),
            "right" | "270" => Ok(Self::Right),
            _ => Err(DeviceError::invalid(format!("Unknown rotation: {}", s))),
        }
    }
}

/// Whether rotation requests are currently honoured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RotationLock {
    Frozen,
    #[default]
    Free,
}

impl RotationLock {
    pub fn from_locked(locked: bool) -> Self {
        if locked {
            Self::Frozen
        } else {
            Self::Free
        }
    }

    pub fn is_frozen(self) -> bool {
        self == Self::Frozen
    }
}

impl fmt::Display for RotationLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Frozen => write!(f, "frozen"),
            Self::Free => write!(f, "free"),
        }
    }
}
