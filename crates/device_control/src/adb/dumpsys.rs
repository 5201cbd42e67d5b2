//! Parsers for `dumpsys` output used to read device state

use regex::Regex;
use std::sync::OnceLock;

use crate::error::{DeviceError, Result};
use crate::rotation::{Rotation, RotationLock};
use crate::status::{DataConnection, WifiStatus};

fn cached(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("static regex must compile"))
}

fn unexpected(what: &str, output: &str) -> DeviceError {
    let excerpt: String = output.chars().take(120).collect();
    DeviceError::communication(format!(
        "Could not read {} from device output: {:?}",
        what, excerpt
    ))
}

/// Current rotation from `dumpsys display`
pub fn parse_rotation(output: &str) -> Result<Rotation> {
    static ORIENTATION: OnceLock<Regex> = OnceLock::new();
    static CURRENT_ROTATION: OnceLock<Regex> = OnceLock::new();

    if let Some(caps) = cached(&ORIENTATION, r"mCurrentOrientation=([0-3])").captures(output) {
        let index: u8 = caps[1].parse().map_err(|_| unexpected("rotation", output))?;
        return Rotation::from_index(index).ok_or_else(|| unexpected("rotation", output));
    }

    // Newer platforms only print the symbolic rotation
    if let Some(caps) = cached(
        &CURRENT_ROTATION,
        r"mCurrentRotation=ROTATION_(0|90|180|270)",
    )
    .captures(output)
    {
        let degrees: u16 = caps[1].parse().map_err(|_| unexpected("rotation", output))?;
        return Rotation::from_index((degrees / 90) as u8)
            .ok_or_else(|| unexpected("rotation", output));
    }

    Err(unexpected("rotation", output))
}

/// Rotation lock from `dumpsys window`
pub fn parse_rotation_lock(output: &str) -> Result<RotationLock> {
    static MODE: OnceLock<Regex> = OnceLock::new();

    let caps = cached(
        &MODE,
        r"mUserRotationMode=(0|1|USER_ROTATION_FREE|USER_ROTATION_LOCKED)",
    )
    .captures(output)
    .ok_or_else(|| unexpected("rotation lock", output))?;

    Ok(match &caps[1] {
        "1" | "USER_ROTATION_LOCKED" => RotationLock::Frozen,
        _ => RotationLock::Free,
    })
}

/// Screen power state from `dumpsys power`
pub fn parse_screen_on(output: &str) -> Result<bool> {
    static SCREEN_ON: OnceLock<Regex> = OnceLock::new();
    static WAKEFULNESS: OnceLock<Regex> = OnceLock::new();

    if let Some(caps) = cached(&SCREEN_ON, r"mScreenOn=(true|false)").captures(output) {
        return Ok(&caps[1] == "true");
    }

    if let Some(caps) =
        cached(&WAKEFULNESS, r"mWakefulness=(Awake|Asleep|Dozing|Dreaming)").captures(output)
    {
        return Ok(matches!(&caps[1], "Awake" | "Dreaming"));
    }

    Err(unexpected("screen state", output))
}

/// Remaining battery percentage from `dumpsys battery`
pub fn parse_battery_level(output: &str) -> Result<u8> {
    static LEVEL: OnceLock<Regex> = OnceLock::new();

    let caps = cached(&LEVEL, r"(?m)^\s*level: (\d+)")
        .captures(output)
        .ok_or_else(|| unexpected("battery level", output))?;

    match caps[1].parse::<u8>() {
        Ok(level) if level <= 100 => Ok(level),
        _ => Err(unexpected("battery level", output)),
    }
}

/// Wi-Fi state from `dumpsys wifi`
pub fn parse_wifi_status(output: &str) -> Result<WifiStatus> {
    static STATUS: OnceLock<Regex> = OnceLock::new();

    cached(&STATUS, r"(?m)^Wi-Fi is (\w+)")
        .captures(output)
        .and_then(|caps| WifiStatus::from_name(&caps[1]))
        .ok_or_else(|| unexpected("Wi-Fi status", output))
}

/// Cellular data state from `dumpsys telephony.registry`
pub fn parse_data_connection(output: &str) -> Result<DataConnection> {
    static STATE: OnceLock<Regex> = OnceLock::new();

    cached(&STATE, r"mDataConnectionState=([0-3])")
        .captures(output)
        .and_then(|caps| caps[1].parse::<u8>().ok())
        .and_then(DataConnection::from_index)
        .ok_or_else(|| unexpected("data connection state", output))
}

/// Whether `dumpsys window` shows no display freeze or pending transition
pub fn parse_idle(output: &str) -> bool {
    static TRANSITION: OnceLock<Regex> = OnceLock::new();
    static FREEZING: OnceLock<Regex> = OnceLock::new();

    if output.contains("mDisplayFrozen=true") {
        return false;
    }

    if let Some(caps) = cached(&FREEZING, r"mWindowsFreezingScreen=(\w+)").captures(output) {
        if !matches!(&caps[1], "false" | "WINDOWS_FREEZING_SCREENS_NONE") {
            return false;
        }
    }

    match cached(&TRANSITION, r"mAppTransitionState=(\w+)").captures(output) {
        Some(caps) => &caps[1] == "APP_STATE_IDLE",
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rotation() {
        let output = "  mDisplayId=0\n  mCurrentOrientation=3\n  mCurrentAppWidth=1080\n";
        assert_eq!(parse_rotation(output).unwrap(), Rotation::Right);
    }

    #[test]
    fn test_parse_rotation_symbolic() {
        let output = "DisplayRotation\n  mCurrentRotation=ROTATION_90 mLastOrientation=-1\n";
        assert_eq!(parse_rotation(output).unwrap(), Rotation::Left);
    }

    #[test]
    fn test_parse_rotation_missing() {
        let err = parse_rotation("Display Devices: size=1").unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_parse_rotation_lock() {
        assert_eq!(
            parse_rotation_lock("mUserRotationMode=1 mUserRotation=0").unwrap(),
            RotationLock::Frozen
        );
        assert_eq!(
            parse_rotation_lock("mUserRotationMode=USER_ROTATION_FREE").unwrap(),
            RotationLock::Free
        );
    }

    #[test]
    fn test_parse_screen_on() {
        assert!(parse_screen_on("  mScreenOn=true\n").unwrap());
        assert!(!parse_screen_on("  mWakefulness=Asleep\n").unwrap());
        assert!(parse_screen_on("  mWakefulness=Dreaming\n").unwrap());
        assert!(parse_screen_on("nothing here").is_err());
    }

    #[test]
    fn test_parse_battery_level() {
        let output = "Current Battery Service state:\n  AC powered: false\n  level: 64\n  scale: 100\n";
        assert_eq!(parse_battery_level(output).unwrap(), 64);
        assert!(parse_battery_level("  level: 250\n").is_err());
        assert!(parse_battery_level("  scale: 100\n").is_err());
    }

    #[test]
    fn test_parse_wifi_status() {
        let output = "Wi-Fi is disabled\nStay-awake conditions: 0\n";
        assert_eq!(parse_wifi_status(output).unwrap(), WifiStatus::Disabled);
        assert!(parse_wifi_status("  Wi-Fi is connected").is_err());
    }

    #[test]
    fn test_parse_data_connection() {
        assert_eq!(
            parse_data_connection("  mServiceState=0\n  mDataConnectionState=1\n").unwrap(),
            DataConnection::Connecting
        );
        assert!(parse_data_connection("mDataConnectionState=-1").is_err());
    }

    #[test]
    fn test_parse_idle() {
        assert!(parse_idle("mAppTransitionState=APP_STATE_IDLE\nmDisplayFrozen=false"));
        assert!(!parse_idle("mAppTransitionState=APP_STATE_RUNNING"));
        assert!(!parse_idle("mDisplayFrozen=true"));
        assert!(!parse_idle("mWindowsFreezingScreen=WINDOWS_FREEZING_SCREENS_ACTIVE"));
        assert!(parse_idle("mWindowsFreezingScreen=WINDOWS_FREEZING_SCREENS_NONE"));
    }
}
