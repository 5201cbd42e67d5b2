//! Scripted in-memory device for unit tests

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::adb::{DeviceTransport, ShellOutput};
use crate::error::{DeviceError, Result};
use crate::rotation::Rotation;

#[derive(Debug)]
struct FakeState {
    rotation: Rotation,
    auto_rotate: bool,
    screen_on: bool,
    /// Rotation and power changes waiting for the device to settle
    pending_rotation: Option<Rotation>,
    pending_screen: Option<bool>,
    /// Idle polls a requested rotation stays unapplied after the transition ends
    rotation_lag: u32,
    lag_remaining: u32,
    /// Number of idle polls that still report a running transition
    busy_polls: u32,
    /// Polls a mutation keeps the device busy for
    settle_polls: u32,
    always_busy: bool,
    hang: bool,
    lost: bool,
    /// Command prefixes the device refuses with a SecurityException
    rejected: Vec<String>,
    battery_level: u8,
    commands: Vec<String>,
}

/// Fake device; clones share state so a test keeps a handle for inspection
#[derive(Debug, Clone)]
pub struct FakeDevice {
    state: Arc<Mutex<FakeState>>,
}

impl FakeDevice {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(FakeState {
                rotation: Rotation::Natural,
                auto_rotate: true,
                screen_on: true,
                pending_rotation: None,
                pending_screen: None,
                rotation_lag: 0,
                lag_remaining: 0,
                busy_polls: 0,
                settle_polls: 1,
                always_busy: false,
                hang: false,
                lost: false,
                rejected: Vec::new(),
                battery_level: 87,
                commands: Vec::new(),
            })),
        }
    }

    pub fn with_rotation(self, rotation: Rotation) -> Self {
        self.state.lock().unwrap().rotation = rotation;
        self
    }

    pub fn with_screen_on(self, on: bool) -> Self {
        self.state.lock().unwrap().screen_on = on;
        self
    }

    /// Start with the accelerometer off, i.e. rotation locked on the device
    pub fn with_auto_rotate(self, on: bool) -> Self {
        self.state.lock().unwrap().auto_rotate = on;
        self
    }

    /// Apply requested rotations only after `polls` idle polls have passed
    pub fn with_rotation_lag(self, polls: u32) -> Self {
        self.state.lock().unwrap().rotation_lag = polls;
        self
    }

    pub fn with_battery_level(self, level: u8) -> Self {
        self.state.lock().unwrap().battery_level = level;
        self
    }

    /// Refuse every command starting with `prefix`, as a permission denial would
    pub fn reject(&self, prefix: &str) {
        self.state.lock().unwrap().rejected.push(prefix.to_string());
    }

    pub fn accept_all(&self) {
        self.state.lock().unwrap().rejected.clear();
    }

    pub fn rotation(&self) -> Rotation {
        self.state.lock().unwrap().rotation
    }

    pub fn screen_on(&self) -> bool {
        self.state.lock().unwrap().screen_on
    }

    pub fn auto_rotate(&self) -> bool {
        self.state.lock().unwrap().auto_rotate
    }

    pub fn set_always_busy(&self, busy: bool) {
        self.state.lock().unwrap().always_busy = busy;
    }

    pub fn set_hang(&self, hang: bool) {
        self.state.lock().unwrap().hang = hang;
    }

    pub fn disconnect(&self) {
        self.state.lock().unwrap().lost = true;
    }

    /// Orientation sensor reports the device turned to `rotation`
    pub fn sensor_rotation(&self, rotation: Rotation) {
        let mut state = self.state.lock().unwrap();
        if state.auto_rotate {
            state.rotation = rotation;
        }
    }

    pub fn commands(&self) -> Vec<String> {
        self.state.lock().unwrap().commands.clone()
    }

    /// Commands other than state reads
    pub fn mutations(&self) -> Vec<String> {
        self.commands()
            .into_iter()
            .filter(|c| !c.starts_with("dumpsys"))
            .collect()
    }

    pub fn clear_commands(&self) {
        self.state.lock().unwrap().commands.clear();
    }
}

impl FakeState {
    fn mutated(&mut self) {
        self.busy_polls = self.settle_polls;
    }

    fn settle(&mut self) {
        if self.pending_rotation.is_some() {
            if self.lag_remaining > 0 {
                self.lag_remaining -= 1;
            } else if let Some(rotation) = self.pending_rotation.take() {
                self.rotation = rotation;
            }
        }
        if let Some(on) = self.pending_screen.take() {
            self.screen_on = on;
        }
    }

    fn window_state(&mut self) -> String {
        let idle = if self.always_busy {
            false
        } else if self.busy_polls > 0 {
            self.busy_polls -= 1;
            false
        } else {
            self.settle();
            true
        };
        let transition = if idle {
            "APP_STATE_IDLE"
        } else {
            "APP_STATE_RUNNING"
        };
        format!(
            "WINDOW MANAGER POLICY STATE\n  mUserRotationMode={} mUserRotation={}\n  mAppTransitionState={}\n  mDisplayFrozen=false\n",
            if self.auto_rotate { 0 } else { 1 },
            self.rotation.index(),
            transition
        )
    }

    fn run(&mut self, args: &[&str]) -> ShellOutput {
        let command = args.join(" ");
        if self.rejected.iter().any(|p| command.starts_with(p.as_str())) {
            return ShellOutput::failed(format!(
                "java.lang.SecurityException: Permission denial: {}",
                command
            ));
        }

        match args {
            ["dumpsys", "display"] => ShellOutput::ok(format!(
                "DISPLAY MANAGER\n  mCurrentOrientation={}\n",
                self.rotation.index()
            )),
            ["dumpsys", "window"] => ShellOutput::ok(self.window_state()),
            ["dumpsys", "power"] => {
                ShellOutput::ok(format!("POWER MANAGER\n  mScreenOn={}\n", self.screen_on))
            }
            ["dumpsys", "battery"] => ShellOutput::ok(format!(
                "Current Battery Service state:\n  AC powered: false\n  USB powered: true\n  level: {}\n  scale: 100\n",
                self.battery_level
            )),
            ["dumpsys", "wifi"] => {
                ShellOutput::ok("Wi-Fi is enabled\nWifi is not connected\nmWifiInfo SSID: <unknown ssid>\n")
            }
            ["dumpsys", "telephony.registry"] => ShellOutput::ok(
                "last known state:\n  mServiceState=0\n  mDataConnectionState=2\n  mDataConnectionNetworkType=13\n",
            ),
            ["settings", "put", "system", "accelerometer_rotation", value] => {
                self.auto_rotate = *value == "1";
                ShellOutput::ok("")
            }
            ["settings", "put", "system", "user_rotation", value] => {
                match value.parse().ok().and_then(Rotation::from_index) {
                    Some(rotation) if !self.auto_rotate => {
                        self.pending_rotation = Some(rotation);
                        self.lag_remaining = self.rotation_lag;
                        self.mutated();
                    }
                    _ => {}
                }
                ShellOutput::ok("")
            }
            ["input", "keyevent", "KEYCODE_WAKEUP"] => {
                self.pending_screen = Some(true);
                self.mutated();
                ShellOutput::ok("")
            }
            ["input", "keyevent", "KEYCODE_SLEEP"] => {
                self.pending_screen = Some(false);
                self.mutated();
                ShellOutput::ok("")
            }
            ["input", "keyevent", "KEYCODE_BACK" | "KEYCODE_HOME"] => {
                self.mutated();
                ShellOutput::ok("")
            }
            ["input", "tap", _, _] | ["input", "swipe", _, _, _, _, _] => {
                self.mutated();
                ShellOutput::ok("")
            }
            _ => ShellOutput::failed(format!("Error: Unknown command: {}", command)),
        }
    }
}

#[async_trait]
impl DeviceTransport for FakeDevice {
    async fn shell(&self, args: &[&str]) -> Result<ShellOutput> {
        let hang = {
            let mut state = self.state.lock().unwrap();
            state.commands.push(args.join(" "));
            if state.lost {
                return Err(DeviceError::communication("error: device 'fake' not found"));
            }
            state.hang
        };
        if hang {
            std::future::pending::<()>().await;
        }
        Ok(self.state.lock().unwrap().run(args))
    }

    fn serial(&self) -> Option<&str> {
        Some("fake-0001")
    }
}
