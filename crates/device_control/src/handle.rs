//! DeviceHandle: rotation, power and input injection on one device

use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::adb::{dumpsys, AdbTransport, DeviceTransport, ShellOutput};
use crate::config::TimingConfig;
use crate::error::{DeviceError, Result};
use crate::gesture::{Point, PointerGesture};
use crate::rotation::{Rotation, RotationLock};
use crate::status::{DataConnection, WifiStatus};

/// Mutable state the handle keeps between calls
#[derive(Debug, Default)]
struct Snapshot {
    lock: RotationLock,
    last_requested: Option<Rotation>,
    /// Requested rotation the device has not shown yet
    pending: Option<Rotation>,
}

/// Live proxy for one connected device
///
/// Mutating operations return once the request is dispatched; call
/// [`DeviceHandle::wait_for_idle`] before reading state back. The handle is
/// created by the caller and passed to whatever needs it; it owns no device
/// resources and has no teardown.
pub struct DeviceHandle<T: DeviceTransport = AdbTransport> {
    transport: T,
    config: TimingConfig,
    snapshot: Mutex<Snapshot>,
}

impl DeviceHandle<AdbTransport> {
    /// Handle for `serial` (or the only attached device) over adb
    ///
    /// Fails with [`DeviceError::InvalidArgument`] if a timing bound is not a
    /// valid number of seconds.
    pub fn adb(serial: Option<String>, config: TimingConfig) -> Result<Self> {
        config.validate()?;
        let transport = AdbTransport::new(serial).with_command_timeout(config.command_timeout()?);
        Ok(Self::with_config(transport, config))
    }
}

impl<T: DeviceTransport> DeviceHandle<T> {
    /// Create a handle with timing from the environment
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, TimingConfig::default())
    }

    pub fn with_config(transport: T, config: TimingConfig) -> Self {
        Self {
            transport,
            config,
            snapshot: Mutex::new(Snapshot::default()),
        }
    }

    pub fn serial(&self) -> Option<&str> {
        self.transport.serial()
    }

    async fn shell(&self, args: &[&str]) -> Result<ShellOutput> {
        self.transport.shell(args).await
    }

    async fn keyevent(&self, keycode: &str) -> Result<bool> {
        let out = self.shell(&["input", "keyevent", keycode]).await?;
        Ok(out.dispatched())
    }

    async fn settings_put(&self, key: &str, value: &str) -> Result<()> {
        let out = self
            .shell(&["settings", "put", "system", key, value])
            .await?;
        if !out.dispatched() {
            return Err(DeviceError::communication(format!(
                "Device refused to set {}={}: {}",
                key,
                value,
                out.output.trim()
            )));
        }
        Ok(())
    }

    // Rotation

    /// Current display rotation
    pub async fn rotation(&self) -> Result<Rotation> {
        let out = self.shell(&["dumpsys", "display"]).await?;
        let rotation = dumpsys::parse_rotation(&out.output)?;
        debug!("Current rotation: {}", rotation);
        Ok(rotation)
    }

    /// Request `target`; no-op when already there or while rotation is frozen
    pub async fn set_rotation(&self, target: Rotation) -> Result<()> {
        let mut snapshot = self.snapshot.lock().await;

        if snapshot.lock.is_frozen() {
            warn!("Rotation is frozen, ignoring request for {}", target);
            return Ok(());
        }

        let current = self.rotation().await?;
        if current == target {
            debug!("Already at {}, nothing to do", target);
            return Ok(());
        }

        info!("Rotating {} -> {}", current, target);
        // user_rotation only takes effect with the accelerometer off
        self.settings_put("accelerometer_rotation", "0").await?;
        self.settings_put("user_rotation", &target.index().to_string())
            .await?;

        snapshot.last_requested = Some(target);
        snapshot.pending = Some(target);
        Ok(())
    }

    /// Request the target given by [`Rotation::opposite_quirk`] and return it
    pub async fn set_rotation_opposite(&self, current: Rotation) -> Result<Rotation> {
        let target = current.opposite_quirk();
        self.set_rotation(target).await?;
        Ok(target)
    }

    /// Flip to the quirk target of the current rotation and report whether
    /// the observed rotation changed once the device settled
    pub async fn rotate_opposite(&self) -> Result<bool> {
        let before = self.rotation().await?;
        self.set_rotation_opposite(before).await?;
        self.wait_for_idle().await?;
        let after = self.rotation().await?;
        Ok(before != after)
    }

    /// Most recent rotation this handle dispatched to the device
    pub async fn last_requested_rotation(&self) -> Option<Rotation> {
        self.snapshot.lock().await.last_requested
    }

    /// Freeze or release rotation for subsequent requests
    ///
    /// The lock that gates [`DeviceHandle::set_rotation`] belongs to this
    /// handle and starts out free, whatever the device reports. The device's
    /// own mode is read with [`DeviceHandle::rotation_lock`]; it also shows
    /// frozen after `set_rotation` pins a rotation, while the handle lock
    /// stays free.
    pub async fn set_rotation_lock(&self, locked: bool) -> Result<()> {
        let mut snapshot = self.snapshot.lock().await;
        let value = if locked { "0" } else { "1" };
        self.settings_put("accelerometer_rotation", value).await?;
        snapshot.lock = RotationLock::from_locked(locked);
        if !locked {
            // user_rotation is ignored once the sensor drives rotation again
            snapshot.pending = None;
        }
        info!("Rotation lock: {}", snapshot.lock);
        Ok(())
    }

    /// Rotation mode as reported by the device
    pub async fn rotation_lock(&self) -> Result<RotationLock> {
        let out = self.shell(&["dumpsys", "window"]).await?;
        dumpsys::parse_rotation_lock(&out.output)
    }

    // Power

    pub async fn is_powered_on(&self) -> Result<bool> {
        let out = self.shell(&["dumpsys", "power"]).await?;
        dumpsys::parse_screen_on(&out.output)
    }

    /// Wake or sleep the device; no-op when already in the requested state
    pub async fn set_power(&self, on: bool) -> Result<()> {
        if self.is_powered_on().await? == on {
            debug!("Screen already {}", if on { "on" } else { "off" });
            return Ok(());
        }

        let keycode = if on { "KEYCODE_WAKEUP" } else { "KEYCODE_SLEEP" };
        info!("Sending {}", keycode);
        if !self.keyevent(keycode).await? {
            return Err(DeviceError::communication(format!(
                "Device rejected {}",
                keycode
            )));
        }
        Ok(())
    }

    /// Invert the power state; returns the requested state
    pub async fn toggle_power(&self) -> Result<bool> {
        let target = !self.is_powered_on().await?;
        self.set_power(target).await?;
        Ok(target)
    }

    // Status

    /// Remaining battery percentage
    pub async fn battery_level(&self) -> Result<u8> {
        let out = self.shell(&["dumpsys", "battery"]).await?;
        dumpsys::parse_battery_level(&out.output)
    }

    pub async fn wifi_status(&self) -> Result<WifiStatus> {
        let out = self.shell(&["dumpsys", "wifi"]).await?;
        dumpsys::parse_wifi_status(&out.output)
    }

    /// Cellular data connection state
    pub async fn data_connection(&self) -> Result<DataConnection> {
        let out = self.shell(&["dumpsys", "telephony.registry"]).await?;
        dumpsys::parse_data_connection(&out.output)
    }

    // Input

    pub async fn press_back(&self) -> Result<bool> {
        self.keyevent("KEYCODE_BACK").await
    }

    pub async fn press_home(&self) -> Result<bool> {
        self.keyevent("KEYCODE_HOME").await
    }

    /// Tap at (x, y)
    pub async fn click(&self, x: i32, y: i32) -> Result<bool> {
        let gesture = PointerGesture::tap(x, y)?;
        self.dispatch(&gesture).await
    }

    /// Drag from (x0, y0) to (x1, y1) over `steps` interpolation steps
    pub async fn drag(&self, x0: i32, y0: i32, x1: i32, y1: i32, steps: i32) -> Result<bool> {
        let gesture = PointerGesture::drag(Point::new(x0, y0), Point::new(x1, y1), steps)?;
        self.dispatch(&gesture).await
    }

    /// Inject a validated gesture
    pub async fn dispatch(&self, gesture: &PointerGesture) -> Result<bool> {
        let start = gesture.start();
        let out = if gesture.is_tap() {
            debug!("Tap at ({}, {})", start.x, start.y);
            self.shell(&["input", "tap", &start.x.to_string(), &start.y.to_string()])
                .await?
        } else {
            let end = gesture.end();
            debug!(
                "Drag ({}, {}) -> ({}, {}) in {} steps",
                start.x,
                start.y,
                end.x,
                end.y,
                gesture.steps()
            );
            self.shell(&[
                "input",
                "swipe",
                &start.x.to_string(),
                &start.y.to_string(),
                &end.x.to_string(),
                &end.y.to_string(),
                &gesture.duration_ms().to_string(),
            ])
            .await?
        };
        Ok(out.dispatched())
    }

    // Settling

    /// Block until the device reports no pending transitions
    ///
    /// The device must look idle on `settle_samples` consecutive polls, and
    /// show the last requested rotation if one is still outstanding. Fails
    /// with [`DeviceError::Timeout`] once `idle_timeout` has elapsed.
    pub async fn wait_for_idle(&self) -> Result<()> {
        let bound = self.config.idle_timeout()?;
        let interval = self.config.idle_poll_interval()?;
        match tokio::time::timeout(bound, self.poll_until_idle(interval)).await {
            Ok(result) => result,
            Err(_) => Err(DeviceError::Timeout(format!(
                "Device not idle after {:?}",
                bound
            ))),
        }
    }

    async fn poll_until_idle(&self, interval: Duration) -> Result<()> {
        let samples = self.config.settle_samples.max(1);
        let mut streak = 0;

        loop {
            let out = self.shell(&["dumpsys", "window"]).await?;
            if dumpsys::parse_idle(&out.output) && self.rotation_applied().await? {
                streak += 1;
                if streak >= samples {
                    debug!("Device idle after {} consecutive polls", streak);
                    return Ok(());
                }
            } else {
                streak = 0;
            }
            tokio::time::sleep(interval).await;
        }
    }

    /// Whether the outstanding rotation request, if any, is on screen
    async fn rotation_applied(&self) -> Result<bool> {
        let pending = self.snapshot.lock().await.pending;
        let Some(target) = pending else {
            return Ok(true);
        };

        let current = self.rotation().await?;
        if current != target {
            debug!("Waiting for rotation {} (now {})", target, current);
            return Ok(false);
        }
        self.snapshot.lock().await.pending = None;
        Ok(true)
    }
}
