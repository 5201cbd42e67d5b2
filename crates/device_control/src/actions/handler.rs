//! Named device actions and their execution against a DeviceHandle

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::adb::DeviceTransport;
use crate::error::{DeviceError, Result};
use crate::handle::DeviceHandle;
use crate::params::{ClickParams, DragParams, RawParams};
use crate::rotation::Rotation;

/// One device intent, as named by instrumentation test methods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum DeviceAction {
    /// Apply the opposite-rotation quirk to the current rotation
    ChangeOrientation,
    /// Rotate so the right side is down
    ChangeRightDown,
    /// Rotate so the left side is down
    ChangeLeftDown,
    FreezeRotation,
    UnfreezeRotation,
    ToggleScreen,
    PressBack,
    PressHome,
    Click(ClickParams),
    Drag(DragParams),
}

impl DeviceAction {
    /// Build an action from a method name and its string extras
    ///
    /// Accepts names with or without the `test` prefix, e.g. `testDrag` and
    /// `Drag`. Parameters are validated here, before any device call.
    pub fn parse(method: &str, params: &RawParams) -> Result<Self> {
        let name = method.trim();
        let name = name.strip_prefix("test").unwrap_or(name);

        let action = match name {
            "ChangeOrientation" => Self::ChangeOrientation,
            "ChangeRightDown" => Self::ChangeRightDown,
            "ChangeLeftDown" => Self::ChangeLeftDown,
            "FreezeRotation" => Self::FreezeRotation,
            "UnfreezeRotation" => Self::UnfreezeRotation,
            "ToggleScreen" => Self::ToggleScreen,
            "PressBack" => Self::PressBack,
            "PressHome" => Self::PressHome,
            "Click" => {
                let params = ClickParams::from_raw(params)?;
                params.gesture()?;
                Self::Click(params)
            }
            "Drag" => {
                let params = DragParams::from_raw(params)?;
                params.gesture()?;
                Self::Drag(params)
            }
            _ => {
                return Err(DeviceError::invalid(format!(
                    "Unknown action: {}",
                    method
                )))
            }
        };
        Ok(action)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::ChangeOrientation => "ChangeOrientation",
            Self::ChangeRightDown => "ChangeRightDown",
            Self::ChangeLeftDown => "ChangeLeftDown",
            Self::FreezeRotation => "FreezeRotation",
            Self::UnfreezeRotation => "UnfreezeRotation",
            Self::ToggleScreen => "ToggleScreen",
            Self::PressBack => "PressBack",
            Self::PressHome => "PressHome",
            Self::Click(_) => "Click",
            Self::Drag(_) => "Drag",
        }
    }
}

/// Outcome of an executed action
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionResult {
    /// The device accepted the action
    pub success: bool,
    /// Observed device state differs from before the action
    pub changed: bool,
    pub message: Option<String>,
}

impl ActionResult {
    pub fn success(changed: bool) -> Self {
        Self {
            success: true,
            changed,
            message: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            changed: false,
            message: Some(message.into()),
        }
    }

    fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Executes actions on an injected device handle
pub struct ActionHandler<'a, T: DeviceTransport> {
    device: &'a DeviceHandle<T>,
}

impl<'a, T: DeviceTransport> ActionHandler<'a, T> {
    pub fn new(device: &'a DeviceHandle<T>) -> Self {
        Self { device }
    }

    /// Run `action` and wait for the device to settle when it changes state
    ///
    /// Device errors propagate; a rejected input event is reported as an
    /// unsuccessful result instead.
    pub async fn execute(&self, action: &DeviceAction) -> Result<ActionResult> {
        info!("Executing {}", action.name());

        let result = match action {
            DeviceAction::ChangeOrientation => {
                let changed = self.device.rotate_opposite().await?;
                let now = self.device.rotation().await?;
                ActionResult::success(changed).with_message(format!("rotation: {}", now))
            }
            DeviceAction::ChangeRightDown => self.rotate_to(Rotation::Right).await?,
            DeviceAction::ChangeLeftDown => self.rotate_to(Rotation::Left).await?,
            DeviceAction::FreezeRotation => self.lock(true).await?,
            DeviceAction::UnfreezeRotation => self.lock(false).await?,
            DeviceAction::ToggleScreen => {
                let before = self.device.is_powered_on().await?;
                self.device.toggle_power().await?;
                self.device.wait_for_idle().await?;
                let after = self.device.is_powered_on().await?;
                ActionResult::success(before != after)
                    .with_message(format!("screen on: {}", after))
            }
            DeviceAction::PressBack => Self::dispatched(self.device.press_back().await?),
            DeviceAction::PressHome => Self::dispatched(self.device.press_home().await?),
            DeviceAction::Click(p) => Self::dispatched(self.device.click(p.x, p.y).await?),
            DeviceAction::Drag(p) => Self::dispatched(
                self.device
                    .drag(p.start_x, p.start_y, p.end_x, p.end_y, p.steps)
                    .await?,
            ),
        };

        Ok(result)
    }

    async fn rotate_to(&self, target: Rotation) -> Result<ActionResult> {
        let before = self.device.rotation().await?;
        self.device.set_rotation(target).await?;
        self.device.wait_for_idle().await?;
        let after = self.device.rotation().await?;
        Ok(ActionResult::success(before != after).with_message(format!("rotation: {}", after)))
    }

    async fn lock(&self, locked: bool) -> Result<ActionResult> {
        let before = self.device.rotation_lock().await?;
        self.device.set_rotation_lock(locked).await?;
        self.device.wait_for_idle().await?;
        let after = self.device.rotation_lock().await?;
        Ok(ActionResult::success(before != after)
            .with_message(format!("rotation lock: {}", after)))
    }

    fn dispatched(accepted: bool) -> ActionResult {
        if accepted {
            ActionResult::success(true)
        } else {
            ActionResult::failure("Device did not accept the input event")
        }
    }
}
