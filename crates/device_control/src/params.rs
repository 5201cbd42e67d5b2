//! Typed parameters for input actions, parsed from named string extras

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{DeviceError, Result};
use crate::gesture::{Point, PointerGesture};

/// Named string parameters as supplied by a test runner (`-e key value`)
pub type RawParams = HashMap<String, String>;

fn int_param(params: &RawParams, key: &str) -> Result<i32> {
    let raw = params
        .get(key)
        .ok_or_else(|| DeviceError::invalid(format!("Missing parameter: {}", key)))?;
    raw.trim().parse().map_err(|_| {
        DeviceError::invalid(format!("Parameter {} is not an integer: {:?}", key, raw))
    })
}

/// Parameters of a click
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClickParams {
    pub x: i32,
    pub y: i32,
}

impl ClickParams {
    pub fn from_raw(params: &RawParams) -> Result<Self> {
        Ok(Self {
            x: int_param(params, "x")?,
            y: int_param(params, "y")?,
        })
    }

    pub fn gesture(&self) -> Result<PointerGesture> {
        PointerGesture::tap(self.x, self.y)
    }
}

/// Parameters of a drag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DragParams {
    pub start_x: i32,
    pub start_y: i32,
    pub end_x: i32,
    pub end_y: i32,
    pub steps: i32,
}

impl DragParams {
    pub fn from_raw(params: &RawParams) -> Result<Self> {
        Ok(Self {
            start_x: int_param(params, "startX")?,
            start_y: int_param(params, "startY")?,
            end_x: int_param(params, "endX")?,
            end_y: int_param(params, "endY")?,
            steps: int_param(params, "steps")?,
        })
    }

    pub fn gesture(&self) -> Result<PointerGesture> {
        PointerGesture::drag(
            Point::new(self.start_x, self.start_y),
            Point::new(self.end_x, self.end_y),
            self.steps,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(pairs: &[(&str, &str)]) -> RawParams {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_click_params() {
        let params = ClickParams::from_raw(&raw(&[("x", "50"), ("y", " 100 ")])).unwrap();
        assert_eq!(params, ClickParams { x: 50, y: 100 });
    }

    #[test]
    fn test_click_params_missing_key() {
        let err = ClickParams::from_raw(&raw(&[("x", "50")])).unwrap_err();
        assert!(matches!(err, DeviceError::InvalidArgument(ref m) if m.contains("y")));
    }

    #[test]
    fn test_drag_params_not_integer() {
        let err = DragParams::from_raw(&raw(&[
            ("startX", "0"),
            ("startY", "0"),
            ("endX", "ten"),
            ("endY", "10"),
            ("steps", "5"),
        ]))
        .unwrap_err();
        assert!(matches!(err, DeviceError::InvalidArgument(ref m) if m.contains("endX")));
    }

    #[test]
    fn test_drag_params_json_keys() {
        let params: DragParams = serde_json::from_str(
            r#"{"startX": 1, "startY": 2, "endX": 3, "endY": 4, "steps": 10}"#,
        )
        .unwrap();
        assert_eq!(params.end_y, 4);
        assert_eq!(params.gesture().unwrap().steps(), 10);
    }
}
