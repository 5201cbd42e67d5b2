//! Pointer gestures for coordinate-based input injection

use serde::{Deserialize, Serialize};

use crate::error::{DeviceError, Result};

/// Time the device-side injector spends on each interpolation step
pub const STEP_DURATION_MS: u32 = 5;

/// Screen coordinate in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    fn validate(self) -> Result<Self> {
        if self.x < 0 || self.y < 0 {
            return Err(DeviceError::invalid(format!(
                "Coordinates must be non-negative, got ({}, {})",
                self.x, self.y
            )));
        }
        Ok(self)
    }
}

/// A validated tap or drag
///
/// Construction is the only place coordinates and step counts are checked,
/// so a `PointerGesture` that exists is always safe to dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointerGesture {
    points: Vec<Point>,
    steps: u32,
}

impl PointerGesture {
    /// Single-point tap
    pub fn tap(x: i32, y: i32) -> Result<Self> {
        let point = Point::new(x, y).validate()?;
        Ok(Self {
            points: vec![point],
            steps: 0,
        })
    }

    /// Drag between two endpoints over `steps` interpolation steps
    pub fn drag(start: Point, end: Point, steps: i32) -> Result<Self> {
        if steps < 1 {
            return Err(DeviceError::invalid(format!(
                "Drag steps must be >= 1, got {}",
                steps
            )));
        }
        let start = start.validate()?;
        let end = end.validate()?;
        Ok(Self {
            points: vec![start, end],
            steps: steps as u32,
        })
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn steps(&self) -> u32 {
        self.steps
    }

    pub fn is_tap(&self) -> bool {
        self.points.len() == 1
    }

    pub fn start(&self) -> Point {
        self.points[0]
    }

    pub fn end(&self) -> Point {
        self.points[self.points.len() - 1]
    }

    /// Total injection time on the device
    pub fn duration_ms(&self) -> u32 {
        self.steps.saturating_mul(STEP_DURATION_MS)
    }

    /// Every pointer position the gesture passes through, endpoints included
    pub fn interpolate(&self) -> Vec<Point> {
        if self.is_tap() {
            return self.points.clone();
        }

        let (start, end) = (self.start(), self.end());
        let steps = self.steps as i64;
        let dx = (end.x - start.x) as i64;
        let dy = (end.y - start.y) as i64;

        (0..=steps)
            .map(|i| {
                Point::new(
                    start.x + (dx * i / steps) as i32,
                    start.y + (dy * i / steps) as i32,
                )
            })
            .collect()
    }
}
