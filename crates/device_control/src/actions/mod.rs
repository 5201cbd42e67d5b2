//! Action handling module for named device intents
//!
//! This module provides:
//! - `handler`: Action parsing and execution against a `DeviceHandle`

mod handler;

pub use handler::{ActionHandler, ActionResult, DeviceAction};
