//! Timing configuration for device operations

use std::env;
use std::time::Duration;

use crate::error::{DeviceError, Result};

fn env_f64(key: &str, default: f64) -> f64 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .filter(|v: &f64| v.is_finite() && *v >= 0.0)
        .unwrap_or(default)
}

/// Timing bounds applied by a `DeviceHandle`
///
/// Values are seconds. `Default` honours the `DEVICE_CONTROL_*` environment
/// variables so a test runner can tune a slow device without code changes.
#[derive(Debug, Clone, PartialEq)]
pub struct TimingConfig {
    /// Upper bound for `wait_for_idle`
    pub idle_timeout: f64,
    /// Delay between two idle polls
    pub idle_poll_interval: f64,
    /// Consecutive idle polls required before the device counts as settled
    pub settle_samples: u32,
    /// Upper bound for a single shell command round trip
    pub command_timeout: f64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            idle_timeout: env_f64("DEVICE_CONTROL_IDLE_TIMEOUT", 10.0),
            idle_poll_interval: env_f64("DEVICE_CONTROL_IDLE_POLL_INTERVAL", 0.2),
            settle_samples: env::var("DEVICE_CONTROL_SETTLE_SAMPLES")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|v| *v > 0)
                .unwrap_or(2),
            command_timeout: env_f64("DEVICE_CONTROL_COMMAND_TIMEOUT", 10.0),
        }
    }
}

impl TimingConfig {
    /// Create a new TimingConfig from defaults and environment overrides
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the idle-wait bound
    pub fn with_idle_timeout(mut self, secs: f64) -> Self {
        self.idle_timeout = secs;
        self
    }

    /// Set the idle poll interval
    pub fn with_idle_poll_interval(mut self, secs: f64) -> Self {
        self.idle_poll_interval = secs;
        self
    }

    /// Set the number of consecutive idle polls
    pub fn with_settle_samples(mut self, samples: u32) -> Self {
        self.settle_samples = samples.max(1);
        self
    }

    /// Set the per-command bound
    pub fn with_command_timeout(mut self, secs: f64) -> Self {
        self.command_timeout = secs;
        self
    }

    pub fn idle_timeout(&self) -> Result<Duration> {
        seconds("idle timeout", self.idle_timeout)
    }

    pub fn idle_poll_interval(&self) -> Result<Duration> {
        seconds("idle poll interval", self.idle_poll_interval)
    }

    pub fn command_timeout(&self) -> Result<Duration> {
        seconds("command timeout", self.command_timeout)
    }

    /// Check that every bound is a finite, non-negative number of seconds
    pub fn validate(&self) -> Result<()> {
        self.idle_timeout()?;
        self.idle_poll_interval()?;
        self.command_timeout()?;
        Ok(())
    }
}

fn seconds(what: &str, secs: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(secs).map_err(|_| {
        DeviceError::invalid(format!("{} must be finite and >= 0, got {}", what, secs))
    })
}
