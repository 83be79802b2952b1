//! Rate Limit Configuration
//!
//! Limits and window lengths for the three service windows, plus the sweep
//! cadence for the background cleanup task.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default per-agent burst limit (messages per burst window)
pub const DEFAULT_BURST_LIMIT: u32 = 1;
/// Default burst window in seconds
pub const DEFAULT_BURST_WINDOW_SECS: u64 = 10;
/// Default per-agent hourly limit (messages per hourly window)
pub const DEFAULT_HOURLY_LIMIT: u32 = 50;
/// Default hourly window in seconds
pub const DEFAULT_HOURLY_WINDOW_SECS: u64 = 60 * 60;
/// Default per-IP limit for unauthenticated reads (requests per window)
pub const DEFAULT_IP_LIMIT: u32 = 60;
/// Default per-IP window in seconds
pub const DEFAULT_IP_WINDOW_SECS: u64 = 60;
/// Default interval between background sweeps in seconds
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 5 * 60;

/// Rate limit configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable rate limiting
    pub enabled: bool,

    /// Messages an agent may send per burst window
    pub burst_limit: u32,

    /// Burst window length in seconds
    pub burst_window_secs: u64,

    /// Messages an agent may send per hourly window
    pub hourly_limit: u32,

    /// Hourly window length in seconds
    pub hourly_window_secs: u64,

    /// Requests an unauthenticated IP may make per window
    pub ip_limit: u32,

    /// Per-IP window length in seconds
    pub ip_window_secs: u64,

    /// Interval between background sweeps in seconds
    pub sweep_interval_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            burst_limit: DEFAULT_BURST_LIMIT,
            burst_window_secs: DEFAULT_BURST_WINDOW_SECS,
            hourly_limit: DEFAULT_HOURLY_LIMIT,
            hourly_window_secs: DEFAULT_HOURLY_WINDOW_SECS,
            ip_limit: DEFAULT_IP_LIMIT,
            ip_window_secs: DEFAULT_IP_WINDOW_SECS,
            sweep_interval_secs: DEFAULT_SWEEP_INTERVAL_SECS,
        }
    }
}

impl RateLimitConfig {
    /// Create a new rate limit configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::default().apply_env_overrides()
    }

    /// Apply environment variable overrides to this configuration
    ///
    /// Environment variables take precedence over config file values:
    /// - AGORA_RATE_LIMIT_ENABLED
    /// - AGORA_BURST_LIMIT
    /// - AGORA_BURST_WINDOW_SECS
    /// - AGORA_HOURLY_LIMIT
    /// - AGORA_IP_LIMIT
    /// - AGORA_SWEEP_INTERVAL_SECS
    pub fn apply_env_overrides(mut self) -> Self {
        if let Ok(val) = std::env::var("AGORA_RATE_LIMIT_ENABLED") {
            self.enabled = val.parse().unwrap_or(self.enabled);
        }

        if let Ok(val) = std::env::var("AGORA_BURST_LIMIT") {
            if let Ok(limit) = val.parse() {
                self.burst_limit = limit;
            }
        }

        if let Ok(val) = std::env::var("AGORA_BURST_WINDOW_SECS") {
            if let Ok(secs) = val.parse() {
                self.burst_window_secs = secs;
            }
        }

        if let Ok(val) = std::env::var("AGORA_HOURLY_LIMIT") {
            if let Ok(limit) = val.parse() {
                self.hourly_limit = limit;
            }
        }

        if let Ok(val) = std::env::var("AGORA_IP_LIMIT") {
            if let Ok(limit) = val.parse() {
                self.ip_limit = limit;
            }
        }

        if let Ok(val) = std::env::var("AGORA_SWEEP_INTERVAL_SECS") {
            if let Ok(secs) = val.parse() {
                self.sweep_interval_secs = secs;
            }
        }

        self
    }

    /// Check the configuration for values the limiter cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.burst_limit == 0 || self.hourly_limit == 0 || self.ip_limit == 0 {
            bail!("rate limits must be at least 1");
        }
        if self.burst_window_secs == 0 || self.hourly_window_secs == 0 || self.ip_window_secs == 0 {
            bail!("rate limit windows must be at least 1 second");
        }
        if self.sweep_interval_secs == 0 {
            bail!("sweep interval must be at least 1 second");
        }
        Ok(())
    }

    /// Get the sweep interval as a duration
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    /// Disable rate limiting (for testing)
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}
