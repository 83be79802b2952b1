//! Rate Limiter
//!
//! Central manager for the three fixed windows: per-agent message burst,
//! per-agent hourly message quota, and per-IP request rate for
//! unauthenticated reads.

use super::config::RateLimitConfig;
use super::window::{current_time_ms, RateLimitDecision, WindowKind, WindowStore};
use crate::metrics;

/// Rate limiter over the three service windows.
///
/// Checks are synchronous; each underlying store serializes its own keys.
/// A message send consumes burst first, then hourly, so a burst denial
/// never spends hourly quota.
#[derive(Debug)]
pub struct RateLimiter {
    /// Whether checks are enforced at all
    enabled: bool,

    /// Per-agent burst window
    burst: WindowStore,

    /// Per-agent hourly window
    hourly: WindowStore,

    /// Per-IP window for unauthenticated reads
    ip: WindowStore,
}

impl RateLimiter {
    /// Create a rate limiter from configuration
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            enabled: config.enabled,
            burst: WindowStore::with_limits(
                WindowKind::MessageBurst,
                config.burst_limit,
                config.burst_window_secs * 1000,
            ),
            hourly: WindowStore::with_limits(
                WindowKind::MessageHourly,
                config.hourly_limit,
                config.hourly_window_secs * 1000,
            ),
            ip: WindowStore::with_limits(
                WindowKind::IpRequests,
                config.ip_limit,
                config.ip_window_secs * 1000,
            ),
        }
    }

    /// Create with default configuration
    pub fn default_config() -> Self {
        Self::new(&RateLimitConfig::default())
    }

    /// Create a disabled rate limiter (for testing)
    pub fn disabled() -> Self {
        Self::new(&RateLimitConfig::disabled())
    }

    /// Check whether an agent may send a message right now
    pub fn check_message(&self, agent_id: &str) -> RateLimitDecision {
        self.check_message_at(agent_id, current_time_ms())
    }

    /// Check whether an agent may send a message at an explicit clock reading.
    ///
    /// The burst window is consumed first; a burst denial returns without
    /// touching the hourly window. When both windows admit, the reported
    /// decision is whichever has fewer actions remaining, so callers always
    /// see their tightest constraint.
    pub fn check_message_at(&self, agent_id: &str, now_ms: u64) -> RateLimitDecision {
        if !self.enabled {
            return RateLimitDecision::allowed(u32::MAX, now_ms);
        }

        let burst = self.burst.check_at(agent_id, now_ms);
        if !burst.allowed {
            tracing::debug!(agent_id, retry_after = ?burst.retry_after_secs, "burst window denied message");
            metrics::RATE_LIMIT_DENIALS_TOTAL
                .with_label_values(&[WindowKind::MessageBurst.label()])
                .inc();
            return burst;
        }

        let hourly = self.hourly.check_at(agent_id, now_ms);
        if !hourly.allowed {
            tracing::debug!(agent_id, retry_after = ?hourly.retry_after_secs, "hourly window denied message");
            metrics::RATE_LIMIT_DENIALS_TOTAL
                .with_label_values(&[WindowKind::MessageHourly.label()])
                .inc();
            return hourly;
        }

        if burst.remaining < hourly.remaining {
            burst
        } else {
            hourly
        }
    }

    /// Check whether an unauthenticated caller at `ip` may read right now
    pub fn check_ip(&self, ip: &str) -> RateLimitDecision {
        self.check_ip_at(ip, current_time_ms())
    }

    /// Check the per-IP window at an explicit clock reading
    pub fn check_ip_at(&self, ip: &str, now_ms: u64) -> RateLimitDecision {
        if !self.enabled {
            return RateLimitDecision::allowed(u32::MAX, now_ms);
        }

        let decision = self.ip.check_at(ip, now_ms);
        if !decision.allowed {
            tracing::debug!(ip, retry_after = ?decision.retry_after_secs, "ip window denied request");
            metrics::RATE_LIMIT_DENIALS_TOTAL
                .with_label_values(&[WindowKind::IpRequests.label()])
                .inc();
        }
        decision
    }

    /// Drop expired entries from every window at the current wall clock
    pub fn sweep(&self) -> usize {
        self.sweep_at(current_time_ms())
    }

    /// Drop expired entries from every window at an explicit clock reading
    pub fn sweep_at(&self, now_ms: u64) -> usize {
        self.burst.sweep_at(now_ms) + self.hourly.sweep_at(now_ms) + self.ip.sweep_at(now_ms)
    }

    /// Total keys currently tracked across all windows
    pub fn tracked_keys(&self) -> usize {
        self.burst.len() + self.hourly.len() + self.ip.len()
    }
}
