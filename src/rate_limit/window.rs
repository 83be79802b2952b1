//! Fixed-Window Counters
//!
//! This module provides the fixed-window counter store underlying every
//! quota: each key maps to a count and a window expiry, and a check is an
//! atomic read-modify-write of that pair under the store's lock.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds since the Unix epoch.
///
/// Window arithmetic runs on epoch millis so expiries survive serialization
/// and compare cheaply.
pub fn current_time_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// The kinds of windows the service enforces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WindowKind {
    /// Per-agent message burst window
    MessageBurst,
    /// Per-agent hourly message window
    MessageHourly,
    /// Per-IP request window for unauthenticated reads
    IpRequests,
}

impl WindowKind {
    /// Get the default limit for this window kind
    pub fn default_limit(&self) -> u32 {
        match self {
            WindowKind::MessageBurst => 1,
            WindowKind::MessageHourly => 50,
            WindowKind::IpRequests => 60,
        }
    }

    /// Get the default window length in milliseconds
    pub fn default_window_ms(&self) -> u64 {
        match self {
            WindowKind::MessageBurst => 10 * 1000,
            WindowKind::MessageHourly => 60 * 60 * 1000,
            WindowKind::IpRequests => 60 * 1000,
        }
    }

    /// Short label used in logs and metrics
    pub fn label(&self) -> &'static str {
        match self {
            WindowKind::MessageBurst => "burst",
            WindowKind::MessageHourly => "hourly",
            WindowKind::IpRequests => "ip",
        }
    }
}

/// A single key's state inside one window store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowEntry {
    /// Actions admitted in the current window
    pub count: u32,

    /// Epoch millis at which the window expires; an entry with
    /// `resets_at_ms <= now` is logically absent
    pub resets_at_ms: u64,
}

/// Outcome of a single window check
#[derive(Debug, Clone)]
pub struct RateLimitDecision {
    /// Whether the action was admitted
    pub allowed: bool,

    /// Actions left in the window after this check
    pub remaining: u32,

    /// Epoch millis at which the window expires
    pub resets_at_ms: u64,

    /// Whole seconds until retry is worthwhile (denials only, rounded up)
    pub retry_after_secs: Option<u64>,
}

impl RateLimitDecision {
    /// Create an allowed decision
    pub fn allowed(remaining: u32, resets_at_ms: u64) -> Self {
        Self {
            allowed: true,
            remaining,
            resets_at_ms,
            retry_after_secs: None,
        }
    }

    /// Create a denied decision
    pub fn denied(resets_at_ms: u64, retry_after_secs: u64) -> Self {
        Self {
            allowed: false,
            remaining: 0,
            resets_at_ms,
            retry_after_secs: Some(retry_after_secs),
        }
    }

    /// Window expiry as a UTC timestamp for API bodies
    pub fn reset_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.resets_at_ms as i64).unwrap_or_default()
    }
}

/// Fixed-window counter store for one window kind.
///
/// Every check is a single locked read-modify-write, so two concurrent
/// checks on the same key can never both observe the same count. Denied
/// checks do not touch the entry; only the sweeper deletes entries.
#[derive(Debug)]
pub struct WindowStore {
    kind: WindowKind,
    limit: u32,
    window_ms: u64,
    entries: Mutex<HashMap<String, WindowEntry>>,
}

impl WindowStore {
    /// Create a store with the default limits for the given kind
    pub fn new(kind: WindowKind) -> Self {
        Self::with_limits(kind, kind.default_limit(), kind.default_window_ms())
    }

    /// Create a store with custom limits
    pub fn with_limits(kind: WindowKind, limit: u32, window_ms: u64) -> Self {
        Self {
            kind,
            limit,
            window_ms,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Window kind of this store
    pub fn kind(&self) -> WindowKind {
        self.kind
    }

    /// Configured limit per window
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Configured window length in milliseconds
    pub fn window_ms(&self) -> u64 {
        self.window_ms
    }

    /// Check-and-consume one action for `key` at the current wall clock
    pub fn check(&self, key: &str) -> RateLimitDecision {
        self.check_at(key, current_time_ms())
    }

    /// Check-and-consume one action for `key` at an explicit clock reading.
    ///
    /// An absent or expired entry (`resets_at_ms <= now_ms`) starts a fresh
    /// window with count 1. A full entry denies without mutating anything,
    /// so denied checks never extend a window. Otherwise the count is
    /// incremented and the action admitted.
    pub fn check_at(&self, key: &str, now_ms: u64) -> RateLimitDecision {
        let mut entries = self.entries.lock().unwrap();

        match entries.get_mut(key) {
            Some(entry) if entry.resets_at_ms > now_ms => {
                if entry.count >= self.limit {
                    let retry_after = (entry.resets_at_ms - now_ms).div_ceil(1000);
                    RateLimitDecision::denied(entry.resets_at_ms, retry_after)
                } else {
                    entry.count += 1;
                    RateLimitDecision::allowed(self.limit - entry.count, entry.resets_at_ms)
                }
            }
            _ => {
                let resets_at_ms = now_ms + self.window_ms;
                entries.insert(
                    key.to_string(),
                    WindowEntry {
                        count: 1,
                        resets_at_ms,
                    },
                );
                RateLimitDecision::allowed(self.limit.saturating_sub(1), resets_at_ms)
            }
        }
    }

    /// Remove expired entries at the current wall clock, returning how many
    /// were dropped
    pub fn sweep(&self) -> usize {
        self.sweep_at(current_time_ms())
    }

    /// Remove entries whose window expired at or before `now_ms`
    pub fn sweep_at(&self, now_ms: u64) -> usize {
        let mut entries = self.entries.lock().unwrap();
        let before = entries.len();
        entries.retain(|_, entry| entry.resets_at_ms > now_ms);
        before - entries.len()
    }

    /// Number of tracked keys, expired entries included until swept
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    /// Whether the store tracks no keys
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot a key's entry (test and diagnostic use)
    pub fn entry(&self, key: &str) -> Option<WindowEntry> {
        self.entries.lock().unwrap().get(key).copied()
    }
}
