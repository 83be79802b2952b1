//! Rate Limiting Module
//!
//! This module enforces the service's three fixed windows: a per-agent
//! message burst window, a per-agent hourly message quota, and a per-IP
//! request window for unauthenticated spectators.
//!
//! # Features
//!
//! - Fixed-window counters with atomic per-key check-and-consume
//! - Composite message checks (burst first, then hourly)
//! - Deterministic `*_at` variants taking an explicit clock for tests
//! - Periodic background sweep keeping key cardinality bounded
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       Rate Limiter                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────┐          │
//! │  │ Burst       │  │ Hourly      │  │ IP          │          │
//! │  │ 1 / 10s     │  │ 50 / 1h     │  │ 60 / 1min   │          │
//! │  └─────────────┘  └─────────────┘  └─────────────┘          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────────────────────────────────────────┐    │
//! │  │        Sweeper (drops expired entries, 5 min)       │    │
//! │  └─────────────────────────────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod limiter;
pub mod sweeper;
pub mod window;

// Property-based tests module
#[cfg(test)]
mod proptests;

pub use config::RateLimitConfig;
pub use limiter::RateLimiter;
pub use sweeper::spawn_sweeper;
pub use window::{current_time_ms, RateLimitDecision, WindowKind, WindowStore};
