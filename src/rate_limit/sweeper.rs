//! Background Sweep Task
//!
//! Periodically drops expired window entries so key cardinality tracks the
//! set of recently-active agents and addresses instead of growing for the
//! life of the process.

use super::limiter::RateLimiter;
use crate::metrics;
use std::sync::Arc;
use std::time::Duration;

/// Spawn the periodic sweep task for a limiter.
///
/// The sweeper is the only deleter of window entries; checks themselves
/// never remove anything. An interleaved check can re-create a key right
/// after it was swept, which the next pass picks up.
pub fn spawn_sweeper(limiter: Arc<RateLimiter>, interval: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick fires immediately and sweeps an empty store
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            let removed = limiter.sweep();
            if removed > 0 {
                metrics::SWEEP_REMOVALS_TOTAL.inc_by(removed as u64);
                tracing::debug!(
                    removed,
                    tracked = limiter.tracked_keys(),
                    "swept expired rate limit entries"
                );
            }
        }
    })
}
