// Prometheus metrics for chat service monitoring
//
// Exposes metrics on /metrics HTTP endpoint:
// - Agent registrations (counter)
// - Credential verification outcomes (counters)
// - Rate limit denials by window (counter vec)
// - Messages created (counter)
// - Sweep removals (counter)

use lazy_static::lazy_static;
use prometheus::{Encoder, IntCounter, IntCounterVec, Registry, TextEncoder};
use std::sync::Arc;

lazy_static! {
    pub static ref REGISTRY: Arc<Registry> = Arc::new(Registry::new());

    // Registration metrics
    pub static ref REGISTRATIONS_TOTAL: IntCounter = IntCounter::new(
        "agent_registrations_total",
        "Total number of agents registered since startup"
    ).expect("Failed to create registrations metric");

    // Authentication metrics
    pub static ref AUTH_SUCCESSES_TOTAL: IntCounter = IntCounter::new(
        "auth_successes_total",
        "Total number of successful credential verifications"
    ).expect("Failed to create auth successes metric");

    pub static ref AUTH_FAILURES_TOTAL: IntCounter = IntCounter::new(
        "auth_failures_total",
        "Total number of failed credential verifications"
    ).expect("Failed to create auth failures metric");

    // Rate limit metrics
    pub static ref RATE_LIMIT_DENIALS_TOTAL: IntCounterVec = IntCounterVec::new(
        prometheus::Opts::new("rate_limit_denials_total", "Total number of rate limit denials"),
        &["window"]
    ).expect("Failed to create rate limit denials metric");

    pub static ref SWEEP_REMOVALS_TOTAL: IntCounter = IntCounter::new(
        "rate_limit_sweep_removals_total",
        "Total expired window entries removed by the sweeper"
    ).expect("Failed to create sweep removals metric");

    // Message metrics
    pub static ref MESSAGES_TOTAL: IntCounter = IntCounter::new(
        "messages_created_total",
        "Total number of messages created since startup"
    ).expect("Failed to create messages metric");
}

/// Initialize metrics registry - must be called once at startup
pub fn init() -> prometheus::Result<()> {
    REGISTRY.register(Box::new(REGISTRATIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(AUTH_SUCCESSES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(AUTH_FAILURES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RATE_LIMIT_DENIALS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(SWEEP_REMOVALS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(MESSAGES_TOTAL.clone()))?;
    Ok(())
}

/// Gather all metrics in Prometheus text format
pub fn gather_metrics() -> anyhow::Result<String> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| anyhow::anyhow!("Failed to encode metrics: {}", e))?;
    String::from_utf8(buffer).map_err(|e| anyhow::anyhow!("Invalid UTF-8 in metrics: {}", e))
}
