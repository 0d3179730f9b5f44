//! Prometheus metrics for the Turnate gateway
//!
//! Counts admission decisions so rejections can be told apart by cause:
//! - Rate tier rejections and live bucket counts
//! - Input screening and content-type rejections
//! - Session authentication failures
//! - Deadline expiries

use anyhow::Result;
use once_cell::sync::Lazy;
use prometheus::{
    Encoder, IntCounter, IntCounterVec, IntGaugeVec, TextEncoder, opts, register_int_counter,
    register_int_counter_vec, register_int_gauge_vec,
};

// ============================================================================
// Rate Limiting Metrics
// ============================================================================

/// Requests denied by a rate tier
pub static RATE_LIMIT_REJECTIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        opts!(
            "turnate_rate_limit_rejections_total",
            "Requests denied by a rate limit tier"
        ),
        &["tier"]
    )
    .expect("Failed to register RATE_LIMIT_REJECTIONS metric")
});

/// Buckets currently tracked per tier
pub static RATE_LIMIT_BUCKETS: Lazy<IntGaugeVec> = Lazy::new(|| {
    register_int_gauge_vec!(
        opts!(
            "turnate_rate_limit_buckets",
            "Client buckets currently held by a rate limit tier"
        ),
        &["tier"]
    )
    .expect("Failed to register RATE_LIMIT_BUCKETS metric")
});

/// Idle buckets removed by the sweep
pub static RATE_LIMIT_EVICTIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        opts!(
            "turnate_rate_limit_evictions_total",
            "Idle client buckets evicted by the sweep"
        ),
        &["tier"]
    )
    .expect("Failed to register RATE_LIMIT_EVICTIONS metric")
});

// ============================================================================
// Interceptor Metrics
// ============================================================================

/// Requests terminated by an interceptor, labelled by interceptor name
pub static INTERCEPTOR_REJECTIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        opts!(
            "turnate_interceptor_rejections_total",
            "Requests terminated by an interceptor"
        ),
        &["interceptor", "status"]
    )
    .expect("Failed to register INTERCEPTOR_REJECTIONS metric")
});

/// Requests that exceeded the deadline
pub static REQUEST_TIMEOUTS: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(opts!(
        "turnate_request_timeouts_total",
        "Requests terminated by the deadline"
    ))
    .expect("Failed to register REQUEST_TIMEOUTS metric")
});

// ============================================================================
// Authentication Metrics
// ============================================================================

/// Session authentication failures
pub static AUTH_FAILURES: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        opts!(
            "turnate_auth_failures_total",
            "Session authentication failures by reason"
        ),
        &["reason"]
    )
    .expect("Failed to register AUTH_FAILURES metric")
});

/// Failed last-seen refreshes (never fail the request)
pub static LAST_SEEN_UPDATE_FAILURES: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(opts!(
        "turnate_last_seen_update_failures_total",
        "Best-effort last-seen refreshes that failed"
    ))
    .expect("Failed to register LAST_SEEN_UPDATE_FAILURES metric")
});

/// Render all registered metrics in the Prometheus text format
pub fn gather_metrics() -> Result<String> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}
