//! Prometheus metrics for observability.
//!
//! This module provides metrics for monitoring the packlink server:
//! - HTTP request metrics (latency, counts, errors)
//! - Authentication failures
//! - Service state (collected dynamically)

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "packlink_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("packlink_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "packlink_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

/// Authentication failures.
pub static AUTH_FAILURES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "packlink_auth_failures_total",
            "Total authentication failures",
        ),
        &["reason"],
    )
    .unwrap()
});

// =============================================================================
// Service Metrics (collected dynamically)
// =============================================================================

/// Announces waiting for their parse call.
pub static PENDING_MATCH_SETS: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "packlink_pending_match_sets",
        "Number of announces with pending matches",
    )
    .unwrap()
});

/// Client listings held by the cache.
pub static LISTING_CACHE_SLOTS: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "packlink_listing_cache_slots",
        "Number of client listings in the cache",
    )
    .unwrap()
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    // HTTP
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();
    registry
        .register(Box::new(AUTH_FAILURES_TOTAL.clone()))
        .unwrap();

    // Service
    registry
        .register(Box::new(PENDING_MATCH_SETS.clone()))
        .unwrap();
    registry
        .register(Box::new(LISTING_CACHE_SLOTS.clone()))
        .unwrap();

    // Core metrics (announces, hardlinks, listing refreshes, external services)
    for metric in packlink_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}

/// Collect dynamic metrics from current application state.
pub fn collect_dynamic_metrics(state: &crate::state::AppState) {
    let service = state.service();
    PENDING_MATCH_SETS.set(service.pending().len() as i64);
    LISTING_CACHE_SLOTS.set(service.listings().len() as i64);
}
