//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Announce processing (pack and parse phases, by status code)
//! - Hardlinks
//! - Listing cache refreshes
//! - External services (download client, TVMaze)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts};

// =============================================================================
// Announce Metrics
// =============================================================================

/// Processed announces by phase and resulting status code.
pub static ANNOUNCES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("packlink_announces_total", "Total announces processed"),
        &["phase", "status"], // phase: "pack", "parse"
    )
    .unwrap()
});

/// Duration of a pack or parse request.
pub static ANNOUNCE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "packlink_announce_duration_seconds",
            "Duration of announce processing",
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["phase"],
    )
    .unwrap()
});

/// Hardlink attempts by outcome.
pub static HARDLINKS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("packlink_hardlinks_total", "Total hardlink attempts"),
        &["outcome"], // "created", "already_linked", "failed"
    )
    .unwrap()
});

// =============================================================================
// Listing Cache Metrics
// =============================================================================

/// Listing refreshes by outcome.
pub static LISTING_REFRESHES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "packlink_listing_refreshes_total",
            "Total torrent listing refreshes",
        ),
        &["outcome"], // "success", "error"
    )
    .unwrap()
});

// =============================================================================
// External Service Metrics
// =============================================================================

/// External service request duration.
pub static EXTERNAL_SERVICE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "packlink_external_service_duration_seconds",
            "Duration of external service calls",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["service", "operation"],
    )
    .unwrap()
});

/// External service requests total.
pub static EXTERNAL_SERVICE_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "packlink_external_service_requests_total",
            "Total external service requests",
        ),
        &["service", "operation", "status"], // status: "success", "error"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Record one external service call.
pub fn observe_external_call(service: &str, operation: &str, seconds: f64, success: bool) {
    EXTERNAL_SERVICE_DURATION
        .with_label_values(&[service, operation])
        .observe(seconds);
    EXTERNAL_SERVICE_REQUESTS
        .with_label_values(&[service, operation, if success { "success" } else { "error" }])
        .inc();
}

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Announces
        Box::new(ANNOUNCES_TOTAL.clone()),
        Box::new(ANNOUNCE_DURATION.clone()),
        Box::new(HARDLINKS_TOTAL.clone()),
        // Listing cache
        Box::new(LISTING_REFRESHES_TOTAL.clone()),
        // External services
        Box::new(EXTERNAL_SERVICE_DURATION.clone()),
        Box::new(EXTERNAL_SERVICE_REQUESTS.clone()),
    ]
}
