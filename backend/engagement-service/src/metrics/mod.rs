//! Prometheus metrics for engagement-service.
//!
//! Exposes upstream and view-cache collectors and an HTTP handler for the `/metrics` endpoint.

use actix_web::HttpResponse;
use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, Encoder, HistogramVec, IntCounterVec,
    TextEncoder,
};
use std::time::Duration;

lazy_static! {
    /// Evaluation-service calls by resource (users, posts, comments) and outcome.
    pub static ref UPSTREAM_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "upstream_requests_total",
        "Evaluation service requests segmented by resource and outcome",
        &["resource", "outcome"]
    )
    .expect("failed to register upstream_requests_total");

    /// View cache events (hit/miss) per entry.
    pub static ref VIEW_CACHE_EVENTS: IntCounterVec = register_int_counter_vec!(
        "view_cache_events_total",
        "View cache lookups segmented by entry and outcome",
        &["entry", "event"]
    )
    .expect("failed to register view_cache_events_total");

    pub static ref VIEW_COMPUTE_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "view_compute_duration_seconds",
        "Time spent recomputing a cache entry from upstream data",
        &["entry"],
        vec![0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 10.0, 30.0, 60.0]
    )
    .expect("failed to register view_compute_duration_seconds");
}

pub fn record_upstream_request(resource: &str, outcome: &str) {
    UPSTREAM_REQUESTS_TOTAL
        .with_label_values(&[resource, outcome])
        .inc();
}

pub fn record_cache_event(entry: &str, event: &str) {
    VIEW_CACHE_EVENTS.with_label_values(&[entry, event]).inc();
}

pub fn observe_compute_duration(entry: &str, duration: Duration) {
    VIEW_COMPUTE_DURATION_SECONDS
        .with_label_values(&[entry])
        .observe(duration.as_secs_f64());
}

/// Actix handler that renders Prometheus metrics in text format.
pub async fn serve_metrics() -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        return HttpResponse::InternalServerError().body(err.to_string());
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}
