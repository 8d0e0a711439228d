//! Metrics collection and exposition.
//!
//! # Metrics
//! - `vault_requests_total` (counter): HTTP requests by method, status
//! - `vault_request_duration_seconds` (histogram): request latency
//! - `vault_errors_total` (counter): errors recorded by the monitor
//! - `vault_transitions_total` (counter): vault stage transitions by target stage
//! - `vault_timer_resets_total` (counter): countdown resets
//!
//! # Design Decisions
//! - The monitor's own atomic counters stay authoritative for `/health`;
//!   these are a mirror for Prometheus scraping
//! - Without an installed recorder every call here is a no-op

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Install the global Prometheus recorder and return its render handle.
pub fn install_recorder() -> Option<PrometheusHandle> {
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            tracing::info!("Prometheus recorder installed");
            Some(handle)
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to install Prometheus recorder");
            None
        }
    }
}

pub fn record_request(method: &str, status: u16, elapsed: Duration) {
    counter!(
        "vault_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("vault_request_duration_seconds", "method" => method.to_string())
        .record(elapsed.as_secs_f64());
}

pub fn record_error() {
    counter!("vault_errors_total").increment(1);
}

pub fn record_transition(to: &'static str) {
    counter!("vault_transitions_total", "to" => to).increment(1);
}

pub fn record_timer_reset() {
    counter!("vault_timer_resets_total").increment(1);
}
