//! Metrics collection and exposition.
//!
//! # Metrics
//! - `xmr402_decisions_total` (counter): payment decisions by outcome, reason
//! - `xmr402_sessions_active` (gauge): current client sessions
//! - `xmr402_upstream_duration_seconds` (histogram): upstream exchange latency
//! - `xmr402_verifier_duration_seconds` (histogram): refresh + proof check latency
//! - `xmr402_upstream_connect_failures_total` (counter)

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::payments::Decision;

/// Install the Prometheus exporter with an HTTP listener on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Count one payment decision.
pub fn record_decision(decision: &Decision) {
    let (outcome, reason) = match decision {
        Decision::Accepted(_) => ("accepted", "none"),
        Decision::Rejected(None) => ("rejected", "missing_credential"),
        Decision::Rejected(Some(reason)) => ("rejected", reason.code()),
    };
    counter!("xmr402_decisions_total", "outcome" => outcome, "reason" => reason).increment(1);
}

/// Set the active session gauge.
pub fn record_active_sessions(count: u64) {
    gauge!("xmr402_sessions_active").set(count as f64);
}

/// Record the duration of one upstream request/response exchange.
pub fn record_upstream_duration(start: Instant) {
    histogram!("xmr402_upstream_duration_seconds").record(start.elapsed().as_secs_f64());
}

/// Record the duration of one verifier round trip.
pub fn record_verifier_duration(start: Instant) {
    histogram!("xmr402_verifier_duration_seconds").record(start.elapsed().as_secs_f64());
}

/// Count a failed upstream connect.
pub fn record_upstream_connect_failure() {
    counter!("xmr402_upstream_connect_failures_total").increment(1);
}
