//! Metrics collection and exposition.
//!
//! # Metrics
//! - `proxy_requests_total` (counter): requests by route, status
//! - `proxy_request_duration_seconds` (histogram): latency by route
//! - `proxy_pipeline_aborts_total` (counter): aborts by pipeline, reason
//! - `proxy_rewrites_total` (counter): rewriter runs by format, outcome
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   exporter every call is a no-op
//! - The Prometheus exporter serves its own HTTP listener

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Outcome label of `proxy_rewrites_total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewriteOutcome {
    Rewritten,
    Unchanged,
    Failed,
}

impl RewriteOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            RewriteOutcome::Rewritten => "rewritten",
            RewriteOutcome::Unchanged => "unchanged",
            RewriteOutcome::Failed => "failed",
        }
    }
}

/// Install the Prometheus recorder and start its scrape listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

/// Record a finished inbound request.
pub fn record_request(route: &'static str, status: u16, start: Instant) {
    counter!("proxy_requests_total", "route" => route, "status" => status.to_string()).increment(1);
    histogram!("proxy_request_duration_seconds", "route" => route)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_pipeline_abort(pipeline: &'static str, reason: &'static str) {
    counter!("proxy_pipeline_aborts_total", "pipeline" => pipeline, "reason" => reason).increment(1);
}

pub fn record_rewrite(format: &'static str, outcome: RewriteOutcome) {
    counter!("proxy_rewrites_total", "format" => format, "outcome" => outcome.as_str()).increment(1);
}
