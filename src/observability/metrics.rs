//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Install the Prometheus exporter on its own listener
//! - Record publish outcomes and HTTP traffic
//! - Publish the agent gauges computed by the sampler
//!
//! # Metrics
//! - `flecto_agents_online` (gauge): agents seen within the offline threshold, by namespace, project
//! - `flecto_agents_errors` (gauge): of those, agents reporting ERROR
//! - `flecto_publish_total` (counter): publish attempts by outcome
//! - `flecto_http_requests_total` (counter): requests by method, status
//! - `flecto_http_request_duration_seconds` (histogram): handler latency
//!
//! # Design Decisions
//! - Every tick writes both agent gauges for each sampled project and
//!   zeroes the ones that left the sample; zeroed series then idle out
//!   after two sample intervals
//! - Recording before the exporter is installed is a no-op

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use metrics_util::MetricKindMask;

pub const AGENTS_ONLINE: &str = "flecto_agents_online";
pub const AGENTS_ERRORS: &str = "flecto_agents_errors";
pub const PUBLISH_TOTAL: &str = "flecto_publish_total";
pub const HTTP_REQUESTS_TOTAL: &str = "flecto_http_requests_total";
pub const HTTP_REQUEST_DURATION: &str = "flecto_http_request_duration_seconds";

/// Install the global recorder and start the scrape listener on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr, sample_interval: Duration) -> Result<(), BuildError> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .idle_timeout(MetricKindMask::GAUGE, Some(sample_interval * 2))
        .install()?;
    tracing::info!(address = %addr, "metrics exporter listening");
    Ok(())
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    counter!(
        HTTP_REQUESTS_TOTAL,
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!(HTTP_REQUEST_DURATION, "method" => method.to_string())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_publish(outcome: &'static str) {
    counter!(PUBLISH_TOTAL, "outcome" => outcome).increment(1);
}

pub fn set_agents_online(namespace: &str, project: &str, online: u64) {
    gauge!(
        AGENTS_ONLINE,
        "namespace" => namespace.to_string(),
        "project" => project.to_string()
    )
    .set(online as f64);
}

pub fn set_agents_errors(namespace: &str, project: &str, errors: u64) {
    gauge!(
        AGENTS_ERRORS,
        "namespace" => namespace.to_string(),
        "project" => project.to_string()
    )
    .set(errors as f64);
}
