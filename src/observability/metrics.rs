//! Metrics collection and exposition.
//!
//! # Metrics
//! - `router_ticks_total` (counter): reconcile ticks by `outcome`
//!   (`unchanged`, `applied`, `synthesis_failed`, `apply_failed`)
//! - `router_apps` (gauge): routable apps in the last synthesized snapshot
//! - `router_apply_failures_total` (counter): failed applies by `stage`
//!
//! # Design Decisions
//! - The exporter is opt-in; without it the macros record into a no-op recorder
//! - Labels are static strings, so cardinality is fixed

use std::net::SocketAddr;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and serve `/metrics` on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_tick(outcome: &'static str) {
    metrics::counter!("router_ticks_total", "outcome" => outcome).increment(1);
}

pub fn record_apps(count: usize) {
    metrics::gauge!("router_apps").set(count as f64);
}

pub fn record_apply_failure(stage: &'static str) {
    metrics::counter!("router_apply_failures_total", "stage" => stage).increment(1);
}
