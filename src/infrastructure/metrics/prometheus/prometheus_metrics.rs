//! Prometheus metrics implementation.
//!
//! This module provides a concrete implementation of the `Metrics` trait using
//! the Prometheus metrics format. It delegates to utility functions in sibling
//! modules (`counters.rs`, `recorder.rs`) which handle the actual metrics
//! collection via the global `metrics` crate registry.

use crate::domain::Metrics;

/// Prometheus-based metrics implementation.
///
/// Empty because all counters live in the global `metrics` registry; the
/// `PrometheusHandle` kept in `recorder.rs` renders them.
pub struct PrometheusMetrics {}

impl PrometheusMetrics {
    pub fn new() -> Self {
        tracing::info!("Creating Prometheus metrics");
        PrometheusMetrics {}
    }
}

impl Metrics for PrometheusMetrics {
    fn render(&self) -> String {
        super::render_metrics()
    }

    fn record_auth_attempt(&self, outcome: &'static str) {
        tracing::debug!(outcome, "Recording authentication attempt");
        super::increment_auth_attempt(outcome);
    }

    fn record_user_created(&self) {
        tracing::debug!("Recording user created event");
        super::increment_user_created();
    }
}
