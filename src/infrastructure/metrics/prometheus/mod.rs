mod counters;
mod prometheus_metrics;
mod recorder;

pub use prometheus_metrics::PrometheusMetrics;
use std::sync::Arc;

// Re-export utilities for internal use within this module
pub(crate) use counters::{increment_auth_attempt, increment_user_created};
pub(crate) use recorder::{init_metrics, render_metrics};

/// Creates a new Prometheus metrics implementation.
///
/// This implementation collects metrics in Prometheus format and exposes
/// them via the `/metrics` endpoint for scraping.
pub fn create() -> anyhow::Result<crate::domain::MetricsPtr> {
    tracing::info!("Initializing Prometheus metrics");
    init_metrics()?;

    Ok(Arc::new(PrometheusMetrics::new()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_returns_valid_metrics() {
        let result = create();
        assert!(result.is_ok());
    }

    #[test]
    fn test_create_twice_reuses_recorder() {
        let first = create().expect("first init");
        let second = create().expect("second init");

        first.record_auth_attempt("verified");
        second.record_user_created();

        let rendered = second.render();
        assert!(rendered.contains("auth_attempts_total"), "got: {rendered}");
        assert!(rendered.contains("users_created_total"), "got: {rendered}");
    }

    #[test]
    fn test_concurrent_create_installs_once() {
        let workers: Vec<_> = (0..8).map(|_| std::thread::spawn(create)).collect();

        for worker in workers {
            let result = worker.join().expect("init thread panicked");
            assert!(result.is_ok(), "concurrent init failed: {:?}", result.err());
        }
    }
}
