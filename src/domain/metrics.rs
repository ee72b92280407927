use std::sync::Arc;

/// Abstraction for application metrics (counters).
pub trait Metrics: Send + Sync + 'static {
    // ---
    /// Render current metrics in Prometheus text format.
    fn render(&self) -> String;

    /// Record the outcome of one authentication attempt
    /// (`verified`, `unverified`, `legacy` or `rejected`).
    fn record_auth_attempt(&self, outcome: &'static str);

    /// Record a "user created" event.
    fn record_user_created(&self);
}

/// Type alias for any backend that implements Metrics.
pub type MetricsPtr = Arc<dyn Metrics>;
