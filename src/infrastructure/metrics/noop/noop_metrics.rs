use crate::domain::Metrics;

/// No-op metrics implementation for testing.
pub struct NoopMetrics;

impl Metrics for NoopMetrics {
    // ---
    fn render(&self) -> String {
        String::new()
    }
    fn record_auth_attempt(&self, _: &'static str) {}
    fn record_user_created(&self) {}
}
