use anyhow::{Context, Result};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::{Mutex, OnceLock};

static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Serializes recorder installation; the global recorder can be set once.
static INIT: Mutex<()> = Mutex::new(());

/// Install the Prometheus recorder globally and store the handle.
///
/// The recorder can only be installed once per process; later or
/// concurrent calls reuse the existing handle.
pub fn init_metrics() -> Result<()> {
    // ---
    if HANDLE.get().is_some() {
        return Ok(());
    }

    let _guard = INIT.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    if HANDLE.get().is_some() {
        return Ok(());
    }

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .context("failed to install Prometheus recorder")?;

    let _ = HANDLE.set(handle);
    Ok(())
}

/// Render the current metrics in Prometheus text format.
pub fn render_metrics() -> String {
    // ---
    HANDLE.get().map(PrometheusHandle::render).unwrap_or_default()
}
