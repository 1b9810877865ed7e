use metrics::{counter, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus exporter and register all application metrics.
/// Returns a `PrometheusHandle` whose `render()` method produces the
/// text/plain Prometheus scrape payload.
pub fn init_metrics() -> anyhow::Result<PrometheusHandle> {
    let builder = PrometheusBuilder::new();
    let handle = builder
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("failed to install Prometheus recorder: {e}"))?;

    // Pre-register counters so they appear even before the first increment.
    counter!("positions_synced_total").absolute(0);
    counter!("orders_synced_total").absolute(0);
    counter!("orders_resolved_total").absolute(0);
    counter!("stop_loss_triggered_total").absolute(0);
    counter!("stop_loss_failed_total").absolute(0);

    // Pre-register gauges at zero.
    gauge!("active_stop_losses").set(0.0);

    Ok(handle)
}
