//! Prometheus wiring: HTTP middleware plus the booking counters sharing its
//! registry.

use std::sync::Arc;

use actix_web_prom::{PrometheusMetrics, PrometheusMetricsBuilder};
use parkspot::domain::ports::BookingMetrics;
use parkspot::outbound::metrics::PrometheusBookingMetrics;

/// Middleware exporting request metrics on `/metrics`.
pub(crate) fn build_prometheus() -> std::io::Result<PrometheusMetrics> {
    PrometheusMetricsBuilder::new("parkspot")
        .endpoint("/metrics")
        .build()
        .map_err(|err| std::io::Error::other(format!("prometheus setup failed: {err}")))
}

pub(crate) fn booking_metrics(
    prometheus: &PrometheusMetrics,
) -> std::io::Result<Arc<dyn BookingMetrics>> {
    let metrics = PrometheusBookingMetrics::new(&prometheus.registry).map_err(|err| {
        std::io::Error::other(format!("booking metrics registration failed: {err}"))
    })?;
    Ok(Arc::new(metrics))
}
