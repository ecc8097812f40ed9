//! Prometheus-backed implementations of the metrics ports, compiled only with
//! the `metrics` feature.

mod prometheus_bookings;

pub use prometheus_bookings::PrometheusBookingMetrics;
