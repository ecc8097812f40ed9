//! Domain port surface for recording booking outcome metrics.
//!
//! Keeps booking services free of any particular metrics backend. The
//! Prometheus adapter lives behind the `metrics` feature; tests and builds
//! without it use [`NoOpBookingMetrics`].

use async_trait::async_trait;

use crate::domain::BookingStatus;

use super::define_port_error;

define_port_error! {
    /// Errors exposed when recording booking metrics.
    pub enum BookingMetricsError {
        /// Metric exporter rejected the write.
        Export { message: String } => "booking metrics exporter failed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookingMetrics: Send + Sync {
    /// A reservation was stored.
    async fn record_created(&self) -> Result<(), BookingMetricsError>;

    /// A reservation was refused; `reason` is a stable label such as
    /// `capacity_exhausted`.
    async fn record_rejected(&self, reason: &str) -> Result<(), BookingMetricsError>;

    /// A booking moved to `status`.
    async fn record_transition(&self, status: BookingStatus) -> Result<(), BookingMetricsError>;
}

/// No-op implementation for when metrics are disabled or in tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpBookingMetrics;

#[async_trait]
impl BookingMetrics for NoOpBookingMetrics {
    async fn record_created(&self) -> Result<(), BookingMetricsError> {
        Ok(())
    }

    async fn record_rejected(&self, _reason: &str) -> Result<(), BookingMetricsError> {
        Ok(())
    }

    async fn record_transition(&self, _status: BookingStatus) -> Result<(), BookingMetricsError> {
        Ok(())
    }
}
