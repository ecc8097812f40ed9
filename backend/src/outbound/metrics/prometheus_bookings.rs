//! Prometheus adapter for booking outcome counters.

use async_trait::async_trait;
use prometheus::{CounterVec, IntCounter, Opts, Registry};

use crate::domain::BookingStatus;
use crate::domain::ports::{BookingMetrics, BookingMetricsError};

/// Booking counters registered against a shared registry.
///
/// - `parkspot_bookings_created_total`: reservations stored
/// - `parkspot_bookings_rejected_total{reason}`: refused reservations, such
///   as `capacity_exhausted` or `vehicle_already_booked`
/// - `parkspot_booking_transitions_total{status}`: lifecycle moves by target
///   status
pub struct PrometheusBookingMetrics {
    created_total: IntCounter,
    rejected_total: CounterVec,
    transitions_total: CounterVec,
}

impl PrometheusBookingMetrics {
    /// Create the counters and register them with `registry`.
    ///
    /// # Errors
    ///
    /// Fails when a metric with the same name is already registered.
    pub fn new(registry: &Registry) -> Result<Self, prometheus::Error> {
        let created_total = IntCounter::new(
            "parkspot_bookings_created_total",
            "Reservations stored",
        )?;
        let rejected_total = CounterVec::new(
            Opts::new(
                "parkspot_bookings_rejected_total",
                "Reservations refused by reason",
            ),
            &["reason"],
        )?;
        let transitions_total = CounterVec::new(
            Opts::new(
                "parkspot_booking_transitions_total",
                "Booking status transitions by target status",
            ),
            &["status"],
        )?;
        registry.register(Box::new(created_total.clone()))?;
        registry.register(Box::new(rejected_total.clone()))?;
        registry.register(Box::new(transitions_total.clone()))?;
        Ok(Self {
            created_total,
            rejected_total,
            transitions_total,
        })
    }
}

#[async_trait]
impl BookingMetrics for PrometheusBookingMetrics {
    async fn record_created(&self) -> Result<(), BookingMetricsError> {
        self.created_total.inc();
        Ok(())
    }

    async fn record_rejected(&self, reason: &str) -> Result<(), BookingMetricsError> {
        self.rejected_total
            .get_metric_with_label_values(&[reason])
            .map_err(|err| BookingMetricsError::export(err.to_string()))?
            .inc();
        Ok(())
    }

    async fn record_transition(&self, status: BookingStatus) -> Result<(), BookingMetricsError> {
        self.transitions_total
            .with_label_values(&[status.as_str()])
            .inc();
        Ok(())
    }
}
