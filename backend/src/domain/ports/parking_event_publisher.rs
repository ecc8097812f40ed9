//! Port for fanning parking events out to real-time subscribers.

use async_trait::async_trait;

use crate::domain::ParkingEvent;

use super::define_port_error;

define_port_error! {
    /// Errors raised while delivering events.
    pub enum EventPublishError {
        /// The event could not be encoded or handed to the transport.
        Delivery { message: String } => "event delivery failed: {message}",
    }
}

/// Publishes domain events. Delivery is best effort; callers log failures
/// and carry on.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ParkingEventPublisher: Send + Sync {
    async fn publish(&self, event: &ParkingEvent) -> Result<(), EventPublishError>;
}

/// Publisher that drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpEventPublisher;

#[async_trait]
impl ParkingEventPublisher for NoOpEventPublisher {
    async fn publish(&self, _event: &ParkingEvent) -> Result<(), EventPublishError> {
        Ok(())
    }
}
