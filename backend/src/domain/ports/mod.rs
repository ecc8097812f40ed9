//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports (repositories, event publisher, metrics) describe what the
//! domain needs from adapters; driving ports (accounts, locations, bookings)
//! are what inbound adapters call. Each driven port exposes a strongly typed
//! error generated by [`define_port_error!`].

mod macros;
pub(crate) use macros::define_port_error;

mod accounts;
mod booking_metrics;
mod booking_repository;
mod bookings;
mod locations;
mod parking_event_publisher;
mod parking_location_repository;
mod user_repository;

#[cfg(test)]
pub use accounts::{MockAccountsCommand, MockAccountsQuery};
pub use accounts::{AccountsCommand, AccountsQuery};
#[cfg(test)]
pub use booking_metrics::MockBookingMetrics;
pub use booking_metrics::{BookingMetrics, BookingMetricsError, NoOpBookingMetrics};
#[cfg(test)]
pub use booking_repository::MockBookingRepository;
pub use booking_repository::{BookingPersistenceError, BookingRepository};
#[cfg(test)]
pub use bookings::{MockBookingsCommand, MockBookingsQuery};
pub use bookings::{BookingsCommand, BookingsQuery, NewBooking};
#[cfg(test)]
pub use locations::{MockLocationsCommand, MockLocationsQuery};
pub use locations::{
    AvailabilityQuote, LocationView, LocationsCommand, LocationsQuery, NearbyLocation,
};
#[cfg(test)]
pub use parking_event_publisher::MockParkingEventPublisher;
pub use parking_event_publisher::{EventPublishError, NoOpEventPublisher, ParkingEventPublisher};
#[cfg(test)]
pub use parking_location_repository::MockParkingLocationRepository;
pub use parking_location_repository::{LocationPersistenceError, ParkingLocationRepository};
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{UserPersistenceError, UserRepository};
