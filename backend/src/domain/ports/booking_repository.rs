//! Port abstraction for booking persistence.
//!
//! Adapters own the atomicity of [`BookingRepository::insert_checked`]. The
//! availability check and the insert must not interleave with another
//! reservation at the same location, nor with a change to the location's
//! capacity or status.
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    Booking, BookingId, BookingStatus, BookingWindow, ParkingLocationId, ReservationConflict,
    UserId,
};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by booking repository adapters.
    pub enum BookingPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => "booking repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "booking repository query failed: {message}",
        /// Availability check refused the reservation.
        Rejected { conflict: ReservationConflict } => "reservation rejected: {conflict}",
        /// The booked location no longer exists.
        LocationMissing { id: String } => "parking location not found: {id}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Check availability and insert in one atomic step.
    ///
    /// Locks the booked location, reads its stored capacity and status, loads
    /// occupying bookings at the location and for the plate, and inserts only
    /// when [`crate::domain::check_reservation_at`] passes.
    async fn insert_checked(&self, booking: &Booking) -> Result<(), BookingPersistenceError>;

    async fn find_by_id(&self, id: &BookingId) -> Result<Option<Booking>, BookingPersistenceError>;

    /// Bookings owned by `user`, newest window first.
    async fn list_for_user(
        &self,
        user: &UserId,
        status: Option<BookingStatus>,
    ) -> Result<Vec<Booking>, BookingPersistenceError>;

    /// Every booking at a location, ordered by window start.
    async fn list_for_location(
        &self,
        location: &ParkingLocationId,
    ) -> Result<Vec<Booking>, BookingPersistenceError>;

    /// Occupying bookings at a location that overlap `window`.
    async fn list_occupying(
        &self,
        location: &ParkingLocationId,
        window: &BookingWindow,
    ) -> Result<Vec<Booking>, BookingPersistenceError>;

    /// Move a booking from `expected` to `next`, stamping `updated_at`.
    ///
    /// Returns `false` when the booking is missing or no longer in
    /// `expected`, leaving it untouched.
    async fn update_status(
        &self,
        id: &BookingId,
        expected: BookingStatus,
        next: BookingStatus,
        at: DateTime<Utc>,
    ) -> Result<bool, BookingPersistenceError>;
}
