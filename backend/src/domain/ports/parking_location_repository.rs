//! Port abstraction for parking location persistence.
//!
//! `update` and `delete` check the location's bookings under the same lock
//! that [`super::BookingRepository::insert_checked`] takes, so a shrink or a
//! removal cannot race a reservation into overbooking.
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    GeoBounds, LocationStatus, PageRequest, ParkingLocation, ParkingLocationId,
};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by parking location repository adapters.
    pub enum LocationPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => "location repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "location repository query failed: {message}",
        /// The location to update does not exist.
        NotFound { id: String } => "parking location not found: {id}",
        /// The new capacity is below what upcoming bookings already hold.
        CapacityBelowBookings { peak: u32 } => "{peak} spaces are already booked in upcoming windows",
        /// Current or upcoming bookings still hold a space.
        HasBookings { peak: u32 } => "location still holds {peak} current or upcoming bookings",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ParkingLocationRepository: Send + Sync {
    async fn insert(&self, location: &ParkingLocation) -> Result<(), LocationPersistenceError>;

    /// Replace every mutable column of an existing location.
    ///
    /// A capacity below the stored one is refused with `CapacityBelowBookings`
    /// when bookings still holding a space after `now` peak above it.
    async fn update(
        &self,
        location: &ParkingLocation,
        now: DateTime<Utc>,
    ) -> Result<(), LocationPersistenceError>;

    /// Remove a location and its bookings. Returns `false` when absent.
    ///
    /// Refused with `HasBookings` while any booking still holds a space
    /// after `now`.
    async fn delete(
        &self,
        id: &ParkingLocationId,
        now: DateTime<Utc>,
    ) -> Result<bool, LocationPersistenceError>;

    async fn find_by_id(
        &self,
        id: &ParkingLocationId,
    ) -> Result<Option<ParkingLocation>, LocationPersistenceError>;

    /// List locations ordered by creation time then id, optionally filtered by status.
    async fn list(
        &self,
        page: PageRequest,
        status: Option<LocationStatus>,
    ) -> Result<Vec<ParkingLocation>, LocationPersistenceError>;

    /// Active locations inside `bounds`, or every active location when `None`.
    async fn list_within(
        &self,
        bounds: Option<GeoBounds>,
    ) -> Result<Vec<ParkingLocation>, LocationPersistenceError>;
}
