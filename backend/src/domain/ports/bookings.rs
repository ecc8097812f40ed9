//! Driving ports for reservations.

use async_trait::async_trait;

use crate::domain::{
    Actor, Booking, BookingId, BookingStatus, BookingWindow, Error, ParkingLocationId,
    VehiclePlate, VehicleType,
};

/// Validated reservation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBooking {
    pub location_id: ParkingLocationId,
    pub vehicle_plate: VehiclePlate,
    pub vehicle_type: VehicleType,
    pub window: BookingWindow,
}

/// Reservation mutations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookingsCommand: Send + Sync {
    /// Reserve a space; a full location or double-booked vehicle is a conflict.
    async fn create(&self, actor: &Actor, request: NewBooking) -> Result<Booking, Error>;

    async fn cancel(&self, actor: &Actor, id: &BookingId) -> Result<Booking, Error>;

    async fn check_in(&self, actor: &Actor, id: &BookingId) -> Result<Booking, Error>;

    async fn complete(&self, actor: &Actor, id: &BookingId) -> Result<Booking, Error>;
}

/// Reservation reads.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookingsQuery: Send + Sync {
    /// A booking visible to its owner or an admin.
    async fn get(&self, actor: &Actor, id: &BookingId) -> Result<Booking, Error>;

    async fn list_mine(
        &self,
        actor: &Actor,
        status: Option<BookingStatus>,
    ) -> Result<Vec<Booking>, Error>;

    /// Every booking at a location; admin only.
    async fn list_for_location(
        &self,
        actor: &Actor,
        location_id: &ParkingLocationId,
    ) -> Result<Vec<Booking>, Error>;
}
