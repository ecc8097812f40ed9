//! Driving ports for parking location management and search.

use async_trait::async_trait;

use crate::domain::{
    Actor, Availability, BookingWindow, Error, LocationStatus, NearbyQuery, PageRequest,
    ParkingLocation, ParkingLocationDraft, ParkingLocationId, ParkingLocationPatch,
};

/// A location together with the spaces free right now.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationView {
    pub location: ParkingLocation,
    pub available_spaces: u32,
}

/// A nearby search hit with live availability.
#[derive(Debug, Clone, PartialEq)]
pub struct NearbyLocation {
    pub location: ParkingLocation,
    pub distance_km: f64,
    pub available_spaces: u32,
}

/// Availability and price for a prospective window.
#[derive(Debug, Clone, PartialEq)]
pub struct AvailabilityQuote {
    pub location_id: ParkingLocationId,
    pub window: BookingWindow,
    pub availability: Availability,
    pub price_cents: i64,
}

/// Admin-only location mutations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LocationsCommand: Send + Sync {
    async fn create(&self, actor: &Actor, draft: ParkingLocationDraft)
    -> Result<LocationView, Error>;

    /// Shrinking below the peak of current and future bookings is a conflict.
    async fn update(
        &self,
        actor: &Actor,
        id: &ParkingLocationId,
        patch: ParkingLocationPatch,
    ) -> Result<LocationView, Error>;

    /// Deleting a location with current or future bookings is a conflict.
    async fn delete(&self, actor: &Actor, id: &ParkingLocationId) -> Result<(), Error>;
}

/// Public location reads.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LocationsQuery: Send + Sync {
    async fn get(&self, id: &ParkingLocationId) -> Result<LocationView, Error>;

    async fn list(
        &self,
        page: PageRequest,
        status: Option<LocationStatus>,
    ) -> Result<Vec<LocationView>, Error>;

    /// Active locations ranked by distance from the query centre.
    async fn nearby(&self, query: NearbyQuery) -> Result<Vec<NearbyLocation>, Error>;

    /// Space availability and price quote for `window`.
    async fn availability(
        &self,
        id: &ParkingLocationId,
        window: BookingWindow,
    ) -> Result<AvailabilityQuote, Error>;
}
