//! Parking tables shared by the in-memory location and booking repositories.
//!
//! Locations and bookings live behind a single lock, so a reservation and a
//! capacity change at the same location always see each other's writes.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::domain::{Booking, BookingId, ParkingLocation, ParkingLocationId};

use super::{InMemoryBookingRepository, InMemoryParkingLocationRepository};

#[derive(Debug, Default)]
pub(super) struct ParkingTables {
    pub(super) locations: HashMap<ParkingLocationId, ParkingLocation>,
    pub(super) bookings: HashMap<BookingId, Booking>,
}

impl ParkingTables {
    pub(super) fn bookings_at(&self, location: &ParkingLocationId) -> Vec<Booking> {
        self.bookings
            .values()
            .filter(|booking| booking.location_id == *location)
            .cloned()
            .collect()
    }
}

pub(super) type SharedTables = Arc<RwLock<ParkingTables>>;

/// Owner of the shared tables; hands out repositories over them.
#[derive(Debug, Clone, Default)]
pub struct InMemoryParkingStore {
    tables: SharedTables,
}

impl InMemoryParkingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn locations(&self) -> InMemoryParkingLocationRepository {
        InMemoryParkingLocationRepository::over(Arc::clone(&self.tables))
    }

    pub fn bookings(&self) -> InMemoryBookingRepository {
        InMemoryBookingRepository::over(Arc::clone(&self.tables))
    }
}
