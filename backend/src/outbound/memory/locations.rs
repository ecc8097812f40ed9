//! In-memory `ParkingLocationRepository`.
//!
//! Shrinks and deletes inspect bookings under the shared write lock, the same
//! one reservations take.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::ports::{LocationPersistenceError, ParkingLocationRepository};
use crate::domain::{
    GeoBounds, LocationStatus, PageRequest, ParkingLocation, ParkingLocationId, future_peak,
};

use super::store::SharedTables;

#[derive(Debug, Clone)]
pub struct InMemoryParkingLocationRepository {
    tables: SharedTables,
}

impl InMemoryParkingLocationRepository {
    pub(super) fn over(tables: SharedTables) -> Self {
        Self { tables }
    }

    async fn matching(&self, keep: impl Fn(&ParkingLocation) -> bool) -> Vec<ParkingLocation> {
        let mut rows: Vec<ParkingLocation> = self
            .tables
            .read()
            .await
            .locations
            .values()
            .filter(|location| keep(location))
            .cloned()
            .collect();
        rows.sort_by(by_creation);
        rows
    }
}

fn by_creation(a: &ParkingLocation, b: &ParkingLocation) -> std::cmp::Ordering {
    a.created_at()
        .cmp(&b.created_at())
        .then_with(|| a.id().cmp(&b.id()))
}

#[async_trait]
impl ParkingLocationRepository for InMemoryParkingLocationRepository {
    async fn insert(&self, location: &ParkingLocation) -> Result<(), LocationPersistenceError> {
        self.tables
            .write()
            .await
            .locations
            .insert(location.id(), location.clone());
        Ok(())
    }

    async fn update(
        &self,
        location: &ParkingLocation,
        now: DateTime<Utc>,
    ) -> Result<(), LocationPersistenceError> {
        let mut tables = self.tables.write().await;
        let Some(stored) = tables.locations.get(&location.id()) else {
            return Err(LocationPersistenceError::not_found(location.id().to_string()));
        };
        if location.total_spaces() < stored.total_spaces() {
            let peak = future_peak(now, &tables.bookings_at(&location.id()));
            if location.total_spaces().get() < peak {
                return Err(LocationPersistenceError::capacity_below_bookings(peak));
            }
        }
        tables.locations.insert(location.id(), location.clone());
        Ok(())
    }

    async fn delete(
        &self,
        id: &ParkingLocationId,
        now: DateTime<Utc>,
    ) -> Result<bool, LocationPersistenceError> {
        let mut tables = self.tables.write().await;
        if !tables.locations.contains_key(id) {
            return Ok(false);
        }
        let peak = future_peak(now, &tables.bookings_at(id));
        if peak > 0 {
            return Err(LocationPersistenceError::has_bookings(peak));
        }
        tables.locations.remove(id);
        tables.bookings.retain(|_, booking| booking.location_id != *id);
        Ok(true)
    }

    async fn find_by_id(
        &self,
        id: &ParkingLocationId,
    ) -> Result<Option<ParkingLocation>, LocationPersistenceError> {
        Ok(self.tables.read().await.locations.get(id).cloned())
    }

    async fn list(
        &self,
        page: PageRequest,
        status: Option<LocationStatus>,
    ) -> Result<Vec<ParkingLocation>, LocationPersistenceError> {
        Ok(self
            .matching(|location| status.is_none_or(|wanted| location.status() == wanted))
            .await
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .collect())
    }

    async fn list_within(
        &self,
        bounds: Option<GeoBounds>,
    ) -> Result<Vec<ParkingLocation>, LocationPersistenceError> {
        Ok(self
            .matching(|location| {
                bounds.is_none_or(|bounds| bounds.contains(location.coordinates()))
            })
            .await)
    }
}
