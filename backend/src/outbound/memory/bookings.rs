//! In-memory `BookingRepository`.
//!
//! `insert_checked` holds the shared write lock across the location read, the
//! availability check and the insert, so concurrent reservations for the last
//! space serialise with each other and with capacity changes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::ports::{BookingPersistenceError, BookingRepository};
use crate::domain::{
    Booking, BookingId, BookingStatus, BookingWindow, ParkingLocationId, UserId,
    check_reservation_at,
};

use super::store::SharedTables;

#[derive(Debug, Clone)]
pub struct InMemoryBookingRepository {
    tables: SharedTables,
}

impl InMemoryBookingRepository {
    pub(super) fn over(tables: SharedTables) -> Self {
        Self { tables }
    }

    async fn collect(
        &self,
        keep: impl Fn(&Booking) -> bool,
        order: impl Fn(&Booking, &Booking) -> std::cmp::Ordering,
    ) -> Vec<Booking> {
        let mut rows: Vec<Booking> = self
            .tables
            .read()
            .await
            .bookings
            .values()
            .filter(|booking| keep(booking))
            .cloned()
            .collect();
        rows.sort_by(order);
        rows
    }
}

#[async_trait]
impl BookingRepository for InMemoryBookingRepository {
    async fn insert_checked(&self, booking: &Booking) -> Result<(), BookingPersistenceError> {
        let mut tables = self.tables.write().await;
        let Some(location) = tables.locations.get(&booking.location_id) else {
            return Err(BookingPersistenceError::location_missing(
                booking.location_id.to_string(),
            ));
        };
        let at_location = tables.bookings_at(&booking.location_id);
        let same_vehicle: Vec<Booking> = tables
            .bookings
            .values()
            .filter(|other| other.vehicle_plate == booking.vehicle_plate)
            .cloned()
            .collect();
        check_reservation_at(booking, location, &at_location, &same_vehicle)
            .map_err(BookingPersistenceError::rejected)?;
        tables.bookings.insert(booking.id, booking.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &BookingId) -> Result<Option<Booking>, BookingPersistenceError> {
        Ok(self.tables.read().await.bookings.get(id).cloned())
    }

    async fn list_for_user(
        &self,
        user: &UserId,
        status: Option<BookingStatus>,
    ) -> Result<Vec<Booking>, BookingPersistenceError> {
        Ok(self
            .collect(
                |booking| {
                    booking.user_id == *user && status.is_none_or(|wanted| booking.status == wanted)
                },
                |a, b| {
                    b.window
                        .start()
                        .cmp(&a.window.start())
                        .then_with(|| a.id.cmp(&b.id))
                },
            )
            .await)
    }

    async fn list_for_location(
        &self,
        location: &ParkingLocationId,
    ) -> Result<Vec<Booking>, BookingPersistenceError> {
        Ok(self
            .collect(
                |booking| booking.location_id == *location,
                |a, b| {
                    a.window
                        .start()
                        .cmp(&b.window.start())
                        .then_with(|| a.id.cmp(&b.id))
                },
            )
            .await)
    }

    async fn list_occupying(
        &self,
        location: &ParkingLocationId,
        window: &BookingWindow,
    ) -> Result<Vec<Booking>, BookingPersistenceError> {
        Ok(self
            .collect(
                |booking| {
                    booking.location_id == *location
                        && booking.is_occupying()
                        && booking.window.overlaps(window)
                },
                |a, b| {
                    a.window
                        .start()
                        .cmp(&b.window.start())
                        .then_with(|| a.id.cmp(&b.id))
                },
            )
            .await)
    }

    async fn update_status(
        &self,
        id: &BookingId,
        expected: BookingStatus,
        next: BookingStatus,
        at: DateTime<Utc>,
    ) -> Result<bool, BookingPersistenceError> {
        let mut tables = self.tables.write().await;
        match tables.bookings.get_mut(id) {
            Some(booking) if booking.status == expected => {
                booking.status = next;
                booking.updated_at = at;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::ParkingLocationRepository;
    use crate::domain::{
        LocationStatus, OperatingHours, ParkingLocation, ParkingLocationDraft,
        ReservationConflict, VehiclePlate, VehicleType,
    };
    use crate::outbound::memory::InMemoryParkingStore;
    use chrono::TimeZone;
    use rstest::{fixture, rstest};
    use std::sync::Arc;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, hour, 0, 0)
            .single()
            .expect("timestamp")
    }

    fn booking(location_id: ParkingLocationId, plate: &str, start: u32, end: u32) -> Booking {
        Booking {
            id: BookingId::random(),
            user_id: UserId::random(),
            location_id,
            vehicle_plate: VehiclePlate::new(plate).expect("plate"),
            vehicle_type: VehicleType::Car,
            window: BookingWindow::new(at(start), at(end)).expect("window"),
            total_price_cents: 400,
            status: BookingStatus::Confirmed,
            created_at: at(7),
            updated_at: at(7),
        }
    }

    async fn lot(store: &InMemoryParkingStore, spaces: u32) -> ParkingLocationId {
        let location = ParkingLocation::create(
            ParkingLocationId::random(),
            ParkingLocationDraft {
                name: "Haymarket".into(),
                address: "1 Haymarket Terrace, Edinburgh".into(),
                latitude: 55.94,
                longitude: -3.22,
                total_spaces: spaces,
                hourly_rate_cents: 200,
                operating_hours: OperatingHours::AlwaysOpen,
                amenities: Vec::new(),
                status: LocationStatus::Active,
            },
            at(7),
        )
        .expect("valid location");
        store.locations().insert(&location).await.expect("insert");
        location.id()
    }

    #[fixture]
    fn store() -> InMemoryParkingStore {
        InMemoryParkingStore::new()
    }

    #[rstest]
    #[tokio::test]
    async fn last_space_goes_to_exactly_one_of_two_racers(store: InMemoryParkingStore) {
        let location_id = lot(&store, 1).await;
        let repo = Arc::new(store.bookings());
        let first = booking(location_id, "AA11", 9, 11);
        let second = booking(location_id, "BB22", 10, 12);

        let (a, b) = tokio::join!(
            {
                let repo = Arc::clone(&repo);
                let first = first.clone();
                async move { repo.insert_checked(&first).await }
            },
            {
                let repo = Arc::clone(&repo);
                let second = second.clone();
                async move { repo.insert_checked(&second).await }
            }
        );

        assert_eq!(u8::from(a.is_ok()) + u8::from(b.is_ok()), 1);
        let rejected = a.err().or(b.err()).expect("one rejection");
        assert!(matches!(
            rejected,
            BookingPersistenceError::Rejected {
                conflict: ReservationConflict::CapacityExhausted { peak: 1, capacity: 1 }
            }
        ));
    }

    #[rstest]
    #[tokio::test]
    async fn back_to_back_bookings_share_a_space(store: InMemoryParkingStore) {
        let location_id = lot(&store, 1).await;
        let repo = store.bookings();
        repo.insert_checked(&booking(location_id, "AA11", 9, 10))
            .await
            .expect("first");
        repo.insert_checked(&booking(location_id, "BB22", 10, 11))
            .await
            .expect("second starts when the first ends");
    }

    #[rstest]
    #[tokio::test]
    async fn a_vehicle_cannot_hold_two_overlapping_bookings(store: InMemoryParkingStore) {
        let here = lot(&store, 10).await;
        let there = lot(&store, 10).await;
        let repo = store.bookings();
        let held = booking(here, "AA11", 9, 11);
        repo.insert_checked(&held).await.expect("first");

        let elsewhere = booking(there, "AA 11", 10, 12);
        let err = repo.insert_checked(&elsewhere).await.expect_err("plate clash");
        assert_eq!(
            err,
            BookingPersistenceError::rejected(ReservationConflict::VehicleAlreadyBooked {
                booking_id: held.id
            })
        );
    }

    #[rstest]
    #[tokio::test]
    async fn update_status_is_compare_and_set(store: InMemoryParkingStore) {
        let location_id = lot(&store, 1).await;
        let repo = store.bookings();
        let stored = booking(location_id, "AA11", 9, 11);
        repo.insert_checked(&stored).await.expect("insert");

        assert!(
            repo.update_status(&stored.id, BookingStatus::Confirmed, BookingStatus::Cancelled, at(8))
                .await
                .expect("update")
        );
        assert!(
            !repo
                .update_status(&stored.id, BookingStatus::Confirmed, BookingStatus::CheckedIn, at(8))
                .await
                .expect("stale update")
        );
        let reloaded = repo.find_by_id(&stored.id).await.expect("read").expect("row");
        assert_eq!(reloaded.status, BookingStatus::Cancelled);
        assert_eq!(reloaded.updated_at, at(8));

        let occupying = repo
            .list_occupying(&location_id, &stored.window)
            .await
            .expect("list");
        assert!(occupying.is_empty(), "cancelled bookings free their space");
    }

    #[rstest]
    #[tokio::test]
    async fn user_bookings_list_newest_window_first(store: InMemoryParkingStore) {
        let location_id = lot(&store, 10).await;
        let repo = store.bookings();
        let early = booking(location_id, "AA11", 8, 9);
        let mut late = booking(location_id, "BB22", 12, 13);
        late.user_id = early.user_id;
        repo.insert_checked(&early).await.expect("early");
        repo.insert_checked(&late).await.expect("late");

        let listed = repo.list_for_user(&early.user_id, None).await.expect("list");
        assert_eq!(listed, vec![late.clone(), early.clone()]);
        let by_location = repo.list_for_location(&location_id).await.expect("list");
        assert_eq!(by_location, vec![early, late]);
    }
}
