//! PostgreSQL-backed `BookingRepository`.
//!
//! `insert_checked` runs in one transaction that first locks the location row
//! with `SELECT ... FOR UPDATE` and checks against the capacity and status it
//! reads there. Reservations and location updates for the same location
//! therefore queue behind each other, and the check always sees every
//! committed booking and the committed capacity. Plate clashes across two
//! different locations are checked in the same transaction but are not
//! serialised by that lock.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use uuid::Uuid;

use crate::domain::ports::{BookingPersistenceError, BookingRepository};
use crate::domain::{
    Booking, BookingId, BookingStatus, BookingWindow, ParkingLocation, ParkingLocationId,
    ReservationConflict, UserId, check_reservation_at,
};

use super::error_mapping::{map_diesel_failure, map_pool_failure};
use super::models::{BookingRow, NewBookingRow, ParkingLocationRow};
use super::pool::{DbPool, PoolError};
use super::schema::{bookings, parking_locations};

#[derive(Clone)]
pub struct DieselBookingRepository {
    pool: DbPool,
}

impl DieselBookingRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> BookingPersistenceError {
    map_pool_failure(error, BookingPersistenceError::connection)
}

fn map_diesel_error(
    error: diesel::result::Error,
    operation: &'static str,
) -> BookingPersistenceError {
    map_diesel_failure(
        error,
        operation,
        BookingPersistenceError::query,
        BookingPersistenceError::connection,
    )
}

fn decode(row: BookingRow) -> Result<Booking, BookingPersistenceError> {
    Booking::try_from(row).map_err(|err| BookingPersistenceError::query(err.to_string()))
}

fn decode_all(rows: Vec<BookingRow>) -> Result<Vec<Booking>, BookingPersistenceError> {
    rows.into_iter().map(decode).collect()
}

pub(super) fn occupying_statuses() -> [&'static str; 2] {
    BookingStatus::OCCUPYING.map(BookingStatus::as_str)
}

/// Failure inside the checked-insert transaction; anything but `Database`
/// rolls back without touching the table.
enum CheckedInsertError {
    Database(diesel::result::Error),
    Corrupt(String),
    Missing,
    Rejected(ReservationConflict),
}

impl From<diesel::result::Error> for CheckedInsertError {
    fn from(value: diesel::result::Error) -> Self {
        Self::Database(value)
    }
}

async fn load_overlapping(
    conn: &mut AsyncPgConnection,
    filter_location: Option<Uuid>,
    filter_plate: Option<&str>,
    window: &BookingWindow,
) -> Result<Vec<Booking>, CheckedInsertError> {
    let mut query = bookings::table
        .select(BookingRow::as_select())
        .filter(bookings::status.eq_any(occupying_statuses()))
        .filter(bookings::start_time.lt(window.end()))
        .filter(bookings::end_time.gt(window.start()))
        .into_boxed();
    if let Some(location_id) = filter_location {
        query = query.filter(bookings::location_id.eq(location_id));
    }
    if let Some(plate) = filter_plate {
        query = query.filter(bookings::vehicle_plate.eq(plate.to_owned()));
    }
    let rows = query.load(conn).await?;
    rows.into_iter()
        .map(|row| {
            Booking::try_from(row).map_err(|err| CheckedInsertError::Corrupt(err.to_string()))
        })
        .collect()
}

#[async_trait]
impl BookingRepository for DieselBookingRepository {
    async fn insert_checked(&self, booking: &Booking) -> Result<(), BookingPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let location_id = *booking.location_id.as_uuid();

        let outcome = conn
            .transaction::<_, CheckedInsertError, _>(|conn| {
                async move {
                    let row = parking_locations::table
                        .find(location_id)
                        .select(ParkingLocationRow::as_select())
                        .for_update()
                        .first(conn)
                        .await
                        .optional()?
                        .ok_or(CheckedInsertError::Missing)?;
                    let location = ParkingLocation::try_from(row)
                        .map_err(|err| CheckedInsertError::Corrupt(err.to_string()))?;

                    let at_location =
                        load_overlapping(conn, Some(location_id), None, &booking.window).await?;
                    let same_vehicle = load_overlapping(
                        conn,
                        None,
                        Some(booking.vehicle_plate.as_ref()),
                        &booking.window,
                    )
                    .await?;
                    check_reservation_at(booking, &location, &at_location, &same_vehicle)
                        .map_err(CheckedInsertError::Rejected)?;

                    diesel::insert_into(bookings::table)
                        .values(NewBookingRow::from(booking))
                        .execute(conn)
                        .await?;
                    Ok(())
                }
                .scope_boxed()
            })
            .await;

        outcome.map_err(|err| match err {
            CheckedInsertError::Database(err) => map_diesel_error(err, "insert booking"),
            CheckedInsertError::Corrupt(message) => BookingPersistenceError::query(message),
            CheckedInsertError::Missing => {
                BookingPersistenceError::location_missing(booking.location_id.to_string())
            }
            CheckedInsertError::Rejected(conflict) => BookingPersistenceError::rejected(conflict),
        })
    }

    async fn find_by_id(&self, id: &BookingId) -> Result<Option<Booking>, BookingPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        bookings::table
            .find(id.as_uuid())
            .select(BookingRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|err| map_diesel_error(err, "find booking"))?
            .map(decode)
            .transpose()
    }

    async fn list_for_user(
        &self,
        user: &UserId,
        status: Option<BookingStatus>,
    ) -> Result<Vec<Booking>, BookingPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let mut query = bookings::table
            .select(BookingRow::as_select())
            .filter(bookings::user_id.eq(user.as_uuid()))
            .order((bookings::start_time.desc(), bookings::id.asc()))
            .into_boxed();
        if let Some(status) = status {
            query = query.filter(bookings::status.eq(status.as_str()));
        }
        let rows = query
            .load(&mut conn)
            .await
            .map_err(|err| map_diesel_error(err, "list user bookings"))?;
        decode_all(rows)
    }

    async fn list_for_location(
        &self,
        location: &ParkingLocationId,
    ) -> Result<Vec<Booking>, BookingPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows = bookings::table
            .select(BookingRow::as_select())
            .filter(bookings::location_id.eq(location.as_uuid()))
            .order((bookings::start_time.asc(), bookings::id.asc()))
            .load(&mut conn)
            .await
            .map_err(|err| map_diesel_error(err, "list location bookings"))?;
        decode_all(rows)
    }

    async fn list_occupying(
        &self,
        location: &ParkingLocationId,
        window: &BookingWindow,
    ) -> Result<Vec<Booking>, BookingPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows = bookings::table
            .select(BookingRow::as_select())
            .filter(bookings::location_id.eq(location.as_uuid()))
            .filter(bookings::status.eq_any(occupying_statuses()))
            .filter(bookings::start_time.lt(window.end()))
            .filter(bookings::end_time.gt(window.start()))
            .order((bookings::start_time.asc(), bookings::id.asc()))
            .load(&mut conn)
            .await
            .map_err(|err| map_diesel_error(err, "list occupying bookings"))?;
        decode_all(rows)
    }

    async fn update_status(
        &self,
        id: &BookingId,
        expected: BookingStatus,
        next: BookingStatus,
        at: DateTime<Utc>,
    ) -> Result<bool, BookingPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let updated = diesel::update(
            bookings::table
                .find(id.as_uuid())
                .filter(bookings::status.eq(expected.as_str())),
        )
        .set((bookings::status.eq(next.as_str()), bookings::updated_at.eq(at)))
        .execute(&mut conn)
        .await
        .map_err(|err| map_diesel_error(err, "update booking status"))?;
        Ok(updated == 1)
    }
}
