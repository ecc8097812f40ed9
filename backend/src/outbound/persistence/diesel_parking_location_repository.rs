//! PostgreSQL-backed `ParkingLocationRepository`.
//!
//! `update` and `delete` lock the location row with `SELECT ... FOR UPDATE`,
//! the same lock `DieselBookingRepository::insert_checked` takes, before
//! weighing the change against bookings still holding a space.
//!
//! `list_within` prefilters with a latitude/longitude box served by the
//! `parking_locations_lat_lng_idx` index; exact distances are computed in the
//! domain.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use uuid::Uuid;

use crate::domain::ports::{LocationPersistenceError, ParkingLocationRepository};
use crate::domain::{
    Booking, GeoBounds, LocationStatus, PageRequest, ParkingLocation, ParkingLocationId,
    future_peak,
};

use super::diesel_booking_repository::occupying_statuses;
use super::error_mapping::{map_diesel_failure, map_pool_failure};
use super::models::{BookingRow, ParkingLocationRecord, ParkingLocationRow};
use super::pool::{DbPool, PoolError};
use super::schema::{bookings, parking_locations};

#[derive(Clone)]
pub struct DieselParkingLocationRepository {
    pool: DbPool,
}

impl DieselParkingLocationRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> LocationPersistenceError {
    map_pool_failure(error, LocationPersistenceError::connection)
}

fn map_diesel_error(
    error: diesel::result::Error,
    operation: &'static str,
) -> LocationPersistenceError {
    map_diesel_failure(
        error,
        operation,
        LocationPersistenceError::query,
        LocationPersistenceError::connection,
    )
}

fn encode(location: &ParkingLocation) -> Result<ParkingLocationRecord, LocationPersistenceError> {
    ParkingLocationRecord::encode(location).map_err(LocationPersistenceError::query)
}

fn decode(row: ParkingLocationRow) -> Result<ParkingLocation, LocationPersistenceError> {
    ParkingLocation::try_from(row).map_err(|err| LocationPersistenceError::query(err.to_string()))
}

fn decode_all(
    rows: Vec<ParkingLocationRow>,
) -> Result<Vec<ParkingLocation>, LocationPersistenceError> {
    rows.into_iter().map(decode).collect()
}

/// Failure inside a guarded write; `Refused` carries the port error to
/// surface once the transaction has rolled back.
enum GuardedWriteError {
    Database(diesel::result::Error),
    Refused(LocationPersistenceError),
}

impl From<diesel::result::Error> for GuardedWriteError {
    fn from(value: diesel::result::Error) -> Self {
        Self::Database(value)
    }
}

impl GuardedWriteError {
    fn into_port(self, operation: &'static str) -> LocationPersistenceError {
        match self {
            Self::Database(err) => map_diesel_error(err, operation),
            Self::Refused(err) => err,
        }
    }
}

/// Lock the location row for the rest of the transaction.
async fn lock_location(
    conn: &mut AsyncPgConnection,
    id: Uuid,
) -> Result<Option<ParkingLocationRow>, GuardedWriteError> {
    Ok(parking_locations::table
        .find(id)
        .select(ParkingLocationRow::as_select())
        .for_update()
        .first(conn)
        .await
        .optional()?)
}

/// Peak of the occupying bookings at `id` that end after `now`.
async fn upcoming_peak(
    conn: &mut AsyncPgConnection,
    id: Uuid,
    now: DateTime<Utc>,
) -> Result<u32, GuardedWriteError> {
    let rows: Vec<BookingRow> = bookings::table
        .select(BookingRow::as_select())
        .filter(bookings::location_id.eq(id))
        .filter(bookings::status.eq_any(occupying_statuses()))
        .filter(bookings::end_time.gt(now))
        .load(conn)
        .await?;
    let upcoming = rows
        .into_iter()
        .map(Booking::try_from)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| GuardedWriteError::Refused(LocationPersistenceError::query(err.to_string())))?;
    Ok(future_peak(now, &upcoming))
}

#[async_trait]
impl ParkingLocationRepository for DieselParkingLocationRepository {
    async fn insert(&self, location: &ParkingLocation) -> Result<(), LocationPersistenceError> {
        let record = encode(location)?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(parking_locations::table)
            .values(&record)
            .execute(&mut conn)
            .await
            .map_err(|err| map_diesel_error(err, "insert parking location"))?;
        Ok(())
    }

    async fn update(
        &self,
        location: &ParkingLocation,
        now: DateTime<Utc>,
    ) -> Result<(), LocationPersistenceError> {
        let record = encode(location)?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let id = record.id;
        let record = &record;

        conn.transaction::<_, GuardedWriteError, _>(|conn| {
            async move {
                let Some(stored) = lock_location(conn, id).await? else {
                    return Err(GuardedWriteError::Refused(LocationPersistenceError::not_found(
                        id.to_string(),
                    )));
                };
                if record.total_spaces < stored.total_spaces {
                    let peak = upcoming_peak(conn, id, now).await?;
                    if location.total_spaces().get() < peak {
                        return Err(GuardedWriteError::Refused(
                            LocationPersistenceError::capacity_below_bookings(peak),
                        ));
                    }
                }
                diesel::update(parking_locations::table.find(id))
                    .set(record)
                    .execute(conn)
                    .await?;
                Ok(())
            }
            .scope_boxed()
        })
        .await
        .map_err(|err| err.into_port("update parking location"))
    }

    async fn delete(
        &self,
        id: &ParkingLocationId,
        now: DateTime<Utc>,
    ) -> Result<bool, LocationPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let id = *id.as_uuid();

        conn.transaction::<_, GuardedWriteError, _>(|conn| {
            async move {
                if lock_location(conn, id).await?.is_none() {
                    return Ok(false);
                }
                let peak = upcoming_peak(conn, id, now).await?;
                if peak > 0 {
                    return Err(GuardedWriteError::Refused(
                        LocationPersistenceError::has_bookings(peak),
                    ));
                }
                // Finished and cancelled bookings go with the row (ON DELETE CASCADE).
                let deleted = diesel::delete(parking_locations::table.find(id))
                    .execute(conn)
                    .await?;
                Ok(deleted > 0)
            }
            .scope_boxed()
        })
        .await
        .map_err(|err| err.into_port("delete parking location"))
    }

    async fn find_by_id(
        &self,
        id: &ParkingLocationId,
    ) -> Result<Option<ParkingLocation>, LocationPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        parking_locations::table
            .find(id.as_uuid())
            .select(ParkingLocationRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|err| map_diesel_error(err, "find parking location"))?
            .map(decode)
            .transpose()
    }

    async fn list(
        &self,
        page: PageRequest,
        status: Option<LocationStatus>,
    ) -> Result<Vec<ParkingLocation>, LocationPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let mut query = parking_locations::table
            .select(ParkingLocationRow::as_select())
            .order((parking_locations::created_at.asc(), parking_locations::id.asc()))
            .limit(i64::from(page.limit()))
            .offset(i64::from(page.offset()))
            .into_boxed();
        if let Some(status) = status {
            query = query.filter(parking_locations::status.eq(status.as_str()));
        }
        let rows = query
            .load(&mut conn)
            .await
            .map_err(|err| map_diesel_error(err, "list parking locations"))?;
        decode_all(rows)
    }

    async fn list_within(
        &self,
        bounds: Option<GeoBounds>,
    ) -> Result<Vec<ParkingLocation>, LocationPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let mut query = parking_locations::table
            .select(ParkingLocationRow::as_select())
            .order((parking_locations::created_at.asc(), parking_locations::id.asc()))
            .into_boxed();
        if let Some(bounds) = bounds {
            query = query
                .filter(parking_locations::latitude.between(bounds.min_lat, bounds.max_lat))
                .filter(parking_locations::longitude.between(bounds.min_lng, bounds.max_lng));
        }
        let rows = query
            .load(&mut conn)
            .await
            .map_err(|err| map_diesel_error(err, "list parking locations within bounds"))?;
        decode_all(rows)
    }
}
