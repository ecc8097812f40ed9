//! Internal Diesel row structs and their conversions to domain types.
//!
//! Rows never leave the persistence layer. Reading a row revalidates it
//! through the domain constructors, so a hand-edited database cannot smuggle
//! an invalid entity into the services.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::{
    Amenity, Booking, BookingId, BookingStatus, BookingWindow, EmailAddress, LocationStatus,
    OperatingHours, ParkingLocation, ParkingLocationDraft, ParkingLocationId, PhoneNumber, User,
    UserId, UserName, UserRole, VehiclePlate, VehicleType,
};

use super::schema::{bookings, parking_locations, users};

/// A stored row that no longer satisfies domain validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("corrupt {table} row {id}: {reason}")]
pub(crate) struct RowDecodeError {
    table: &'static str,
    id: Uuid,
    reason: String,
}

impl RowDecodeError {
    fn new(table: &'static str, id: Uuid, reason: impl ToString) -> Self {
        Self {
            table,
            id,
            reason: reason.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub id: Uuid,
    pub name: &'a str,
    pub email: &'a str,
    pub phone: Option<&'a str>,
    pub role: &'a str,
    pub created_at: DateTime<Utc>,
}

impl<'a> From<&'a User> for NewUserRow<'a> {
    fn from(user: &'a User) -> Self {
        Self {
            id: *user.id.as_uuid(),
            name: user.name.as_ref(),
            email: user.email.as_ref(),
            phone: user.phone.as_ref().map(AsRef::as_ref),
            role: user.role.as_str(),
            created_at: user.created_at,
        }
    }
}

impl TryFrom<UserRow> for User {
    type Error = RowDecodeError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let corrupt = |reason: &dyn std::fmt::Display| RowDecodeError::new("users", row.id, reason);
        Ok(Self {
            id: UserId::from_uuid(row.id),
            name: UserName::new(row.name.as_str()).map_err(|err| corrupt(&err))?,
            email: EmailAddress::new(row.email.as_str()).map_err(|err| corrupt(&err))?,
            phone: row
                .phone
                .as_deref()
                .map(PhoneNumber::new)
                .transpose()
                .map_err(|err| corrupt(&err))?,
            role: row.role.parse::<UserRole>().map_err(|err| corrupt(&err))?,
            created_at: row.created_at,
        })
    }
}

// ---------------------------------------------------------------------------
// Parking locations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = parking_locations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ParkingLocationRow {
    pub id: Uuid,
    pub name: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub total_spaces: i32,
    pub hourly_rate_cents: i64,
    pub operating_hours: serde_json::Value,
    pub amenities: Vec<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Full row image used for both insert and update.
#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = parking_locations)]
pub(crate) struct ParkingLocationRecord {
    pub id: Uuid,
    pub name: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub total_spaces: i32,
    pub hourly_rate_cents: i64,
    pub operating_hours: serde_json::Value,
    pub amenities: Vec<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ParkingLocationRecord {
    pub(crate) fn encode(location: &ParkingLocation) -> Result<Self, String> {
        let total_spaces = i32::try_from(location.total_spaces().get())
            .map_err(|err| format!("total_spaces out of range: {err}"))?;
        let operating_hours = serde_json::to_value(location.operating_hours())
            .map_err(|err| format!("encode operating_hours: {err}"))?;
        Ok(Self {
            id: *location.id().as_uuid(),
            name: location.name().as_ref().to_owned(),
            address: location.address().as_ref().to_owned(),
            latitude: location.coordinates().latitude(),
            longitude: location.coordinates().longitude(),
            total_spaces,
            hourly_rate_cents: location.hourly_rate().cents(),
            operating_hours,
            amenities: location
                .amenities()
                .as_slice()
                .iter()
                .map(|amenity| amenity.as_str().to_owned())
                .collect(),
            status: location.status().as_str().to_owned(),
            created_at: location.created_at(),
            updated_at: location.updated_at(),
        })
    }
}

impl TryFrom<ParkingLocationRow> for ParkingLocation {
    type Error = RowDecodeError;

    fn try_from(row: ParkingLocationRow) -> Result<Self, Self::Error> {
        let id = row.id;
        let corrupt = |reason: &dyn std::fmt::Display| {
            RowDecodeError::new("parking_locations", id, reason)
        };
        let operating_hours: OperatingHours =
            serde_json::from_value(row.operating_hours).map_err(|err| corrupt(&err))?;
        let amenities = row
            .amenities
            .iter()
            .map(|raw| raw.parse::<Amenity>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| corrupt(&err))?;
        let total_spaces = u32::try_from(row.total_spaces).map_err(|err| corrupt(&err))?;
        let status = row.status.parse::<LocationStatus>().map_err(|err| corrupt(&err))?;

        ParkingLocation::restore(
            ParkingLocationId::from_uuid(id),
            ParkingLocationDraft {
                name: row.name,
                address: row.address,
                latitude: row.latitude,
                longitude: row.longitude,
                total_spaces,
                hourly_rate_cents: row.hourly_rate_cents,
                operating_hours,
                amenities,
                status,
            },
            row.created_at,
            row.updated_at,
        )
        .map_err(|err| corrupt(&err))
    }
}

// ---------------------------------------------------------------------------
// Bookings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = bookings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct BookingRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub location_id: Uuid,
    pub vehicle_plate: String,
    pub vehicle_type: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub total_price_cents: i64,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = bookings)]
pub(crate) struct NewBookingRow<'a> {
    pub id: Uuid,
    pub user_id: Uuid,
    pub location_id: Uuid,
    pub vehicle_plate: &'a str,
    pub vehicle_type: &'a str,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub total_price_cents: i64,
    pub status: &'a str,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<'a> From<&'a Booking> for NewBookingRow<'a> {
    fn from(booking: &'a Booking) -> Self {
        Self {
            id: *booking.id.as_uuid(),
            user_id: *booking.user_id.as_uuid(),
            location_id: *booking.location_id.as_uuid(),
            vehicle_plate: booking.vehicle_plate.as_ref(),
            vehicle_type: booking.vehicle_type.as_str(),
            start_time: booking.window.start(),
            end_time: booking.window.end(),
            total_price_cents: booking.total_price_cents,
            status: booking.status.as_str(),
            created_at: booking.created_at,
            updated_at: booking.updated_at,
        }
    }
}

impl TryFrom<BookingRow> for Booking {
    type Error = RowDecodeError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        let corrupt =
            |reason: &dyn std::fmt::Display| RowDecodeError::new("bookings", row.id, reason);
        Ok(Self {
            id: BookingId::from_uuid(row.id),
            user_id: UserId::from_uuid(row.user_id),
            location_id: ParkingLocationId::from_uuid(row.location_id),
            vehicle_plate: VehiclePlate::new(row.vehicle_plate.as_str())
                .map_err(|err| corrupt(&err))?,
            vehicle_type: row
                .vehicle_type
                .parse::<VehicleType>()
                .map_err(|err| corrupt(&err))?,
            window: BookingWindow::new(row.start_time, row.end_time)
                .map_err(|err| corrupt(&err))?,
            total_price_cents: row.total_price_cents,
            status: row
                .status
                .parse::<BookingStatus>()
                .map_err(|err| corrupt(&err))?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
