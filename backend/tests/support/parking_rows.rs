//! Row builders shared by the Diesel adapter suites.

#![allow(dead_code, reason = "each suite uses a different subset")]

use chrono::{DateTime, Duration, TimeZone, Utc};
use parkspot::domain::{
    Amenity, Booking, BookingId, BookingStatus, BookingWindow, EmailAddress, LocationStatus,
    OperatingHours, ParkingLocation, ParkingLocationDraft, ParkingLocationId,
    ParkingLocationPatch, User, UserId, UserName, UserRole, VehiclePlate, VehicleType,
};

/// Fixed reference instant; whole seconds so rows survive the round trip.
pub fn base() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 2, 8, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub fn hours(offset: i64) -> DateTime<Utc> {
    base() + Duration::hours(offset)
}

pub fn user(email: &str) -> User {
    User {
        id: UserId::random(),
        name: UserName::new("Rowan Test").expect("valid name"),
        email: EmailAddress::new(email).expect("valid email"),
        phone: None,
        role: UserRole::User,
        created_at: base(),
    }
}

pub fn location_with(
    name: &str,
    spaces: u32,
    hours: OperatingHours,
    status: LocationStatus,
    created_minute: i64,
) -> ParkingLocation {
    ParkingLocation::create(
        ParkingLocationId::random(),
        ParkingLocationDraft {
            name: name.into(),
            address: format!("{name}, Edinburgh"),
            latitude: 55.95,
            longitude: -3.19,
            total_spaces: spaces,
            hourly_rate_cents: 250,
            operating_hours: hours,
            amenities: vec![Amenity::Covered, Amenity::EvCharging],
            status,
        },
        base() + Duration::minutes(created_minute),
    )
    .expect("valid location")
}

pub fn location(name: &str, spaces: u32) -> ParkingLocation {
    location_with(
        name,
        spaces,
        OperatingHours::AlwaysOpen,
        LocationStatus::Active,
        0,
    )
}

pub fn patched(location: &ParkingLocation, patch: ParkingLocationPatch) -> ParkingLocation {
    location.apply(patch, base()).expect("valid patch")
}

pub fn resized(location: &ParkingLocation, spaces: u32) -> ParkingLocation {
    patched(
        location,
        ParkingLocationPatch {
            total_spaces: Some(spaces),
            ..ParkingLocationPatch::default()
        },
    )
}

pub fn booking(
    owner: &User,
    location: &ParkingLocation,
    plate: &str,
    start_h: i64,
    end_h: i64,
) -> Booking {
    Booking {
        id: BookingId::random(),
        user_id: owner.id,
        location_id: location.id(),
        vehicle_plate: VehiclePlate::new(plate).expect("valid plate"),
        vehicle_type: VehicleType::Car,
        window: BookingWindow::new(hours(start_h), hours(end_h)).expect("valid window"),
        total_price_cents: 500,
        status: BookingStatus::Confirmed,
        created_at: base(),
        updated_at: base(),
    }
}
