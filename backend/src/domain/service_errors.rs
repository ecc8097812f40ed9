//! Mapping from port failures to domain [`Error`] values.

use serde_json::json;

use super::Error;
use super::ports::{
    BookingPersistenceError, LocationPersistenceError, UserPersistenceError,
};

/// `400` with `details.field` / `details.code`.
pub(crate) fn invalid_field(field: &str, code: &str, message: impl Into<String>) -> Error {
    Error::invalid_request(message).with_details(json!({ "field": field, "code": code }))
}

/// `409` with `details.code`.
pub(crate) fn conflict_with_code(code: &str, message: impl Into<String>) -> Error {
    Error::conflict(message).with_details(json!({ "code": code }))
}

pub(crate) fn map_user_error(error: UserPersistenceError) -> Error {
    match error {
        UserPersistenceError::Connection { message } => {
            Error::service_unavailable(format!("user repository unavailable: {message}"))
        }
        UserPersistenceError::Query { message } => {
            Error::internal(format!("user repository error: {message}"))
        }
        UserPersistenceError::DuplicateEmail { .. } => Error::conflict("email already registered")
            .with_details(json!({ "field": "email", "code": "email_taken" })),
    }
}

pub(crate) fn map_location_error(error: LocationPersistenceError) -> Error {
    match error {
        LocationPersistenceError::Connection { message } => {
            Error::service_unavailable(format!("location repository unavailable: {message}"))
        }
        LocationPersistenceError::Query { message } => {
            Error::internal(format!("location repository error: {message}"))
        }
        LocationPersistenceError::NotFound { .. } => Error::not_found("parking location not found"),
        LocationPersistenceError::CapacityBelowBookings { peak } => Error::conflict(format!(
            "{peak} spaces are already booked in upcoming windows"
        ))
        .with_details(json!({ "code": "capacity_below_bookings", "peakOccupied": peak })),
        LocationPersistenceError::HasBookings { .. } => conflict_with_code(
            "location_has_bookings",
            "location still has current or upcoming bookings",
        ),
    }
}

pub(crate) fn map_booking_error(error: BookingPersistenceError) -> Error {
    match error {
        BookingPersistenceError::Connection { message } => {
            Error::service_unavailable(format!("booking repository unavailable: {message}"))
        }
        BookingPersistenceError::Query { message } => {
            Error::internal(format!("booking repository error: {message}"))
        }
        BookingPersistenceError::Rejected { conflict } => {
            Error::conflict(conflict.to_string()).with_details(json!({ "code": conflict.reason() }))
        }
        BookingPersistenceError::LocationMissing { .. } => {
            Error::not_found("parking location not found")
        }
    }
}
