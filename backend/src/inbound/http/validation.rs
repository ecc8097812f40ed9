//! Request validation helpers shared by the HTTP handlers.
//!
//! Every failure is an `invalid_request` error whose details carry the
//! offending camelCase `field`, a machine-readable `code` and, where useful,
//! the raw `value`.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde_json::json;

use crate::domain::{
    BookingValidationError, Error, GeoValidationError, InvalidPageLimit, LocationValidationError,
    PageRequest, UserValidationError,
};

/// Request field name as clients see it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub(crate) fn as_str(self) -> &'static str {
        self.0
    }
}

/// `invalid_request` with `{field, code}` details.
pub(crate) fn invalid_field(field: &str, code: &str, message: impl Into<String>) -> Error {
    Error::invalid_request(message).with_details(json!({ "field": field, "code": code }))
}

fn invalid_value(field: FieldName, code: &str, message: String, value: &str) -> Error {
    Error::invalid_request(message).with_details(json!({
        "field": field.as_str(),
        "value": value,
        "code": code,
    }))
}

pub(crate) fn missing_field_error(field: FieldName) -> Error {
    invalid_field(
        field.as_str(),
        "missing_field",
        format!("missing required field: {}", field.as_str()),
    )
}

pub(crate) fn invalid_uuid_error(field: FieldName, value: &str) -> Error {
    invalid_value(
        field,
        "invalid_uuid",
        format!("{} must be a valid UUID", field.as_str()),
        value,
    )
}

/// Parse a path or body identifier into one of the domain id newtypes.
pub(crate) fn parse_id<T: FromStr>(value: &str, field: FieldName) -> Result<T, Error> {
    value
        .parse::<T>()
        .map_err(|_| invalid_uuid_error(field, value))
}

pub(crate) fn invalid_timestamp_error(field: FieldName, value: &str) -> Error {
    invalid_value(
        field,
        "invalid_timestamp",
        format!("{} must be an RFC 3339 timestamp", field.as_str()),
        value,
    )
}

pub(crate) fn parse_rfc3339_timestamp(value: &str, field: FieldName) -> Result<DateTime<Utc>, Error> {
    DateTime::parse_from_rfc3339(value)
        .map(|timestamp| timestamp.with_timezone(&Utc))
        .map_err(|_| invalid_timestamp_error(field, value))
}

/// Parse a required query or body value, reporting absence as `missing_field`.
pub(crate) fn require<T>(value: Option<T>, field: FieldName) -> Result<T, Error> {
    value.ok_or_else(|| missing_field_error(field))
}

/// Parse a comma-separated list such as `covered,ev_charging`.
pub(crate) fn parse_csv<T>(raw: &str, field: FieldName) -> Result<Vec<T>, Error>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| {
            item.parse::<T>().map_err(|err| {
                invalid_value(field, "invalid_value", err.to_string(), item)
            })
        })
        .collect()
}

pub(crate) fn page_request(limit: Option<u32>, offset: Option<u32>) -> Result<PageRequest, Error> {
    PageRequest::new(limit, offset).map_err(|InvalidPageLimit(value)| {
        invalid_value(
            FieldName::new("limit"),
            "invalid_limit",
            InvalidPageLimit(value).to_string(),
            &value.to_string(),
        )
    })
}

pub(crate) fn from_user_error(err: UserValidationError) -> Error {
    invalid_field(err.field(), err.code(), err.to_string())
}

pub(crate) fn from_location_error(err: LocationValidationError) -> Error {
    invalid_field(err.field(), err.code(), err.to_string())
}

pub(crate) fn from_booking_error(err: BookingValidationError) -> Error {
    invalid_field(err.field(), err.code(), err.to_string())
}

pub(crate) fn from_geo_error(err: GeoValidationError) -> Error {
    let code = match err {
        GeoValidationError::Radius(_) => "invalid_radius",
        GeoValidationError::Latitude(_) | GeoValidationError::Longitude(_) => "invalid_coordinates",
    };
    invalid_field(err.field(), code, err.to_string())
}
