//! Domain primitives, aggregates and services.
//!
//! Purpose: Define strongly typed parking entities and the pure algorithms
//! (Haversine ranking, peak occupancy) used by the API and persistence
//! layers. Keep types immutable and document invariants and serialisation
//! contracts (serde) in each type's Rustdoc.
//!
//! Public surface:
//! - Error (alias to `error::Error`): API error response payload.
//! - ErrorCode (alias to `error::ErrorCode`): stable error identifier.
//! - User, ParkingLocation, Booking: the aggregates.
//! - AccountService, LocationService, BookingService: driving port
//!   implementations wired by the server.

pub mod error;
pub mod ports;
pub mod trace_id;
pub mod user;

mod account_service;
mod availability;
mod booking;
mod booking_policy;
mod booking_service;
mod events;
mod geo;
mod ids;
mod location_service;
mod nearby;
mod page;
mod parking_location;
mod service_errors;

pub use self::account_service::AccountService;
pub use self::availability::{
    Availability, ReservationConflict, check_reservation, check_reservation_at, future_peak,
    peak_occupancy, peak_occupancy_of_windows,
};
pub use self::booking::{
    Booking, BookingAction, BookingId, BookingStatus, BookingValidationError, BookingWindow,
    TransitionError, VehiclePlate, VehicleType, quote_price,
};
pub use self::booking_policy::{BookingPolicy, BookingPolicyError, PolicyViolation};
pub use self::booking_service::BookingService;
pub use self::error::{Error, ErrorCode, ErrorValidationError, TRACE_ID_HEADER};
pub use self::events::{BookingChange, ParkingEvent, Room, UnknownRoom};
pub use self::geo::{
    Coordinates, DEFAULT_SEARCH_RADIUS_KM, GeoBounds, GeoValidationError, MAX_SEARCH_RADIUS_KM,
    SearchRadius, haversine_km,
};
pub use self::ids::IdParseError;
pub use self::location_service::LocationService;
pub use self::nearby::{
    InvalidNearbyLimit, NEARBY_LIMIT_DEFAULT, NEARBY_LIMIT_MAX, NearbyCandidate, NearbyQuery,
    rank_nearby,
};
pub use self::page::{InvalidPageLimit, PAGE_LIMIT_DEFAULT, PAGE_LIMIT_MAX, PageRequest};
pub use self::parking_location::{
    Address, Amenity, AmenitySet, Capacity, HourlyRate, LocationName, LocationStatus,
    LocationValidationError, OperatingHours, ParkingLocation, ParkingLocationDraft,
    ParkingLocationId, ParkingLocationPatch,
};
pub use self::trace_id::TraceId;
pub use self::user::{
    Actor, EmailAddress, NewUser, PhoneNumber, User, UserId, UserName, UserRole,
    UserValidationError,
};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use parkspot::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::forbidden("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
