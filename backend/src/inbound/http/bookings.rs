//! Booking handlers.
//!
//! ```text
//! POST /api/v1/bookings {"locationId":"…","vehiclePlate":"SN19 ABC","vehicleType":"car",
//!                        "startTime":"2025-03-01T10:00:00Z","endTime":"2025-03-01T12:00:00Z"}
//! GET  /api/v1/bookings?status=confirmed
//! POST /api/v1/bookings/{id}/cancel
//! ```

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::ports::NewBooking;
use crate::domain::{
    Booking, BookingId, BookingStatus, BookingWindow, Error, VehiclePlate, VehicleType,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::require_actor;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, from_booking_error, invalid_field, parse_id, parse_rfc3339_timestamp, require,
};

/// Body for `POST /api/v1/bookings`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    #[schema(example = "9b2f0d1e-7c4a-4e0b-8d55-0f3c2a1b6e77")]
    pub location_id: Option<String>,
    #[schema(example = "SN19 ABC")]
    pub vehicle_plate: Option<String>,
    /// `car`, `motorcycle`, `van` or `ev`. Defaults to `car`.
    pub vehicle_type: Option<String>,
    #[schema(example = "2025-03-01T10:00:00Z")]
    pub start_time: Option<String>,
    #[schema(example = "2025-03-01T12:00:00Z")]
    pub end_time: Option<String>,
}

impl TryFrom<CreateBookingRequest> for NewBooking {
    type Error = Error;

    fn try_from(body: CreateBookingRequest) -> Result<Self, Self::Error> {
        let location_field = FieldName::new("locationId");
        let plate_field = FieldName::new("vehiclePlate");
        let start_field = FieldName::new("startTime");
        let end_field = FieldName::new("endTime");

        let location_id = parse_id(&require(body.location_id, location_field)?, location_field)?;
        let vehicle_plate =
            VehiclePlate::new(require(body.vehicle_plate, plate_field)?).map_err(from_booking_error)?;
        let vehicle_type = body
            .vehicle_type
            .as_deref()
            .map(str::parse::<VehicleType>)
            .transpose()
            .map_err(from_booking_error)?
            .unwrap_or(VehicleType::Car);
        let start =
            parse_rfc3339_timestamp(&require(body.start_time, start_field)?, start_field)?;
        let end = parse_rfc3339_timestamp(&require(body.end_time, end_field)?, end_field)?;
        let window = BookingWindow::new(start, end).map_err(from_booking_error)?;

        Ok(Self {
            location_id,
            vehicle_plate,
            vehicle_type,
            window,
        })
    }
}

/// Booking as returned by the API.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookingResponse {
    pub id: String,
    pub user_id: String,
    pub location_id: String,
    #[schema(example = "SN19ABC")]
    pub vehicle_plate: String,
    #[schema(example = "car")]
    pub vehicle_type: String,
    pub start_time: String,
    pub end_time: String,
    #[schema(example = 500)]
    pub total_price_cents: i64,
    #[schema(example = "confirmed")]
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Booking> for BookingResponse {
    fn from(booking: Booking) -> Self {
        Self {
            id: booking.id.to_string(),
            user_id: booking.user_id.to_string(),
            location_id: booking.location_id.to_string(),
            vehicle_plate: booking.vehicle_plate.into(),
            vehicle_type: booking.vehicle_type.as_str().to_owned(),
            start_time: booking.window.start().to_rfc3339(),
            end_time: booking.window.end().to_rfc3339(),
            total_price_cents: booking.total_price_cents,
            status: booking.status.as_str().to_owned(),
            created_at: booking.created_at.to_rfc3339(),
            updated_at: booking.updated_at.to_rfc3339(),
        }
    }
}

/// `GET /api/v1/bookings` query.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BookingListQuery {
    /// `confirmed`, `checked_in`, `completed` or `cancelled`.
    pub status: Option<String>,
}

fn booking_id(raw: &str) -> ApiResult<BookingId> {
    parse_id(raw, FieldName::new("id"))
}

/// Reserve a space for the caller.
#[utoipa::path(
    post,
    path = "/api/v1/bookings",
    request_body = CreateBookingRequest,
    responses(
        (status = 201, description = "Booked", body = BookingResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Unknown location", body = ErrorSchema),
        (status = 409, description = "Location full or vehicle already booked", body = ErrorSchema)
    ),
    tags = ["bookings"],
    operation_id = "createBooking"
)]
#[post("/bookings")]
pub async fn create_booking(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<CreateBookingRequest>,
) -> ApiResult<HttpResponse> {
    let actor = require_actor(&state, &session).await?;
    let request = NewBooking::try_from(payload.into_inner())?;
    let booking = state.bookings.create(&actor, request).await?;
    Ok(HttpResponse::Created().json(BookingResponse::from(booking)))
}

/// The caller's bookings, newest window first.
#[utoipa::path(
    get,
    path = "/api/v1/bookings",
    params(BookingListQuery),
    responses(
        (status = 200, description = "Bookings", body = [BookingResponse]),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema)
    ),
    tags = ["bookings"],
    operation_id = "listMyBookings"
)]
#[get("/bookings")]
pub async fn list_bookings(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<BookingListQuery>,
) -> ApiResult<web::Json<Vec<BookingResponse>>> {
    let actor = require_actor(&state, &session).await?;
    let status = query
        .status
        .as_deref()
        .map(str::parse::<BookingStatus>)
        .transpose()
        .map_err(|err| invalid_field("status", err.code(), err.to_string()))?;
    let bookings = state.bookings_query.list_mine(&actor, status).await?;
    Ok(web::Json(bookings.into_iter().map(BookingResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/api/v1/bookings/{id}",
    params(("id" = String, Path, description = "Booking id")),
    responses(
        (status = 200, description = "Booking", body = BookingResponse),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Not the owner", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["bookings"],
    operation_id = "getBooking"
)]
#[get("/bookings/{id}")]
pub async fn get_booking(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<BookingResponse>> {
    let actor = require_actor(&state, &session).await?;
    let id = booking_id(&path)?;
    Ok(web::Json(state.bookings_query.get(&actor, &id).await?.into()))
}

/// Cancel before the window starts. Admins may cancel any confirmed booking.
#[utoipa::path(
    post,
    path = "/api/v1/bookings/{id}/cancel",
    params(("id" = String, Path, description = "Booking id")),
    responses(
        (status = 200, description = "Cancelled", body = BookingResponse),
        (status = 403, description = "Not the owner", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema),
        (status = 409, description = "Not cancellable", body = ErrorSchema)
    ),
    tags = ["bookings"],
    operation_id = "cancelBooking"
)]
#[post("/bookings/{id}/cancel")]
pub async fn cancel_booking(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<BookingResponse>> {
    let actor = require_actor(&state, &session).await?;
    let id = booking_id(&path)?;
    Ok(web::Json(state.bookings.cancel(&actor, &id).await?.into()))
}

/// Owner check-in, open from shortly before the start until the end.
#[utoipa::path(
    post,
    path = "/api/v1/bookings/{id}/check-in",
    params(("id" = String, Path, description = "Booking id")),
    responses(
        (status = 200, description = "Checked in", body = BookingResponse),
        (status = 403, description = "Not the owner", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema),
        (status = 409, description = "Outside the check-in window", body = ErrorSchema)
    ),
    tags = ["bookings"],
    operation_id = "checkInBooking"
)]
#[post("/bookings/{id}/check-in")]
pub async fn check_in_booking(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<BookingResponse>> {
    let actor = require_actor(&state, &session).await?;
    let id = booking_id(&path)?;
    Ok(web::Json(state.bookings.check_in(&actor, &id).await?.into()))
}

#[utoipa::path(
    post,
    path = "/api/v1/bookings/{id}/complete",
    params(("id" = String, Path, description = "Booking id")),
    responses(
        (status = 200, description = "Completed", body = BookingResponse),
        (status = 403, description = "Not the owner", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema),
        (status = 409, description = "Not checked in", body = ErrorSchema)
    ),
    tags = ["bookings"],
    operation_id = "completeBooking"
)]
#[post("/bookings/{id}/complete")]
pub async fn complete_booking(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<BookingResponse>> {
    let actor = require_actor(&state, &session).await?;
    let id = booking_id(&path)?;
    Ok(web::Json(state.bookings.complete(&actor, &id).await?.into()))
}

#[cfg(test)]
#[path = "bookings_tests.rs"]
mod tests;
