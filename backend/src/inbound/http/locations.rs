//! Parking location handlers.
//!
//! Reads are public; mutations and the per-location booking list require an
//! admin session. Every location in a response carries the number of spaces
//! free right now.

use actix_web::{HttpResponse, delete, get, patch, post, web};
use tracing::info;

use crate::domain::{NearbyQuery, ParkingLocationDraft, ParkingLocationId, ParkingLocationPatch};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::require_actor;
use crate::inbound::http::bookings::BookingResponse;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, page_request, parse_id};

pub use super::locations_dto::{
    AvailabilityParams, AvailabilityResponse, CreateLocationRequest, ListLocationsQuery,
    LocationResponse, NearbyLocationResponse, NearbyParams, OperatingHoursBody,
    UpdateLocationRequest,
};

fn location_id(raw: &str) -> ApiResult<ParkingLocationId> {
    parse_id(raw, FieldName::new("id"))
}

#[utoipa::path(
    get,
    path = "/api/v1/locations",
    params(ListLocationsQuery),
    responses(
        (status = 200, description = "Locations", body = [LocationResponse]),
        (status = 400, description = "Invalid request", body = ErrorSchema)
    ),
    tags = ["locations"],
    operation_id = "listLocations",
    security([])
)]
#[get("/locations")]
pub async fn list_locations(
    state: web::Data<HttpState>,
    query: web::Query<ListLocationsQuery>,
) -> ApiResult<web::Json<Vec<LocationResponse>>> {
    let page = page_request(query.limit, query.offset)?;
    let views = state.locations_query.list(page, query.status()?).await?;
    Ok(web::Json(views.into_iter().map(LocationResponse::from).collect()))
}

/// Active locations within the radius, nearest first.
#[utoipa::path(
    get,
    path = "/api/v1/locations/nearby",
    params(NearbyParams),
    responses(
        (status = 200, description = "Nearby locations", body = [NearbyLocationResponse]),
        (status = 400, description = "Invalid request", body = ErrorSchema)
    ),
    tags = ["locations"],
    operation_id = "nearbyLocations",
    security([])
)]
#[get("/locations/nearby")]
pub async fn nearby_locations(
    state: web::Data<HttpState>,
    params: web::Query<NearbyParams>,
) -> ApiResult<web::Json<Vec<NearbyLocationResponse>>> {
    let query = NearbyQuery::try_from(params.into_inner())?;
    let hits = state.locations_query.nearby(query).await?;
    Ok(web::Json(hits.into_iter().map(NearbyLocationResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/api/v1/locations/{id}",
    params(("id" = String, Path, description = "Location id")),
    responses(
        (status = 200, description = "Location", body = LocationResponse),
        (status = 400, description = "Invalid id", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["locations"],
    operation_id = "getLocation",
    security([])
)]
#[get("/locations/{id}")]
pub async fn get_location(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<LocationResponse>> {
    let id = location_id(&path)?;
    Ok(web::Json(state.locations_query.get(&id).await?.into()))
}

/// Free spaces and price for a prospective window.
#[utoipa::path(
    get,
    path = "/api/v1/locations/{id}/availability",
    params(("id" = String, Path, description = "Location id"), AvailabilityParams),
    responses(
        (status = 200, description = "Availability quote", body = AvailabilityResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["locations"],
    operation_id = "locationAvailability",
    security([])
)]
#[get("/locations/{id}/availability")]
pub async fn location_availability(
    state: web::Data<HttpState>,
    path: web::Path<String>,
    query: web::Query<AvailabilityParams>,
) -> ApiResult<web::Json<AvailabilityResponse>> {
    let id = location_id(&path)?;
    let window = query.window()?;
    Ok(web::Json(
        state.locations_query.availability(&id, window).await?.into(),
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/locations",
    request_body = CreateLocationRequest,
    responses(
        (status = 201, description = "Created", body = LocationResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Admin only", body = ErrorSchema)
    ),
    tags = ["locations"],
    operation_id = "createLocation"
)]
#[post("/locations")]
pub async fn create_location(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<CreateLocationRequest>,
) -> ApiResult<HttpResponse> {
    let actor = require_actor(&state, &session).await?;
    let draft = ParkingLocationDraft::try_from(payload.into_inner())?;
    let view = state.locations.create(&actor, draft).await?;
    info!(location_id = %view.location.id(), "location created");
    Ok(HttpResponse::Created().json(LocationResponse::from(view)))
}

/// Partial update. Shrinking below booked demand is a conflict.
#[utoipa::path(
    patch,
    path = "/api/v1/locations/{id}",
    params(("id" = String, Path, description = "Location id")),
    request_body = UpdateLocationRequest,
    responses(
        (status = 200, description = "Updated", body = LocationResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Admin only", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema),
        (status = 409, description = "Capacity below booked demand", body = ErrorSchema)
    ),
    tags = ["locations"],
    operation_id = "updateLocation"
)]
#[patch("/locations/{id}")]
pub async fn update_location(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<UpdateLocationRequest>,
) -> ApiResult<web::Json<LocationResponse>> {
    let actor = require_actor(&state, &session).await?;
    let id = location_id(&path)?;
    let patch = ParkingLocationPatch::try_from(payload.into_inner())?;
    Ok(web::Json(state.locations.update(&actor, &id, patch).await?.into()))
}

#[utoipa::path(
    delete,
    path = "/api/v1/locations/{id}",
    params(("id" = String, Path, description = "Location id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Admin only", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema),
        (status = 409, description = "Location has upcoming bookings", body = ErrorSchema)
    ),
    tags = ["locations"],
    operation_id = "deleteLocation"
)]
#[delete("/locations/{id}")]
pub async fn delete_location(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let actor = require_actor(&state, &session).await?;
    let id = location_id(&path)?;
    state.locations.delete(&actor, &id).await?;
    info!(location_id = %id, "location deleted");
    Ok(HttpResponse::NoContent().finish())
}

#[utoipa::path(
    get,
    path = "/api/v1/locations/{id}/bookings",
    params(("id" = String, Path, description = "Location id")),
    responses(
        (status = 200, description = "Bookings at the location", body = [BookingResponse]),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Admin only", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["locations"],
    operation_id = "locationBookings"
)]
#[get("/locations/{id}/bookings")]
pub async fn location_bookings(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<Vec<BookingResponse>>> {
    let actor = require_actor(&state, &session).await?;
    let id = location_id(&path)?;
    let bookings = state.bookings_query.list_for_location(&actor, &id).await?;
    Ok(web::Json(bookings.into_iter().map(BookingResponse::from).collect()))
}

#[cfg(test)]
#[path = "locations_tests.rs"]
mod tests;
