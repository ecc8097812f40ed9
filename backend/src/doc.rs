//! OpenAPI document for the REST API.
//!
//! [`ApiDoc`] gathers every HTTP handler's `#[utoipa::path]` annotation.
//! Request and response bodies are collected from those annotations; the
//! error schemas are registered explicitly because the domain error type
//! does not derive `ToSchema`. Debug builds serve Swagger UI at `/docs`.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::inbound::http::schemas::{ErrorCodeSchema, ErrorSchema};

struct SessionCookieAddon;

impl Modify for SessionCookieAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);
        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Session cookie issued by POST /api/v1/login.",
            ))),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    modifiers(&SessionCookieAddon),
    info(
        title = "ParkSpot API",
        description = "Parking locations, reservations and live availability."
    ),
    servers((url = "/", description = "Relative to the deployment base URL")),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::users::register,
        crate::inbound::http::users::login,
        crate::inbound::http::users::logout,
        crate::inbound::http::users::current_user,
        crate::inbound::http::users::get_user,
        crate::inbound::http::users::list_users,
        crate::inbound::http::locations::list_locations,
        crate::inbound::http::locations::nearby_locations,
        crate::inbound::http::locations::get_location,
        crate::inbound::http::locations::location_availability,
        crate::inbound::http::locations::create_location,
        crate::inbound::http::locations::update_location,
        crate::inbound::http::locations::delete_location,
        crate::inbound::http::locations::location_bookings,
        crate::inbound::http::bookings::create_booking,
        crate::inbound::http::bookings::list_bookings,
        crate::inbound::http::bookings::get_booking,
        crate::inbound::http::bookings::cancel_booking,
        crate::inbound::http::bookings::check_in_booking,
        crate::inbound::http::bookings::complete_booking,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(ErrorSchema, ErrorCodeSchema)),
    tags(
        (name = "users", description = "Accounts and sessions"),
        (name = "locations", description = "Parking locations and availability"),
        (name = "bookings", description = "Reservations and their lifecycle"),
        (name = "health", description = "Liveness and readiness probes")
    )
)]
pub struct ApiDoc;
