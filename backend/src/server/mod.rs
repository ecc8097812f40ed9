//! Server construction and middleware wiring.

mod config;
#[cfg(feature = "metrics")]
mod metrics;
mod state_builders;

pub use config::ServerConfig;

use std::sync::Arc;

use actix_session::{
    SessionMiddleware,
    config::{CookieContentSecurity, PersistentSession},
    storage::CookieSessionStore,
};
use actix_web::cookie::{Key, SameSite};
use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};

#[cfg(debug_assertions)]
use parkspot::doc::ApiDoc;
use parkspot::domain::ports::ParkingEventPublisher;
#[cfg(not(feature = "metrics"))]
use parkspot::domain::ports::{BookingMetrics, NoOpBookingMetrics};
use parkspot::inbound::http::bookings::{
    cancel_booking, check_in_booking, complete_booking, create_booking, get_booking,
    list_bookings,
};
use parkspot::inbound::http::error::{json_error_handler, query_error_handler};
use parkspot::inbound::http::health::{HealthState, live, ready};
use parkspot::inbound::http::locations::{
    create_location, delete_location, get_location, list_locations, location_availability,
    location_bookings, nearby_locations, update_location,
};
use parkspot::inbound::http::state::HttpState;
use parkspot::inbound::http::users::{
    current_user, get_user, list_users, login, logout, register,
};
use parkspot::inbound::ws::{self, RoomRegistry, WsState};
use parkspot::middleware::Trace;
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

use state_builders::{ServiceDeps, build_http_state};

#[derive(Clone)]
struct AppDependencies {
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
    ws_state: web::Data<WsState>,
    key: Key,
    cookie_secure: bool,
    same_site: SameSite,
}

fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        health_state,
        http_state,
        ws_state,
        key,
        cookie_secure,
        same_site,
    } = deps;

    let session = SessionMiddleware::builder(CookieSessionStore::default(), key)
        .cookie_name("session".into())
        .cookie_path("/".into())
        .cookie_secure(cookie_secure)
        .cookie_http_only(true)
        .cookie_content_security(CookieContentSecurity::Private)
        .cookie_same_site(same_site)
        .session_lifecycle(
            PersistentSession::default().session_ttl(actix_web::cookie::time::Duration::hours(8)),
        )
        .build();

    // Literal segments must register before the `{id}` matchers beside them.
    let api = web::scope("/api/v1")
        .service(register)
        .service(login)
        .service(logout)
        .service(current_user)
        .service(get_user)
        .service(list_users)
        .service(nearby_locations)
        .service(list_locations)
        .service(create_location)
        .service(location_availability)
        .service(location_bookings)
        .service(get_location)
        .service(update_location)
        .service(delete_location)
        .service(create_booking)
        .service(list_bookings)
        .service(get_booking)
        .service(cancel_booking)
        .service(check_in_booking)
        .service(complete_booking);

    let app = App::new()
        .app_data(health_state)
        .app_data(http_state)
        .app_data(ws_state)
        .app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .app_data(web::QueryConfig::default().error_handler(query_error_handler))
        .wrap(session)
        .wrap(Trace)
        .service(api)
        .service(ws::ws_entry)
        .service(ready)
        .service(live);

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

    app
}

/// Construct the HTTP server.
///
/// Storage follows the configuration: PostgreSQL repositories when a pool
/// is attached, in-memory ones otherwise. One [`RoomRegistry`] serves both as
/// the services' event publisher and as the WebSocket room table.
///
/// # Errors
/// Propagates [`std::io::Error`] when metrics registration or binding the
/// socket fails.
pub fn create_server(
    health_state: web::Data<HealthState>,
    config: ServerConfig,
) -> std::io::Result<Server> {
    let rooms = Arc::new(RoomRegistry::new());
    let events: Arc<dyn ParkingEventPublisher> = rooms.clone();

    #[cfg(feature = "metrics")]
    let prometheus = metrics::build_prometheus()?;
    #[cfg(feature = "metrics")]
    let booking_metrics = metrics::booking_metrics(&prometheus)?;
    #[cfg(not(feature = "metrics"))]
    let booking_metrics: Arc<dyn BookingMetrics> = Arc::new(NoOpBookingMetrics);

    let deps = ServiceDeps::new(&config, events, booking_metrics);
    let state = build_http_state(&config, deps);
    let ws_state = web::Data::new(WsState::new(
        Arc::clone(&state.locations_query),
        rooms,
        config.allowed_origins.iter().cloned(),
    ));
    let http_state = web::Data::new(state);

    let ServerConfig {
        key,
        cookie_secure,
        same_site,
        bind_addr,
        ..
    } = config;

    let server_health_state = health_state.clone();
    let server = HttpServer::new(move || {
        let app = build_app(AppDependencies {
            health_state: server_health_state.clone(),
            http_state: http_state.clone(),
            ws_state: ws_state.clone(),
            key: key.clone(),
            cookie_secure,
            same_site,
        });

        #[cfg(feature = "metrics")]
        let app = app.wrap(prometheus.clone());

        app
    })
    .bind(bind_addr)?
    .run();

    health_state.mark_ready();
    Ok(server)
}
