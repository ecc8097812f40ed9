//! Shared harness for the end-to-end suites.
//!
//! Integration tests compile as separate crates, so each suite pulls this in
//! with `mod support;`. The harness wires the real services over the
//! in-memory repositories and serves them on an ephemeral port; `ApiClient`
//! keeps the session cookie between calls the way a browser would.

#![allow(dead_code, reason = "each suite uses a different subset")]

use std::net::TcpListener;
use std::sync::Arc;

use actix_session::SessionMiddleware;
use actix_session::config::CookieContentSecurity;
use actix_session::storage::CookieSessionStore;
use actix_web::cookie::{Key, SameSite};
use actix_web::dev::ServerHandle;
use actix_web::http::{Method, header};
use actix_web::{App, HttpServer, web};
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use mockable::DefaultClock;
use serde_json::Value;

use parkspot::Trace;
use parkspot::domain::ports::NoOpBookingMetrics;
use parkspot::domain::{
    AccountService, BookingPolicy, BookingService, EmailAddress, LocationService,
};
use parkspot::inbound::http::bookings::{
    cancel_booking, check_in_booking, complete_booking, create_booking, get_booking,
    list_bookings,
};
use parkspot::inbound::http::error::{json_error_handler, query_error_handler};
use parkspot::inbound::http::locations::{
    create_location, delete_location, get_location, list_locations, location_availability,
    location_bookings, nearby_locations, update_location,
};
use parkspot::inbound::http::state::{HttpState, HttpStatePorts};
use parkspot::inbound::http::users::{
    current_user, get_user, list_users, login, logout, register,
};
use parkspot::inbound::ws::{self, AllowedOrigin, RoomRegistry, WsState};
use parkspot::outbound::memory::{InMemoryParkingStore, InMemoryUserRepository};

pub const ADMIN_EMAIL: &str = "ops@parkspot.example";
pub const ORIGIN: &str = "http://localhost:3000";

pub struct TestServer {
    pub base_url: String,
    pub rooms: Arc<RoomRegistry>,
    pub handle: ServerHandle,
}

/// Real services over the in-memory repositories, sharing one room registry.
pub fn in_memory_states() -> (HttpState, WsState, Arc<RoomRegistry>) {
    let rooms = Arc::new(RoomRegistry::new());
    let clock = Arc::new(DefaultClock);
    let users = Arc::new(InMemoryUserRepository::new());
    let store = InMemoryParkingStore::new();
    let locations = Arc::new(store.locations());
    let bookings = Arc::new(store.bookings());

    let accounts = Arc::new(AccountService::new(
        users,
        [EmailAddress::new(ADMIN_EMAIL).expect("admin email")],
        clock.clone(),
    ));
    let location_service = Arc::new(LocationService::new(
        locations.clone(),
        bookings.clone(),
        rooms.clone(),
        clock.clone(),
    ));
    let booking_service = Arc::new(BookingService::new(
        locations,
        bookings,
        rooms.clone(),
        Arc::new(NoOpBookingMetrics),
        BookingPolicy::default(),
        clock,
    ));

    let http = HttpState::new(HttpStatePorts {
        accounts: accounts.clone(),
        accounts_query: accounts,
        locations: location_service.clone(),
        locations_query: location_service.clone(),
        bookings: booking_service.clone(),
        bookings_query: booking_service,
    });
    let ws = WsState::new(
        location_service,
        rooms.clone(),
        [AllowedOrigin::parse(ORIGIN).expect("origin")],
    );
    (http, ws, rooms)
}

/// Start a server on `127.0.0.1:0`. Must run inside an actix runtime.
pub fn spawn_server() -> TestServer {
    let (http_state, ws_state, rooms) = in_memory_states();
    let http_data = web::Data::new(http_state);
    let ws_data = web::Data::new(ws_state);
    let key = Key::generate();
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind listener");
    let addr = listener.local_addr().expect("listener addr");

    let server = HttpServer::new(move || {
        let session = SessionMiddleware::builder(CookieSessionStore::default(), key.clone())
            .cookie_name("session".to_owned())
            .cookie_secure(false)
            .cookie_content_security(CookieContentSecurity::Private)
            .cookie_same_site(SameSite::Lax)
            .build();
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
        App::new()
            .app_data(http_data.clone())
            .app_data(ws_data.clone())
            .app_data(web::JsonConfig::default().error_handler(json_error_handler))
            .app_data(web::QueryConfig::default().error_handler(query_error_handler))
            .wrap(session)
            .wrap(Trace)
            .service(api)
            .service(ws::ws_entry)
    })
    .disable_signals()
    .workers(1)
    .listen(listener)
    .expect("listen")
    .run();

    let handle = server.handle();
    actix_web::rt::spawn(server);
    TestServer {
        base_url: format!("http://{addr}"),
        rooms,
        handle,
    }
}

/// Response status and JSON body (`Null` when empty).
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: u16,
    pub body: Value,
}

impl Reply {
    pub fn str(&self, field: &str) -> &str {
        self.body
            .get(field)
            .and_then(Value::as_str)
            .unwrap_or_else(|| panic!("missing string field {field} in {}", self.body))
    }

    pub fn error_code(&self) -> Option<&str> {
        self.body.get("code").and_then(Value::as_str)
    }

    pub fn detail_code(&self) -> Option<&str> {
        self.body
            .get("details")
            .and_then(|details| details.get("code"))
            .and_then(Value::as_str)
    }
}

/// HTTP client holding one session.
pub struct ApiClient {
    base_url: String,
    cookie: Option<String>,
    inner: awc::Client,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_owned(),
            cookie: None,
            inner: awc::Client::default(),
        }
    }

    pub fn session_cookie(&self) -> Option<&str> {
        self.cookie.as_deref()
    }

    pub async fn call(&mut self, method: Method, path: &str, body: Option<Value>) -> Reply {
        let mut request = self
            .inner
            .request(method, format!("{}/api/v1{path}", self.base_url));
        if let Some(cookie) = &self.cookie {
            request = request.insert_header((header::COOKIE, cookie.clone()));
        }
        let mut response = match body {
            Some(body) => request.send_json(&body).await,
            None => request.send().await,
        }
        .expect("request");

        if let Some(cookie) = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(';').next())
        {
            self.cookie = Some(cookie.to_owned());
        }
        let status = response.status().as_u16();
        let bytes = response.body().await.expect("body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };
        Reply { status, body }
    }

    pub async fn get(&mut self, path: &str) -> Reply {
        self.call(Method::GET, path, None).await
    }

    pub async fn post(&mut self, path: &str, body: Value) -> Reply {
        self.call(Method::POST, path, Some(body)).await
    }

    pub async fn register(&mut self, name: &str, email: &str) -> Reply {
        self.post(
            "/users",
            serde_json::json!({ "name": name, "email": email }),
        )
        .await
    }
}

/// RFC 3339 timestamp `minutes` from now, whole seconds.
pub fn minutes_from_now(minutes: i64) -> String {
    timestamp(Utc::now() + Duration::minutes(minutes))
}

pub fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn location_body(name: &str, total_spaces: u32, latitude: f64, longitude: f64) -> Value {
    serde_json::json!({
        "name": name,
        "address": format!("{name}, Edinburgh"),
        "latitude": latitude,
        "longitude": longitude,
        "totalSpaces": total_spaces,
        "hourlyRateCents": 250,
        "amenities": ["covered"],
    })
}
