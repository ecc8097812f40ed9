//! Behaviour tests for pushed availability and booking updates.

mod support;

use std::cell::RefCell;
use std::time::Duration;

use actix_web::http::header;
use awc::BoxedSocket;
use awc::ws::{Codec, Frame, Message};
use futures_util::{SinkExt, StreamExt};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use serde_json::{Value, json};

use support::{ADMIN_EMAIL, ApiClient, ORIGIN, TestServer, location_body, minutes_from_now};

type Socket = actix_codec::Framed<BoxedSocket, Codec>;

struct LiveWorld {
    system: actix_rt::SystemRunner,
    server: TestServer,
    location_id: RefCell<Option<String>>,
    driver: RefCell<Option<ApiClient>>,
    socket: RefCell<Option<Socket>>,
}

impl LiveWorld {
    fn new() -> Self {
        let system = actix_rt::System::new();
        let server = system.block_on(async { support::spawn_server() });
        Self {
            system,
            server,
            location_id: RefCell::new(None),
            driver: RefCell::new(None),
            socket: RefCell::new(None),
        }
    }

    fn block_on<F: std::future::Future>(&self, future: F) -> F::Output {
        self.system.block_on(future)
    }

    fn location_id(&self) -> String {
        self.location_id.borrow().clone().expect("location created")
    }

    fn open_socket(&self, cookie: Option<String>) {
        let url = format!("{}/ws", self.server.base_url);
        let socket = self.block_on(async move {
            let mut request = awc::Client::default()
                .ws(url)
                .set_header(header::ORIGIN, ORIGIN);
            if let Some(cookie) = cookie {
                request = request.set_header(header::COOKIE, cookie);
            }
            let (_response, socket) = request.connect().await.expect("websocket connect");
            socket
        });
        *self.socket.borrow_mut() = Some(socket);
    }

    fn send(&self, payload: Value) {
        let mut socket = self.socket.borrow_mut();
        let socket = socket.as_mut().expect("socket open");
        self.block_on(async {
            socket
                .send(Message::Text(payload.to_string().into()))
                .await
                .expect("send frame");
        });
    }

    /// Next text frame whose `type` matches, skipping everything else.
    fn receive(&self, wanted: &str) -> Value {
        let mut socket = self.socket.borrow_mut();
        let socket = socket.as_mut().expect("socket open");
        self.block_on(async {
            tokio::time::timeout(Duration::from_secs(3), async {
                loop {
                    let frame = socket.next().await.expect("open stream").expect("frame");
                    if let Frame::Text(bytes) = frame {
                        let value: Value = serde_json::from_slice(&bytes).expect("json frame");
                        if value["type"] == wanted {
                            return value;
                        }
                    }
                }
            })
            .await
            .unwrap_or_else(|_| panic!("no {wanted} message within timeout"))
        })
    }

    fn book_next_hour(&self) {
        let location_id = self.location_id();
        let mut driver = self.driver.borrow_mut();
        let driver = driver.as_mut().expect("driver registered");
        let reply = self.block_on(driver.post(
            "/bookings",
            json!({
                "locationId": location_id,
                "vehiclePlate": "SN19ABC",
                "startTime": minutes_from_now(0),
                "endTime": minutes_from_now(60),
            }),
        ));
        assert_eq!(reply.status, 201, "{}", reply.body);
    }

    fn register_driver(&self) -> Option<String> {
        let mut driver = ApiClient::new(&self.server.base_url);
        let reply = self.block_on(driver.register("Driver", "driver@example.com"));
        assert_eq!(reply.status, 201, "{}", reply.body);
        let cookie = driver.session_cookie().map(str::to_owned);
        *self.driver.borrow_mut() = Some(driver);
        cookie
    }
}

impl Drop for LiveWorld {
    fn drop(&mut self) {
        let handle = self.server.handle.clone();
        self.system.block_on(async move {
            handle.stop(false).await;
        });
    }
}

#[fixture]
fn world() -> LiveWorld {
    LiveWorld::new()
}

#[given("a parking location with 2 spaces")]
fn a_parking_location_with_two_spaces(world: &LiveWorld) {
    let mut admin = ApiClient::new(&world.server.base_url);
    let registered = world.block_on(admin.register("Ops", ADMIN_EMAIL));
    assert_eq!(registered.status, 201);
    let created = world.block_on(admin.post(
        "/locations",
        location_body("Harbour Street", 2, 55.9765, -3.1701),
    ));
    assert_eq!(created.status, 201, "{}", created.body);
    *world.location_id.borrow_mut() = Some(created.str("id").to_owned());
}

#[given("a client watching that location")]
fn a_client_watching_that_location(world: &LiveWorld) {
    world.open_socket(None);
    world.send(json!({"type": "subscribe:location", "locationId": world.location_id()}));
    let ack = world.receive("subscribed");
    assert_eq!(ack["room"], format!("location:{}", world.location_id()));
}

#[given("a driver following their bookings")]
fn a_driver_following_their_bookings(world: &LiveWorld) {
    let cookie = world.register_driver();
    world.open_socket(cookie);
    world.send(json!({"type": "subscribe:bookings"}));
    world.receive("subscribed");
}

#[given("a client connected to live updates")]
fn a_client_connected_to_live_updates(world: &LiveWorld) {
    world.open_socket(None);
}

#[when("a driver books a space there for the next hour")]
fn a_driver_books_a_space(world: &LiveWorld) {
    world.register_driver();
    world.book_next_hour();
}

#[when("the driver books a space there for the next hour")]
fn the_driver_books_a_space(world: &LiveWorld) {
    world.book_next_hour();
}

#[when("the client watches an unknown location")]
fn the_client_watches_an_unknown_location(world: &LiveWorld) {
    world.send(json!({
        "type": "subscribe:location",
        "locationId": "00000000-0000-4000-8000-000000000000",
    }));
}

#[then("the watcher receives a location update with 1 available space")]
fn the_watcher_receives_a_location_update(world: &LiveWorld) {
    let update = world.receive("location:update");
    assert_eq!(update["locationId"], world.location_id());
    assert_eq!(update["availableSpaces"], 1);
    assert_eq!(update["totalSpaces"], 2);
}

#[then("the driver receives a booking update marked created")]
fn the_driver_receives_a_booking_update(world: &LiveWorld) {
    let update = world.receive("booking:update");
    assert_eq!(update["change"], "created");
    assert_eq!(update["booking"]["locationId"], world.location_id());
}

#[then("the client receives a not_found error")]
fn the_client_receives_a_not_found_error(world: &LiveWorld) {
    let error = world.receive("error");
    assert_eq!(error["code"], "not_found");
    assert_eq!(world.block_on(world.server.rooms.room_count()), 0);
}

#[scenario(
    path = "tests/features/live_availability.feature",
    name = "Watchers see availability drop when a space is booked"
)]
fn watchers_see_availability_drop(world: LiveWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/live_availability.feature",
    name = "Drivers follow their own bookings"
)]
fn drivers_follow_their_own_bookings(world: LiveWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/live_availability.feature",
    name = "Watching an unknown location is refused"
)]
fn watching_an_unknown_location_is_refused(world: LiveWorld) {
    drop(world);
}
