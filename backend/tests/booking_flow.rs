//! End-to-end reservation flows over HTTP against the in-memory wiring.

mod support;

use actix_web::http::Method;
use rstest::rstest;
use serde_json::{Value, json};

use support::{
    ADMIN_EMAIL, ApiClient, TestServer, location_body, minutes_from_now, spawn_server,
};

async fn admin(server: &TestServer) -> ApiClient {
    let mut client = ApiClient::new(&server.base_url);
    let reply = client.register("Ops Desk", ADMIN_EMAIL).await;
    assert_eq!(reply.status, 201, "{}", reply.body);
    assert_eq!(reply.str("role"), "admin");
    client
}

async fn driver(server: &TestServer, email: &str) -> ApiClient {
    let mut client = ApiClient::new(&server.base_url);
    let reply = client.register("Driver", email).await;
    assert_eq!(reply.status, 201, "{}", reply.body);
    client
}

async fn create_location(admin: &mut ApiClient, spaces: u32) -> String {
    let reply = admin
        .post("/locations", location_body("Harbour Street", spaces, 55.9765, -3.1701))
        .await;
    assert_eq!(reply.status, 201, "{}", reply.body);
    reply.str("id").to_owned()
}

fn booking_body(location_id: &str, plate: &str, start: i64, end: i64) -> Value {
    json!({
        "locationId": location_id,
        "vehiclePlate": plate,
        "startTime": minutes_from_now(start),
        "endTime": minutes_from_now(end),
    })
}

#[rstest]
#[actix_rt::test]
async fn reserve_check_in_and_complete() {
    let server = spawn_server();
    let mut ops = admin(&server).await;
    let location_id = create_location(&mut ops, 1).await;
    let mut ada = driver(&server, "ada@example.com").await;

    let created = ada
        .post("/bookings", booking_body(&location_id, "sn19 abc", 10, 70))
        .await;
    assert_eq!(created.status, 201, "{}", created.body);
    assert_eq!(created.str("status"), "confirmed");
    assert_eq!(created.str("vehiclePlate"), "SN19ABC");
    assert_eq!(created.body["totalPriceCents"], 250);
    let booking_id = created.str("id").to_owned();

    let checked_in = ada
        .call(Method::POST, &format!("/bookings/{booking_id}/check-in"), None)
        .await;
    assert_eq!(checked_in.status, 200, "{}", checked_in.body);
    assert_eq!(checked_in.str("status"), "checked_in");

    let completed = ada
        .call(Method::POST, &format!("/bookings/{booking_id}/complete"), None)
        .await;
    assert_eq!(completed.status, 200, "{}", completed.body);
    assert_eq!(completed.str("status"), "completed");

    let mine = ada.get("/bookings?status=completed").await;
    assert_eq!(mine.body.as_array().map(Vec::len), Some(1));
}

#[rstest]
#[actix_rt::test]
async fn the_last_space_cannot_be_booked_twice() {
    let server = spawn_server();
    let mut ops = admin(&server).await;
    let location_id = create_location(&mut ops, 1).await;
    let mut ada = driver(&server, "ada@example.com").await;
    let mut bob = driver(&server, "bob@example.com").await;

    let first = ada
        .post("/bookings", booking_body(&location_id, "AA11AAA", 30, 150))
        .await;
    assert_eq!(first.status, 201, "{}", first.body);

    let clash = bob
        .post("/bookings", booking_body(&location_id, "BB22BBB", 90, 210))
        .await;
    assert_eq!(clash.status, 409);
    assert_eq!(clash.error_code(), Some("conflict"));
    assert_eq!(clash.detail_code(), Some("capacity_exhausted"));

    let quote = bob
        .get(&format!(
            "/locations/{location_id}/availability?start={}&end={}",
            urlencode(&minutes_from_now(90)),
            urlencode(&minutes_from_now(210)),
        ))
        .await;
    assert_eq!(quote.status, 200, "{}", quote.body);
    assert_eq!(quote.body["availableSpaces"], 0);
    assert_eq!(quote.body["peakOccupied"], 1);

    let back_to_back = bob
        .post("/bookings", booking_body(&location_id, "BB22BBB", 150, 210))
        .await;
    assert_eq!(back_to_back.status, 201, "{}", back_to_back.body);
}

#[rstest]
#[actix_rt::test]
async fn cancelling_frees_the_space() {
    let server = spawn_server();
    let mut ops = admin(&server).await;
    let location_id = create_location(&mut ops, 1).await;
    let mut ada = driver(&server, "ada@example.com").await;
    let mut bob = driver(&server, "bob@example.com").await;

    let held = ada
        .post("/bookings", booking_body(&location_id, "AA11AAA", 60, 120))
        .await;
    let held_id = held.str("id").to_owned();

    let snooping = bob
        .call(Method::POST, &format!("/bookings/{held_id}/cancel"), None)
        .await;
    assert_eq!(snooping.status, 403);

    let cancelled = ada
        .call(Method::POST, &format!("/bookings/{held_id}/cancel"), None)
        .await;
    assert_eq!(cancelled.str("status"), "cancelled");

    let rebooked = bob
        .post("/bookings", booking_body(&location_id, "BB22BBB", 60, 120))
        .await;
    assert_eq!(rebooked.status, 201, "{}", rebooked.body);

    let again = ada
        .call(Method::POST, &format!("/bookings/{held_id}/cancel"), None)
        .await;
    assert_eq!(again.status, 409);
    assert_eq!(again.detail_code(), Some("invalid_status"));
}

#[rstest]
#[actix_rt::test]
async fn nearby_search_ranks_by_distance_and_hides_full_locations() {
    let server = spawn_server();
    let mut ops = admin(&server).await;
    let far = ops
        .post("/locations", location_body("Portobello", 10, 55.9530, -3.1100))
        .await;
    let near = ops
        .post("/locations", location_body("Leith Walk", 10, 55.9700, -3.1750))
        .await;
    ops.post("/locations", location_body("Glasgow Central", 10, 55.8600, -4.2500))
        .await;

    let mut visitor = ApiClient::new(&server.base_url);
    let hits = visitor
        .get("/locations/nearby?lat=55.9720&lng=-3.1720&radiusKm=10")
        .await;
    assert_eq!(hits.status, 200, "{}", hits.body);
    let ids: Vec<&str> = hits
        .body
        .as_array()
        .expect("array")
        .iter()
        .filter_map(|hit| hit["id"].as_str())
        .collect();
    assert_eq!(ids, vec![near.str("id"), far.str("id")]);
}

#[rstest]
#[actix_rt::test]
async fn location_management_is_admin_only() {
    let server = spawn_server();
    let mut ada = driver(&server, "ada@example.com").await;
    let denied = ada
        .post("/locations", location_body("Rogue Lot", 5, 55.95, -3.19))
        .await;
    assert_eq!(denied.status, 403);

    let mut anonymous = ApiClient::new(&server.base_url);
    let unauthorised = anonymous.get("/bookings").await;
    assert_eq!(unauthorised.status, 401);
    assert!(unauthorised.body.get("traceId").is_some());
}

#[rstest]
#[actix_rt::test]
async fn malformed_bodies_use_the_error_envelope() {
    let server = spawn_server();
    let mut ada = driver(&server, "ada@example.com").await;
    let reply = ada
        .post(
            "/bookings",
            json!({ "locationId": "lot-7", "vehiclePlate": "AA11AAA",
                    "startTime": minutes_from_now(10), "endTime": minutes_from_now(70) }),
        )
        .await;
    assert_eq!(reply.status, 400);
    assert_eq!(reply.error_code(), Some("invalid_request"));
    assert_eq!(reply.body["details"]["field"], "locationId");
}

fn urlencode(raw: &str) -> String {
    raw.replace('+', "%2B").replace(':', "%3A")
}
