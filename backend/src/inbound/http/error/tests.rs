//! Tests for HTTP error mapping.

use super::*;
use actix_web::body::to_bytes;
use actix_web::{App, test as actix_test, web};
use rstest::{fixture, rstest};
use rstest_bdd_macros::{given, then, when};
use serde::Deserialize;
use serde_json::{Value, json};

const TRACE_ID: &str = "6c0f53b4-9f9e-4f50-9a3e-3b1c2d4e5f60";

#[fixture]
fn trace_id() -> String {
    TRACE_ID.to_owned()
}

async fn decode(err: &Error) -> (StatusCode, Option<String>, Error) {
    let response = ResponseError::error_response(err);
    let status = response.status();
    let header = response
        .headers()
        .get(TRACE_ID_HEADER)
        .map(|value| value.to_str().expect("ascii trace id").to_owned());
    let bytes = to_bytes(response.into_body()).await.expect("read body");
    let payload = serde_json::from_slice(&bytes).expect("error payload");
    (status, header, payload)
}

#[rstest]
#[case(Error::invalid_request("bad"), StatusCode::BAD_REQUEST)]
#[case(Error::unauthorized("who"), StatusCode::UNAUTHORIZED)]
#[case(Error::forbidden("no"), StatusCode::FORBIDDEN)]
#[case(Error::not_found("gone"), StatusCode::NOT_FOUND)]
#[case(Error::conflict("full"), StatusCode::CONFLICT)]
#[case(Error::service_unavailable("db down"), StatusCode::SERVICE_UNAVAILABLE)]
#[case(Error::internal("boom"), StatusCode::INTERNAL_SERVER_ERROR)]
fn statuses_follow_error_codes(#[case] err: Error, #[case] expected: StatusCode) {
    assert_eq!(ResponseError::status_code(&err), expected);
}

#[rstest]
#[actix_web::test]
async fn internal_errors_are_redacted_but_keep_the_trace(trace_id: String) {
    let err = Error::internal("connection string leaked")
        .with_trace_id(trace_id.clone())
        .with_details(json!({"dsn": "postgres://secret"}));

    let (status, header, payload) = decode(&err).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(header.as_deref(), Some(TRACE_ID));
    assert_eq!(payload.message(), "Internal server error");
    assert_eq!(payload.trace_id(), Some(trace_id.as_str()));
    assert!(payload.details().is_none());
}

#[rstest]
#[actix_web::test]
async fn conflicts_keep_their_details(trace_id: String) {
    let details = json!({"code": "capacity_exhausted", "peakOccupied": 2});
    let err = Error::conflict("location is full")
        .with_trace_id(trace_id)
        .with_details(details.clone());

    let (status, header, payload) = decode(&err).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(header.as_deref(), Some(TRACE_ID));
    assert_eq!(payload.message(), "location is full");
    assert_eq!(payload.details(), Some(&details));
}

#[rstest]
#[actix_web::test]
async fn missing_trace_id_omits_the_header() {
    let (_, header, payload) = decode(&Error::not_found("no such booking")).await;
    assert!(header.is_none());
    assert!(payload.trace_id().is_none());
}

#[test]
fn framework_errors_become_internal() {
    let err: Error = actix_web::error::ErrorBadRequest("boom").into();
    assert_eq!(err.code(), ErrorCode::InternalError);
    assert_eq!(err.message(), "Internal server error");
}

#[derive(Deserialize)]
struct Payload {
    #[allow(dead_code)]
    spaces: u32,
}

#[actix_web::test]
async fn malformed_json_bodies_use_the_error_payload() {
    let app = actix_test::init_service(
        App::new()
            .app_data(web::JsonConfig::default().error_handler(json_error_handler))
            .route(
                "/payload",
                web::post().to(|_: web::Json<Payload>| async { actix_web::HttpResponse::Ok() }),
            ),
    )
    .await;

    let req = actix_test::TestRequest::post()
        .uri("/payload")
        .set_json(json!({"spaces": "many"}))
        .to_request();
    let res = actix_test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(body["code"], "invalid_request");
    assert_eq!(body["details"]["code"], "invalid_body");
}

#[actix_web::test]
async fn malformed_query_strings_use_the_error_payload() {
    let app = actix_test::init_service(
        App::new()
            .app_data(web::QueryConfig::default().error_handler(query_error_handler))
            .route(
                "/payload",
                web::get().to(|_: web::Query<Payload>| async { actix_web::HttpResponse::Ok() }),
            ),
    )
    .await;

    let req = actix_test::TestRequest::get().uri("/payload?spaces=-3").to_request();
    let res = actix_test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(body["details"]["code"], "invalid_query");
}

#[given("a conflict error code")]
fn a_conflict_error_code() -> ErrorCode {
    ErrorCode::Conflict
}

#[when("the adapter maps the code to an HTTP status")]
fn the_adapter_maps_the_code(code: ErrorCode) -> StatusCode {
    super::status_for(code)
}

#[then("the status is 409 Conflict")]
fn the_status_is_409(status: StatusCode) {
    assert_eq!(status, StatusCode::CONFLICT);
}

#[rstest]
fn conflict_scenario() {
    let code = a_conflict_error_code();
    let status = the_adapter_maps_the_code(code);
    the_status_is_409(status);
}

#[test]
fn non_internal_payloads_pass_through() {
    let err = Error::forbidden("admins only");
    assert_eq!(super::client_payload(&err), err);
}
