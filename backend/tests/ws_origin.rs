//! Origin checks on the `/ws` upgrade handshake.

mod support;

use actix_http::Request;
use actix_session::SessionMiddleware;
use actix_session::storage::CookieSessionStore;
use actix_web::body::BoxBody;
use actix_web::cookie::Key;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::header::{self, HeaderValue};
use actix_web::http::StatusCode;
use actix_web::test::{self, TestRequest};
use actix_web::{App, web};
use parkspot::inbound::ws::{self, WsState};
use rstest::{fixture, rstest};

// Sample Sec-WebSocket-Key from RFC 6455 section 1.3.
const SAMPLE_KEY: &str = "dGhlIHNhbXBsZSBub25jZQ==";

#[fixture]
fn ws_state() -> WsState {
    let (_http, ws, _rooms) = support::in_memory_states();
    ws
}

async fn init_app(
    state: WsState,
) -> impl Service<Request, Response = ServiceResponse<BoxBody>, Error = actix_web::Error> {
    test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .wrap(SessionMiddleware::new(
                CookieSessionStore::default(),
                Key::generate(),
            ))
            .service(ws::ws_entry),
    )
    .await
}

fn handshake() -> TestRequest {
    TestRequest::get()
        .uri("/ws")
        .insert_header((header::UPGRADE, "websocket"))
        .insert_header((header::CONNECTION, "Upgrade"))
        .insert_header((header::SEC_WEBSOCKET_VERSION, "13"))
        .insert_header((header::SEC_WEBSOCKET_KEY, SAMPLE_KEY))
}

#[derive(Debug, Clone, Copy)]
enum BadOrigin {
    Missing,
    Unlisted,
    OtherPort,
    Duplicated,
    NotUtf8,
    NotAUrl,
}

fn request_for(case: BadOrigin) -> Request {
    match case {
        BadOrigin::Missing => handshake().to_request(),
        BadOrigin::Unlisted => handshake()
            .insert_header((header::ORIGIN, "https://elsewhere.example"))
            .to_request(),
        BadOrigin::OtherPort => handshake()
            .insert_header((header::ORIGIN, "http://localhost:3001"))
            .to_request(),
        BadOrigin::Duplicated => handshake()
            .append_header((header::ORIGIN, support::ORIGIN))
            .append_header((header::ORIGIN, "https://elsewhere.example"))
            .to_request(),
        BadOrigin::NotUtf8 => {
            let raw = HeaderValue::from_bytes(&[0x80]).expect("opaque header value");
            handshake().insert_header((header::ORIGIN, raw)).to_request()
        }
        BadOrigin::NotAUrl => handshake()
            .insert_header((header::ORIGIN, "parkspot"))
            .to_request(),
    }
}

#[rstest]
#[actix_rt::test]
async fn upgrades_for_the_configured_origin(ws_state: WsState) {
    let app = init_app(ws_state).await;
    let request = handshake()
        .insert_header((header::ORIGIN, support::ORIGIN))
        .to_request();
    let response = test::call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::SWITCHING_PROTOCOLS);
}

#[rstest]
#[case(BadOrigin::Missing, StatusCode::FORBIDDEN)]
#[case(BadOrigin::Unlisted, StatusCode::FORBIDDEN)]
#[case(BadOrigin::OtherPort, StatusCode::FORBIDDEN)]
#[case(BadOrigin::Duplicated, StatusCode::BAD_REQUEST)]
#[case(BadOrigin::NotUtf8, StatusCode::BAD_REQUEST)]
#[case(BadOrigin::NotAUrl, StatusCode::BAD_REQUEST)]
#[actix_rt::test]
async fn refuses_bad_origin_headers(
    ws_state: WsState,
    #[case] case: BadOrigin,
    #[case] expected: StatusCode,
) {
    let app = init_app(ws_state).await;
    let response = test::call_service(&app, request_for(case)).await;
    assert_eq!(response.status(), expected, "{case:?}");
}
