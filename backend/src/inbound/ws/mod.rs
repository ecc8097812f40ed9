//! WebSocket inbound adapter delivering live booking and availability updates.
//!
//! Responsibilities:
//! - validate upgrade requests against the configured origin allow-list
//! - attach the session user, when present, to the connection
//! - run the per-connection loop that joins rooms and relays broadcasts

use actix_web::web::{self, Payload};
use actix_web::{
    HttpRequest, HttpResponse, get,
    http::header::{HeaderValue, ORIGIN},
};
use tracing::{error, warn};
use url::Url;

use crate::inbound::http::session::SessionContext;

mod session;

pub mod messages;
pub mod rooms;
pub mod state;

pub use rooms::RoomRegistry;
pub use state::{AllowedOrigin, WsState};

/// Handle WebSocket upgrade for the `/ws` endpoint.
#[get("/ws")]
pub async fn ws_entry(
    state: web::Data<WsState>,
    http_session: SessionContext,
    req: HttpRequest,
    stream: Payload,
) -> actix_web::Result<HttpResponse> {
    let mut origin_iter = req.headers().get_all(ORIGIN);
    let origin_header = origin_iter.next().ok_or_else(|| {
        error!("Missing Origin header on WebSocket upgrade");
        actix_web::error::ErrorForbidden("Origin not allowed")
    })?;
    if origin_iter.next().is_some() {
        error!("Multiple Origin headers on WebSocket upgrade");
        return Err(actix_web::error::ErrorBadRequest("Invalid Origin header"));
    }

    validate_origin(&state, origin_header)?;

    let user_id = http_session.user_id().unwrap_or_else(|error| {
        warn!(error = %error, "Ignoring unreadable session on WebSocket upgrade");
        None
    });

    let (response, ws_session, message_stream) =
        actix_ws::handle(&req, stream).map_err(|error| {
            error!(error = %error, "WebSocket upgrade failed");
            actix_web::error::ErrorInternalServerError("WebSocket upgrade failed")
        })?;

    actix_web::rt::spawn(session::handle_ws_session(
        state.get_ref().clone(),
        user_id,
        ws_session,
        message_stream,
    ));

    Ok(response)
}

fn validate_origin(state: &WsState, origin_header: &HeaderValue) -> actix_web::Result<()> {
    let origin_value = match origin_header.to_str() {
        Ok(value) => value,
        Err(error) => {
            error!(error = %error, "Failed to parse Origin header as string");
            return Err(actix_web::error::ErrorBadRequest("Invalid Origin header"));
        }
    };

    let origin = Url::parse(origin_value).map_err(|error| {
        error!(error = %error, "Failed to parse Origin header as URL");
        actix_web::error::ErrorBadRequest("Invalid Origin header")
    })?;

    if state.is_allowed(&origin) {
        Ok(())
    } else {
        warn!(
            origin = origin_value,
            "Rejected WS upgrade due to disallowed Origin"
        );
        Err(actix_web::error::ErrorForbidden("Origin not allowed"))
    }
}
