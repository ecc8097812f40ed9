//! Per-connection WebSocket handler.
//!
//! Multiplexes three sources in one loop: heartbeat ticks, client frames and
//! room broadcasts queued by the [`RoomRegistry`]. The public contract pings
//! every 5s and drops a connection after 10s without client traffic; tests
//! shorten both intervals.

use std::sync::Arc;
use std::time::{Duration, Instant};

use actix_ws::{CloseCode, CloseReason, Closed, Message, MessageStream, ProtocolError, Session};
use tokio::sync::mpsc;
use tokio::time;
use tracing::{debug, warn};

use crate::domain::ports::LocationsQuery;
use crate::domain::{Error, ErrorCode, ParkingLocationId, Room, UserId};
use crate::inbound::ws::messages::{ClientMessage, ServerMessage};
use crate::inbound::ws::rooms::{RoomRegistry, Subscriber};
use crate::inbound::ws::state::WsState;

/// Time between heartbeats to the client (5s in production, shorter in tests).
#[cfg(not(test))]
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);
#[cfg(test)]
const HEARTBEAT_INTERVAL: Duration = Duration::from_millis(50);

/// Max idle time before disconnecting the client (10s in production, shorter in tests).
#[cfg(not(test))]
const CLIENT_TIMEOUT: Duration = Duration::from_secs(10);
#[cfg(test)]
const CLIENT_TIMEOUT: Duration = Duration::from_millis(100);

pub(super) async fn handle_ws_session(
    state: WsState,
    user_id: Option<UserId>,
    session: Session,
    stream: MessageStream,
) {
    let (subscriber, outbound) = state.rooms.subscriber();
    let ws = WsSession {
        locations_query: state.locations_query,
        rooms: state.rooms,
        user_id,
        subscriber,
    };
    ws.run(session, stream, outbound).await;
}

enum SessionError {
    ClientClosed(Option<CloseReason>),
    StreamClosed,
    HeartbeatTimeout,
    Protocol(ProtocolError),
    InvalidPayload,
    Network(Closed),
}

enum CloseAction {
    None,
    Close(Option<CloseReason>),
}

struct WsSession {
    locations_query: Arc<dyn LocationsQuery>,
    rooms: Arc<RoomRegistry>,
    user_id: Option<UserId>,
    subscriber: Subscriber,
}

impl WsSession {
    async fn run(
        &self,
        mut session: Session,
        mut stream: MessageStream,
        mut outbound: mpsc::UnboundedReceiver<Arc<str>>,
    ) {
        let mut last_heartbeat = Instant::now();
        let mut heartbeat = time::interval(HEARTBEAT_INTERVAL);

        loop {
            let result = tokio::select! {
                _ = heartbeat.tick() => {
                    self.handle_heartbeat_tick(&mut session, &last_heartbeat).await
                }
                message = stream.recv() => {
                    self.handle_stream_message(&mut session, &mut last_heartbeat, message)
                        .await
                }
                Some(frame) = outbound.recv() => {
                    session
                        .text(frame.as_ref().to_owned())
                        .await
                        .map_err(SessionError::Network)
                }
            };

            if let Err(error) = result {
                self.rooms.leave_all(self.subscriber.id()).await;
                self.log_shutdown_reason(&error);
                let close_action = self.close_action_for(&error);
                self.close_session_if_needed(session, close_action).await;
                return;
            }
        }
    }

    async fn handle_heartbeat_tick(
        &self,
        session: &mut Session,
        last_heartbeat: &Instant,
    ) -> Result<(), SessionError> {
        if Instant::now().duration_since(*last_heartbeat) > CLIENT_TIMEOUT {
            return Err(SessionError::HeartbeatTimeout);
        }

        session.ping(b"").await.map_err(SessionError::Network)
    }

    async fn handle_stream_message(
        &self,
        session: &mut Session,
        last_heartbeat: &mut Instant,
        message: Option<Result<Message, ProtocolError>>,
    ) -> Result<(), SessionError> {
        let Some(message) = message else {
            return Err(SessionError::StreamClosed);
        };

        match message {
            Ok(message) => self.handle_message(session, last_heartbeat, message).await,
            Err(error) => Err(SessionError::Protocol(error)),
        }
    }

    async fn handle_message(
        &self,
        session: &mut Session,
        last_heartbeat: &mut Instant,
        message: Message,
    ) -> Result<(), SessionError> {
        match message {
            Message::Ping(payload) => {
                *last_heartbeat = Instant::now();
                session
                    .pong(&payload)
                    .await
                    .map_err(SessionError::Network)
            }
            Message::Text(text) => {
                *last_heartbeat = Instant::now();
                self.handle_text_message(session, text.as_ref()).await
            }
            Message::Pong(_) | Message::Binary(_) | Message::Continuation(_) | Message::Nop => {
                *last_heartbeat = Instant::now();
                Ok(())
            }
            Message::Close(reason) => Err(SessionError::ClientClosed(reason)),
        }
    }

    async fn handle_text_message(
        &self,
        session: &mut Session,
        text: &str,
    ) -> Result<(), SessionError> {
        let request = match serde_json::from_str::<ClientMessage>(text) {
            Ok(request) => request,
            Err(error) => {
                warn!(error = %error, "Rejected malformed WebSocket payload");
                return Err(SessionError::InvalidPayload);
            }
        };

        let reply = match self.handle_request(request).await {
            Ok(reply) => reply,
            Err(error) => error_message(&error),
        };
        self.send_json(session, &reply)
            .await
            .map_err(SessionError::Network)
    }

    async fn handle_request(&self, request: ClientMessage) -> Result<ServerMessage, Error> {
        match request {
            ClientMessage::SubscribeLocation { location_id } => {
                let id = parse_location_id(&location_id)?;
                self.locations_query.get(&id).await?;
                let room = Room::Location(id);
                self.rooms.join(room, &self.subscriber).await;
                debug!(room = %room, "joined room");
                Ok(ServerMessage::subscribed(&room))
            }
            ClientMessage::UnsubscribeLocation { location_id } => {
                let room = Room::Location(parse_location_id(&location_id)?);
                self.rooms.leave(&room, self.subscriber.id()).await;
                Ok(ServerMessage::unsubscribed(&room))
            }
            ClientMessage::SubscribeBookings => {
                let room = self.bookings_room()?;
                self.rooms.join(room, &self.subscriber).await;
                debug!(room = %room, "joined room");
                Ok(ServerMessage::subscribed(&room))
            }
            ClientMessage::UnsubscribeBookings => {
                let room = self.bookings_room()?;
                self.rooms.leave(&room, self.subscriber.id()).await;
                Ok(ServerMessage::unsubscribed(&room))
            }
        }
    }

    fn bookings_room(&self) -> Result<Room, Error> {
        self.user_id
            .map(Room::UserBookings)
            .ok_or_else(|| Error::unauthorized("login required to follow bookings"))
    }

    async fn send_json<T: serde::Serialize>(
        &self,
        session: &mut Session,
        payload: &T,
    ) -> Result<(), Closed> {
        match serde_json::to_string(payload) {
            Ok(body) => session.text(body).await,
            Err(error) => {
                warn!(error = %error, "Failed to serialize WebSocket payload");
                Ok(())
            }
        }
    }

    fn log_shutdown_reason(&self, error: &SessionError) {
        match error {
            SessionError::HeartbeatTimeout => {
                warn!("WebSocket heartbeat timeout; closing connection");
            }
            SessionError::Protocol(error) => {
                warn!(error = %error, "WebSocket protocol error");
            }
            SessionError::Network(error) => {
                warn!(error = %error, "WebSocket send failed; closing connection");
            }
            SessionError::InvalidPayload
            | SessionError::ClientClosed(_)
            | SessionError::StreamClosed => {}
        }
    }

    fn close_action_for(&self, error: &SessionError) -> CloseAction {
        match error {
            SessionError::HeartbeatTimeout => CloseAction::Close(Some(CloseReason {
                code: CloseCode::Normal,
                description: Some("heartbeat timeout".to_owned()),
            })),
            SessionError::Protocol(_) => CloseAction::Close(Some(CloseReason {
                code: CloseCode::Protocol,
                description: Some("protocol error".to_owned()),
            })),
            SessionError::InvalidPayload => CloseAction::Close(Some(CloseReason {
                code: CloseCode::Policy,
                description: Some("invalid payload".to_owned()),
            })),
            SessionError::ClientClosed(reason) => CloseAction::Close(reason.clone()),
            SessionError::StreamClosed | SessionError::Network(_) => CloseAction::None,
        }
    }

    async fn close_session_if_needed(&self, session: Session, close_action: CloseAction) {
        if let CloseAction::Close(reason) = close_action {
            if let Err(error) = session.close(reason).await {
                warn!(error = %error, "Failed to close WebSocket session");
            }
        }
    }
}

fn parse_location_id(raw: &str) -> Result<ParkingLocationId, Error> {
    raw.parse()
        .map_err(|_| Error::invalid_request(format!("locationId must be a valid UUID: {raw}")))
}

fn error_message(error: &Error) -> ServerMessage {
    if error.code() == ErrorCode::InternalError {
        warn!(message = error.message(), "WebSocket request failed");
        return ServerMessage::error(error.code().as_str(), "Internal server error");
    }
    ServerMessage::from(error)
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
