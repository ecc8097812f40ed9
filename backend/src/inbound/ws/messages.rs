//! Wire-level message definitions for the WebSocket adapter.
//!
//! Every frame is a JSON object tagged by `type`. Clients send subscription
//! requests; the server replies with acknowledgements, errors and the
//! broadcasts for rooms the connection has joined.

use serde::{Deserialize, Serialize};

use crate::domain::{BookingChange, Error, ParkingEvent, Room};
use crate::inbound::http::bookings::BookingResponse;

/// Frame sent by the client.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    #[serde(rename = "subscribe:location", rename_all = "camelCase")]
    SubscribeLocation { location_id: String },
    #[serde(rename = "unsubscribe:location", rename_all = "camelCase")]
    UnsubscribeLocation { location_id: String },
    /// Join the session user's own booking room.
    #[serde(rename = "subscribe:bookings")]
    SubscribeBookings,
    #[serde(rename = "unsubscribe:bookings")]
    UnsubscribeBookings,
}

/// Frame sent to the client.
#[derive(Debug, Serialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    #[serde(rename = "booking:update")]
    BookingUpdate {
        booking: BookingResponse,
        change: BookingChange,
    },
    #[serde(rename = "location:update", rename_all = "camelCase")]
    LocationUpdate {
        location_id: String,
        available_spaces: u32,
        total_spaces: u32,
        status: String,
    },
    #[serde(rename = "subscribed")]
    Subscribed { room: String },
    #[serde(rename = "unsubscribed")]
    Unsubscribed { room: String },
    #[serde(rename = "error")]
    Error { code: String, message: String },
}

impl ServerMessage {
    pub fn subscribed(room: &Room) -> Self {
        Self::Subscribed {
            room: room.to_string(),
        }
    }

    pub fn unsubscribed(room: &Room) -> Self {
        Self::Unsubscribed {
            room: room.to_string(),
        }
    }

    pub fn error(code: &str, message: impl Into<String>) -> Self {
        Self::Error {
            code: code.to_owned(),
            message: message.into(),
        }
    }
}

impl From<&Error> for ServerMessage {
    fn from(value: &Error) -> Self {
        Self::error(value.code().as_str(), value.message())
    }
}

impl From<&ParkingEvent> for ServerMessage {
    fn from(value: &ParkingEvent) -> Self {
        match value {
            ParkingEvent::BookingChanged { booking, change } => Self::BookingUpdate {
                booking: BookingResponse::from(booking.clone()),
                change: *change,
            },
            ParkingEvent::LocationChanged {
                location_id,
                available_spaces,
                total_spaces,
                status,
            } => Self::LocationUpdate {
                location_id: location_id.to_string(),
                available_spaces: *available_spaces,
                total_spaces: *total_spaces,
                status: status.as_str().to_owned(),
            },
        }
    }
}
