//! Real-time parking events and the rooms they are delivered to.

use std::fmt;

use serde::Serialize;

use super::booking::Booking;
use super::parking_location::{LocationStatus, ParkingLocationId};
use super::user::UserId;

const LOCATION_PREFIX: &str = "location:";
const USER_BOOKINGS_PREFIX: &str = "user:bookings:";

/// Broadcast channel that clients subscribe to.
///
/// # Examples
/// ```
/// use parkspot::domain::{ParkingLocationId, Room};
///
/// let id = ParkingLocationId::random();
/// let room = Room::Location(id);
/// assert_eq!(room.to_string().parse::<Room>(), Ok(room));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Room {
    Location(ParkingLocationId),
    UserBookings(UserId),
}

impl fmt::Display for Room {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Location(id) => write!(f, "{LOCATION_PREFIX}{id}"),
            Self::UserBookings(id) => write!(f, "{USER_BOOKINGS_PREFIX}{id}"),
        }
    }
}

/// Room name that is not `location:<uuid>` or `user:bookings:<uuid>`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognised room name: {0}")]
pub struct UnknownRoom(pub String);

impl std::str::FromStr for Room {
    type Err = UnknownRoom;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || UnknownRoom(s.to_owned());
        if let Some(rest) = s.strip_prefix(USER_BOOKINGS_PREFIX) {
            return UserId::new(rest).map(Self::UserBookings).map_err(|_| unknown());
        }
        if let Some(rest) = s.strip_prefix(LOCATION_PREFIX) {
            return ParkingLocationId::new(rest)
                .map(Self::Location)
                .map_err(|_| unknown());
        }
        Err(unknown())
    }
}

/// What happened to a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingChange {
    Created,
    Cancelled,
    CheckedIn,
    Completed,
}

/// Domain event fanned out to subscribed clients.
#[derive(Debug, Clone, PartialEq)]
pub enum ParkingEvent {
    BookingChanged {
        booking: Booking,
        change: BookingChange,
    },
    LocationChanged {
        location_id: ParkingLocationId,
        available_spaces: u32,
        total_spaces: u32,
        status: LocationStatus,
    },
}

impl ParkingEvent {
    /// Rooms that should receive this event.
    pub fn rooms(&self) -> Vec<Room> {
        match self {
            Self::BookingChanged { booking, .. } => vec![
                Room::UserBookings(booking.user_id),
                Room::Location(booking.location_id),
            ],
            Self::LocationChanged { location_id, .. } => vec![Room::Location(*location_id)],
        }
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::{
        BookingId, BookingStatus, BookingWindow, VehiclePlate, VehicleType,
    };
    use rstest::rstest;

    #[rstest]
    #[case("location:3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    #[case("user:bookings:3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    fn room_names_round_trip(#[case] raw: &str) {
        let room: Room = raw.parse().expect("valid room");
        assert_eq!(room.to_string(), raw);
    }

    #[rstest]
    #[case("location:")]
    #[case("location:not-a-uuid")]
    #[case("user:3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    #[case("lobby")]
    fn unknown_rooms_are_rejected(#[case] raw: &str) {
        assert_eq!(raw.parse::<Room>(), Err(UnknownRoom(raw.to_owned())));
    }

    #[rstest]
    fn booking_events_target_owner_and_location() {
        let start = "2025-03-01T10:00:00Z".parse().expect("start");
        let end = "2025-03-01T11:00:00Z".parse().expect("end");
        let booking = Booking {
            id: BookingId::random(),
            user_id: UserId::random(),
            location_id: ParkingLocationId::random(),
            vehicle_plate: VehiclePlate::new("AB12").expect("plate"),
            vehicle_type: VehicleType::Van,
            window: BookingWindow::new(start, end).expect("window"),
            total_price_cents: 100,
            status: BookingStatus::Confirmed,
            created_at: start,
            updated_at: start,
        };
        let event = ParkingEvent::BookingChanged {
            booking: booking.clone(),
            change: BookingChange::Created,
        };
        assert_eq!(
            event.rooms(),
            vec![
                Room::UserBookings(booking.user_id),
                Room::Location(booking.location_id)
            ]
        );
    }

    #[rstest]
    fn location_events_target_location_only() {
        let location_id = ParkingLocationId::random();
        let event = ParkingEvent::LocationChanged {
            location_id,
            available_spaces: 3,
            total_spaces: 5,
            status: LocationStatus::Active,
        };
        assert_eq!(event.rooms(), vec![Room::Location(location_id)]);
    }
}
