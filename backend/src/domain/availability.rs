//! Space availability and reservation conflict checks.
//!
//! Occupancy is measured as the peak number of occupying bookings that hold a
//! space at the same instant, not the number of bookings touching the window.
//! Two back-to-back bookings therefore consume one space, not two.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::booking::{Booking, BookingId, BookingWindow};
use super::parking_location::{Capacity, LocationStatus, ParkingLocation};

/// Maximum number of occupying bookings overlapping any instant of `window`.
///
/// Intervals are half-open, so an end and a start at the same instant never
/// count together.
///
/// # Examples
/// ```
/// use parkspot::domain::{BookingWindow, peak_occupancy_of_windows};
///
/// let w = |s: &str, e: &str| {
///     BookingWindow::new(s.parse().expect("start"), e.parse().expect("end")).expect("window")
/// };
/// let bookings = [
///     w("2025-03-01T09:00:00Z", "2025-03-01T10:00:00Z"),
///     w("2025-03-01T10:00:00Z", "2025-03-01T11:00:00Z"),
/// ];
/// let window = w("2025-03-01T09:00:00Z", "2025-03-01T11:00:00Z");
/// assert_eq!(peak_occupancy_of_windows(&window, bookings.iter()), 1);
/// ```
pub fn peak_occupancy_of_windows<'a>(
    window: &BookingWindow,
    occupied: impl IntoIterator<Item = &'a BookingWindow>,
) -> u32 {
    // (instant, delta); ends sort before starts at the same instant.
    let mut edges: Vec<(DateTime<Utc>, i8)> = Vec::new();
    for other in occupied {
        if !other.overlaps(window) {
            continue;
        }
        edges.push((other.start().max(window.start()), 1));
        edges.push((other.end().min(window.end()), -1));
    }
    edges.sort_unstable();

    let mut current: u32 = 0;
    let mut peak: u32 = 0;
    for (_, delta) in edges {
        if delta > 0 {
            current += 1;
            peak = peak.max(current);
        } else {
            current = current.saturating_sub(1);
        }
    }
    peak
}

/// Peak occupancy counting only bookings that hold a space.
pub fn peak_occupancy<'a>(
    window: &BookingWindow,
    bookings: impl IntoIterator<Item = &'a Booking>,
) -> u32 {
    peak_occupancy_of_windows(
        window,
        bookings
            .into_iter()
            .filter(|booking| booking.is_occupying())
            .map(|booking| &booking.window),
    )
}

/// Peak occupancy from `now` until the last occupying booking ends.
///
/// This is the smallest capacity a location can shrink to without
/// stranding a booking, and zero means nothing still holds a space.
pub fn future_peak<'a>(
    now: DateTime<Utc>,
    bookings: impl IntoIterator<Item = &'a Booking>,
) -> u32 {
    let occupying: Vec<&Booking> = bookings
        .into_iter()
        .filter(|booking| booking.is_occupying())
        .collect();
    let Some(horizon) = occupying.iter().map(|booking| booking.window.end()).max() else {
        return 0;
    };
    BookingWindow::new(now, horizon)
        .map(|window| peak_occupancy(&window, occupying))
        .unwrap_or(0)
}

/// Space summary for a location over a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Availability {
    pub total_spaces: u32,
    pub peak_occupied: u32,
    pub available_spaces: u32,
}

impl Availability {
    pub fn compute<'a>(
        capacity: Capacity,
        window: &BookingWindow,
        bookings: impl IntoIterator<Item = &'a Booking>,
    ) -> Self {
        let peak_occupied = peak_occupancy(window, bookings);
        Self {
            total_spaces: capacity.get(),
            peak_occupied,
            available_spaces: capacity.get().saturating_sub(peak_occupied),
        }
    }
}

/// Reasons a reservation cannot be placed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReservationConflict {
    #[error("no spaces left: {peak} of {capacity} already taken")]
    CapacityExhausted { peak: u32, capacity: u32 },
    #[error("vehicle already holds booking {booking_id} for an overlapping window")]
    VehicleAlreadyBooked { booking_id: BookingId },
    #[error("parking location is {} and not accepting bookings", status.as_str())]
    LocationUnavailable { status: LocationStatus },
}

impl ReservationConflict {
    /// Stable reason label for metrics and error details.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::CapacityExhausted { .. } => "capacity_exhausted",
            Self::VehicleAlreadyBooked { .. } => "vehicle_already_booked",
            Self::LocationUnavailable { .. } => "location_unavailable",
        }
    }
}

/// Decide whether `candidate` fits alongside the existing bookings.
///
/// `location_bookings` are the bookings at the candidate's location and
/// `vehicle_bookings` are the bookings held by the same plate anywhere. Either
/// list may contain non-occupying bookings or the candidate itself; both are
/// ignored.
pub fn check_reservation(
    candidate: &Booking,
    capacity: Capacity,
    location_bookings: &[Booking],
    vehicle_bookings: &[Booking],
) -> Result<(), ReservationConflict> {
    if let Some(clash) = vehicle_bookings.iter().find(|other| {
        other.id != candidate.id
            && other.is_occupying()
            && other.vehicle_plate == candidate.vehicle_plate
            && other.window.overlaps(&candidate.window)
    }) {
        return Err(ReservationConflict::VehicleAlreadyBooked {
            booking_id: clash.id,
        });
    }

    let peak = peak_occupancy(
        &candidate.window,
        location_bookings
            .iter()
            .filter(|other| other.id != candidate.id && other.location_id == candidate.location_id),
    );
    if peak >= capacity.get() {
        return Err(ReservationConflict::CapacityExhausted {
            peak,
            capacity: capacity.get(),
        });
    }
    Ok(())
}

/// [`check_reservation`] against the location as currently stored.
///
/// Adapters call this with the row they hold locked, so a status change or
/// a capacity shrink committed after the caller's own read still applies.
pub fn check_reservation_at(
    candidate: &Booking,
    location: &ParkingLocation,
    location_bookings: &[Booking],
    vehicle_bookings: &[Booking],
) -> Result<(), ReservationConflict> {
    if !location.is_active() {
        return Err(ReservationConflict::LocationUnavailable {
            status: location.status(),
        });
    }
    check_reservation(
        candidate,
        location.total_spaces(),
        location_bookings,
        vehicle_bookings,
    )
}
