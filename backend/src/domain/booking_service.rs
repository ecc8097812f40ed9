//! Reservation domain service.
//!
//! Owns the booking lifecycle: policy and operating-hours checks, atomic
//! capacity-checked inserts, status transitions guarded by compare-and-set,
//! and the metrics and realtime events that follow each change.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockable::Clock;
use tracing::{info, warn};

use crate::domain::ports::{
    BookingMetrics, BookingPersistenceError, BookingRepository, BookingsCommand, BookingsQuery,
    NewBooking, ParkingEventPublisher, ParkingLocationRepository,
};
use crate::domain::service_errors::{
    conflict_with_code, invalid_field, map_booking_error, map_location_error,
};
use crate::domain::{
    Actor, Availability, Booking, BookingAction, BookingChange, BookingId, BookingPolicy,
    BookingStatus, BookingWindow, Error, ParkingEvent, ParkingLocation, ParkingLocationId,
    PolicyViolation, TransitionError, quote_price,
};

/// Booking service implementing the reservation driving ports.
#[derive(Clone)]
pub struct BookingService<L, B> {
    locations: Arc<L>,
    bookings: Arc<B>,
    events: Arc<dyn ParkingEventPublisher>,
    metrics: Arc<dyn BookingMetrics>,
    policy: BookingPolicy,
    clock: Arc<dyn Clock>,
}

impl<L, B> BookingService<L, B> {
    pub fn new(
        locations: Arc<L>,
        bookings: Arc<B>,
        events: Arc<dyn ParkingEventPublisher>,
        metrics: Arc<dyn BookingMetrics>,
        policy: BookingPolicy,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            locations,
            bookings,
            events,
            metrics,
            policy,
            clock,
        }
    }
}

fn booking_not_found(id: &BookingId) -> Error {
    Error::not_found(format!("booking {id} not found"))
}

fn map_transition(error: TransitionError) -> Error {
    let code = match &error {
        TransitionError::NotOwner => return Error::forbidden(error.to_string()),
        TransitionError::InvalidState { .. } => "invalid_status",
        TransitionError::AlreadyStarted => "already_started",
        TransitionError::TooEarly { .. } => "check_in_too_early",
        TransitionError::WindowEnded => "window_ended",
    };
    conflict_with_code(code, error.to_string())
}

fn change_for(status: BookingStatus) -> BookingChange {
    match status {
        BookingStatus::Confirmed => BookingChange::Created,
        BookingStatus::CheckedIn => BookingChange::CheckedIn,
        BookingStatus::Completed => BookingChange::Completed,
        BookingStatus::Cancelled => BookingChange::Cancelled,
    }
}

impl<L, B> BookingService<L, B>
where
    L: ParkingLocationRepository,
    B: BookingRepository,
{
    async fn load(&self, id: &BookingId) -> Result<Booking, Error> {
        self.bookings
            .find_by_id(id)
            .await
            .map_err(map_booking_error)?
            .ok_or_else(|| booking_not_found(id))
    }

    async fn load_location(&self, id: &ParkingLocationId) -> Result<ParkingLocation, Error> {
        self.locations
            .find_by_id(id)
            .await
            .map_err(map_location_error)?
            .ok_or_else(|| Error::not_found(format!("parking location {id} not found")))
    }

    /// Publish the booking change and the location's fresh availability.
    async fn broadcast(&self, booking: &Booking, change: BookingChange, now: DateTime<Utc>) {
        let booking_event = ParkingEvent::BookingChanged {
            booking: booking.clone(),
            change,
        };
        if let Err(error) = self.events.publish(&booking_event).await {
            warn!(booking_id = %booking.id, %error, "failed to publish booking event");
        }

        let location = match self.locations.find_by_id(&booking.location_id).await {
            Ok(Some(location)) => location,
            Ok(None) => return,
            Err(error) => {
                warn!(location_id = %booking.location_id, %error, "failed to reload location");
                return;
            }
        };
        let window = BookingWindow::minute_from(now);
        let occupying = match self
            .bookings
            .list_occupying(&booking.location_id, &window)
            .await
        {
            Ok(occupying) => occupying,
            Err(error) => {
                warn!(location_id = %booking.location_id, %error, "failed to load occupancy");
                return;
            }
        };
        let availability = Availability::compute(location.total_spaces(), &window, occupying.iter());
        let location_event = ParkingEvent::LocationChanged {
            location_id: location.id(),
            available_spaces: availability.available_spaces,
            total_spaces: availability.total_spaces,
            status: location.status(),
        };
        if let Err(error) = self.events.publish(&location_event).await {
            warn!(location_id = %location.id(), %error, "failed to publish location update");
        }
    }

    async fn transition(
        &self,
        actor: &Actor,
        id: &BookingId,
        action: BookingAction,
    ) -> Result<Booking, Error> {
        let now = self.clock.utc();
        let booking = self.load(id).await?;
        let next = booking
            .authorise(action, actor, now, self.policy.check_in_grace())
            .map_err(map_transition)?;

        let applied = self
            .bookings
            .update_status(id, booking.status, next, now)
            .await
            .map_err(map_booking_error)?;
        if !applied {
            return Err(conflict_with_code(
                "concurrent_update",
                "booking changed concurrently; reload and retry",
            ));
        }
        info!(booking_id = %id, status = next.as_str(), user_id = %actor.user_id, "booking status changed");

        if let Err(error) = self.metrics.record_transition(next).await {
            warn!(%error, "failed to record booking transition");
        }
        let updated = Booking {
            status: next,
            updated_at: now,
            ..booking
        };
        self.broadcast(&updated, change_for(next), now).await;
        Ok(updated)
    }
}

#[async_trait]
impl<L, B> BookingsCommand for BookingService<L, B>
where
    L: ParkingLocationRepository,
    B: BookingRepository,
{
    async fn create(&self, actor: &Actor, request: NewBooking) -> Result<Booking, Error> {
        let now = self.clock.utc();
        self.policy
            .validate(&request.window, now)
            .map_err(|violation| {
                let field = match violation {
                    PolicyViolation::StartInPast => "startTime",
                    _ => "endTime",
                };
                invalid_field(field, violation.code(), violation.message())
            })?;

        let location = self.load_location(&request.location_id).await?;
        if !location.is_active() {
            return Err(conflict_with_code(
                "location_unavailable",
                format!("parking location {} is not accepting bookings", location.id()),
            ));
        }
        if !location.operating_hours().admits(&request.window) {
            return Err(invalid_field(
                "startTime",
                "outside_operating_hours",
                "booking falls outside the location's operating hours",
            ));
        }

        let booking = Booking {
            id: BookingId::random(),
            user_id: actor.user_id,
            location_id: location.id(),
            vehicle_plate: request.vehicle_plate,
            vehicle_type: request.vehicle_type,
            total_price_cents: quote_price(location.hourly_rate(), &request.window),
            window: request.window,
            status: BookingStatus::Confirmed,
            created_at: now,
            updated_at: now,
        };

        // The snapshot above only fails fast; the repository re-reads capacity
        // and status under its lock.
        match self.bookings.insert_checked(&booking).await {
            Ok(()) => {}
            Err(BookingPersistenceError::Rejected { conflict }) => {
                if let Err(error) = self.metrics.record_rejected(conflict.reason()).await {
                    warn!(%error, "failed to record rejected booking");
                }
                info!(location_id = %location.id(), reason = conflict.reason(), "booking rejected");
                return Err(map_booking_error(BookingPersistenceError::Rejected {
                    conflict,
                }));
            }
            Err(error) => return Err(map_booking_error(error)),
        }
        info!(
            booking_id = %booking.id,
            location_id = %booking.location_id,
            user_id = %booking.user_id,
            "booking created"
        );

        if let Err(error) = self.metrics.record_created().await {
            warn!(%error, "failed to record booking creation");
        }
        self.broadcast(&booking, BookingChange::Created, now).await;
        Ok(booking)
    }

    async fn cancel(&self, actor: &Actor, id: &BookingId) -> Result<Booking, Error> {
        self.transition(actor, id, BookingAction::Cancel).await
    }

    async fn check_in(&self, actor: &Actor, id: &BookingId) -> Result<Booking, Error> {
        self.transition(actor, id, BookingAction::CheckIn).await
    }

    async fn complete(&self, actor: &Actor, id: &BookingId) -> Result<Booking, Error> {
        self.transition(actor, id, BookingAction::Complete).await
    }
}

#[async_trait]
impl<L, B> BookingsQuery for BookingService<L, B>
where
    L: ParkingLocationRepository,
    B: BookingRepository,
{
    async fn get(&self, actor: &Actor, id: &BookingId) -> Result<Booking, Error> {
        let booking = self.load(id).await?;
        if !actor.may_access(&booking.user_id) {
            return Err(Error::forbidden("booking belongs to another user"));
        }
        Ok(booking)
    }

    async fn list_mine(
        &self,
        actor: &Actor,
        status: Option<BookingStatus>,
    ) -> Result<Vec<Booking>, Error> {
        self.bookings
            .list_for_user(&actor.user_id, status)
            .await
            .map_err(map_booking_error)
    }

    async fn list_for_location(
        &self,
        actor: &Actor,
        location_id: &ParkingLocationId,
    ) -> Result<Vec<Booking>, Error> {
        if !actor.is_admin() {
            return Err(Error::forbidden("admin role required"));
        }
        self.load_location(location_id).await?;
        self.bookings
            .list_for_location(location_id)
            .await
            .map_err(map_booking_error)
    }
}

#[cfg(test)]
#[path = "booking_service_tests.rs"]
mod tests;
