//! Parking location domain service.
//!
//! Implements the location driving ports: admin-only mutations, public reads
//! enriched with live availability, and nearby search. Shrinks and deletes
//! are checked against bookings by the repository, under the lock that
//! reservations take.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockable::Clock;
use tracing::{info, warn};

use crate::domain::nearby::rank_unbounded;
use crate::domain::ports::{
    AvailabilityQuote, BookingRepository, LocationView, LocationsCommand, LocationsQuery,
    NearbyLocation, ParkingEventPublisher, ParkingLocationRepository,
};
use crate::domain::service_errors::{invalid_field, map_booking_error, map_location_error};
use crate::domain::{
    Actor, Availability, BookingWindow, Error, GeoBounds, LocationStatus,
    LocationValidationError, NearbyQuery, PageRequest, ParkingEvent, ParkingLocation,
    ParkingLocationDraft, ParkingLocationId, ParkingLocationPatch, quote_price,
};

/// Location service implementing the location driving ports.
#[derive(Clone)]
pub struct LocationService<L, B> {
    locations: Arc<L>,
    bookings: Arc<B>,
    events: Arc<dyn ParkingEventPublisher>,
    clock: Arc<dyn Clock>,
}

impl<L, B> LocationService<L, B> {
    pub fn new(
        locations: Arc<L>,
        bookings: Arc<B>,
        events: Arc<dyn ParkingEventPublisher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            locations,
            bookings,
            events,
            clock,
        }
    }
}

fn require_admin(actor: &Actor) -> Result<(), Error> {
    if actor.is_admin() {
        Ok(())
    } else {
        Err(Error::forbidden("admin role required"))
    }
}

fn map_validation(error: LocationValidationError) -> Error {
    invalid_field(error.field(), error.code(), error.to_string())
}

fn not_found(id: &ParkingLocationId) -> Error {
    Error::not_found(format!("parking location {id} not found"))
}

impl<L, B> LocationService<L, B>
where
    L: ParkingLocationRepository,
    B: BookingRepository,
{
    async fn load(&self, id: &ParkingLocationId) -> Result<ParkingLocation, Error> {
        self.locations
            .find_by_id(id)
            .await
            .map_err(map_location_error)?
            .ok_or_else(|| not_found(id))
    }

    async fn availability_over(
        &self,
        location: &ParkingLocation,
        window: &BookingWindow,
    ) -> Result<Availability, Error> {
        let occupying = self
            .bookings
            .list_occupying(&location.id(), window)
            .await
            .map_err(map_booking_error)?;
        Ok(Availability::compute(
            location.total_spaces(),
            window,
            occupying.iter(),
        ))
    }

    async fn view(&self, location: ParkingLocation, now: DateTime<Utc>) -> Result<LocationView, Error> {
        let availability = self
            .availability_over(&location, &BookingWindow::minute_from(now))
            .await?;
        Ok(LocationView {
            location,
            available_spaces: availability.available_spaces,
        })
    }

    async fn announce(&self, view: &LocationView) {
        let event = ParkingEvent::LocationChanged {
            location_id: view.location.id(),
            available_spaces: view.available_spaces,
            total_spaces: view.location.total_spaces().get(),
            status: view.location.status(),
        };
        if let Err(error) = self.events.publish(&event).await {
            warn!(location_id = %view.location.id(), %error, "failed to publish location update");
        }
    }
}

#[async_trait]
impl<L, B> LocationsCommand for LocationService<L, B>
where
    L: ParkingLocationRepository,
    B: BookingRepository,
{
    async fn create(
        &self,
        actor: &Actor,
        draft: ParkingLocationDraft,
    ) -> Result<LocationView, Error> {
        require_admin(actor)?;
        let now = self.clock.utc();
        let location = ParkingLocation::create(ParkingLocationId::random(), draft, now)
            .map_err(map_validation)?;
        self.locations
            .insert(&location)
            .await
            .map_err(map_location_error)?;
        info!(location_id = %location.id(), "parking location created");

        let view = LocationView {
            available_spaces: location.total_spaces().get(),
            location,
        };
        self.announce(&view).await;
        Ok(view)
    }

    async fn update(
        &self,
        actor: &Actor,
        id: &ParkingLocationId,
        patch: ParkingLocationPatch,
    ) -> Result<LocationView, Error> {
        require_admin(actor)?;
        let now = self.clock.utc();
        let updated = self
            .load(id)
            .await?
            .apply(patch, now)
            .map_err(map_validation)?;
        self.locations
            .update(&updated, now)
            .await
            .map_err(map_location_error)?;
        info!(location_id = %id, "parking location updated");

        let view = self.view(updated, now).await?;
        self.announce(&view).await;
        Ok(view)
    }

    async fn delete(&self, actor: &Actor, id: &ParkingLocationId) -> Result<(), Error> {
        require_admin(actor)?;
        let now = self.clock.utc();
        let location = self.load(id).await?;
        if !self
            .locations
            .delete(id, now)
            .await
            .map_err(map_location_error)?
        {
            return Err(not_found(id));
        }
        info!(location_id = %id, "parking location deleted");

        self.announce(&LocationView {
            available_spaces: 0,
            location: location
                .apply(
                    ParkingLocationPatch {
                        status: Some(LocationStatus::Inactive),
                        ..ParkingLocationPatch::default()
                    },
                    now,
                )
                .map_err(map_validation)?,
        })
        .await;
        Ok(())
    }
}

#[async_trait]
impl<L, B> LocationsQuery for LocationService<L, B>
where
    L: ParkingLocationRepository,
    B: BookingRepository,
{
    async fn get(&self, id: &ParkingLocationId) -> Result<LocationView, Error> {
        let location = self.load(id).await?;
        self.view(location, self.clock.utc()).await
    }

    async fn list(
        &self,
        page: PageRequest,
        status: Option<LocationStatus>,
    ) -> Result<Vec<LocationView>, Error> {
        let now = self.clock.utc();
        let locations = self
            .locations
            .list(page, status)
            .await
            .map_err(map_location_error)?;
        let mut views = Vec::with_capacity(locations.len());
        for location in locations {
            views.push(self.view(location, now).await?);
        }
        Ok(views)
    }

    async fn nearby(&self, query: NearbyQuery) -> Result<Vec<NearbyLocation>, Error> {
        let now = self.clock.utc();
        let bounds = GeoBounds::around(query.center, query.radius);
        let candidates = self
            .locations
            .list_within(bounds)
            .await
            .map_err(map_location_error)?;

        let mut results = Vec::new();
        for hit in rank_unbounded(&query, candidates) {
            if results.len() >= query.limit() {
                break;
            }
            let view = self.view(hit.location, now).await?;
            if query
                .min_available_spaces
                .is_some_and(|min| view.available_spaces < min)
            {
                continue;
            }
            results.push(NearbyLocation {
                location: view.location,
                distance_km: hit.distance_km,
                available_spaces: view.available_spaces,
            });
        }
        Ok(results)
    }

    async fn availability(
        &self,
        id: &ParkingLocationId,
        window: BookingWindow,
    ) -> Result<AvailabilityQuote, Error> {
        let location = self.load(id).await?;
        let availability = self.availability_over(&location, &window).await?;
        Ok(AvailabilityQuote {
            location_id: location.id(),
            price_cents: quote_price(location.hourly_rate(), &window),
            window,
            availability,
        })
    }
}

#[cfg(test)]
#[path = "location_service_tests.rs"]
mod tests;
