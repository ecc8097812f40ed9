//! Tests for the booking service.

use std::sync::{Arc, Mutex};

use chrono::{Duration, Local, NaiveTime, TimeZone};
use mockall::predicate::eq;
use rstest::{fixture, rstest};
use serde_json::json;

use super::*;
use crate::domain::ports::{
    EventPublishError, MockBookingMetrics, MockBookingRepository, MockParkingLocationRepository,
};
use crate::domain::{
    Amenity, ErrorCode, LocationStatus, OperatingHours, ParkingLocationDraft, ReservationConflict,
    UserId, UserRole, VehiclePlate, VehicleType,
};

struct FixtureClock;

impl Clock for FixtureClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0)
            .single()
            .expect("valid fixture timestamp")
    }
}

#[derive(Default)]
struct RecordingPublisher {
    events: Mutex<Vec<ParkingEvent>>,
}

#[async_trait]
impl ParkingEventPublisher for RecordingPublisher {
    async fn publish(&self, event: &ParkingEvent) -> Result<(), EventPublishError> {
        self.events
            .lock()
            .expect("events lock")
            .push(event.clone());
        Ok(())
    }
}

fn now() -> DateTime<Utc> {
    FixtureClock.utc()
}

fn driver() -> Actor {
    Actor {
        user_id: UserId::random(),
        role: UserRole::User,
    }
}

fn location_with(status: LocationStatus, hours: OperatingHours) -> ParkingLocation {
    ParkingLocation::create(
        ParkingLocationId::random(),
        ParkingLocationDraft {
            name: "Central".into(),
            address: "1 High Street, London".into(),
            latitude: 51.5074,
            longitude: -0.1278,
            total_spaces: 2,
            hourly_rate_cents: 250,
            operating_hours: hours,
            amenities: vec![Amenity::Cctv],
            status,
        },
        now(),
    )
    .expect("valid location")
}

#[fixture]
fn location() -> ParkingLocation {
    location_with(LocationStatus::Active, OperatingHours::AlwaysOpen)
}

fn window(start_h: i64, hours: i64) -> BookingWindow {
    let start = now() + Duration::hours(start_h);
    BookingWindow::new(start, start + Duration::hours(hours)).expect("valid window")
}

fn request(location: &ParkingLocation, window: BookingWindow) -> NewBooking {
    NewBooking {
        location_id: location.id(),
        vehicle_plate: VehiclePlate::new("AB12CDE").expect("valid plate"),
        vehicle_type: VehicleType::Car,
        window,
    }
}

fn stored_booking(owner: &Actor, location: &ParkingLocation, window: BookingWindow) -> Booking {
    Booking {
        id: BookingId::random(),
        user_id: owner.user_id,
        location_id: location.id(),
        vehicle_plate: VehiclePlate::new("AB12CDE").expect("valid plate"),
        vehicle_type: VehicleType::Car,
        window,
        total_price_cents: 500,
        status: BookingStatus::Confirmed,
        created_at: now(),
        updated_at: now(),
    }
}

fn locations_returning(location: &ParkingLocation) -> MockParkingLocationRepository {
    let stored = location.clone();
    let mut locations = MockParkingLocationRepository::new();
    locations
        .expect_find_by_id()
        .returning(move |_| Ok(Some(stored.clone())));
    locations
}

fn service(
    locations: MockParkingLocationRepository,
    bookings: MockBookingRepository,
    metrics: MockBookingMetrics,
    publisher: Arc<RecordingPublisher>,
) -> BookingService<MockParkingLocationRepository, MockBookingRepository> {
    BookingService::new(
        Arc::new(locations),
        Arc::new(bookings),
        publisher,
        Arc::new(metrics),
        BookingPolicy::default(),
        Arc::new(FixtureClock),
    )
}

#[rstest]
#[tokio::test]
async fn create_prices_stores_and_announces(location: ParkingLocation) {
    let mut bookings = MockBookingRepository::new();
    bookings
        .expect_insert_checked()
        .withf(|booking| booking.status == BookingStatus::Confirmed)
        .times(1)
        .return_once(|_| Ok(()));
    bookings
        .expect_list_occupying()
        .return_once(|_, _| Ok(Vec::new()));
    let mut metrics = MockBookingMetrics::new();
    metrics.expect_record_created().times(1).return_once(|| Ok(()));
    let publisher = Arc::new(RecordingPublisher::default());
    let svc = service(
        locations_returning(&location),
        bookings,
        metrics,
        publisher.clone(),
    );
    let actor = driver();

    let booking = svc
        .create(&actor, request(&location, window(1, 2)))
        .await
        .expect("booking created");

    assert_eq!(booking.user_id, actor.user_id);
    assert_eq!(booking.total_price_cents, 500);
    let events = publisher.events.lock().expect("events lock");
    assert!(matches!(
        events.as_slice(),
        [
            ParkingEvent::BookingChanged {
                change: BookingChange::Created,
                ..
            },
            ParkingEvent::LocationChanged { .. },
        ]
    ));
}

#[rstest]
#[tokio::test]
async fn create_reports_rejection_reason(location: ParkingLocation) {
    let mut bookings = MockBookingRepository::new();
    bookings.expect_insert_checked().times(1).return_once(|_| {
        Err(BookingPersistenceError::rejected(
            ReservationConflict::CapacityExhausted {
                peak: 2,
                capacity: 2,
            },
        ))
    });
    let mut metrics = MockBookingMetrics::new();
    metrics
        .expect_record_rejected()
        .with(eq("capacity_exhausted"))
        .times(1)
        .return_once(|_| Ok(()));
    metrics.expect_record_created().times(0);
    let publisher = Arc::new(RecordingPublisher::default());
    let svc = service(
        locations_returning(&location),
        bookings,
        metrics,
        publisher.clone(),
    );

    let error = svc
        .create(&driver(), request(&location, window(1, 2)))
        .await
        .expect_err("full");

    assert_eq!(error.code(), ErrorCode::Conflict);
    assert_eq!(
        error.details().and_then(|d| d.get("code")),
        Some(&json!("capacity_exhausted"))
    );
    assert!(publisher.events.lock().expect("events lock").is_empty());
}

#[rstest]
#[case(window(-1, 2), "startTime", "start_in_past")]
#[case(window(1, 25), "endTime", "duration_too_long")]
#[tokio::test]
async fn create_enforces_policy(
    location: ParkingLocation,
    #[case] requested: BookingWindow,
    #[case] field: &str,
    #[case] code: &str,
) {
    let mut locations = MockParkingLocationRepository::new();
    locations.expect_find_by_id().times(0);
    let svc = service(
        locations,
        MockBookingRepository::new(),
        MockBookingMetrics::new(),
        Arc::default(),
    );

    let error = svc
        .create(&driver(), request(&location, requested))
        .await
        .expect_err("policy violation");
    assert_eq!(error.code(), ErrorCode::InvalidRequest);
    assert_eq!(
        error.details(),
        Some(&json!({ "field": field, "code": code }))
    );
}

#[rstest]
#[tokio::test]
async fn create_refuses_inactive_locations() {
    let closed = location_with(LocationStatus::Maintenance, OperatingHours::AlwaysOpen);
    let mut bookings = MockBookingRepository::new();
    bookings.expect_insert_checked().times(0);
    let svc = service(
        locations_returning(&closed),
        bookings,
        MockBookingMetrics::new(),
        Arc::default(),
    );

    let error = svc
        .create(&driver(), request(&closed, window(1, 2)))
        .await
        .expect_err("inactive");
    assert_eq!(error.code(), ErrorCode::Conflict);
}

#[rstest]
#[tokio::test]
async fn create_respects_operating_hours() {
    let hours = OperatingHours::daily(
        NaiveTime::from_hms_opt(8, 0, 0).expect("time"),
        NaiveTime::from_hms_opt(11, 0, 0).expect("time"),
    )
    .expect("valid hours");
    let daytime = location_with(LocationStatus::Active, hours);
    let svc = service(
        locations_returning(&daytime),
        MockBookingRepository::new(),
        MockBookingMetrics::new(),
        Arc::default(),
    );

    let error = svc
        .create(&driver(), request(&daytime, window(1, 3)))
        .await
        .expect_err("after closing");
    assert_eq!(
        error.details().and_then(|d| d.get("code")),
        Some(&json!("outside_operating_hours"))
    );
}

#[rstest]
#[tokio::test]
async fn cancel_by_stranger_is_forbidden(location: ParkingLocation) {
    let booking = stored_booking(&driver(), &location, window(2, 1));
    let mut bookings = MockBookingRepository::new();
    bookings
        .expect_find_by_id()
        .return_once(move |_| Ok(Some(booking)));
    bookings.expect_update_status().times(0);
    let svc = service(
        MockParkingLocationRepository::new(),
        bookings,
        MockBookingMetrics::new(),
        Arc::default(),
    );

    let error = svc
        .cancel(&driver(), &BookingId::random())
        .await
        .expect_err("not owner");
    assert_eq!(error.code(), ErrorCode::Forbidden);
}

#[rstest]
#[tokio::test]
async fn check_in_before_grace_is_a_conflict(location: ParkingLocation) {
    let owner = driver();
    let booking = stored_booking(&owner, &location, window(2, 1));
    let mut bookings = MockBookingRepository::new();
    bookings
        .expect_find_by_id()
        .return_once(move |_| Ok(Some(booking)));
    let svc = service(
        MockParkingLocationRepository::new(),
        bookings,
        MockBookingMetrics::new(),
        Arc::default(),
    );

    let error = svc
        .check_in(&owner, &BookingId::random())
        .await
        .expect_err("too early");
    assert_eq!(error.code(), ErrorCode::Conflict);
    assert_eq!(
        error.details().and_then(|d| d.get("code")),
        Some(&json!("check_in_too_early"))
    );
}

#[rstest]
#[tokio::test]
async fn cancel_updates_status_and_records_transition(location: ParkingLocation) {
    let owner = driver();
    let booking = stored_booking(&owner, &location, window(2, 1));
    let id = booking.id;
    let mut bookings = MockBookingRepository::new();
    bookings
        .expect_find_by_id()
        .return_once(move |_| Ok(Some(booking)));
    bookings
        .expect_update_status()
        .with(
            eq(id),
            eq(BookingStatus::Confirmed),
            eq(BookingStatus::Cancelled),
            eq(now()),
        )
        .times(1)
        .return_once(|_, _, _, _| Ok(true));
    bookings
        .expect_list_occupying()
        .return_once(|_, _| Ok(Vec::new()));
    let mut metrics = MockBookingMetrics::new();
    metrics
        .expect_record_transition()
        .with(eq(BookingStatus::Cancelled))
        .times(1)
        .return_once(|_| Ok(()));
    let publisher = Arc::new(RecordingPublisher::default());
    let svc = service(
        locations_returning(&location),
        bookings,
        metrics,
        publisher.clone(),
    );

    let cancelled = svc.cancel(&owner, &id).await.expect("cancelled");
    assert_eq!(cancelled.status, BookingStatus::Cancelled);
    assert_eq!(publisher.events.lock().expect("events lock").len(), 2);
}

#[rstest]
#[tokio::test]
async fn lost_status_race_is_a_conflict(location: ParkingLocation) {
    let owner = driver();
    let booking = stored_booking(&owner, &location, window(2, 1));
    let mut bookings = MockBookingRepository::new();
    bookings
        .expect_find_by_id()
        .return_once(move |_| Ok(Some(booking)));
    bookings
        .expect_update_status()
        .return_once(|_, _, _, _| Ok(false));
    let mut metrics = MockBookingMetrics::new();
    metrics.expect_record_transition().times(0);
    let svc = service(
        MockParkingLocationRepository::new(),
        bookings,
        metrics,
        Arc::default(),
    );

    let error = svc
        .cancel(&owner, &BookingId::random())
        .await
        .expect_err("race lost");
    assert_eq!(
        error.details().and_then(|d| d.get("code")),
        Some(&json!("concurrent_update"))
    );
}

#[rstest]
#[tokio::test]
async fn get_hides_other_users_bookings(location: ParkingLocation) {
    let booking = stored_booking(&driver(), &location, window(2, 1));
    let mut bookings = MockBookingRepository::new();
    bookings
        .expect_find_by_id()
        .return_once(move |_| Ok(Some(booking)));
    let svc = service(
        MockParkingLocationRepository::new(),
        bookings,
        MockBookingMetrics::new(),
        Arc::default(),
    );

    let error = svc
        .get(&driver(), &BookingId::random())
        .await
        .expect_err("forbidden");
    assert_eq!(error.code(), ErrorCode::Forbidden);
}

#[rstest]
#[tokio::test]
async fn list_for_location_requires_admin() {
    let mut bookings = MockBookingRepository::new();
    bookings.expect_list_for_location().times(0);
    let svc = service(
        MockParkingLocationRepository::new(),
        bookings,
        MockBookingMetrics::new(),
        Arc::default(),
    );

    let error = svc
        .list_for_location(&driver(), &ParkingLocationId::random())
        .await
        .expect_err("forbidden");
    assert_eq!(error.code(), ErrorCode::Forbidden);
}
