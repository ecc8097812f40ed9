//! Wiring of repositories into the domain services behind the HTTP ports.

use std::sync::Arc;

use mockable::{Clock, DefaultClock};

use parkspot::domain::ports::{
    BookingMetrics, BookingRepository, ParkingEventPublisher, ParkingLocationRepository,
    UserRepository,
};
use parkspot::domain::{AccountService, BookingPolicy, BookingService, EmailAddress, LocationService};
use parkspot::inbound::http::state::{HttpState, HttpStatePorts};
use parkspot::outbound::memory::{InMemoryParkingStore, InMemoryUserRepository};
use parkspot::outbound::persistence::{
    DieselBookingRepository, DieselParkingLocationRepository, DieselUserRepository,
};
use tracing::warn;

use super::ServerConfig;

/// Collaborators shared by every service regardless of storage backend.
pub(crate) struct ServiceDeps {
    pub(crate) events: Arc<dyn ParkingEventPublisher>,
    pub(crate) metrics: Arc<dyn BookingMetrics>,
    pub(crate) policy: BookingPolicy,
    pub(crate) admin_emails: Vec<EmailAddress>,
    pub(crate) clock: Arc<dyn Clock>,
}

impl ServiceDeps {
    pub(crate) fn new(
        config: &ServerConfig,
        events: Arc<dyn ParkingEventPublisher>,
        metrics: Arc<dyn BookingMetrics>,
    ) -> Self {
        Self {
            events,
            metrics,
            policy: config.booking_policy,
            admin_emails: config.admin_emails.clone(),
            clock: Arc::new(DefaultClock),
        }
    }
}

fn wire_services<U, L, B>(
    users: Arc<U>,
    locations: Arc<L>,
    bookings: Arc<B>,
    deps: ServiceDeps,
) -> HttpStatePorts
where
    U: UserRepository + 'static,
    L: ParkingLocationRepository + 'static,
    B: BookingRepository + 'static,
{
    let ServiceDeps {
        events,
        metrics,
        policy,
        admin_emails,
        clock,
    } = deps;
    let accounts = Arc::new(AccountService::new(users, admin_emails, Arc::clone(&clock)));
    let location_service = Arc::new(LocationService::new(
        Arc::clone(&locations),
        Arc::clone(&bookings),
        Arc::clone(&events),
        Arc::clone(&clock),
    ));
    let booking_service = Arc::new(BookingService::new(
        locations, bookings, events, metrics, policy, clock,
    ));
    HttpStatePorts {
        accounts: accounts.clone(),
        accounts_query: accounts,
        locations: location_service.clone(),
        locations_query: location_service,
        bookings: booking_service.clone(),
        bookings_query: booking_service,
    }
}

/// Build the handler state on PostgreSQL when a pool is configured and on the
/// in-memory repositories otherwise.
pub(crate) fn build_http_state(config: &ServerConfig, deps: ServiceDeps) -> HttpState {
    let ports = match &config.db_pool {
        Some(pool) => wire_services(
            Arc::new(DieselUserRepository::new(pool.clone())),
            Arc::new(DieselParkingLocationRepository::new(pool.clone())),
            Arc::new(DieselBookingRepository::new(pool.clone())),
            deps,
        ),
        None => {
            warn!("no database configured; data lives in memory and is lost on restart");
            let store = InMemoryParkingStore::new();
            wire_services(
                Arc::new(InMemoryUserRepository::new()),
                Arc::new(store.locations()),
                Arc::new(store.bookings()),
                deps,
            )
        }
    };
    HttpState::new(ports)
}
