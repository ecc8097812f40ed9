//! Shared HTTP adapter state.
//!
//! Handlers receive this through `web::Data` and only ever talk to the
//! driving ports, so they can be exercised with mocks and no I/O.

use std::sync::Arc;

use crate::domain::ports::{
    AccountsCommand, AccountsQuery, BookingsCommand, BookingsQuery, LocationsCommand,
    LocationsQuery,
};

/// Parameter object bundling the port implementations.
#[derive(Clone)]
pub struct HttpStatePorts {
    pub accounts: Arc<dyn AccountsCommand>,
    pub accounts_query: Arc<dyn AccountsQuery>,
    pub locations: Arc<dyn LocationsCommand>,
    pub locations_query: Arc<dyn LocationsQuery>,
    pub bookings: Arc<dyn BookingsCommand>,
    pub bookings_query: Arc<dyn BookingsQuery>,
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub accounts: Arc<dyn AccountsCommand>,
    pub accounts_query: Arc<dyn AccountsQuery>,
    pub locations: Arc<dyn LocationsCommand>,
    pub locations_query: Arc<dyn LocationsQuery>,
    pub bookings: Arc<dyn BookingsCommand>,
    pub bookings_query: Arc<dyn BookingsQuery>,
}

impl HttpState {
    pub fn new(ports: HttpStatePorts) -> Self {
        let HttpStatePorts {
            accounts,
            accounts_query,
            locations,
            locations_query,
            bookings,
            bookings_query,
        } = ports;
        Self {
            accounts,
            accounts_query,
            locations,
            locations_query,
            bookings,
            bookings_query,
        }
    }
}

impl From<HttpStatePorts> for HttpState {
    fn from(ports: HttpStatePorts) -> Self {
        Self::new(ports)
    }
}
