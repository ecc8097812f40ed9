//! In-process repositories used when no database is configured and in tests.
//!
//! Locations and bookings share one [`InMemoryParkingStore`] lock; users keep
//! their own. Reads clone rows out so no lock is held across an `.await` in
//! callers.

mod bookings;
mod locations;
mod store;
mod users;

pub use bookings::InMemoryBookingRepository;
pub use locations::InMemoryParkingLocationRepository;
pub use store::InMemoryParkingStore;
pub use users::InMemoryUserRepository;
