//! PostgreSQL persistence adapters using Diesel with `diesel-async` and `bb8`.
//!
//! Row structs (`models`) and table definitions (`schema`) stay private to
//! this module. Repositories translate rows through the domain constructors
//! and report failures as the port error types.
//!
//! ```ignore
//! use parkspot::outbound::persistence::{DbPool, DieselBookingRepository, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/parkspot")).await?;
//! let bookings = DieselBookingRepository::new(pool);
//! ```

mod diesel_booking_repository;
mod diesel_parking_location_repository;
mod diesel_user_repository;
mod error_mapping;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_booking_repository::DieselBookingRepository;
pub use diesel_parking_location_repository::DieselParkingLocationRepository;
pub use diesel_user_repository::DieselUserRepository;
pub use migrations::{MigrationError, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
