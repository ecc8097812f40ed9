//! Outbound adapters implementing the domain ports.
//!
//! - **memory**: process-local repositories used when no database is configured
//! - **persistence**: PostgreSQL repositories built on Diesel
//! - **metrics**: Prometheus booking counters (feature-gated)
//!
//! Adapters translate between domain types and storage representations and
//! hold no booking rules of their own beyond the atomic checked insert.

pub mod memory;
#[cfg(feature = "metrics")]
pub mod metrics;
pub mod persistence;
