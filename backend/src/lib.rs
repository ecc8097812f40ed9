//! ParkSpot backend library.
//!
//! Layout follows ports and adapters: `domain` holds entities, booking rules
//! and the port traits; `inbound` adapts HTTP and WebSocket traffic onto the
//! driving ports; `outbound` implements the driven ports over memory,
//! PostgreSQL and Prometheus. The binary wires them together.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod settings;

/// OpenAPI document served by Swagger UI in debug builds.
pub use doc::ApiDoc;
pub use middleware::Trace;
