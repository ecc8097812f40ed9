//! Inbound adapters translating client traffic into domain port calls.
//!
//! [`http`] serves the REST API and [`ws`] streams live booking and
//! availability updates over WebSockets.

pub mod http;
pub mod ws;
