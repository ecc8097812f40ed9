//! HTTP inbound adapter exposing the REST API.

pub mod auth;
pub mod bookings;
pub mod error;
pub mod health;
pub mod locations;
mod locations_dto;
pub mod schemas;
pub mod session;
pub mod session_config;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod users;
pub mod validation;

pub use error::ApiResult;
