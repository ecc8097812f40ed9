//! Application settings loaded via OrthoConfig.
//!
//! Values layer CLI flags over `PARKSPOT_*` environment variables over an
//! optional configuration file. List-valued settings (allowed WebSocket
//! origins, admin emails) are comma-separated strings.

use std::net::SocketAddr;

use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::domain::{BookingPolicy, BookingPolicyError, EmailAddress, UserValidationError};
use crate::inbound::ws::AllowedOrigin;
use crate::outbound::persistence::PoolConfig;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_WS_ORIGIN: &str = "http://localhost:3000";
const DEFAULT_MIN_MINUTES: i64 = 30;
const DEFAULT_MAX_MINUTES: i64 = 24 * 60;
const DEFAULT_GRACE_MINUTES: i64 = 15;
const DEFAULT_PAST_START_MINUTES: i64 = 5;

/// Errors raised while interpreting loaded settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("invalid bind address '{value}': {source}")]
    BindAddr {
        value: String,
        #[source]
        source: std::net::AddrParseError,
    },
    #[error("invalid WebSocket origin '{value}': {source}")]
    Origin {
        value: String,
        #[source]
        source: url::ParseError,
    },
    #[error("invalid admin email '{value}': {source}")]
    AdminEmail {
        value: String,
        #[source]
        source: UserValidationError,
    },
    #[error("invalid booking policy: {0}")]
    Policy(#[from] BookingPolicyError),
}

/// Server settings.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "PARKSPOT")]
pub struct AppSettings {
    /// Socket address to listen on; defaults to `0.0.0.0:8080`.
    pub bind_addr: Option<String>,
    /// PostgreSQL URL. Without it the server keeps everything in memory.
    pub database_url: Option<String>,
    /// Maximum pooled database connections.
    pub db_pool_size: Option<u32>,
    /// Apply embedded migrations before serving.
    #[ortho_config(default = true)]
    pub run_migrations: bool,
    /// Comma-separated origins allowed to open `/ws`.
    pub ws_allowed_origins: Option<String>,
    /// Comma-separated emails that register as administrators.
    pub admin_emails: Option<String>,
    pub booking_min_minutes: Option<i64>,
    pub booking_max_minutes: Option<i64>,
    pub check_in_grace_minutes: Option<i64>,
    pub past_start_tolerance_minutes: Option<i64>,
}

fn split_list(raw: Option<&str>) -> impl Iterator<Item = &str> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
}

impl AppSettings {
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let value = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        value.parse().map_err(|source| SettingsError::BindAddr {
            value: value.to_owned(),
            source,
        })
    }

    /// Pool settings when a database URL is configured.
    pub fn pool_config(&self) -> Option<PoolConfig> {
        let url = self.database_url.as_deref()?.trim();
        if url.is_empty() {
            return None;
        }
        let config = PoolConfig::new(url);
        Some(match self.db_pool_size {
            Some(size) => config.with_max_size(size),
            None => config,
        })
    }

    /// Allowed WebSocket origins; `http://localhost:3000` when unset.
    pub fn allowed_origins(&self) -> Result<Vec<AllowedOrigin>, SettingsError> {
        let raw = self.ws_allowed_origins.as_deref().unwrap_or(DEFAULT_WS_ORIGIN);
        split_list(Some(raw))
            .map(|value| {
                AllowedOrigin::parse(value).map_err(|source| SettingsError::Origin {
                    value: value.to_owned(),
                    source,
                })
            })
            .collect()
    }

    pub fn admin_emails(&self) -> Result<Vec<EmailAddress>, SettingsError> {
        split_list(self.admin_emails.as_deref())
            .map(|value| {
                EmailAddress::new(value).map_err(|source| SettingsError::AdminEmail {
                    value: value.to_owned(),
                    source,
                })
            })
            .collect()
    }

    pub fn booking_policy(&self) -> Result<BookingPolicy, SettingsError> {
        Ok(BookingPolicy::from_minutes(
            self.booking_min_minutes.unwrap_or(DEFAULT_MIN_MINUTES),
            self.booking_max_minutes.unwrap_or(DEFAULT_MAX_MINUTES),
            self.check_in_grace_minutes.unwrap_or(DEFAULT_GRACE_MINUTES),
            self.past_start_tolerance_minutes
                .unwrap_or(DEFAULT_PAST_START_MINUTES),
        )?)
    }
}
