//! Server configuration assembled by `main` from validated settings.

use std::net::SocketAddr;

use actix_web::cookie::{Key, SameSite};
use parkspot::domain::{BookingPolicy, EmailAddress};
use parkspot::inbound::ws::AllowedOrigin;
use parkspot::outbound::persistence::DbPool;

/// Everything `create_server` needs besides the health state.
pub struct ServerConfig {
    pub(crate) key: Key,
    pub(crate) cookie_secure: bool,
    pub(crate) same_site: SameSite,
    pub(crate) bind_addr: SocketAddr,
    pub(crate) db_pool: Option<DbPool>,
    pub(crate) allowed_origins: Vec<AllowedOrigin>,
    pub(crate) admin_emails: Vec<EmailAddress>,
    pub(crate) booking_policy: BookingPolicy,
}

impl ServerConfig {
    #[must_use]
    pub fn new(key: Key, cookie_secure: bool, same_site: SameSite, bind_addr: SocketAddr) -> Self {
        Self {
            key,
            cookie_secure,
            same_site,
            bind_addr,
            db_pool: None,
            allowed_origins: Vec::new(),
            admin_emails: Vec::new(),
            booking_policy: BookingPolicy::default(),
        }
    }

    /// Serve from PostgreSQL instead of the in-memory repositories.
    #[must_use]
    pub fn with_db_pool(mut self, pool: DbPool) -> Self {
        self.db_pool = Some(pool);
        self
    }

    #[must_use]
    pub fn with_allowed_origins(mut self, origins: Vec<AllowedOrigin>) -> Self {
        self.allowed_origins = origins;
        self
    }

    #[must_use]
    pub fn with_admin_emails(mut self, emails: Vec<EmailAddress>) -> Self {
        self.admin_emails = emails;
        self
    }

    #[must_use]
    pub fn with_booking_policy(mut self, policy: BookingPolicy) -> Self {
        self.booking_policy = policy;
        self
    }
}
