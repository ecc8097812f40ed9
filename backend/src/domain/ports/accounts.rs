//! Driving ports for account registration, login and user lookups.

use async_trait::async_trait;

use crate::domain::{Actor, EmailAddress, Error, NewUser, PageRequest, User, UserId};

/// Account mutations and session establishment.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountsCommand: Send + Sync {
    /// Create an account; duplicate emails are a conflict.
    async fn register(&self, draft: NewUser) -> Result<User, Error>;

    /// Resolve the account behind `email`; unknown emails are unauthorised.
    async fn login(&self, email: EmailAddress) -> Result<User, Error>;
}

/// Account reads.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountsQuery: Send + Sync {
    /// Resolve the caller behind a session; a stale id is unauthorised.
    async fn actor(&self, user_id: &UserId) -> Result<Actor, Error>;

    /// Fetch a user visible to `actor` (themself or any user for admins).
    async fn get_user(&self, actor: &Actor, id: &UserId) -> Result<User, Error>;

    /// List every user; admin only.
    async fn list_users(&self, actor: &Actor, page: PageRequest) -> Result<Vec<User>, Error>;
}
