//! Account domain service: registration, login and user lookups.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::info;

use crate::domain::ports::{AccountsCommand, AccountsQuery, UserRepository};
use crate::domain::service_errors::map_user_error;
use crate::domain::{
    Actor, EmailAddress, Error, NewUser, PageRequest, User, UserId, UserRole,
};

/// Account service implementing the account driving ports.
#[derive(Clone)]
pub struct AccountService<U> {
    users: Arc<U>,
    admin_emails: Arc<HashSet<EmailAddress>>,
    clock: Arc<dyn Clock>,
}

impl<U> AccountService<U> {
    /// Accounts registered with an email in `admin_emails` receive the admin role.
    pub fn new(
        users: Arc<U>,
        admin_emails: impl IntoIterator<Item = EmailAddress>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users,
            admin_emails: Arc::new(admin_emails.into_iter().collect()),
            clock,
        }
    }

    fn role_for(&self, email: &EmailAddress) -> UserRole {
        if self.admin_emails.contains(email) {
            UserRole::Admin
        } else {
            UserRole::User
        }
    }
}

#[async_trait]
impl<U> AccountsCommand for AccountService<U>
where
    U: UserRepository,
{
    async fn register(&self, draft: NewUser) -> Result<User, Error> {
        let NewUser { name, email, phone } = draft;
        let user = User {
            id: UserId::random(),
            role: self.role_for(&email),
            name,
            email,
            phone,
            created_at: self.clock.utc(),
        };
        self.users.insert(&user).await.map_err(map_user_error)?;
        info!(user_id = %user.id, role = user.role.as_str(), "user registered");
        Ok(user)
    }

    async fn login(&self, email: EmailAddress) -> Result<User, Error> {
        self.users
            .find_by_email(&email)
            .await
            .map_err(map_user_error)?
            .ok_or_else(|| Error::unauthorized("no account exists for that email"))
    }
}

#[async_trait]
impl<U> AccountsQuery for AccountService<U>
where
    U: UserRepository,
{
    async fn actor(&self, user_id: &UserId) -> Result<Actor, Error> {
        self.users
            .find_by_id(user_id)
            .await
            .map_err(map_user_error)?
            .map(|user| Actor::of(&user))
            .ok_or_else(|| Error::unauthorized("session user no longer exists"))
    }

    async fn get_user(&self, actor: &Actor, id: &UserId) -> Result<User, Error> {
        if !actor.may_access(id) {
            return Err(Error::forbidden("cannot view another user's account"));
        }
        self.users
            .find_by_id(id)
            .await
            .map_err(map_user_error)?
            .ok_or_else(|| Error::not_found(format!("user {id} not found")))
    }

    async fn list_users(&self, actor: &Actor, page: PageRequest) -> Result<Vec<User>, Error> {
        if !actor.is_admin() {
            return Err(Error::forbidden("admin role required"));
        }
        self.users.list(page).await.map_err(map_user_error)
    }
}

#[cfg(test)]
#[path = "account_service_tests.rs"]
mod tests;
