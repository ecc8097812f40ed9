//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::{Service, ServiceResponse};
use actix_web::{HttpResponse, test, web};

use crate::domain::ports::{
    MockAccountsCommand, MockAccountsQuery, MockBookingsCommand, MockBookingsQuery,
    MockLocationsCommand, MockLocationsQuery,
};
use crate::domain::{Actor, UserId, UserRole};

use super::ApiResult;
use super::session::SessionContext;
use super::state::{HttpState, HttpStatePorts};

/// Session middleware with a fresh key, a `session` cookie name and the
/// `Secure` flag disabled for plain HTTP tests.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build()
}

/// One mock per driving port; set expectations then call [`Self::into_state`].
#[derive(Default)]
pub struct MockPorts {
    pub accounts: MockAccountsCommand,
    pub accounts_query: MockAccountsQuery,
    pub locations: MockLocationsCommand,
    pub locations_query: MockLocationsQuery,
    pub bookings: MockBookingsCommand,
    pub bookings_query: MockBookingsQuery,
}

impl MockPorts {
    /// Resolve every session to `actor`.
    pub fn acting_as(mut self, actor: Actor) -> Self {
        self.accounts_query
            .expect_actor()
            .returning(move |_| Ok(actor));
        self
    }

    pub fn into_state(self) -> HttpState {
        HttpState::new(HttpStatePorts {
            accounts: Arc::new(self.accounts),
            accounts_query: Arc::new(self.accounts_query),
            locations: Arc::new(self.locations),
            locations_query: Arc::new(self.locations_query),
            bookings: Arc::new(self.bookings),
            bookings_query: Arc::new(self.bookings_query),
        })
    }
}

pub fn actor(role: UserRole) -> Actor {
    Actor {
        user_id: UserId::random(),
        role,
    }
}

/// Route handler mounted at `/test/login/{id}` that stores `id` in the session.
pub async fn test_login(session: SessionContext, path: web::Path<String>) -> ApiResult<HttpResponse> {
    let user_id = UserId::new(path.as_str())
        .map_err(|err| crate::domain::Error::invalid_request(err.to_string()))?;
    session.persist_user(&user_id)?;
    Ok(HttpResponse::NoContent().finish())
}

/// Log in through [`test_login`] and return the session cookie.
pub async fn session_cookie<S>(app: &S, user_id: &UserId) -> Cookie<'static>
where
    S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let req = test::TestRequest::post()
        .uri(&format!("/test/login/{user_id}"))
        .to_request();
    let res = test::call_service(app, req).await;
    assert!(res.status().is_success(), "test login failed: {}", res.status());
    res.response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .expect("session cookie")
        .into_owned()
}
